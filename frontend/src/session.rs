use crate::route::parse_int_prefix;

/// Member grade that may moderate any post or comment.
pub const ADMIN_GRADE: i64 = 3;

/// Identity of the signed-in member (or the anonymous visitor), read once from
/// the host markup and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberMeta {
    pub id: String,
    pub grade: i64,
    pub logged_in: bool,
    pub nickname: String,
}

impl MemberMeta {
    pub fn anonymous() -> Self {
        MemberMeta::default()
    }

    /// Builds the session from `data-*` attribute lookups on the member meta
    /// element. `lookup` receives attribute names such as `data-grade`.
    pub fn from_attributes<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        MemberMeta {
            id: lookup("data-id").unwrap_or_default(),
            grade: lookup("data-grade")
                .and_then(|grade| parse_int_prefix(&grade))
                .unwrap_or(0),
            logged_in: lookup("data-logged-in").as_deref() == Some("true"),
            nickname: lookup("data-nickname").unwrap_or_default(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.grade == ADMIN_GRADE
    }

    pub fn can_edit_post(&self, writer: &str) -> bool {
        self.logged_in && (self.is_admin() || self.nickname == writer)
    }

    pub fn can_delete_comment(&self, owner_id: Option<&str>) -> bool {
        self.is_admin() || (!self.id.is_empty() && owner_id == Some(self.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> MemberMeta {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MemberMeta::from_attributes(|name| map.get(name).cloned())
    }

    #[test]
    fn missing_attributes_yield_anonymous_session() {
        assert_eq!(from_map(&[]), MemberMeta::anonymous());
    }

    #[test]
    fn attributes_are_typed_once() {
        let member = from_map(&[
            ("data-id", "marine01"),
            ("data-grade", "3"),
            ("data-logged-in", "true"),
            ("data-nickname", "마린"),
        ]);
        assert_eq!(member.id, "marine01");
        assert!(member.is_admin());
        assert!(member.logged_in);
        assert_eq!(member.nickname, "마린");
    }

    #[test]
    fn malformed_grade_falls_back_to_zero() {
        let member = from_map(&[("data-grade", "admin"), ("data-logged-in", "yes")]);
        assert_eq!(member.grade, 0);
        assert!(!member.logged_in);
    }

    #[test]
    fn post_edit_requires_login_and_ownership_or_admin() {
        let mut member = from_map(&[("data-logged-in", "true"), ("data-nickname", "저그")]);
        assert!(member.can_edit_post("저그"));
        assert!(!member.can_edit_post("프로토스"));
        member.grade = ADMIN_GRADE;
        assert!(member.can_edit_post("프로토스"));
        member.logged_in = false;
        assert!(!member.can_edit_post("저그"));
    }

    #[test]
    fn comment_delete_needs_matching_non_empty_id() {
        let member = from_map(&[("data-id", "zerg")]);
        assert!(member.can_delete_comment(Some("zerg")));
        assert!(!member.can_delete_comment(Some("toss")));
        assert!(!member.can_delete_comment(None));
        assert!(!MemberMeta::anonymous().can_delete_comment(Some("")));
    }
}
