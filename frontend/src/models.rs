//! Wire shapes of the board API. The server is loose about types (dates may
//! arrive formatted or as epoch numbers, counts occasionally as strings, lists
//! as `null`), so decoding is deliberately forgiving.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::route::parse_int_prefix;

mod lenient {
    use super::*;

    pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(as_int(&Value::deserialize(deserializer)?).unwrap_or(0))
    }

    pub fn opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(as_int(&Value::deserialize(deserializer)?))
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => String::new(),
            Value::String(text) => text,
            other => other.to_string(),
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(flag) => flag,
            Value::Number(number) => number.as_f64().map_or(false, |n| n != 0.0),
            Value::String(text) => !text.is_empty() && text != "false",
            _ => false,
        })
    }

    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn as_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|n| n.trunc() as i64)),
            Value::String(text) => parse_int_prefix(text),
            _ => None,
        }
    }
}

pub use lenient::as_int as lenient_int;

/// One entry of `/boards/boardList`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardSummary {
    pub board_title: Option<String>,
    pub korean_title: Option<String>,
}

/// A post, either a full `postData` payload or a row of a board listing (in
/// which case `content` is absent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    #[serde(deserialize_with = "lenient::int")]
    pub post_num: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub writer: String,
    #[serde(deserialize_with = "lenient::text")]
    pub reg_date: String,
    #[serde(deserialize_with = "lenient::int")]
    pub views: i64,
    pub content: Option<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub recommend_count: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub comment_count: i64,
}

/// Server-computed pagination window. Used both for board listings and as the
/// comment pagination descriptor, which is posted back verbatim to fetch the
/// page it describes; unknown fields are carried along for that reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    #[serde(deserialize_with = "lenient::int")]
    pub recent_page: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub total_page: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub total_post_count: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub page_begin_point: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub page_end_point: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub prev_page_set_point: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub next_page_set_point: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            recent_page: 1,
            total_page: 1,
            total_post_count: 0,
            page_begin_point: 1,
            page_end_point: 1,
            prev_page_set_point: 0,
            next_page_set_point: 0,
            extra: Map::new(),
        }
    }
}

impl Page {
    pub fn has_prev_set(&self) -> bool {
        self.prev_page_set_point >= 1
    }

    pub fn has_next_set(&self) -> bool {
        self.next_page_set_point >= 1 && self.next_page_set_point <= self.total_page
    }

    /// Numbered page buttons are only drawn when there is more than one page.
    pub fn window(&self) -> std::ops::RangeInclusive<i64> {
        if self.total_page > 1 {
            self.page_begin_point..=self.page_end_point
        } else {
            1..=0
        }
    }
}

/// `/boards/{t}/listData` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardPage {
    pub board_title: Option<String>,
    pub korean_title: Option<String>,
    pub page: Page,
    #[serde(deserialize_with = "lenient::list")]
    pub self_notice_list: Vec<Post>,
    #[serde(deserialize_with = "lenient::list")]
    pub post_list: Vec<Post>,
    #[serde(deserialize_with = "lenient::flag")]
    pub can_write: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentAuthor {
    pub nick_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    #[serde(deserialize_with = "lenient::int")]
    pub comment_num: i64,
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub reg_date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub content: String,
    pub nickname: Option<String>,
    #[serde(rename = "memberDTO")]
    pub member: Option<CommentAuthor>,
}

impl Comment {
    /// Member nickname, else the anonymous author's nickname marked as a
    /// non-member, else a generic placeholder.
    pub fn author_label(&self) -> String {
        if let Some(nick) = self
            .member
            .as_ref()
            .and_then(|member| member.nick_name.as_deref())
            .filter(|nick| !nick.is_empty())
        {
            return nick.to_owned();
        }
        match self.nickname.as_deref().filter(|nick| !nick.is_empty()) {
            Some(nick) => format!("{} (비회원)", nick),
            None => "익명".to_owned(),
        }
    }
}

/// Body of `addComment`: members send their id, visitors a nickname and a
/// password that later authorises deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post_num: i64,
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl NewComment {
    pub fn member(post_num: i64, id: &str, content: &str) -> Self {
        NewComment {
            post_num,
            id: id.to_owned(),
            content: content.to_owned(),
            nickname: None,
            password: None,
        }
    }

    pub fn visitor(post_num: i64, nickname: &str, password: &str, content: &str) -> Self {
        NewComment {
            post_num,
            id: String::new(),
            content: content.to_owned(),
            nickname: Some(nickname.to_owned()),
            password: Some(password.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostNumBody {
    pub post_num: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPageRequest {
    pub recent_page: i64,
    pub post_num: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendState {
    #[serde(deserialize_with = "lenient::flag")]
    pub check_recommend: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelatedPost {
    pub board_title: Option<String>,
    #[serde(deserialize_with = "lenient::opt_int")]
    pub post_num: Option<i64>,
    pub title: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatReply {
    pub answer: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub related_posts: Vec<RelatedPost>,
    pub usage_text: Option<String>,
    pub error: Option<String>,
}
