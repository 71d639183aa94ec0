//! The surface the controller draws on. In the browser this is the feed list
//! and terminal transcript in the DOM; in the console it is stdout.

use std::fmt;

use crate::markup::{Element, Node};
use crate::route::parse_int_prefix;

/// Identifies one appended feed item for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Regions of a feed item that are redrawn after it was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Recommend,
    CommentViewLink,
    CommentsView,
    CommentsList,
    CommentsPager,
    CommentForm,
    CommentsDivider,
    PostMenu,
    PostMenuToggle,
    ChatMeta,
    ChatAnswer,
    ChatRelated,
}

impl Slot {
    fn suffix(&self) -> &'static str {
        match self {
            Slot::Recommend => "recommend",
            Slot::CommentViewLink => "comment-view",
            Slot::CommentsView => "comments",
            Slot::CommentsList => "comments-list",
            Slot::CommentsPager => "comments-page",
            Slot::CommentForm => "comment-form",
            Slot::CommentsDivider => "comments-divider",
            Slot::PostMenu => "menu",
            Slot::PostMenuToggle => "menu-toggle",
            Slot::ChatMeta => "chat-meta",
            Slot::ChatAnswer => "chat-answer",
            Slot::ChatRelated => "chat-related",
        }
    }
}

pub fn item_dom_id(item: ItemId) -> String {
    format!("scFeedItem{}", item.0)
}

pub fn slot_dom_id(item: ItemId, slot: Slot) -> String {
    format!("scFeedItem{}-{}", item.0, slot.suffix())
}

/// Widget visibility. The initial state comes from the host markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Collapsed,
    Open,
}

/// What the visitor typed into an inline comment form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub content: String,
    pub nickname: String,
    pub password: String,
}

pub const ACTION_ATTR: &str = "data-sc-action";
pub const ITEM_ATTR: &str = "data-sc-item";
pub const ARG_ATTR: &str = "data-sc-arg";

/// Clicks on controls inside rendered feed items. Controls carry their action
/// in `data-sc-action`, the owning item in `data-sc-item` and an optional
/// numeric argument in `data-sc-arg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedAction {
    ToggleRecommend(ItemId),
    ToggleComments(ItemId),
    ToggleCommentForm(ItemId),
    SubmitComment(ItemId),
    DeleteComment(ItemId, i64),
    CommentPage(ItemId, i64),
    TogglePostMenu(ItemId),
}

impl FeedAction {
    pub fn name(&self) -> &'static str {
        match self {
            FeedAction::ToggleRecommend(_) => "recommend",
            FeedAction::ToggleComments(_) => "comments",
            FeedAction::ToggleCommentForm(_) => "comment-form",
            FeedAction::SubmitComment(_) => "comment-submit",
            FeedAction::DeleteComment(..) => "comment-delete",
            FeedAction::CommentPage(..) => "comment-page",
            FeedAction::TogglePostMenu(_) => "post-menu",
        }
    }

    pub fn item(&self) -> ItemId {
        match self {
            FeedAction::ToggleRecommend(item)
            | FeedAction::ToggleComments(item)
            | FeedAction::ToggleCommentForm(item)
            | FeedAction::SubmitComment(item)
            | FeedAction::DeleteComment(item, _)
            | FeedAction::CommentPage(item, _)
            | FeedAction::TogglePostMenu(item) => *item,
        }
    }

    fn arg(&self) -> Option<i64> {
        match self {
            FeedAction::DeleteComment(_, arg) | FeedAction::CommentPage(_, arg) => Some(*arg),
            _ => None,
        }
    }

    /// Stamps the action's data attributes onto a control.
    pub fn apply(&self, element: Element) -> Element {
        let element = element
            .attr(ACTION_ATTR, self.name())
            .attr(ITEM_ATTR, self.item().to_string());
        match self.arg() {
            Some(arg) => element.attr(ARG_ATTR, arg.to_string()),
            None => element,
        }
    }

    /// A control only drives the item whose article holds it, and never from
    /// inside rendered content, where post bodies may carry look-alike
    /// attributes.
    pub fn is_owned_by(&self, article_id: Option<&str>, inside_content: bool) -> bool {
        !inside_content && article_id == Some(item_dom_id(self.item()).as_str())
    }

    pub fn from_attributes(action: &str, item: &str, arg: Option<&str>) -> Option<FeedAction> {
        let item = ItemId(item.trim().parse().ok()?);
        let number = || arg.and_then(parse_int_prefix);
        Some(match action {
            "recommend" => FeedAction::ToggleRecommend(item),
            "comments" => FeedAction::ToggleComments(item),
            "comment-form" => FeedAction::ToggleCommentForm(item),
            "comment-submit" => FeedAction::SubmitComment(item),
            "comment-delete" => FeedAction::DeleteComment(item, number()?),
            "comment-page" => FeedAction::CommentPage(item, number()?),
            "post-menu" => FeedAction::TogglePostMenu(item),
            _ => return None,
        })
    }
}

pub trait Feed {
    /// Appends a rendered item to the feed. The item becomes the owner of the
    /// live access keys.
    fn append(&self, item: ItemId, element: Element);

    /// Replaces the contents of one slot of an item.
    fn fill(&self, item: ItemId, slot: Slot, nodes: Vec<Node>);

    fn set_hidden(&self, item: ItemId, slot: Slot, hidden: bool);

    fn set_attribute(&self, item: ItemId, slot: Slot, name: &str, value: &str);

    fn read_comment_draft(&self, item: ItemId) -> CommentDraft;

    fn reset_comment_draft(&self, item: ItemId);

    fn focus_comment_draft(&self, _item: ItemId) {}

    /// Empties the terminal transcript. Feed items are left alone.
    fn clear_transcript(&self);

    fn set_visibility(&self, visibility: Visibility);

    /// Real navigation, used when inline rendering is off.
    fn navigate(&self, href: &str);

    /// Blocking notice for input that was rejected before any request.
    fn alert(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_round_trip_through_attributes() {
        let actions = [
            FeedAction::ToggleRecommend(ItemId(1)),
            FeedAction::DeleteComment(ItemId(2), 77),
            FeedAction::CommentPage(ItemId(3), 4),
            FeedAction::TogglePostMenu(ItemId(5)),
        ];
        for action in actions {
            let element = action.apply(Element::new("button"));
            let parsed = FeedAction::from_attributes(
                element.get_attr(ACTION_ATTR).unwrap(),
                element.get_attr(ITEM_ATTR).unwrap(),
                element.get_attr(ARG_ATTR),
            );
            assert_eq!(parsed, Some(action));
        }
    }

    #[test]
    fn malformed_action_attributes_are_ignored() {
        assert_eq!(FeedAction::from_attributes("comments", "x", None), None);
        assert_eq!(FeedAction::from_attributes("comment-page", "1", None), None);
        assert_eq!(FeedAction::from_attributes("launch", "1", None), None);
    }

    #[test]
    fn controls_only_act_on_their_own_item() {
        let action = FeedAction::DeleteComment(ItemId(1), 40);
        assert!(action.is_owned_by(Some("scFeedItem1"), false));
        assert!(!action.is_owned_by(Some("scFeedItem1"), true));
        assert!(!action.is_owned_by(Some("scFeedItem2"), false));
        assert!(!action.is_owned_by(None, false));
    }

    #[test]
    fn slot_ids_are_scoped_to_their_item() {
        assert_eq!(slot_dom_id(ItemId(4), Slot::Recommend), "scFeedItem4-recommend");
        assert_ne!(
            slot_dom_id(ItemId(4), Slot::CommentsList),
            slot_dom_id(ItemId(5), Slot::CommentsList)
        );
    }
}
