//! Prints the feed as plain text, one block per item.

use std::cell::RefCell;
use std::io::Write;

use log::{debug, warn};
use url::Url;

use sc_terminal_frontend::markup::{Element, Node};
use sc_terminal_frontend::{CommentDraft, Feed, ItemId, Slot, Visibility};

pub struct TextFeed<W> {
    out: RefCell<W>,
    origin: Url,
}

impl<W: Write> TextFeed<W> {
    pub fn new(out: W, origin: Url) -> Self {
        TextFeed {
            out: RefCell::new(out),
            origin,
        }
    }

    fn print(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        if let Err(err) = writeln!(out, "{}", text).and_then(|()| out.flush()) {
            warn!("could not write to the terminal: {}", err);
        }
    }
}

impl TextFeed<Vec<u8>> {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.out.borrow()).into_owned()
    }
}

fn slot_prefix(slot: Slot) -> Option<&'static str> {
    match slot {
        Slot::Recommend | Slot::CommentViewLink => Some("  "),
        Slot::CommentsList | Slot::ChatAnswer | Slot::ChatRelated => Some(""),
        Slot::CommentsPager => Some("  pages: "),
        Slot::ChatMeta => Some("  usage: "),
        Slot::CommentsView
        | Slot::CommentForm
        | Slot::CommentsDivider
        | Slot::PostMenu
        | Slot::PostMenuToggle => None,
    }
}

impl<W: Write> Feed for TextFeed<W> {
    fn append(&self, item: ItemId, element: Element) {
        self.print(&format!("#{}\n{}\n", item, element.text_content()));
    }

    fn fill(&self, item: ItemId, slot: Slot, nodes: Vec<Node>) {
        let prefix = match slot_prefix(slot) {
            Some(prefix) => prefix,
            None => return,
        };
        let text = Element::new("div").children(nodes).text_content();
        if !text.is_empty() {
            self.print(&format!("#{} {}{}", item, prefix, text));
        }
    }

    fn set_hidden(&self, item: ItemId, slot: Slot, hidden: bool) {
        debug!("item {} slot {:?} hidden={}", item, slot, hidden);
    }

    fn set_attribute(&self, _item: ItemId, _slot: Slot, _name: &str, _value: &str) {}

    // the console has no inline comment form
    fn read_comment_draft(&self, _item: ItemId) -> CommentDraft {
        CommentDraft::default()
    }

    fn reset_comment_draft(&self, _item: ItemId) {}

    fn clear_transcript(&self) {
        self.print("\x1b[2J\x1b[H");
    }

    fn set_visibility(&self, visibility: Visibility) {
        debug!("terminal {:?}", visibility);
    }

    fn navigate(&self, href: &str) {
        let target = self
            .origin
            .join(href)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_owned());
        self.print(&format!("-> {}", target));
    }

    fn alert(&self, message: &str) {
        self.print(&format!("! {}", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> TextFeed<Vec<u8>> {
        TextFeed::new(Vec::new(), Url::parse("http://localhost:8080").unwrap())
    }

    #[test]
    fn items_print_as_text() {
        let feed = feed();
        feed.append(
            ItemId(3),
            Element::new("article")
                .child(Element::new("div").text("[SYSTEM]"))
                .child(Element::new("div").text("<b>hi</b>")),
        );
        assert_eq!(feed.contents(), "#3\n[SYSTEM]\n<b>hi</b>\n\n");
    }

    #[test]
    fn navigation_prints_absolute_url() {
        let feed = feed();
        feed.navigate("/boards/funBoard?recentPage=2");
        assert_eq!(
            feed.contents(),
            "-> http://localhost:8080/boards/funBoard?recentPage=2\n"
        );
    }

    #[test]
    fn structural_slots_are_not_printed() {
        let feed = feed();
        feed.fill(ItemId(1), Slot::PostMenu, vec![Node::from("menu")]);
        feed.fill(ItemId(1), Slot::Recommend, vec![Node::from("추천(M): 2")]);
        assert_eq!(feed.contents(), "#1   추천(M): 2\n");
    }
}
