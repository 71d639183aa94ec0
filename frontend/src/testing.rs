//! Scripted transport and recording feed shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use url::Url;

use crate::error::TransportError;
use crate::feed::{CommentDraft, Feed, ItemId, Slot, Visibility};
use crate::gateway::Gateway;
use crate::markup::{Element, Node};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

pub use futures::executor::block_on;

pub const ORIGIN: &str = "https://sc1hub.example";

pub fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

#[derive(Default)]
struct Script {
    routes: RefCell<HashMap<(Method, String), VecDeque<HttpResponse>>>,
    requests: RefCell<Vec<HttpRequest>>,
    gate: RefCell<Option<Shared<oneshot::Receiver<()>>>>,
}

/// Answers requests from per-route queues. The last response queued for a
/// route keeps being served; an unscripted route is a transport failure.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Rc<Script>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    pub fn respond(&self, method: Method, target: &str, status: u16, body: &str) {
        self.script
            .routes
            .borrow_mut()
            .entry((method, target.to_owned()))
            .or_default()
            .push_back(HttpResponse::new(status, body));
    }

    /// Holds every request until the returned sender fires.
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.script.gate.borrow_mut() = Some(rx.shared());
        tx
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.requests.borrow().clone()
    }

    pub fn targets(&self) -> Vec<String> {
        self.script
            .requests
            .borrow()
            .iter()
            .map(|request| format!("{} {}", request.method.as_str(), request.target()))
            .collect()
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = (request.method, request.target());
        self.script.requests.borrow_mut().push(request);

        let gate = self.script.gate.borrow().clone();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let mut routes = self.script.routes.borrow_mut();
        let queue = routes
            .get_mut(&key)
            .ok_or_else(|| TransportError::Request(format!("no route for {} {}", key.0.as_str(), key.1)))?;
        match queue.len() {
            0 => Err(TransportError::Request("empty route".into())),
            1 => Ok(queue[0].clone()),
            _ => Ok(queue.pop_front().unwrap()),
        }
    }
}

pub fn gateway(transport: &MockTransport) -> Gateway<MockTransport> {
    Gateway::new(transport.clone(), origin())
}

/// Keeps appended items as element trees and applies slot updates to a
/// flat map so tests can inspect what the user would see.
#[derive(Default)]
pub struct RecordingFeed {
    pub items: RefCell<Vec<(ItemId, Element)>>,
    pub slots: RefCell<HashMap<(ItemId, Slot), Vec<Node>>>,
    pub hidden: RefCell<HashMap<(ItemId, Slot), bool>>,
    pub attributes: RefCell<HashMap<(ItemId, Slot, String), String>>,
    pub drafts: RefCell<HashMap<ItemId, CommentDraft>>,
    pub alerts: RefCell<Vec<String>>,
    pub navigations: RefCell<Vec<String>>,
    pub visibility: Cell<Option<Visibility>>,
    pub transcript_clears: Cell<usize>,
}

impl RecordingFeed {
    pub fn item(&self, item: ItemId) -> Element {
        self.items
            .borrow()
            .iter()
            .find(|(id, _)| *id == item)
            .map(|(_, element)| element.clone())
            .unwrap()
    }

    pub fn last_item(&self) -> (ItemId, Element) {
        self.items.borrow().last().cloned().unwrap()
    }

    pub fn slot_html(&self, item: ItemId, slot: Slot) -> String {
        self.slots
            .borrow()
            .get(&(item, slot))
            .map(|nodes| nodes.iter().map(Node::render).collect())
            .unwrap_or_default()
    }

    pub fn slot_text(&self, item: ItemId, slot: Slot) -> String {
        let nodes = self.slots.borrow().get(&(item, slot)).cloned().unwrap_or_default();
        Element::new("div").children(nodes).text_content()
    }

    pub fn is_hidden(&self, item: ItemId, slot: Slot) -> Option<bool> {
        self.hidden.borrow().get(&(item, slot)).copied()
    }

    pub fn set_draft(&self, item: ItemId, content: &str, nickname: &str, password: &str) {
        self.drafts.borrow_mut().insert(
            item,
            CommentDraft {
                content: content.into(),
                nickname: nickname.into(),
                password: password.into(),
            },
        );
    }

    pub fn system_messages(&self) -> Vec<String> {
        self.items
            .borrow()
            .iter()
            .filter(|(_, element)| {
                element
                    .get_attr("class")
                    .map_or(false, |class| class.contains("sc-feed__system-item"))
            })
            .map(|(_, element)| element.text_content())
            .collect()
    }
}

impl Feed for RecordingFeed {
    fn append(&self, item: ItemId, element: Element) {
        self.items.borrow_mut().push((item, element));
    }

    fn fill(&self, item: ItemId, slot: Slot, nodes: Vec<Node>) {
        self.slots.borrow_mut().insert((item, slot), nodes);
    }

    fn set_hidden(&self, item: ItemId, slot: Slot, hidden: bool) {
        self.hidden.borrow_mut().insert((item, slot), hidden);
    }

    fn set_attribute(&self, item: ItemId, slot: Slot, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert((item, slot, name.to_owned()), value.to_owned());
    }

    fn read_comment_draft(&self, item: ItemId) -> CommentDraft {
        self.drafts.borrow().get(&item).cloned().unwrap_or_default()
    }

    fn reset_comment_draft(&self, item: ItemId) {
        self.drafts.borrow_mut().remove(&item);
    }

    fn clear_transcript(&self) {
        self.transcript_clears.set(self.transcript_clears.get() + 1);
    }

    fn set_visibility(&self, visibility: Visibility) {
        self.visibility.set(Some(visibility));
    }

    fn navigate(&self, href: &str) {
        self.navigations.borrow_mut().push(href.to_owned());
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_owned());
    }
}
