//! Browser glue: `fetch` transport, the DOM-backed feed, document listeners
//! and the `window.scTerminal` handle.

use std::rc::Rc;

use async_trait::async_trait;
use log::{debug, info, warn, Level, LevelFilter, Log, Metadata, Record};
use url::Url;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local, JsFuture};
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlTextAreaElement, KeyboardEvent, MouseEvent, Request, RequestInit, Response, Window,
};

use crate::command::Command;
use crate::config::TerminalConfig;
use crate::controller::Controller;
use crate::editor::EditorConfig;
use crate::error::TransportError;
use crate::feed::{
    item_dom_id, slot_dom_id, CommentDraft, Feed, FeedAction, ItemId, Slot, Visibility,
    ACTION_ATTR, ARG_ATTR, ITEM_ATTR,
};
use crate::gateway::Gateway;
use crate::interceptor::{intercept, AnchorFacts, ClickFacts};
use crate::markup::{Element as Markup, Node, FRAGMENT_ATTR};
use crate::render::{ACCESS_KEY_ATTR, BYPASS_ATTR, CONFIRM_ATTR, FIELD_ATTR};
use crate::route::{is_board_url, is_post_url, parse_board_url, parse_post_url};
use crate::sanitize::SafeHtml;
use crate::session::MemberMeta;
use crate::transport::{HttpRequest, HttpResponse, Transport};

const ROOT_ID: &str = "scTerminal";
const OUTPUT_ID: &str = "scTerminalOutput";
const INPUT_ID: &str = "scTerminalInput";
const MEMBER_META_ID: &str = "scMemberMeta";
const FEED_ID: &str = "scFeed";
const FEED_LIST_ID: &str = "scFeedList";
const COLLAPSED_CLASS: &str = "is-collapsed";
const CONTENT_SELECTOR: &str = ".sc-feed__content";
const NARROW_VIEWPORT: &str = "(max-width: 768px)";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(contents: &str);
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            console_log(&format!("[sc-terminal] {} {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn js_message(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

pub struct FetchTransport;

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let window =
            web_sys::window().ok_or_else(|| TransportError::Request("no window".into()))?;

        let init = RequestInit::new();
        init.set_method(request.method.as_str());
        if let Some(body) = &request.body {
            init.set_body(&JsValue::from_str(body));
        }
        let fetch_request = Request::new_with_str_and_init(request.url.as_str(), &init)
            .map_err(|err| TransportError::Request(js_message(err)))?;
        let headers = fetch_request.headers();
        headers
            .set("Accept", "application/json")
            .map_err(|err| TransportError::Request(js_message(err)))?;
        if request.body.is_some() {
            headers
                .set("Content-Type", "application/json")
                .map_err(|err| TransportError::Request(js_message(err)))?;
        }

        let value = JsFuture::from(window.fetch_with_request(&fetch_request))
            .await
            .map_err(|err| TransportError::Request(js_message(err)))?;
        let response: Response = value
            .dyn_into()
            .map_err(|err| TransportError::Request(js_message(err)))?;
        let text = response
            .text()
            .map_err(|err| TransportError::Body(js_message(err)))?;
        let body = JsFuture::from(text)
            .await
            .map_err(|err| TransportError::Body(js_message(err)))?;

        Ok(HttpResponse::new(
            response.status(),
            body.as_string().unwrap_or_default(),
        ))
    }
}

/// The feed as it lives in the host page: feed items go to `#scFeedList`
/// (created inside the page body row when missing), terminal output to
/// `#scTerminalOutput`.
pub struct DomFeed {
    window: Window,
    document: Document,
    terminal: Element,
    output: Element,
    suppress_focus: bool,
}

impl DomFeed {
    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn slot(&self, item: ItemId, slot: Slot) -> Option<Element> {
        let element = self.by_id(&slot_dom_id(item, slot));
        if element.is_none() {
            debug!("slot {:?} of item {} is not in the document", slot, item);
        }
        element
    }

    fn feed_list(&self) -> Element {
        if let Some(list) = self.by_id(FEED_LIST_ID) {
            return list;
        }
        let row = self
            .document
            .query_selector(".section-inner .sc-row, .section-inner .row")
            .ok()
            .flatten();
        let row = match row {
            Some(row) => row,
            None => return self.output.clone(),
        };
        match self.create_feed(&row) {
            Ok(list) => list,
            Err(err) => {
                warn!("feed list could not be created: {}", js_message(err));
                self.output.clone()
            }
        }
    }

    fn create_feed(&self, row: &Element) -> Result<Element, JsValue> {
        let feed = self.document.create_element("div")?;
        feed.set_id(FEED_ID);
        let column = if row.class_list().contains("sc-row") {
            "sc-col-12 sc-feed"
        } else {
            "col-sm-12 sc-feed"
        };
        feed.set_class_name(column);
        let list = self.document.create_element("div")?;
        list.set_id(FEED_LIST_ID);
        list.set_class_name("sc-feed__list");
        feed.append_child(&list)?;
        row.append_child(&feed)?;
        Ok(list)
    }

    /// Only the newest item keeps live access keys. Keys the host page set
    /// on its own elements are left alone.
    fn activate_access_keys(&self, item: ItemId) {
        let stale = format!("[{}][accesskey]", ACCESS_KEY_ATTR);
        if let Ok(live) = self.document.query_selector_all(&stale) {
            for index in 0..live.length() {
                if let Some(element) = live.item(index).and_then(|node| node.dyn_into::<Element>().ok()) {
                    let _ = element.remove_attribute("accesskey");
                }
            }
        }
        let owner = match self.by_id(&item_dom_id(item)) {
            Some(owner) => owner,
            None => return,
        };
        let selector = format!("[{}]", ACCESS_KEY_ATTR);
        if let Ok(candidates) = owner.query_selector_all(&selector) {
            for index in 0..candidates.length() {
                let element = candidates
                    .item(index)
                    .and_then(|node| node.dyn_into::<Element>().ok());
                if let Some(element) = element {
                    if let Some(key) = element.get_attribute(ACCESS_KEY_ATTR).filter(|key| !key.is_empty()) {
                        let _ = element.set_attribute("accesskey", &key);
                    }
                }
            }
        }
    }

    /// Swaps each placeholder of a freshly inserted item for its fragment.
    /// Placeholders are collected before any fragment lands so look-alikes
    /// inside a fragment are never matched.
    fn insert_fragments(&self, item: ItemId, fragments: &[SafeHtml]) {
        if fragments.is_empty() {
            return;
        }
        let owner = match self.by_id(&item_dom_id(item)) {
            Some(owner) => owner,
            None => return,
        };
        let placeholders = match owner.query_selector_all(&format!("[{}]", FRAGMENT_ATTR)) {
            Ok(placeholders) => placeholders,
            Err(err) => {
                warn!("fragments of item {} not found: {}", item, js_message(err));
                return;
            }
        };
        let placeholders: Vec<Element> = (0..placeholders.length())
            .filter_map(|index| placeholders.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect();
        for placeholder in placeholders {
            let fragment = placeholder
                .get_attribute(FRAGMENT_ATTR)
                .and_then(|index| index.parse::<usize>().ok())
                .and_then(|index| fragments.get(index));
            match fragment {
                Some(fragment) => placeholder.set_outer_html(fragment.as_str()),
                None => placeholder.remove(),
            }
        }
    }

    fn field(&self, item: ItemId, name: &str) -> Option<Element> {
        let form = self.slot(item, Slot::CommentForm)?;
        form.query_selector(&format!("[{}=\"{}\"]", FIELD_ATTR, name))
            .ok()
            .flatten()
    }

    fn field_value(&self, item: ItemId, name: &str) -> String {
        match self.field(item, name) {
            Some(field) => {
                if let Some(area) = field.dyn_ref::<HtmlTextAreaElement>() {
                    area.value()
                } else if let Some(input) = field.dyn_ref::<HtmlInputElement>() {
                    input.value()
                } else {
                    String::new()
                }
            }
            None => String::new(),
        }
    }

    fn clear_field(&self, item: ItemId, name: &str) {
        if let Some(field) = self.field(item, name) {
            if let Some(area) = field.dyn_ref::<HtmlTextAreaElement>() {
                area.set_value("");
            } else if let Some(input) = field.dyn_ref::<HtmlInputElement>() {
                input.set_value("");
            }
        }
    }
}

impl Feed for DomFeed {
    fn append(&self, item: ItemId, element: Markup) {
        let list = self.feed_list();
        let (frame, fragments) = element.render_detached();
        if let Err(err) = list.insert_adjacent_html("beforeend", &frame) {
            warn!("feed item {} could not be inserted: {}", item, js_message(err));
            return;
        }
        self.insert_fragments(item, &fragments);
        self.activate_access_keys(item);
        self.terminal.scroll_into_view_with_bool(false);
    }

    fn fill(&self, item: ItemId, slot: Slot, nodes: Vec<Node>) {
        if let Some(element) = self.slot(item, slot) {
            let html: String = nodes.iter().map(Node::render).collect();
            element.set_inner_html(&html);
        }
    }

    fn set_hidden(&self, item: ItemId, slot: Slot, hidden: bool) {
        if let Some(element) = self.slot(item, slot) {
            if let Some(element) = element.dyn_ref::<HtmlElement>() {
                element.set_hidden(hidden);
            }
        }
    }

    fn set_attribute(&self, item: ItemId, slot: Slot, name: &str, value: &str) {
        if let Some(element) = self.slot(item, slot) {
            let _ = element.set_attribute(name, value);
        }
    }

    fn read_comment_draft(&self, item: ItemId) -> CommentDraft {
        CommentDraft {
            content: self.field_value(item, "content"),
            nickname: self.field_value(item, "nickname"),
            password: self.field_value(item, "password"),
        }
    }

    fn reset_comment_draft(&self, item: ItemId) {
        for name in ["content", "nickname", "password"] {
            self.clear_field(item, name);
        }
    }

    fn focus_comment_draft(&self, item: ItemId) {
        if self.suppress_focus {
            return;
        }
        if let Some(field) = self.field(item, "content") {
            if let Some(field) = field.dyn_ref::<HtmlElement>() {
                let _ = field.focus();
            }
        }
    }

    fn clear_transcript(&self) {
        self.output.set_inner_html("");
    }

    fn set_visibility(&self, visibility: Visibility) {
        let classes = self.terminal.class_list();
        let result = match visibility {
            Visibility::Open => classes.remove_1(COLLAPSED_CLASS),
            Visibility::Collapsed => classes.add_1(COLLAPSED_CLASS),
        };
        if let Err(err) = result {
            warn!("terminal visibility unchanged: {}", js_message(err));
        }
    }

    fn navigate(&self, href: &str) {
        info!("navigating to {}", href);
        if let Err(err) = self.window.location().set_href(href) {
            warn!("navigation to {} failed: {}", href, js_message(err));
        }
    }

    fn alert(&self, message: &str) {
        let _ = self.window.alert_with_message(message);
    }
}

type WebController = Controller<FetchTransport, DomFeed>;

/// The object published as `window.scTerminal` for host-page wiring.
#[wasm_bindgen]
pub struct ScTerminal {
    controller: Rc<WebController>,
}

#[wasm_bindgen]
impl ScTerminal {
    #[wasm_bindgen(js_name = isPostUrl)]
    pub fn is_post_url(&self, url: &str) -> bool {
        is_post_url(url, self.controller.origin())
    }

    #[wasm_bindgen(js_name = isBoardUrl)]
    pub fn is_board_url(&self, url: &str) -> bool {
        is_board_url(url, self.controller.origin())
    }

    #[wasm_bindgen(js_name = openPostFromUrl)]
    pub fn open_post_from_url(&self, url: &str) -> bool {
        match parse_post_url(url, self.controller.origin()) {
            Some(route) => {
                let controller = self.controller.clone();
                spawn_local(async move {
                    controller
                        .open_post(&route.board_title, route.post_num)
                        .await
                });
                true
            }
            None => false,
        }
    }

    #[wasm_bindgen(js_name = openBoardFromUrl)]
    pub fn open_board_from_url(&self, url: &str) -> bool {
        match parse_board_url(url, self.controller.origin()) {
            Some(route) => {
                let controller = self.controller.clone();
                spawn_local(async move {
                    controller
                        .open_board(&route.board_title, route.recent_page)
                        .await
                });
                true
            }
            None => false,
        }
    }

    #[wasm_bindgen(js_name = runCommand)]
    pub fn run_command(&self, raw: &str) -> bool {
        run_command(&self.controller, raw)
    }

    pub fn ask(&self, question: String) -> js_sys::Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            controller.ask(&question).await;
            Ok(JsValue::UNDEFINED)
        })
    }
}

/// Parses synchronously so the caller learns at once whether the line was a
/// command; the command itself runs in the background.
fn run_command(controller: &Rc<WebController>, raw: &str) -> bool {
    match Command::parse(raw, controller.origin()) {
        Some(command) => {
            let controller = controller.clone();
            spawn_local(async move { controller.execute(command).await });
            true
        }
        None => false,
    }
}

fn click_facts(event: &MouseEvent) -> ClickFacts {
    ClickFacts {
        default_prevented: event.default_prevented(),
        trusted: event.is_trusted(),
        button: event.button(),
        modifier_held: event.meta_key() || event.ctrl_key() || event.shift_key() || event.alt_key(),
    }
}

fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn listen_for_links(document: &Document, controller: &Rc<WebController>) -> Result<(), JsValue> {
    let base = document.url()?;
    let controller = controller.clone();
    let onclick = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        let anchor = match target_element(&event).and_then(|target| target.closest("a[href]").ok().flatten()) {
            Some(anchor) => anchor,
            None => return,
        };
        let raw_href = anchor.get_attribute("href").unwrap_or_default();
        let href = Url::parse(&base)
            .and_then(|base| base.join(&raw_href))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| raw_href.clone());
        let target = anchor.get_attribute("target");
        let facts = AnchorFacts {
            raw_href: &raw_href,
            href: &href,
            bypass: anchor.has_attribute(BYPASS_ATTR),
            target: target.as_deref(),
        };
        if let Some(route) = intercept(&click_facts(&event), Some(&facts), controller.origin()) {
            event.prevent_default();
            debug!("intercepted {}", href);
            let controller = controller.clone();
            spawn_local(async move { controller.open_route(&route).await });
        }
    });
    document.add_event_listener_with_callback_and_bool(
        "click",
        onclick.as_ref().unchecked_ref(),
        true,
    )?;
    onclick.forget();
    Ok(())
}

/// The action a feed control triggers, if the control is one the feed
/// rendered for that item.
fn control_action(control: &Element) -> Option<FeedAction> {
    let action = FeedAction::from_attributes(
        &control.get_attribute(ACTION_ATTR)?,
        &control.get_attribute(ITEM_ATTR)?,
        control.get_attribute(ARG_ATTR).as_deref(),
    )?;
    let article = control.closest("article").ok().flatten();
    let inside_content = control.closest(CONTENT_SELECTOR).ok().flatten().is_some();
    if action.is_owned_by(article.map(|article| article.id()).as_deref(), inside_content) {
        Some(action)
    } else {
        debug!("ignored {} control outside its item", action.name());
        None
    }
}

fn listen_for_actions(document: &Document, controller: &Rc<WebController>) -> Result<(), JsValue> {
    let controller = controller.clone();
    let selector = format!("[{}]", ACTION_ATTR);
    let onclick = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
        let control = match target_element(&event).and_then(|target| target.closest(&selector).ok().flatten()) {
            Some(control) => control,
            None => return,
        };
        if let Some(action) = control_action(&control) {
            event.prevent_default();
            let controller = controller.clone();
            spawn_local(async move { controller.handle(action).await });
        }
    });
    document.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();
    Ok(())
}

fn listen_for_confirmations(document: &Document, window: &Window) -> Result<(), JsValue> {
    let window = window.clone();
    let onsubmit = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let form = match event.target().and_then(|target| target.dyn_into::<HtmlFormElement>().ok()) {
            Some(form) => form,
            None => return,
        };
        if let Some(message) = form.get_attribute(CONFIRM_ATTR) {
            if !window.confirm_with_message(&message).unwrap_or(false) {
                event.prevent_default();
            }
        }
    });
    document.add_event_listener_with_callback_and_bool(
        "submit",
        onsubmit.as_ref().unchecked_ref(),
        true,
    )?;
    onsubmit.forget();
    Ok(())
}

fn listen_for_input(input: &HtmlInputElement, controller: &Rc<WebController>) -> Result<(), JsValue> {
    let controller = controller.clone();
    let field = input.clone();
    let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
        if event.key() != "Enter" || event.is_composing() {
            return;
        }
        event.prevent_default();
        let value = field.value();
        if value.trim().is_empty() {
            return;
        }
        field.set_value("");
        if !run_command(&controller, &value) {
            controller.system_message(&format!(
                "알 수 없는 명령어입니다: {} (help 입력)",
                value.trim()
            ));
        }
    });
    input.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
    onkeydown.forget();
    Ok(())
}

fn is_narrow_viewport(window: &Window) -> bool {
    window
        .match_media(NARROW_VIEWPORT)
        .ok()
        .flatten()
        .map_or(false, |query| query.matches())
}

fn start(window: Window, document: Document) -> Result<(), JsValue> {
    let terminal = match document.get_element_by_id(ROOT_ID) {
        Some(terminal) => terminal,
        None => {
            info!("no #{} on this page", ROOT_ID);
            return Ok(());
        }
    };
    let output = match document.get_element_by_id(OUTPUT_ID) {
        Some(output) => output,
        None => {
            warn!("#{} is missing, terminal disabled", OUTPUT_ID);
            return Ok(());
        }
    };

    let origin = Url::parse(&window.location().origin()?)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    let member = document
        .get_element_by_id(MEMBER_META_ID)
        .map(|meta| MemberMeta::from_attributes(|name| meta.get_attribute(name)))
        .unwrap_or_else(MemberMeta::anonymous);
    let narrow = is_narrow_viewport(&window);
    let config = TerminalConfig::from_attributes(|name| terminal.get_attribute(name), narrow);
    let initial = if terminal.class_list().contains(COLLAPSED_CLASS) {
        Visibility::Collapsed
    } else {
        Visibility::Open
    };
    info!(
        "terminal ready (member: {}, inline feed: {})",
        if member.logged_in { member.nickname.as_str() } else { "visitor" },
        config.inline_feed
    );

    let inline_feed = config.inline_feed;
    let feed = DomFeed {
        window: window.clone(),
        document: document.clone(),
        terminal,
        output,
        suppress_focus: narrow,
    };
    let controller = Rc::new(Controller::new(
        Gateway::new(FetchTransport, origin),
        feed,
        member,
        config,
        initial,
    ));

    if inline_feed {
        listen_for_links(&document, &controller)?;
    }
    listen_for_actions(&document, &controller)?;
    listen_for_confirmations(&document, &window)?;
    if let Some(input) = document
        .get_element_by_id(INPUT_ID)
        .and_then(|input| input.dyn_into::<HtmlInputElement>().ok())
    {
        listen_for_input(&input, &controller)?;
    }

    let handle = ScTerminal { controller };
    js_sys::Reflect::set(&window, &JsValue::from_str("scTerminal"), &JsValue::from(handle))?;
    Ok(())
}

#[wasm_bindgen]
pub fn bootstrap() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }

    let window = match web_sys::window() {
        Some(window) => window,
        None => return,
    };
    let document = match window.document() {
        Some(document) => document,
        None => return,
    };
    if let Err(err) = start(window, document) {
        warn!("terminal failed to start: {}", js_message(err));
    }
}

/// The CKEditor options object for the post editor.
#[wasm_bindgen(js_name = editorConfig)]
pub fn editor_config() -> Result<JsValue, JsValue> {
    let json = EditorConfig::default()
        .to_json()
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    js_sys::JSON::parse(&json)
}
