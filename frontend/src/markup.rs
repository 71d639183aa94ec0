//! A small element tree the renderer builds feed items with. It serializes to
//! an HTML string for the DOM and to plain text for the console.

use crate::sanitize::SafeHtml;

/// Marks where a raw HTML fragment belongs in a detached render.
pub const FRAGMENT_ATTR: &str = "data-sc-fragment";

const VOID_ELEMENTS: [&str; 6] = ["br", "hr", "img", "input", "link", "meta"];
const BLOCK_ELEMENTS: [&str; 14] = [
    "article", "div", "fieldset", "form", "hr", "legend", "li", "ol", "p", "table", "tr", "ul",
    "thead", "tbody",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Html(SafeHtml),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<SafeHtml> for Node {
    fn from(html: SafeHtml) -> Self {
        Node::Html(html)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_owned())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl Node {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, None);
        out
    }

    fn write_html(&self, out: &mut String, fragments: Option<&mut Vec<SafeHtml>>) {
        match self {
            Node::Element(element) => element.write_html(out, fragments),
            Node::Text(text) => {
                html_escape::encode_text_to_string(text, out);
            }
            Node::Html(html) => match fragments {
                Some(fragments) => {
                    out.push_str(&format!("<span {}=\"{}\"></span>", FRAGMENT_ATTR, fragments.len()));
                    fragments.push(html.clone());
                }
                None => out.push_str(html.as_str()),
            },
        }
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Node::Element(element) => element.write_text(out),
            Node::Text(text) => out.push_str(text),
            Node::Html(html) => out.push_str(&strip_tags(html.as_str())),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Element {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn hidden(self, hidden: bool) -> Self {
        if hidden {
            self.attr("hidden", "")
        } else {
            self
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn html(mut self, html: SafeHtml) -> Self {
        self.children.push(Node::Html(html));
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Depth-first search over this element and its descendants.
    pub fn find<P>(&self, predicate: &P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        if predicate(self) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| child.find(predicate))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.find(&|element: &Element| element.get_attr("id") == Some(id))
    }

    pub fn find_all<'a, P>(&'a self, predicate: &P, found: &mut Vec<&'a Element>)
    where
        P: Fn(&Element) -> bool,
    {
        if predicate(self) {
            found.push(self);
        }
        for child in self.children.iter().filter_map(Node::as_element) {
            child.find_all(predicate, found);
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, None);
        out
    }

    /// Renders every raw HTML node as an empty placeholder carrying
    /// [`FRAGMENT_ATTR`] and returns the fragments in placeholder order.
    /// Parsed on their own, unbalanced tags in a fragment cannot close the
    /// elements around it.
    pub fn render_detached(&self) -> (String, Vec<SafeHtml>) {
        let mut out = String::new();
        let mut fragments = Vec::new();
        self.write_html(&mut out, Some(&mut fragments));
        (out, fragments)
    }

    fn write_html(&self, out: &mut String, mut fragments: Option<&mut Vec<SafeHtml>>) {
        out.push('<');
        out.push_str(self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if !value.is_empty() {
                out.push_str("=\"");
                html_escape::encode_double_quoted_attribute_to_string(value, out);
                out.push('"');
            }
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.tag) {
            return;
        }
        for child in &self.children {
            child.write_html(out, fragments.as_deref_mut());
        }
        out.push_str("</");
        out.push_str(self.tag);
        out.push('>');
    }

    /// Plain-text projection: hidden subtrees are skipped, block elements end
    /// a line and table cells are separated by ` | `.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        collapse_blank_lines(&out)
    }

    fn write_text(&self, out: &mut String) {
        if self.get_attr("hidden").is_some() {
            return;
        }
        match self.tag {
            "br" => out.push('\n'),
            "hr" => out.push_str("\n----\n"),
            "td" | "th" if !out.is_empty() && !out.ends_with('\n') => out.push_str(" | "),
            _ => {}
        }
        for child in &self.children {
            child.write_text(out);
        }
        if matches!(self.tag, "a" | "button") {
            out.push(' ');
        }
        if BLOCK_ELEMENTS.contains(&self.tag) && !out.ends_with('\n') {
            out.push('\n');
        }
    }
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    html_escape::decode_html_entities(&out).into_owned()
}

fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() && lines.last().map_or(true, |last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().map_or(false, |last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
