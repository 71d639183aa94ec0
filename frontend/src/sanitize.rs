//! HTML sanitization for server-authored rich content.
//!
//! Post bodies are rich HTML from the server and are inserted as markup,
//! not text. The contract is removal, not escaping: every `<script>` and
//! `<style>` element is dropped together with its contents, and everything
//! else is passed through unchanged. Stray `</script>`/`</style>` end tags are
//! dropped as well. An element left open runs to the end of the input, the
//! same way a browser's parser treats it.
//!
//! [`SafeHtml`] is the only way to put raw markup into a rendered tree, so
//! anything that reaches the DOM as HTML has gone through this module.

use std::fmt;

const STRIPPED_ELEMENTS: [&str; 2] = ["script", "style"];

/// Markup that is either sanitized or built entirely from escaped text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Escapes plain text. Both real line breaks and literal `\n` sequences
    /// (which the assistant endpoint sometimes emits) become `<br>`.
    pub fn from_text_with_breaks(text: &str) -> SafeHtml {
        let escaped = escape_html(text);
        SafeHtml(escaped.replace("\\n", "<br>").replace('\n', "<br>"))
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

struct Tag {
    name: String,
    closing: bool,
    end: usize,
}

fn is_tag_name_end(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' ' | b'/' | b'>')
}

/// Tokenizes the tag starting at `start` (which holds `<`). Attribute values
/// are honoured, so a `>` inside a quoted value does not end the tag.
fn tag_at(raw: &str, start: usize) -> Option<Tag> {
    let bytes = raw.as_bytes();
    let mut pos = start + 1;
    let closing = bytes.get(pos) == Some(&b'/');
    if closing {
        pos += 1;
    }
    if !bytes.get(pos)?.is_ascii_alphabetic() {
        return None;
    }
    let name_start = pos;
    while pos < bytes.len() && !is_tag_name_end(bytes[pos]) {
        pos += 1;
    }
    let name = raw[name_start..pos].to_ascii_lowercase();

    let mut quote: Option<u8> = None;
    let mut after_equals = false;
    while pos < bytes.len() {
        let b = bytes[pos];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'>' => {
                    return Some(Tag {
                        name,
                        closing,
                        end: pos + 1,
                    })
                }
                b'"' | b'\'' if after_equals => quote = Some(b),
                b'=' => after_equals = true,
                b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' => {}
                _ => after_equals = false,
            },
        }
        pos += 1;
    }
    Some(Tag {
        name,
        closing,
        end: bytes.len(),
    })
}

/// Returns the offset just past the end tag closing a raw-text element whose
/// content starts at `from`, or the input length if it is never closed.
fn skip_raw_text(raw: &str, lower: &str, from: usize, name: &str) -> usize {
    let needle = format!("</{}", name);
    let bytes = raw.as_bytes();
    let mut search = from;
    while let Some(found) = lower[search..].find(&needle) {
        let after = search + found + needle.len();
        match bytes.get(after) {
            None => return raw.len(),
            Some(&b) if is_tag_name_end(b) => {
                return tag_at(raw, search + found).map_or(raw.len(), |tag| tag.end);
            }
            Some(_) => search = after,
        }
    }
    raw.len()
}

/// Returns the offset just past the comment whose body starts at `from`.
/// `<!-->` and `<!--->` are complete empty comments, and `--!>` closes a
/// comment just like `-->`.
fn comment_end(raw: &str, from: usize) -> usize {
    let rest = &raw[from..];
    if rest.starts_with('>') {
        return from + 1;
    }
    if rest.starts_with("->") {
        return from + 2;
    }
    let closers = [("-->", 3), ("--!>", 4)];
    closers
        .iter()
        .filter_map(|(closer, len)| rest.find(closer).map(|at| at + len))
        .min()
        .map_or(raw.len(), |end| from + end)
}

pub fn sanitize_html(raw: &str) -> SafeHtml {
    let lower = raw.to_ascii_lowercase();
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut copied_to = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        if lower[pos..].starts_with("<!--") {
            pos = comment_end(raw, pos + 4);
            continue;
        }
        match tag_at(raw, pos) {
            Some(tag) if STRIPPED_ELEMENTS.contains(&tag.name.as_str()) => {
                out.push_str(&raw[copied_to..pos]);
                pos = if tag.closing {
                    tag.end
                } else {
                    skip_raw_text(raw, &lower, tag.end, &tag.name)
                };
                copied_to = pos;
            }
            Some(tag) => pos = tag.end,
            None => pos += 1,
        }
    }
    out.push_str(&raw[copied_to..]);
    SafeHtml(out)
}
