//! Classification of navigation targets into board-listing and read-post
//! routes. Everything here is a pure function of the href and the document
//! origin it is resolved against; unparseable input is simply "no match".

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Second path segments under `/boards/` that are endpoints, not boards.
pub const RESERVED_BOARD_NAMES: [&str; 2] = ["boardList", "showLatestPosts"];

const READ_POST: &str = "readPost";

/// Same unreserved set as `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRoute {
    pub board_title: String,
    pub recent_page: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRoute {
    pub board_title: String,
    pub post_num: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Post(PostRoute),
    Board(BoardRoute),
}

impl Route {
    /// Canonical href for the route, as the server would link it.
    pub fn href(&self) -> String {
        match self {
            Route::Post(post) => post_href(&post.board_title, post.post_num),
            Route::Board(board) => board_href(&board.board_title, board.recent_page),
        }
    }
}

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

pub fn post_href(board_title: &str, post_num: i64) -> String {
    format!(
        "/boards/{}/readPost?postNum={}",
        encode_component(board_title),
        post_num
    )
}

pub fn board_href(board_title: &str, recent_page: Option<i64>) -> String {
    match recent_page.filter(|page| *page != 0) {
        Some(page) => format!(
            "/boards/{}?recentPage={}",
            encode_component(board_title),
            page
        ),
        None => format!("/boards/{}", encode_component(board_title)),
    }
}

/// Resolves an absolute or relative href against the document origin.
pub fn resolve(href: &str, origin: &Url) -> Option<Url> {
    origin.join(href).ok()
}

/// Non-empty, percent-decoded path segments.
fn segments(url: &Url) -> Vec<String> {
    url.path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .collect()
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

/// Integer prefix parsing with the leniency of a browser `parseInt(.., 10)`:
/// leading whitespace and trailing garbage are ignored, no digits is `None`.
pub fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

fn board_segments(url: &Url) -> Option<String> {
    let parts = segments(url);
    match parts.as_slice() {
        [root, board_title]
            if root == "boards"
                && !board_title.is_empty()
                && !RESERVED_BOARD_NAMES.contains(&board_title.as_str()) =>
        {
            Some(board_title.clone())
        }
        _ => None,
    }
}

fn post_segments(url: &Url) -> Option<String> {
    let parts = segments(url);
    match parts.as_slice() {
        [root, board_title, action, ..] if root == "boards" && action == READ_POST => {
            Some(board_title.clone())
        }
        _ => None,
    }
}

pub fn is_board_url(href: &str, origin: &Url) -> bool {
    resolve(href, origin)
        .and_then(|url| board_segments(&url))
        .is_some()
}

pub fn parse_board_url(href: &str, origin: &Url) -> Option<BoardRoute> {
    let url = resolve(href, origin)?;
    let board_title = board_segments(&url)?;
    let recent_page = query_value(&url, "recentPage").and_then(|page| parse_int_prefix(&page));
    Some(BoardRoute {
        board_title,
        recent_page,
    })
}

/// True when the path is a read-post page and a `postNum` parameter is
/// present, whether or not it holds a number.
pub fn is_post_url(href: &str, origin: &Url) -> bool {
    resolve(href, origin)
        .filter(|url| post_segments(url).is_some())
        .map(|url| url.query_pairs().any(|(name, _)| name == "postNum"))
        .unwrap_or(false)
}

pub fn parse_post_url(href: &str, origin: &Url) -> Option<PostRoute> {
    let url = resolve(href, origin)?;
    let board_title = post_segments(&url)?;
    let post_num = parse_int_prefix(&query_value(&url, "postNum")?)?;
    Some(PostRoute {
        board_title,
        post_num,
    })
}

/// Read-post routes win over board routes; they cannot both match anyway.
pub fn classify(href: &str, origin: &Url) -> Option<Route> {
    if let Some(post) = parse_post_url(href, origin) {
        return Some(Route::Post(post));
    }
    parse_board_url(href, origin).map(Route::Board)
}
