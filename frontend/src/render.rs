//! Builders for every kind of feed item. Nothing here touches the network or
//! the DOM; the controller decides when to append or refill what is built.

use crate::feed::{item_dom_id, slot_dom_id, FeedAction, ItemId, Slot};
use crate::markup::{Element, Node};
use crate::models::{BoardPage, Comment, Page, Post};
use crate::route::{board_href, encode_component, post_href};
use crate::sanitize::{sanitize_html, SafeHtml};
use crate::session::MemberMeta;

pub const BYPASS_ATTR: &str = "data-sc-terminal-bypass";
pub const ACCESS_KEY_ATTR: &str = "data-sc-accesskey";
pub const CONFIRM_ATTR: &str = "data-sc-confirm";
pub const FIELD_ATTR: &str = "data-sc-field";

const ACTION_CLASS: &str = "pull btn btn-right cancel-btn";
const PENDING_ANSWER: &str = "답변 생성 중...";

/// Counters shown on a post's controls. Always the latest values the gateway
/// reported, never locally incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostCounters {
    pub recommend_count: i64,
    pub recommended: bool,
    pub comment_count: i64,
}

pub struct PostView<'a> {
    pub item: ItemId,
    pub board_title: &'a str,
    pub board_display_name: &'a str,
    pub post: &'a Post,
    pub member: &'a MemberMeta,
    pub compact: bool,
}

pub fn divider() -> Element {
    Element::new("hr").class("sc-divider")
}

fn with_access_key(element: Element, access_key: Option<&str>) -> Element {
    match access_key {
        Some(key) => element.attr(ACCESS_KEY_ATTR, key),
        None => element,
    }
}

fn action_link(label: &str, href: &str, access_key: Option<&str>) -> Element {
    with_access_key(
        Element::new("a").class(ACTION_CLASS).attr("href", href),
        access_key,
    )
    .text(label)
}

/// An in-item control. It is an anchor for styling and access keys, but the
/// click interceptor must never treat it as navigation.
fn inline_action(label: &str, access_key: Option<&str>, action: FeedAction) -> Element {
    let element = with_access_key(
        Element::new("a")
            .class(ACTION_CLASS)
            .attr("href", "#")
            .attr("role", "button")
            .attr(BYPASS_ATTR, "1"),
        access_key,
    );
    action.apply(element).text(label)
}

pub fn recommend_label(counters: &PostCounters, compact: bool) -> String {
    match (compact, counters.recommended) {
        (true, true) => format!("취소({})", counters.recommend_count),
        (true, false) => format!("추천({})", counters.recommend_count),
        (false, true) => format!("추천취소(M): {}", counters.recommend_count),
        (false, false) => format!("추천(M): {}", counters.recommend_count),
    }
}

pub fn comment_view_label(comment_count: i64, compact: bool) -> String {
    if compact {
        format!("댓글({})", comment_count)
    } else {
        format!("댓글보기(O): {}", comment_count)
    }
}

pub fn system_item(item: ItemId, message: &str) -> Element {
    Element::new("article")
        .id(item_dom_id(item))
        .class("sc-feed__item sc-feed__system-item")
        .child(Element::new("div").class("sc-feed__title").text("[SYSTEM]"))
        .child(
            Element::new("div")
                .class("sc-feed__content sc-feed__system-message")
                .text(message),
        )
}

fn comment_form(item: ItemId, member: &MemberMeta) -> Element {
    let author = Element::new("div").class("sc-feed__comment-author");
    let author = if member.logged_in {
        author.text(format!("작성자 : {}", member.nickname))
    } else {
        author
            .child(
                Element::new("input")
                    .attr("type", "text")
                    .attr("placeholder", "닉네임 (필수)")
                    .class("sc-feed__comment-input")
                    .attr(FIELD_ATTR, "nickname"),
            )
            .child(
                Element::new("input")
                    .attr("type", "password")
                    .attr("placeholder", "비밀번호 (필수)")
                    .class("sc-feed__comment-input")
                    .attr(FIELD_ATTR, "password"),
            )
    };

    Element::new("div")
        .id(slot_dom_id(item, Slot::CommentForm))
        .class("sc-feed__comment-form")
        .hidden(true)
        .child(author)
        .child(
            Element::new("textarea")
                .attr("rows", "2")
                .attr("placeholder", "댓글을 작성합니다")
                .class("sc-feed__comment-textarea")
                .attr(FIELD_ATTR, "content"),
        )
        .child(
            Element::new("div").class("sc-feed__comment-submit").child(
                FeedAction::SubmitComment(item)
                    .apply(
                        Element::new("button")
                            .attr("type", "button")
                            .class("sc-feed__comment-register"),
                    )
                    .text("등록"),
            ),
        )
}

fn delete_post_form(board_title: &str, post: &Post) -> Element {
    Element::new("form")
        .attr("action", format!("/boards/{}/deletePost", encode_component(board_title)))
        .attr("method", "post")
        .attr(CONFIRM_ATTR, "정말 이 글을 삭제할까요?")
        .child(
            Element::new("input")
                .attr("type", "hidden")
                .attr("name", "postNum")
                .attr("value", post.post_num.to_string()),
        )
        .child(
            Element::new("input")
                .attr("type", "hidden")
                .attr("name", "writer")
                .attr("value", post.writer.as_str()),
        )
        .child(
            Element::new("button")
                .attr("type", "submit")
                .class(ACTION_CLASS)
                .attr("style", "height:auto")
                .text("삭제"),
        )
}

pub fn post_item(view: &PostView<'_>, counters: &PostCounters) -> Element {
    let PostView {
        item,
        board_title,
        board_display_name,
        post,
        member,
        compact,
    } = *view;

    let mut extra = vec![
        inline_action(
            &recommend_label(counters, compact),
            Some("m"),
            FeedAction::ToggleRecommend(item),
        )
        .id(slot_dom_id(item, Slot::Recommend)),
        inline_action(
            &comment_view_label(counters.comment_count, compact),
            Some("o"),
            FeedAction::ToggleComments(item),
        )
        .id(slot_dom_id(item, Slot::CommentViewLink)),
        inline_action(
            if compact { "댓글작성" } else { "댓글작성(C)" },
            Some("c"),
            FeedAction::ToggleCommentForm(item),
        ),
    ];
    if member.can_edit_post(&post.writer) {
        extra.push(action_link(
            "수정",
            &format!(
                "/boards/{}/modifyPost?postNum={}",
                encode_component(board_title),
                post.post_num
            ),
            None,
        ));
        extra.push(delete_post_form(board_title, post));
    }
    extra.push(action_link(
        if compact { "홈" } else { "초기화면(N)" },
        "/",
        Some("n"),
    ));

    let list_link = action_link(
        if compact { "목록" } else { "목 록(L)" },
        &board_href(board_title, None),
        Some("l"),
    );
    let actions = Element::new("div")
        .class("sc-feed__actions sc-feed__post-actions")
        .child(list_link);
    let actions = if compact {
        let menu_id = slot_dom_id(item, Slot::PostMenu);
        actions
            .child(
                inline_action("게시글 메뉴", None, FeedAction::TogglePostMenu(item))
                    .id(slot_dom_id(item, Slot::PostMenuToggle))
                    .class(format!("{} sc-feed__post-menu-toggle", ACTION_CLASS))
                    .attr("aria-expanded", "false")
                    .attr("aria-controls", menu_id.as_str()),
            )
            .child(
                Element::new("div")
                    .id(menu_id)
                    .class("sc-feed__post-menu-items")
                    .hidden(true)
                    .children(extra),
            )
    } else {
        actions.children(extra)
    };

    let comments = Element::new("div")
        .class("sc-feed__comments")
        .child(
            Element::new("div")
                .id(slot_dom_id(item, Slot::CommentsView))
                .class("sc-feed__comments-view")
                .hidden(true)
                .child(Element::new("div").class("sc-feed__comments-title").text("[댓 글]"))
                .child(
                    Element::new("div")
                        .id(slot_dom_id(item, Slot::CommentsList))
                        .class("sc-feed__comments-list"),
                )
                .child(
                    Element::new("div")
                        .id(slot_dom_id(item, Slot::CommentsPager))
                        .class("sc-feed__comments-page"),
                ),
        )
        .child(comment_form(item, member));

    Element::new("article")
        .id(item_dom_id(item))
        .class("sc-feed__item")
        .child(
            Element::new("div").class("sc-feed__title").text(format!(
                "[{}] {}번 | {}",
                board_display_name, post.post_num, post.title
            )),
        )
        .child(Element::new("div").class("sc-feed__meta").text(format!(
            "작성자: {} | 날짜: {} | 조회: {}",
            post.writer, post.reg_date, post.views
        )))
        .child(divider())
        .child(
            Element::new("div")
                .class("sc-feed__content")
                .html(sanitize_html(post.content.as_deref().unwrap_or_default())),
        )
        .child(divider())
        .child(actions)
        .child(
            divider()
                .id(slot_dom_id(item, Slot::CommentsDivider))
                .hidden(true),
        )
        .child(comments)
        .child(divider())
}

pub fn comment_nodes(item: ItemId, comments: &[Comment], member: &MemberMeta) -> Vec<Node> {
    comments
        .iter()
        .map(|comment| {
            let mut header = Element::new("div")
                .class("sc-feed__comment-meta")
                .text(format!("{}  {}", comment.author_label(), comment.reg_date));
            if comment.comment_num != 0 && member.can_delete_comment(comment.id.as_deref()) {
                header = header.child(
                    FeedAction::DeleteComment(item, comment.comment_num)
                        .apply(Element::new("button").attr("type", "button").class(ACTION_CLASS))
                        .text("댓글삭제(-)"),
                );
            }
            Node::Element(
                Element::new("div")
                    .class("sc-feed__comment")
                    .child(header)
                    .child(
                        Element::new("div")
                            .class("sc-feed__comment-content")
                            .text(comment.content.as_str()),
                    ),
            )
        })
        .collect()
}

/// Buttons for exactly the pages the server's descriptor names; the paging
/// arithmetic itself belongs to the server.
pub fn comment_pager(item: ItemId, page: &Page) -> Vec<Node> {
    let button = |label: String, target: i64, current: bool| -> Node {
        let class = if current {
            "btn btn-theme is-current"
        } else {
            "btn btn-theme"
        };
        FeedAction::CommentPage(item, target)
            .apply(Element::new("button").attr("type", "button").class(class))
            .text(label)
            .into()
    };

    let mut nodes = Vec::new();
    if page.has_prev_set() {
        nodes.push(button("◁".into(), page.prev_page_set_point, false));
    }
    for number in page.window() {
        nodes.push(button(number.to_string(), number, number == page.recent_page));
    }
    if page.has_next_set() {
        nodes.push(button("▷".into(), page.next_page_set_point, false));
    }
    nodes
}

/// `YYYY-MM-DD...` becomes `MM-DD`; anything else is shown as is.
pub fn format_month_day(date: &str) -> String {
    let bytes = date.as_bytes();
    let shaped = bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit);
    if shaped {
        date[5..10].to_owned()
    } else {
        date.to_owned()
    }
}

struct NavLink {
    href: &'static str,
    label: &'static str,
    access_key: Option<&'static str>,
    style: Option<&'static str>,
}

const fn nav(href: &'static str, label: &'static str) -> NavLink {
    NavLink {
        href,
        label,
        access_key: None,
        style: None,
    }
}

const fn styled(href: &'static str, label: &'static str, style: &'static str) -> NavLink {
    NavLink {
        href,
        label,
        access_key: None,
        style: Some(style),
    }
}

const TERRAN: &str = "color:#00FFFF;";
const ZERG: &str = "color:#ea40f7;";
const PROTOSS: &str = "color:#FFFF00";

const COMMAND_ROOM: [NavLink; 5] = [
    NavLink {
        href: "/",
        label: "0. 초기화면(N)",
        access_key: Some("n"),
        style: None,
    },
    nav("/boards/noticeBoard", "1. 공지사항"),
    nav("/boards/videoLinkBoard", "2. 영상자료실"),
    nav("/boards/promotionBoard", "3. 추천 및 홍보"),
    nav("/boards/funBoard", "4. 꿀잼놀이터"),
];

const STRATEGY_BOARDS: [NavLink; 11] = [
    styled("/boards/tVsZBoard", "10. 테저전 게시판", TERRAN),
    styled("/boards/tVsPBoard", "11. 테프전 게시판", TERRAN),
    styled("/boards/tVsTBoard", "12. 테테전 게시판", TERRAN),
    styled("/boards/zVsTBoard", "13. 저테전 게시판", ZERG),
    styled("/boards/zVsPBoard", "14. 저프전 게시판", ZERG),
    styled("/boards/zVsZBoard", "15. 저저전 게시판", ZERG),
    styled("/boards/pVsTBoard", "16. 프테전 게시판", PROTOSS),
    styled("/boards/pVsZBoard", "17. 프저전 게시판", PROTOSS),
    styled("/boards/pVsPBoard", "18. 프프전 게시판", PROTOSS),
    nav("/boards/teamPlayGuideBoard", "19. 팀플 게시판"),
    NavLink {
        href: "/boards/tipBoard",
        label: "20. 꿀팁보급고(T)",
        access_key: Some("t"),
        style: None,
    },
];

fn fieldset(legend: &str, links: &[NavLink]) -> Element {
    let items = links.iter().map(|link| {
        let mut anchor = with_access_key(
            Element::new("a").attr("href", link.href),
            link.access_key,
        );
        if let Some(style) = link.style {
            anchor = anchor.attr("style", style);
        }
        Element::new("li").child(anchor.text(link.label))
    });
    Element::new("fieldset")
        .child(Element::new("legend").text(legend))
        .child(Element::new("ul").children(items))
}

pub fn sidebar() -> Element {
    Element::new("div")
        .class("sc-feed__sidebar")
        .child(fieldset("[ 지휘관회의실 ]", &COMMAND_ROOM))
        .child(fieldset("[ 공략게시판 ]", &STRATEGY_BOARDS))
}

const BOARD_COLUMNS: [(&str, &str, &str); 6] = [
    ("번 호", "post-num hide-on-mobile", "10%"),
    ("제 목", "title", "56%"),
    ("작성자", "writer hide-on-mobile", "10%"),
    ("날 짜", "date hide-on-mobile", "10%"),
    ("조회", "views hide-on-mobile", "7%"),
    ("추천", "recommend hide-on-mobile", "7%"),
];

fn board_row(board_title: &str, post: &Post, notice: bool) -> Element {
    let mut title = Element::new("td").class("title");
    if notice {
        title = title.child(Element::new("span").text("[공지] "));
    }
    title = title.child(
        Element::new("a")
            .attr("href", post_href(board_title, post.post_num))
            .text(post.title.as_str()),
    );
    if post.comment_count > 0 {
        title = title.text(format!(" ( {} )", post.comment_count));
    }

    let row = Element::new("tr");
    let row = if notice { row.class("notice-tr") } else { row };
    row.child(
        Element::new("td")
            .class("post-num hide-on-mobile")
            .text(post.post_num.to_string()),
    )
    .child(title)
    .child(
        Element::new("td")
            .class("writer hide-on-mobile")
            .text(post.writer.as_str()),
    )
    .child(
        Element::new("td")
            .class("date hide-on-mobile")
            .text(format_month_day(&post.reg_date)),
    )
    .child(
        Element::new("td")
            .class("views hide-on-mobile")
            .text(post.views.to_string()),
    )
    .child(
        Element::new("td")
            .class("recommend hide-on-mobile")
            .text(post.recommend_count.to_string()),
    )
}

fn board_page_link(board_title: &str, label: String, page: i64, current: bool) -> Element {
    let class = if current {
        "btn btn-theme is-current"
    } else {
        "btn btn-theme"
    };
    Element::new("a")
        .class(class)
        .attr(
            "href",
            format!("/boards/{}/?recentPage={}", encode_component(board_title), page),
        )
        .text(label)
}

pub fn board_item(item: ItemId, board_title: &str, data: &BoardPage) -> Element {
    let page = &data.page;
    let header = Element::new("tr").children(BOARD_COLUMNS.iter().map(|(text, class, width)| {
        Element::new("th")
            .class(*class)
            .attr("style", format!("width: {};", width))
            .text(*text)
    }));
    let rows = data
        .self_notice_list
        .iter()
        .map(|notice| board_row(board_title, notice, true))
        .chain(
            data.post_list
                .iter()
                .map(|post| board_row(board_title, post, false)),
        );
    let table = Element::new("table")
        .class("sc-feed__table")
        .child(Element::new("thead").child(header))
        .child(Element::new("tbody").children(rows));

    let mut actions = Element::new("div").class("sc-feed__actions");
    if page.has_prev_set() {
        actions = actions.child(board_page_link(
            board_title,
            "[이전]".into(),
            page.prev_page_set_point,
            false,
        ));
    }
    for number in page.window() {
        actions = actions.child(board_page_link(
            board_title,
            format!("[{}]", number),
            number,
            number == page.recent_page,
        ));
    }
    if page.has_next_set() {
        actions = actions.child(board_page_link(
            board_title,
            "[다음]".into(),
            page.next_page_set_point,
            false,
        ));
    }
    if data.can_write {
        actions = actions.child(
            Element::new("a")
                .class("pull-right btn btn-theme")
                .attr(
                    "href",
                    format!("/boards/{}/writePost", encode_component(board_title)),
                )
                .attr(ACCESS_KEY_ATTR, "i")
                .text("글쓰기(I)"),
        );
    }

    let display = data
        .korean_title
        .as_deref()
        .filter(|title| !title.is_empty())
        .unwrap_or(board_title);

    Element::new("article")
        .id(item_dom_id(item))
        .class("sc-feed__item")
        .child(
            Element::new("div")
                .class("sc-feed__title")
                .text(format!("[{}]", display)),
        )
        .child(Element::new("div").class("sc-feed__meta").text(format!(
            "페이지: {}/{} | 총 {}개",
            page.recent_page, page.total_page, page.total_post_count
        )))
        .child(divider())
        .child(
            Element::new("div")
                .class("sc-row sc-feed__board-layout")
                .child(Element::new("div").class("sc-col-3").child(sidebar()))
                .child(
                    Element::new("div")
                        .class("sc-col-9")
                        .child(table)
                        .child(divider())
                        .child(actions),
                ),
        )
        .child(divider())
}

pub fn answer_line(answer: SafeHtml) -> Node {
    Element::new("div")
        .child(Element::new("strong").text("A."))
        .text(" ")
        .html(answer)
        .into()
}

pub fn chat_item(item: ItemId, question: &str) -> Element {
    Element::new("article")
        .id(item_dom_id(item))
        .class("sc-feed__item sc-feed__chat-item")
        .child(Element::new("div").class("sc-feed__title").text("[AI]"))
        .child(
            Element::new("div")
                .id(slot_dom_id(item, Slot::ChatMeta))
                .class("sc-feed__meta"),
        )
        .child(
            Element::new("div")
                .class("sc-feed__content sc-feed__chat-question")
                .child(
                    Element::new("div")
                        .child(Element::new("strong").text("Q."))
                        .text(format!(" {}", question)),
                ),
        )
        .child(
            Element::new("div")
                .id(slot_dom_id(item, Slot::ChatAnswer))
                .class("sc-feed__content sc-feed__chat-answer")
                .child(answer_line(SafeHtml::from_text_with_breaks(PENDING_ANSWER))),
        )
        .child(
            Element::new("div")
                .id(slot_dom_id(item, Slot::ChatRelated))
                .class("sc-feed__content sc-feed__chat-related")
                .hidden(true),
        )
}

/// A related post that survived validation, ready to be linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedLink {
    pub href: String,
    pub label: String,
}

pub fn related_nodes(links: &[RelatedLink]) -> Vec<Node> {
    vec![
        Element::new("div").text("[관련 게시물]").into(),
        Element::new("ol")
            .children(links.iter().map(|link| {
                Element::new("li").child(
                    Element::new("a")
                        .attr("href", link.href.as_str())
                        .text(link.label.as_str()),
                )
            }))
            .into(),
    ]
}
