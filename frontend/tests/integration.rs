extern crate sc_terminal_frontend;

use url::Url;

use sc_terminal_frontend::command::{Command, ASK_USAGE};
use sc_terminal_frontend::editor::EditorConfig;
use sc_terminal_frontend::{
    classify, is_board_url, is_post_url, parse_board_url, parse_post_url, sanitize_html,
    BoardRoute, PostRoute, Route,
};

fn origin() -> Url {
    Url::parse("https://sc1hub.example").unwrap()
}

#[test]
fn post_urls_classify_for_any_board() {
    let origin = origin();
    for (title, num) in [("funBoard", 1), ("tVsZBoard", 42), ("noticeBoard", 900_001)] {
        let relative = format!("/boards/{}/readPost?postNum={}", title, num);
        let absolute = format!("https://sc1hub.example{}", relative);
        for href in [&relative, &absolute] {
            assert!(is_post_url(href, &origin));
            assert_eq!(
                parse_post_url(href, &origin),
                Some(PostRoute {
                    board_title: title.to_owned(),
                    post_num: num,
                })
            );
        }
    }
}

#[test]
fn reserved_names_are_not_boards() {
    let origin = origin();
    assert!(is_board_url("/boards/promotionBoard", &origin));
    assert!(!is_board_url("/boards/boardList", &origin));
    assert!(!is_board_url("/boards/showLatestPosts", &origin));
    assert!(!is_board_url("/boards", &origin));
    assert!(!is_board_url("/boards/a/b", &origin));
    assert_eq!(
        parse_board_url("/boards/promotionBoard/?recentPage=4", &origin),
        Some(BoardRoute {
            board_title: "promotionBoard".into(),
            recent_page: Some(4),
        })
    );
}

#[test]
fn foreign_and_malformed_hrefs_never_match() {
    let origin = origin();
    for href in ["http://[::1", "mailto:gg@sc1hub.example", "/members/login", ""] {
        assert_eq!(classify(href, &origin), None);
    }
}

#[test]
fn command_parsing_is_public() {
    let origin = origin();
    assert_eq!(
        Command::parse("OPEN /boards/funBoard", &origin),
        Some(Command::Open(Route::Board(BoardRoute {
            board_title: "funBoard".into(),
            recent_page: None,
        })))
    );
    assert_eq!(Command::parse("ai", &origin), Some(Command::Usage(ASK_USAGE)));
    assert_eq!(Command::parse("open bogus-not-a-url", &origin), None);
}

#[test]
fn sanitizer_removes_script_and_style_only() {
    let html = sanitize_html(
        r#"<h3>빌드</h3><STYLE>body{display:none}</STYLE><img src="x.png"><Script src="a.js"></Script>끝"#,
    );
    assert_eq!(html.as_str(), r#"<h3>빌드</h3><img src="x.png">끝"#);
}

#[test]
fn editor_config_is_json() {
    let json = EditorConfig::default().to_json().unwrap();
    assert!(json.starts_with(r#"{"language":"ko""#));
    assert!(json.contains(r#""toolbar":[{"name":"document""#));
}
