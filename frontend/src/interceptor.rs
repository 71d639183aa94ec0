//! Decides whether a document click on a link should be rendered inline.
//! The DOM side collects the facts; this module holds the rules.

use url::Url;

use crate::route::{classify, Route};

/// The parts of a click event that matter for interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickFacts {
    pub default_prevented: bool,
    pub trusted: bool,
    pub button: i16,
    pub modifier_held: bool,
}

impl ClickFacts {
    /// A plain, user-initiated primary-button click.
    pub fn primary() -> Self {
        ClickFacts {
            default_prevented: false,
            trusted: true,
            button: 0,
            modifier_held: false,
        }
    }

    fn is_plain(&self) -> bool {
        !self.default_prevented && self.trusted && self.button == 0 && !self.modifier_held
    }
}

/// The nearest enclosing `a[href]` of the click target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorFacts<'a> {
    /// The attribute exactly as written in the markup.
    pub raw_href: &'a str,
    /// The href as the browser resolved it.
    pub href: &'a str,
    pub bypass: bool,
    pub target: Option<&'a str>,
}

impl AnchorFacts<'_> {
    fn is_candidate(&self) -> bool {
        !self.bypass
            && self.target != Some("_blank")
            && !self.raw_href.is_empty()
            && !self.raw_href.starts_with("javascript:")
            && !self.raw_href.starts_with('#')
    }
}

/// The route to render instead of navigating, or `None` to let the browser
/// handle the click. A route is only returned when it fully parses, so a
/// matching path with a non-numeric `postNum` still navigates normally.
pub fn intercept(click: &ClickFacts, anchor: Option<&AnchorFacts<'_>>, origin: &Url) -> Option<Route> {
    if !click.is_plain() {
        return None;
    }
    let anchor = anchor.filter(|anchor| anchor.is_candidate())?;
    classify(anchor.href, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{BoardRoute, PostRoute};

    fn origin() -> Url {
        Url::parse("https://sc1hub.example").unwrap()
    }

    fn anchor(raw_href: &str) -> AnchorFacts<'_> {
        AnchorFacts {
            raw_href,
            href: raw_href,
            bypass: false,
            target: None,
        }
    }

    #[test]
    fn plain_clicks_on_board_links_are_intercepted() {
        let origin = origin();
        assert_eq!(
            intercept(
                &ClickFacts::primary(),
                Some(&anchor("/boards/funBoard/readPost?postNum=4")),
                &origin
            ),
            Some(Route::Post(PostRoute {
                board_title: "funBoard".into(),
                post_num: 4,
            }))
        );
        assert_eq!(
            intercept(&ClickFacts::primary(), Some(&anchor("/boards/funBoard")), &origin),
            Some(Route::Board(BoardRoute {
                board_title: "funBoard".into(),
                recent_page: None,
            }))
        );
    }

    #[test]
    fn modified_or_synthetic_clicks_pass_through() {
        let origin = origin();
        let link = anchor("/boards/funBoard");
        let cases = [
            ClickFacts {
                default_prevented: true,
                ..ClickFacts::primary()
            },
            ClickFacts {
                trusted: false,
                ..ClickFacts::primary()
            },
            ClickFacts {
                button: 1,
                ..ClickFacts::primary()
            },
            ClickFacts {
                modifier_held: true,
                ..ClickFacts::primary()
            },
        ];
        for click in cases {
            assert_eq!(intercept(&click, Some(&link), &origin), None);
        }
    }

    #[test]
    fn marked_or_non_navigating_anchors_pass_through() {
        let origin = origin();
        let click = ClickFacts::primary();
        let bypass = AnchorFacts {
            bypass: true,
            ..anchor("/boards/funBoard")
        };
        let new_tab = AnchorFacts {
            target: Some("_blank"),
            ..anchor("/boards/funBoard")
        };
        assert_eq!(intercept(&click, Some(&bypass), &origin), None);
        assert_eq!(intercept(&click, Some(&new_tab), &origin), None);
        assert_eq!(intercept(&click, Some(&anchor("")), &origin), None);
        assert_eq!(intercept(&click, Some(&anchor("#top")), &origin), None);
        assert_eq!(intercept(&click, Some(&anchor("javascript:void(0)")), &origin), None);
        assert_eq!(intercept(&click, None, &origin), None);
    }

    #[test]
    fn unparseable_post_numbers_navigate_normally() {
        let origin = origin();
        assert_eq!(
            intercept(
                &ClickFacts::primary(),
                Some(&anchor("/boards/funBoard/readPost?postNum=abc")),
                &origin
            ),
            None
        );
        assert_eq!(
            intercept(&ClickFacts::primary(), Some(&anchor("/boards/boardList")), &origin),
            None
        );
    }
}
