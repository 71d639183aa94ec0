//! Display names for boards, fetched once per page load.
//!
//! The first caller starts the `/boards/boardList` request; callers arriving
//! while it is in flight await the same future, and everyone after that gets
//! the memoized map. A failed fetch memoizes an empty map, so display names
//! fall back to the raw board title for the rest of the page's lifetime.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use log::warn;

use crate::gateway::Gateway;
use crate::transport::Transport;

pub type BoardTitleMap = Rc<HashMap<String, String>>;

pub struct BoardTitles<T> {
    gateway: Gateway<T>,
    lookup: RefCell<Option<Shared<LocalBoxFuture<'static, BoardTitleMap>>>>,
}

impl<T: Transport + 'static> BoardTitles<T> {
    pub fn new(gateway: Gateway<T>) -> Self {
        BoardTitles {
            gateway,
            lookup: RefCell::new(None),
        }
    }

    pub async fn map(&self) -> BoardTitleMap {
        let lookup = {
            let mut slot = self.lookup.borrow_mut();
            slot.get_or_insert_with(|| {
                let gateway = self.gateway.clone();
                async move {
                    let boards = gateway.board_list().await.unwrap_or_else(|err| {
                        warn!("board titles unavailable: {}", err);
                        Vec::new()
                    });
                    let map: HashMap<String, String> = boards
                        .into_iter()
                        .filter_map(|board| match (board.board_title, board.korean_title) {
                            (Some(title), Some(korean))
                                if !title.is_empty() && !korean.is_empty() =>
                            {
                                Some((title.to_lowercase(), korean))
                            }
                            _ => None,
                        })
                        .collect();
                    Rc::new(map)
                }
                .boxed_local()
                .shared()
            })
            .clone()
        };
        lookup.await
    }

    /// The board's display title, or the title itself when unknown.
    pub async fn display_name(&self, board_title: &str) -> String {
        self.map()
            .await
            .get(&board_title.to_lowercase())
            .cloned()
            .unwrap_or_else(|| board_title.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::BOARD_LIST_PATH;
    use crate::testing::{block_on, gateway, MockTransport};
    use crate::transport::Method;

    const BOARD_LIST: &str = r#"[
        {"boardTitle":"funBoard","koreanTitle":"꿀잼놀이터"},
        {"boardTitle":"TipBoard","koreanTitle":"꿀팁보급고"},
        {"boardTitle":"broken","koreanTitle":null}
    ]"#;

    #[test]
    fn concurrent_lookups_share_one_request() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, BOARD_LIST_PATH, 200, BOARD_LIST);
        let release = transport.gate();
        let titles = BoardTitles::new(gateway(&transport));

        let (first, second, _) = block_on(async {
            futures::join!(
                titles.display_name("funBoard"),
                titles.display_name("tipboard"),
                async {
                    let _ = release.send(());
                }
            )
        });

        assert_eq!(first, "꿀잼놀이터");
        assert_eq!(second, "꿀팁보급고");
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn later_lookups_are_memoized() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, BOARD_LIST_PATH, 200, BOARD_LIST);
        let titles = BoardTitles::new(gateway(&transport));

        block_on(titles.display_name("funBoard"));
        block_on(titles.display_name("unknownBoard"));
        assert_eq!(block_on(titles.display_name("broken")), "broken");
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn failed_fetch_falls_back_to_raw_titles() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, BOARD_LIST_PATH, 500, "");
        let titles = BoardTitles::new(gateway(&transport));

        assert_eq!(block_on(titles.display_name("funBoard")), "funBoard");
        assert_eq!(block_on(titles.display_name("funBoard")), "funBoard");
        assert_eq!(transport.requests().len(), 1);
    }
}
