//! One method per server capability. Each issues exactly one request; any
//! non-2xx reply becomes [`GatewayError::Status`]. There is no retry, every
//! call is a single user-initiated action.

use std::rc::Rc;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::{GatewayError, GatewayResult};
use crate::models::{
    lenient_int, BoardPage, BoardSummary, ChatReply, ChatRequest, Comment, CommentPageRequest,
    NewComment, Page, Post, PostNumBody, RecommendState,
};
use crate::route::encode_component;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

pub const ASSISTANT_CHAT_PATH: &str = "/api/assistant/chat";
pub const BOARD_LIST_PATH: &str = "/boards/boardList";

const UNAUTHORIZED: u16 = 401;

pub struct Gateway<T> {
    transport: Rc<T>,
    origin: Url,
}

impl<T> Clone for Gateway<T> {
    fn clone(&self) -> Self {
        Gateway {
            transport: self.transport.clone(),
            origin: self.origin.clone(),
        }
    }
}

fn board_path(board_title: &str, action: &str) -> String {
    format!("/boards/{}/{}", encode_component(board_title), action)
}

fn encode<B: Serialize>(body: &B, context: &'static str) -> GatewayResult<String> {
    serde_json::to_string(body).map_err(|err| GatewayError::Decode {
        context,
        message: err.to_string(),
    })
}

fn decode<D: DeserializeOwned>(response: &HttpResponse, context: &'static str) -> GatewayResult<D> {
    serde_json::from_str(&response.body).map_err(|err| GatewayError::Decode {
        context,
        message: err.to_string(),
    })
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T, origin: Url) -> Self {
        Gateway {
            transport: Rc::new(transport),
            origin,
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> GatewayResult<HttpResponse> {
        let url = self.origin.join(path)?;
        let mut request = HttpRequest::new(method, url);
        if let Some(body) = body {
            request = request.with_json(body);
        }
        debug!("{} {}", method.as_str(), request.target());
        Ok(self.transport.send(request).await?)
    }

    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        context: &'static str,
    ) -> GatewayResult<HttpResponse> {
        let response = self.send(method, path, body).await?;
        if !response.is_success() {
            return Err(GatewayError::Status {
                status: response.status,
                context,
            });
        }
        Ok(response)
    }

    pub async fn board_list(&self) -> GatewayResult<Vec<BoardSummary>> {
        let context = "board list";
        let response = self
            .exchange(Method::Get, BOARD_LIST_PATH, None, context)
            .await?;
        decode::<Option<Vec<BoardSummary>>>(&response, context).map(Option::unwrap_or_default)
    }

    pub async fn board_page(
        &self,
        board_title: &str,
        recent_page: Option<i64>,
    ) -> GatewayResult<BoardPage> {
        let context = "board listing";
        let mut path = board_path(board_title, "listData");
        if let Some(page) = recent_page.filter(|page| *page != 0) {
            path.push_str(&format!("?recentPage={}", page));
        }
        let response = self.exchange(Method::Get, &path, None, context).await?;
        decode(&response, context)
    }

    pub async fn post(&self, board_title: &str, post_num: i64) -> GatewayResult<Post> {
        let context = "post";
        let path = format!("{}?postNum={}", board_path(board_title, "postData"), post_num);
        let response = self.exchange(Method::Get, &path, None, context).await?;
        decode(&response, context)
    }

    /// Whether the signed-in member has recommended the post. The server
    /// answers 401 for visitors, which simply means "not recommended".
    pub async fn recommend_state(&self, board_title: &str, post_num: i64) -> GatewayResult<bool> {
        let context = "recommendation check";
        let path = format!(
            "{}?postNum={}",
            board_path(board_title, "checkRecommendation"),
            post_num
        );
        let response = self.send(Method::Get, &path, None).await?;
        if response.status == UNAUTHORIZED {
            return Ok(false);
        }
        if !response.is_success() {
            return Err(GatewayError::Status {
                status: response.status,
                context,
            });
        }
        decode::<RecommendState>(&response, context).map(|state| state.check_recommend)
    }

    pub async fn recommend_count(&self, board_title: &str, post_num: i64) -> GatewayResult<i64> {
        let context = "recommend count";
        let path = format!(
            "{}?postNum={}",
            board_path(board_title, "getRecommendCount"),
            post_num
        );
        let response = self.exchange(Method::Get, &path, None, context).await?;
        let value = serde_json::from_str(&response.body)
            .unwrap_or_else(|_| serde_json::Value::String(response.body.clone()));
        Ok(lenient_int(&value).unwrap_or(0))
    }

    /// Flips the member's recommendation: cancels when `currently_recommended`,
    /// adds otherwise.
    pub async fn set_recommendation(
        &self,
        board_title: &str,
        post_num: i64,
        currently_recommended: bool,
    ) -> GatewayResult<()> {
        let action = if currently_recommended {
            "cancelRecommendation"
        } else {
            "addRecommendation"
        };
        let context = "recommendation update";
        let body = encode(&PostNumBody { post_num }, context)?;
        self.exchange(
            Method::Post,
            &board_path(board_title, action),
            Some(body),
            context,
        )
        .await?;
        Ok(())
    }

    /// Pagination descriptor for one page of a post's comments.
    pub async fn comment_page(
        &self,
        board_title: &str,
        post_num: i64,
        recent_page: i64,
    ) -> GatewayResult<Page> {
        let context = "comment page setting";
        let body = encode(
            &CommentPageRequest {
                recent_page,
                post_num,
            },
            context,
        )?;
        let response = self
            .exchange(
                Method::Post,
                &board_path(board_title, "commentPageSetting"),
                Some(body),
                context,
            )
            .await?;
        decode(&response, context)
    }

    pub async fn comments(&self, board_title: &str, page: &Page) -> GatewayResult<Vec<Comment>> {
        let context = "comment list";
        let body = encode(page, context)?;
        let response = self
            .exchange(
                Method::Post,
                &board_path(board_title, "showCommentList"),
                Some(body),
                context,
            )
            .await?;
        decode::<Option<Vec<Comment>>>(&response, context).map(Option::unwrap_or_default)
    }

    /// The reply body is informational only and is not decoded.
    pub async fn add_comment(&self, board_title: &str, comment: &NewComment) -> GatewayResult<()> {
        let context = "comment submission";
        let body = encode(comment, context)?;
        self.exchange(
            Method::Post,
            &board_path(board_title, "addComment"),
            Some(body),
            context,
        )
        .await?;
        Ok(())
    }

    pub async fn delete_comment(&self, board_title: &str, comment_num: i64) -> GatewayResult<()> {
        let path = format!(
            "{}?commentNum={}",
            board_path(board_title, "deleteComment"),
            comment_num
        );
        self.exchange(Method::Post, &path, None, "comment deletion")
            .await?;
        Ok(())
    }

    pub async fn update_comment_count(&self, board_title: &str, post_num: i64) -> GatewayResult<()> {
        let path = format!(
            "{}?postNum={}",
            board_path(board_title, "updateCommentCount"),
            post_num
        );
        self.exchange(Method::Put, &path, None, "comment count update")
            .await?;
        Ok(())
    }

    /// Sends a question to the assistant. A failed reply still carries the
    /// server's `error` and `usageText`, which end up in
    /// [`GatewayError::Assistant`].
    pub async fn chat(&self, question: &str) -> GatewayResult<ChatReply> {
        let context = "assistant chat";
        let body = encode(
            &ChatRequest {
                message: question.to_owned(),
            },
            context,
        )?;
        let response = self
            .send(Method::Post, ASSISTANT_CHAT_PATH, Some(body))
            .await?;
        let reply = decode::<ChatReply>(&response, context).unwrap_or_else(|err| {
            warn!("assistant reply was not JSON: {}", err);
            ChatReply::default()
        });
        if !response.is_success() {
            return Err(GatewayError::Assistant {
                status: response.status,
                error: reply.error,
                usage_text: reply.usage_text,
            });
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{block_on, gateway, MockTransport};

    #[test]
    fn board_page_encodes_title_and_omits_empty_page() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/boards/fun%20Board/listData", 200, "{}");
        transport.respond(Method::Get, "/boards/funBoard/listData?recentPage=3", 200, "{}");
        let gateway = gateway(&transport);

        block_on(gateway.board_page("fun Board", None)).unwrap();
        block_on(gateway.board_page("funBoard", Some(3))).unwrap();
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn non_success_status_is_typed() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/boards/funBoard/postData?postNum=9", 404, "");
        let err = block_on(gateway(&transport).post("funBoard", 9)).unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn unauthorized_recommendation_check_means_not_recommended() {
        let transport = MockTransport::new();
        transport.respond(
            Method::Get,
            "/boards/funBoard/checkRecommendation?postNum=5",
            401,
            "",
        );
        assert_eq!(
            block_on(gateway(&transport).recommend_state("funBoard", 5)),
            Ok(false)
        );
    }

    #[test]
    fn recommend_count_accepts_bare_numbers_and_strings() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/boards/a/getRecommendCount?postNum=1", 200, "7");
        transport.respond(Method::Get, "/boards/b/getRecommendCount?postNum=1", 200, "\"12\"");
        transport.respond(Method::Get, "/boards/c/getRecommendCount?postNum=1", 200, "oops");
        let gateway = gateway(&transport);
        assert_eq!(block_on(gateway.recommend_count("a", 1)), Ok(7));
        assert_eq!(block_on(gateway.recommend_count("b", 1)), Ok(12));
        assert_eq!(block_on(gateway.recommend_count("c", 1)), Ok(0));
    }

    #[test]
    fn recommendation_toggle_picks_endpoint_from_current_state() {
        let transport = MockTransport::new();
        transport.respond(Method::Post, "/boards/a/addRecommendation", 200, "{}");
        transport.respond(Method::Post, "/boards/a/cancelRecommendation", 200, "{}");
        let gateway = gateway(&transport);
        block_on(gateway.set_recommendation("a", 4, false)).unwrap();
        block_on(gateway.set_recommendation("a", 4, true)).unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].target(), "/boards/a/addRecommendation");
        assert_eq!(requests[1].target(), "/boards/a/cancelRecommendation");
        assert_eq!(requests[1].body.as_deref(), Some(r#"{"postNum":4}"#));
    }

    #[test]
    fn comment_descriptor_is_posted_back_verbatim() {
        let transport = MockTransport::new();
        transport.respond(
            Method::Post,
            "/boards/a/commentPageSetting",
            200,
            r#"{"recentPage":2,"postNum":4,"startIndex":10}"#,
        );
        transport.respond(Method::Post, "/boards/a/showCommentList", 200, "null");
        let gateway = gateway(&transport);

        let page = block_on(gateway.comment_page("a", 4, 2)).unwrap();
        let comments = block_on(gateway.comments("a", &page)).unwrap();
        assert!(comments.is_empty());

        let requests = transport.requests();
        let setting: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(setting, serde_json::json!({"recentPage":2,"postNum":4}));
        let echoed: serde_json::Value =
            serde_json::from_str(requests[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(echoed["startIndex"], 10);
    }

    #[test]
    fn comment_mutations_use_expected_methods() {
        let transport = MockTransport::new();
        transport.respond(Method::Post, "/boards/a/deleteComment?commentNum=31", 200, "");
        transport.respond(Method::Put, "/boards/a/updateCommentCount?postNum=4", 200, "");
        let gateway = gateway(&transport);
        block_on(gateway.delete_comment("a", 31)).unwrap();
        block_on(gateway.update_comment_count("a", 4)).unwrap();
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn failed_chat_carries_error_and_usage() {
        let transport = MockTransport::new();
        transport.respond(
            Method::Post,
            ASSISTANT_CHAT_PATH,
            429,
            r#"{"error":"오늘 사용량을 모두 썼습니다.","usageText":"10/10"}"#,
        );
        let err = block_on(gateway(&transport).chat("빌드 추천")).unwrap_err();
        assert_eq!(
            err,
            GatewayError::Assistant {
                status: 429,
                error: Some("오늘 사용량을 모두 썼습니다.".into()),
                usage_text: Some("10/10".into()),
            }
        );
    }

    #[test]
    fn transport_failure_is_propagated() {
        let transport = MockTransport::new();
        let err = block_on(gateway(&transport).board_list()).unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
