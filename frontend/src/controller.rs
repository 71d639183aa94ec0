//! Drives the feed: opens posts and boards, runs commands, reacts to clicks on
//! rendered controls and talks to the assistant.
//!
//! Everything runs on one thread. Per-post state lives in a `RefCell` map and
//! is only ever borrowed between awaits, never across one, so interleaved
//! actions on the same post cannot trip a borrow. Overlapping requests are not
//! ordered: whichever response lands last is what the feed shows.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::{debug, info, warn};
use url::Url;

use crate::board_titles::BoardTitles;
use crate::command::{Command, HELP_TEXT};
use crate::config::TerminalConfig;
use crate::error::GatewayError;
use crate::feed::{Feed, FeedAction, ItemId, Slot, Visibility};
use crate::gateway::Gateway;
use crate::markup::Node;
use crate::models::{ChatReply, NewComment, RelatedPost};
use crate::render::{
    answer_line, board_item, chat_item, comment_nodes, comment_pager, comment_view_label,
    post_item, recommend_label, related_nodes, system_item, PostCounters, PostView, RelatedLink,
};
use crate::route::{board_href, post_href, Route};
use crate::sanitize::SafeHtml;
use crate::session::MemberMeta;
use crate::transport::Transport;

const LOGIN_REQUIRED: &str = "추천 기능을 사용하려면 로그인이 필요합니다.";
const EMPTY_COMMENT: &str = "댓글 내용을 작성해주세요~";
const MISSING_NICKNAME: &str = "닉네임을 입력해주세요.";
const MISSING_PASSWORD: &str = "비밀번호를 입력해주세요.";
const RECOMMEND_FAILED: &str = "추천 처리 중 오류가 발생했습니다.";
const COMMENT_FAILED: &str = "댓글 작성 중 오류가 발생했습니다.";
const COMMENT_DELETE_FAILED: &str = "댓글 삭제 중 오류가 발생했습니다.";
const EMPTY_QUESTION: &str = "질문을 입력해주세요.";
const QUESTION_TOO_LONG: &str = "질문이 너무 깁니다. 조금만 짧게 입력해주세요.";
const NO_ANSWER: &str = "답변을 생성하지 못했습니다.";
const CHAT_FAILED: &str = "AI 응답을 불러오지 못했습니다.";
const UNTITLED: &str = "제목 없음";

/// What the controller remembers about a post it has rendered.
#[derive(Debug, Clone)]
struct PostState {
    board_title: String,
    post_num: i64,
    /// Count from the post payload, shown when the live count is unavailable.
    payload_recommend_count: i64,
    counters: PostCounters,
    comments_open: bool,
    form_open: bool,
    menu_open: bool,
    comment_page: i64,
    /// Comments on the shown page that this member may delete.
    deletable_comments: Vec<i64>,
}

pub struct Controller<T, F> {
    gateway: Gateway<T>,
    board_titles: BoardTitles<T>,
    feed: F,
    member: MemberMeta,
    config: TerminalConfig,
    visibility: Cell<Visibility>,
    next_item: Cell<u32>,
    posts: RefCell<HashMap<ItemId, PostState>>,
}

impl<T, F> Controller<T, F>
where
    T: Transport + 'static,
    F: Feed,
{
    pub fn new(
        gateway: Gateway<T>,
        feed: F,
        member: MemberMeta,
        config: TerminalConfig,
        initial: Visibility,
    ) -> Self {
        Controller {
            board_titles: BoardTitles::new(gateway.clone()),
            gateway,
            feed,
            member,
            config,
            visibility: Cell::new(initial),
            next_item: Cell::new(1),
            posts: RefCell::new(HashMap::new()),
        }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn origin(&self) -> &Url {
        self.gateway.origin()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility.get()
    }

    pub fn open_widget(&self) {
        self.set_visibility(Visibility::Open);
    }

    pub fn collapse(&self) {
        self.set_visibility(Visibility::Collapsed);
    }

    fn set_visibility(&self, visibility: Visibility) {
        self.visibility.set(visibility);
        self.feed.set_visibility(visibility);
    }

    fn allocate(&self) -> ItemId {
        let id = self.next_item.get();
        self.next_item.set(id + 1);
        ItemId(id)
    }

    pub fn system_message(&self, message: &str) {
        let item = self.allocate();
        self.feed.append(item, system_item(item, message));
        self.open_widget();
    }

    fn post_state(&self, item: ItemId) -> Option<PostState> {
        self.posts.borrow().get(&item).cloned()
    }

    fn update_post<R>(&self, item: ItemId, update: impl FnOnce(&mut PostState) -> R) -> Option<R> {
        self.posts.borrow_mut().get_mut(&item).map(update)
    }

    pub async fn open_route(&self, route: &Route) {
        match route {
            Route::Post(post) => self.open_post(&post.board_title, post.post_num).await,
            Route::Board(board) => self.open_board(&board.board_title, board.recent_page).await,
        }
    }

    pub async fn open_post(&self, board_title: &str, post_num: i64) {
        if !self.config.inline_feed {
            self.feed.navigate(&post_href(board_title, post_num));
            return;
        }
        self.open_widget();

        let display_name = self.board_titles.display_name(board_title).await;
        let post = match self.gateway.post(board_title, post_num).await {
            Ok(post) => post,
            Err(err) => {
                warn!("post {}/{} unavailable: {}", board_title, post_num, err);
                self.system_message(&format!(
                    "게시물을 불러오지 못했습니다. ({} / {})",
                    board_title, post_num
                ));
                return;
            }
        };

        let item = self.allocate();
        let counters = PostCounters {
            recommend_count: post.recommend_count,
            recommended: false,
            comment_count: post.comment_count,
        };
        let view = PostView {
            item,
            board_title,
            board_display_name: &display_name,
            post: &post,
            member: &self.member,
            compact: self.config.compact_menu,
        };
        let element = post_item(&view, &counters);
        self.posts.borrow_mut().insert(
            item,
            PostState {
                board_title: board_title.to_owned(),
                post_num,
                payload_recommend_count: post.recommend_count,
                counters,
                comments_open: false,
                form_open: false,
                menu_open: false,
                comment_page: 1,
                deletable_comments: Vec::new(),
            },
        );
        info!("opened post {}/{} as item {}", board_title, post_num, item);
        self.feed.append(item, element);
        self.refresh_recommendation(item).await;
    }

    pub async fn open_board(&self, board_title: &str, recent_page: Option<i64>) {
        if !self.config.inline_feed {
            self.feed.navigate(&board_href(board_title, recent_page));
            return;
        }
        self.open_widget();

        match self.gateway.board_page(board_title, recent_page).await {
            Ok(data) => {
                let title = data
                    .board_title
                    .clone()
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| board_title.to_owned());
                let item = self.allocate();
                info!("opened board {} as item {}", title, item);
                self.feed.append(item, board_item(item, &title, &data));
            }
            Err(err) => {
                warn!("board {} unavailable: {}", board_title, err);
                self.system_message(&format!("게시판 목록을 불러오지 못했습니다. ({})", board_title));
            }
        }
    }

    fn redraw_recommend(&self, item: ItemId) {
        if let Some(state) = self.post_state(item) {
            let label = recommend_label(&state.counters, self.config.compact_menu);
            self.feed.fill(item, Slot::Recommend, vec![label.into()]);
        }
    }

    fn redraw_comment_link(&self, item: ItemId) {
        if let Some(state) = self.post_state(item) {
            let label = comment_view_label(state.counters.comment_count, self.config.compact_menu);
            self.feed.fill(item, Slot::CommentViewLink, vec![label.into()]);
        }
    }

    /// Re-reads recommendation state and count from the server. Counters are
    /// never adjusted locally.
    pub async fn refresh_recommendation(&self, item: ItemId) {
        let state = match self.post_state(item) {
            Some(state) => state,
            None => return,
        };
        if !self.member.logged_in {
            self.update_post(item, |post| post.counters.recommended = false);
            self.redraw_recommend(item);
            return;
        }

        let recommended = self
            .gateway
            .recommend_state(&state.board_title, state.post_num)
            .await
            .unwrap_or_else(|err| {
                warn!("recommendation state unavailable: {}", err);
                false
            });
        let count = self
            .gateway
            .recommend_count(&state.board_title, state.post_num)
            .await
            .unwrap_or_else(|err| {
                warn!("recommend count unavailable: {}", err);
                state.payload_recommend_count
            });

        self.update_post(item, |post| {
            post.counters.recommended = recommended;
            post.counters.recommend_count = count;
        });
        self.redraw_recommend(item);
    }

    pub async fn toggle_recommendation(&self, item: ItemId) {
        let state = match self.post_state(item) {
            Some(state) => state,
            None => return,
        };
        if !self.member.logged_in {
            self.feed.alert(LOGIN_REQUIRED);
            return;
        }
        let result = self
            .gateway
            .set_recommendation(&state.board_title, state.post_num, state.counters.recommended)
            .await;
        match result {
            Ok(()) => self.refresh_recommendation(item).await,
            Err(err) => {
                warn!("recommendation update failed: {}", err);
                self.system_message(RECOMMEND_FAILED);
            }
        }
    }

    fn sync_comment_divider(&self, item: ItemId) {
        if let Some(state) = self.post_state(item) {
            let visible = state.comments_open || state.form_open;
            self.feed.set_hidden(item, Slot::CommentsDivider, !visible);
        }
    }

    pub async fn toggle_comments(&self, item: ItemId) {
        let open = match self.update_post(item, |post| {
            post.comments_open = !post.comments_open;
            post.comments_open
        }) {
            Some(open) => open,
            None => return,
        };
        self.feed.set_hidden(item, Slot::CommentsView, !open);
        self.sync_comment_divider(item);
        self.redraw_comment_link(item);
        if open {
            self.load_comments(item, 1).await;
        }
    }

    /// Loads one page of comments. The descriptor's total becomes the shown
    /// comment count; on failure the thread is left empty.
    pub async fn load_comments(&self, item: ItemId, recent_page: i64) {
        let state = match self.post_state(item) {
            Some(state) => state,
            None => return,
        };
        let page = match self
            .gateway
            .comment_page(&state.board_title, state.post_num, recent_page)
            .await
        {
            Ok(page) => page,
            Err(err) => {
                warn!("comment page unavailable: {}", err);
                self.clear_comments(item);
                return;
            }
        };
        self.update_post(item, |post| {
            post.counters.comment_count = page.total_post_count;
            post.comment_page = if page.recent_page > 0 { page.recent_page } else { 1 };
        });
        self.redraw_comment_link(item);

        match self.gateway.comments(&state.board_title, &page).await {
            Ok(comments) => {
                let deletable: Vec<i64> = comments
                    .iter()
                    .filter(|comment| {
                        comment.comment_num != 0
                            && self.member.can_delete_comment(comment.id.as_deref())
                    })
                    .map(|comment| comment.comment_num)
                    .collect();
                self.update_post(item, |post| post.deletable_comments = deletable);
                self.feed.fill(
                    item,
                    Slot::CommentsList,
                    comment_nodes(item, &comments, &self.member),
                );
                self.feed.fill(item, Slot::CommentsPager, comment_pager(item, &page));
            }
            Err(err) => {
                warn!("comment list unavailable: {}", err);
                self.clear_comments(item);
            }
        }
    }

    fn clear_comments(&self, item: ItemId) {
        self.update_post(item, |post| post.deletable_comments.clear());
        self.feed.fill(item, Slot::CommentsList, Vec::new());
        self.feed.fill(item, Slot::CommentsPager, Vec::new());
    }

    /// Refreshes the comment count from page 1's descriptor without touching
    /// the (hidden) thread.
    pub async fn refresh_comment_count(&self, item: ItemId) {
        let state = match self.post_state(item) {
            Some(state) => state,
            None => return,
        };
        match self
            .gateway
            .comment_page(&state.board_title, state.post_num, 1)
            .await
        {
            Ok(page) => {
                self.update_post(item, |post| post.counters.comment_count = page.total_post_count);
                self.redraw_comment_link(item);
            }
            Err(err) => debug!("comment count refresh skipped: {}", err),
        }
    }

    pub fn toggle_comment_form(&self, item: ItemId) {
        let open = match self.update_post(item, |post| {
            post.form_open = !post.form_open;
            post.form_open
        }) {
            Some(open) => open,
            None => return,
        };
        self.feed.set_hidden(item, Slot::CommentForm, !open);
        self.sync_comment_divider(item);
        if open {
            self.feed.focus_comment_draft(item);
        }
    }

    /// Validates the draft before any request, then runs
    /// add, update-count and reload (or count refresh) in order. A failure
    /// part way leaves whatever already succeeded in place.
    pub async fn submit_comment(&self, item: ItemId) {
        let state = match self.post_state(item) {
            Some(state) => state,
            None => return,
        };
        let draft = self.feed.read_comment_draft(item);
        let content = draft.content.trim();
        if content.is_empty() {
            self.feed.alert(EMPTY_COMMENT);
            return;
        }
        let comment = if self.member.logged_in {
            NewComment::member(state.post_num, &self.member.id, content)
        } else {
            let nickname = draft.nickname.trim();
            let password = draft.password.trim();
            if nickname.is_empty() {
                self.feed.alert(MISSING_NICKNAME);
                return;
            }
            if password.is_empty() {
                self.feed.alert(MISSING_PASSWORD);
                return;
            }
            NewComment::visitor(state.post_num, nickname, password, content)
        };

        let added = async {
            self.gateway.add_comment(&state.board_title, &comment).await?;
            self.gateway
                .update_comment_count(&state.board_title, state.post_num)
                .await
        }
        .await;
        if let Err(err) = added {
            warn!("comment submission failed: {}", err);
            self.system_message(COMMENT_FAILED);
            return;
        }

        let comments_open = self
            .post_state(item)
            .map_or(false, |post| post.comments_open);
        if comments_open {
            self.load_comments(item, 1).await;
        } else {
            self.refresh_comment_count(item).await;
        }
        self.feed.reset_comment_draft(item);
    }

    pub async fn delete_comment(&self, item: ItemId, comment_num: i64) {
        let state = match self.post_state(item) {
            Some(state) => state,
            None => return,
        };
        if !state.deletable_comments.contains(&comment_num) {
            warn!("comment {} is not deletable by this member", comment_num);
            return;
        }
        let deleted = async {
            self.gateway
                .delete_comment(&state.board_title, comment_num)
                .await?;
            self.gateway
                .update_comment_count(&state.board_title, state.post_num)
                .await
        }
        .await;
        match deleted {
            Ok(()) => self.load_comments(item, state.comment_page).await,
            Err(err) => {
                warn!("comment deletion failed: {}", err);
                self.system_message(COMMENT_DELETE_FAILED);
            }
        }
    }

    pub fn toggle_menu(&self, item: ItemId) {
        let open = match self.update_post(item, |post| {
            post.menu_open = !post.menu_open;
            post.menu_open
        }) {
            Some(open) => open,
            None => return,
        };
        self.feed.set_hidden(item, Slot::PostMenu, !open);
        self.feed.set_attribute(
            item,
            Slot::PostMenuToggle,
            "aria-expanded",
            if open { "true" } else { "false" },
        );
    }

    pub async fn handle(&self, action: FeedAction) {
        debug!("feed action {} on item {}", action.name(), action.item());
        match action {
            FeedAction::ToggleRecommend(item) => self.toggle_recommendation(item).await,
            FeedAction::ToggleComments(item) => self.toggle_comments(item).await,
            FeedAction::ToggleCommentForm(item) => self.toggle_comment_form(item),
            FeedAction::SubmitComment(item) => self.submit_comment(item).await,
            FeedAction::DeleteComment(item, comment_num) => {
                self.delete_comment(item, comment_num).await
            }
            FeedAction::CommentPage(item, page) => self.load_comments(item, page).await,
            FeedAction::TogglePostMenu(item) => self.toggle_menu(item),
        }
    }

    async fn related_links(&self, related: &[RelatedPost]) -> Vec<RelatedLink> {
        let mut links = Vec::new();
        for post in related {
            let board_title = match post.board_title.as_deref().filter(|title| !title.is_empty()) {
                Some(title) => title,
                None => continue,
            };
            let post_num = match post.post_num {
                Some(post_num) => post_num,
                None => continue,
            };
            let display_name = self.board_titles.display_name(board_title).await;
            let title = post
                .title
                .as_deref()
                .filter(|title| !title.is_empty())
                .unwrap_or(UNTITLED);
            let href = post
                .url
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| post_href(board_title, post_num));
            links.push(RelatedLink {
                href,
                label: format!("[{}] {}번 | {}", display_name, post_num, title),
            });
        }
        links
    }

    fn fill_answer(&self, item: ItemId, text: &str) {
        self.feed.fill(
            item,
            Slot::ChatAnswer,
            vec![answer_line(SafeHtml::from_text_with_breaks(text))],
        );
    }

    fn fill_usage(&self, item: ItemId, usage_text: Option<&str>) {
        if let Some(usage) = usage_text.filter(|usage| !usage.is_empty()) {
            self.feed.fill(item, Slot::ChatMeta, vec![Node::from(usage)]);
        }
    }

    async fn show_reply(&self, item: ItemId, reply: ChatReply) {
        self.fill_usage(item, reply.usage_text.as_deref());
        let answer = reply
            .answer
            .as_deref()
            .filter(|answer| !answer.is_empty())
            .unwrap_or(NO_ANSWER);
        self.fill_answer(item, answer);

        let links = self.related_links(&reply.related_posts).await;
        if links.is_empty() {
            self.feed.set_hidden(item, Slot::ChatRelated, true);
        } else {
            self.feed.fill(item, Slot::ChatRelated, related_nodes(&links));
            self.feed.set_hidden(item, Slot::ChatRelated, false);
        }
    }

    /// One chat turn: the question is shown at once with a placeholder that
    /// the answer (or the failure) replaces.
    pub async fn ask(&self, question: &str) {
        let question = question.trim();
        if question.is_empty() {
            self.system_message(EMPTY_QUESTION);
            return;
        }
        if question.chars().count() > self.config.max_question_chars {
            self.system_message(QUESTION_TOO_LONG);
            return;
        }

        self.open_widget();
        let item = self.allocate();
        self.feed.append(item, chat_item(item, question));

        match self.gateway.chat(question).await {
            Ok(reply) => self.show_reply(item, reply).await,
            Err(GatewayError::Assistant {
                status,
                error,
                usage_text,
            }) => {
                warn!("assistant answered HTTP {}", status);
                self.fill_usage(item, usage_text.as_deref());
                let message = error
                    .filter(|error| !error.is_empty())
                    .unwrap_or_else(|| format!("AI 요청에 실패했습니다. ({})", status));
                self.fill_answer(item, &message);
            }
            Err(err) => {
                warn!("assistant unavailable: {}", err);
                self.fill_answer(item, CHAT_FAILED);
            }
        }
    }

    pub async fn execute(&self, command: Command) {
        debug!("command {:?}", command);
        match command {
            Command::Help => self.system_message(HELP_TEXT),
            Command::Clear => {
                self.feed.clear_transcript();
                self.open_widget();
            }
            Command::Close => self.collapse(),
            Command::Open(route) => self.open_route(&route).await,
            Command::Read {
                board_title,
                post_num,
            } => self.open_post(&board_title, post_num).await,
            Command::Ask(question) => self.ask(&question).await,
            Command::Usage(usage) => self.system_message(usage),
        }
    }

    /// Runs one input line. Returns `false`, with no side effect, when the
    /// line is not a command this terminal handles.
    pub async fn run_command(&self, raw: &str) -> bool {
        match Command::parse(raw, self.origin()) {
            Some(command) => {
                self.execute(command).await;
                true
            }
            None => false,
        }
    }
}
