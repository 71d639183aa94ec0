extern crate async_trait;
extern crate futures;
extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod board_titles;
pub mod command;
pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod interceptor;
pub mod markup;
pub mod models;
pub mod render;
pub mod route;
pub mod sanitize;
pub mod session;
pub mod transport;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

#[cfg(test)]
mod testing;

pub use crate::command::Command;
pub use crate::config::TerminalConfig;
pub use crate::controller::Controller;
pub use crate::error::{GatewayError, TransportError};
pub use crate::feed::{CommentDraft, Feed, FeedAction, ItemId, Slot, Visibility};
pub use crate::gateway::Gateway;
pub use crate::route::{
    classify, is_board_url, is_post_url, parse_board_url, parse_post_url, BoardRoute, PostRoute,
    Route,
};
pub use crate::sanitize::{sanitize_html, SafeHtml};
pub use crate::session::MemberMeta;
pub use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
