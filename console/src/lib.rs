extern crate sc_terminal_frontend;

use std::io::Write;

use clap::Parser;
use thiserror::Error;
use url::Url;

use sc_terminal_frontend::{MemberMeta, TerminalConfig};

pub mod text_feed;
pub mod transport;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Line-oriented front end for the board terminal.
#[derive(Debug, Clone, Parser)]
#[command(name = "sc-terminal", version)]
pub struct Args {
    /// Origin of the board server.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    /// Member id to act as; without it the session is anonymous.
    #[arg(long)]
    pub member_id: Option<String>,
    #[arg(long, default_value = "")]
    pub nickname: String,
    #[arg(long, default_value_t = 0)]
    pub grade: i64,
    /// Longest question `ask` accepts, in characters.
    #[arg(long)]
    pub max_question: Option<usize>,
}

impl Args {
    pub fn origin(&self) -> Result<Url, ConsoleError> {
        Ok(Url::parse(&self.base_url)?)
    }

    pub fn member(&self) -> MemberMeta {
        match self.member_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => MemberMeta {
                id: id.to_owned(),
                grade: self.grade,
                logged_in: true,
                nickname: self.nickname.clone(),
            },
            None => MemberMeta::anonymous(),
        }
    }

    pub fn config(&self) -> TerminalConfig {
        let defaults = TerminalConfig::default();
        TerminalConfig {
            max_question_chars: self
                .max_question
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.max_question_chars),
            ..defaults
        }
    }
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("invalid --base-url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("http client could not be built: {0}")]
    Client(#[from] reqwest::Error),
    #[error("stdin: {0}")]
    Io(#[from] std::io::Error),
}

pub fn init_logger() {
    env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}
