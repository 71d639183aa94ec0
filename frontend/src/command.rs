//! The terminal's command mini-language.

use url::Url;

use crate::route::{classify, parse_int_prefix, Route};

pub const HELP_TEXT: &str =
    "명령어: help, clear, close, open <url>, read <boardTitle> <postNum>, ask <question>";
pub const READ_USAGE: &str = "사용법: read <boardTitle> <postNum>";
pub const ASK_USAGE: &str = "사용법: ask <question>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    Close,
    Open(Route),
    Read { board_title: String, post_num: i64 },
    Ask(String),
    /// Recognised command with unusable arguments; the text is shown as is.
    Usage(&'static str),
}

impl Command {
    /// Parses one input line. `None` means the line is not a command this
    /// terminal handles, which the host input is free to treat otherwise.
    /// `open` only parses when its target classifies as a post or board.
    pub fn parse(raw: &str, origin: &Url) -> Option<Command> {
        let value = raw.trim();
        let mut tokens = value.split_whitespace();
        let first = tokens.next()?;
        let args: Vec<&str> = tokens.collect();

        match first.to_lowercase().as_str() {
            "help" => Some(Command::Help),
            "clear" => Some(Command::Clear),
            "close" => Some(Command::Close),
            "open" => classify(args.first()?, origin).map(Command::Open),
            "read" if args.len() >= 2 => Some(match parse_int_prefix(args[1]) {
                Some(post_num) => Command::Read {
                    board_title: args[0].to_owned(),
                    post_num,
                },
                None => Command::Usage(READ_USAGE),
            }),
            "ask" | "ai" => {
                let question = value[first.len()..].trim();
                if question.is_empty() {
                    Some(Command::Usage(ASK_USAGE))
                } else {
                    Some(Command::Ask(question.to_owned()))
                }
            }
            _ => None,
        }
    }
}
