use crate::route::parse_int_prefix;

pub const DEFAULT_MAX_QUESTION_CHARS: usize = 800;

/// Widget behaviour switches. The browser reads overrides from `data-*`
/// attributes on the terminal root; the console builds it from flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Render boards and posts inline instead of navigating to them.
    pub inline_feed: bool,
    pub max_question_chars: usize,
    /// Short labels and a collapsible post menu, for narrow viewports.
    pub compact_menu: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            inline_feed: true,
            max_question_chars: DEFAULT_MAX_QUESTION_CHARS,
            compact_menu: false,
        }
    }
}

impl TerminalConfig {
    pub fn from_attributes<F>(lookup: F, narrow_viewport: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = TerminalConfig::default();
        TerminalConfig {
            inline_feed: match lookup("data-feed").as_deref() {
                Some("off") | Some("false") => false,
                _ => defaults.inline_feed,
            },
            max_question_chars: lookup("data-max-question")
                .and_then(|value| parse_int_prefix(&value))
                .filter(|value| *value > 0)
                .map(|value| value as usize)
                .unwrap_or(defaults.max_question_chars),
            compact_menu: narrow_viewport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_attributes() {
        let config = TerminalConfig::from_attributes(|_| None, false);
        assert_eq!(config, TerminalConfig::default());
    }

    #[test]
    fn attributes_override_defaults() {
        let config = TerminalConfig::from_attributes(
            |name| match name {
                "data-feed" => Some("off".into()),
                "data-max-question" => Some("120".into()),
                _ => None,
            },
            true,
        );
        assert!(!config.inline_feed);
        assert_eq!(config.max_question_chars, 120);
        assert!(config.compact_menu);
    }

    #[test]
    fn non_positive_question_limit_is_ignored() {
        let config = TerminalConfig::from_attributes(
            |name| (name == "data-max-question").then(|| "0".to_string()),
            false,
        );
        assert_eq!(config.max_question_chars, DEFAULT_MAX_QUESTION_CHARS);
    }
}
