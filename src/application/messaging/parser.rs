//! Prefix/command matcher - resolves the activation prefix and command token

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::domain::entities::{CommandItem, CommandMatcher, PrefixEntry, PrefixMatch, PrefixSpec};

const DEFAULT_PREFIX_PATTERN: &str = r"^[\x{200E}xzXZ/i!#$%+£¢€¥^°=¶∆×÷π√✓©®:;?&.\-]";

/// Global default prefix: a single leading symbol from a fixed set
pub static DEFAULT_PREFIX: Lazy<PrefixSpec> = Lazy::new(|| {
    Regex::new(DEFAULT_PREFIX_PATTERN)
        .map(PrefixSpec::Pattern)
        .unwrap_or_else(|e| {
            tracing::error!("Default prefix pattern rejected: {}", e);
            PrefixSpec::Literal("/".to_string())
        })
});

/// Literal prefixes only match at the start of the text
fn find_literal(literal: &str, text: &str) -> Option<String> {
    (!literal.is_empty() && text.starts_with(literal)).then(|| literal.to_string())
}

fn find_in(pattern: &Regex, text: &str) -> Option<String> {
    pattern.find(text).map(|m| m.as_str().to_string())
}

impl PrefixSpec {
    /// The matched prefix text of the first entry that matches
    pub fn find(&self, text: &str) -> Option<String> {
        match self {
            PrefixSpec::Pattern(re) => find_in(re, text),
            PrefixSpec::Literal(lit) => find_literal(lit, text),
            PrefixSpec::List(entries) => entries.iter().find_map(|entry| match entry {
                PrefixEntry::Pattern(re) => find_in(re, text),
                PrefixEntry::Literal(lit) => find_literal(lit, text),
            }),
        }
    }
}

impl CommandMatcher {
    /// Whether the case-folded command token is accepted
    pub fn accepts(&self, command: &str) -> bool {
        match self {
            CommandMatcher::Pattern(re) => re.is_match(command),
            CommandMatcher::Literal(lit) => lit.to_lowercase() == command,
            CommandMatcher::List(items) => items.iter().any(|item| match item {
                CommandItem::Pattern(re) => re.is_match(command),
                CommandItem::Literal(lit) => lit.to_lowercase() == command,
            }),
        }
    }
}

/// Resolves prefixes with plugin > connection > global precedence
#[derive(Debug, Clone, Default)]
pub struct MessageParser {
    connection_prefix: Option<PrefixSpec>,
}

impl MessageParser {
    pub fn new(connection_prefix: Option<PrefixSpec>) -> Self {
        Self { connection_prefix }
    }

    /// Build the connection-level prefix from configured literals
    pub fn from_literals(prefixes: &[String]) -> Self {
        let spec = match prefixes {
            [] => None,
            [single] => Some(PrefixSpec::Literal(single.clone())),
            many => Some(PrefixSpec::List(
                many.iter().cloned().map(PrefixEntry::Literal).collect(),
            )),
        };
        Self::new(spec)
    }

    pub fn effective_prefix<'a>(&'a self, custom: Option<&'a PrefixSpec>) -> &'a PrefixSpec {
        custom
            .or(self.connection_prefix.as_ref())
            .unwrap_or(&DEFAULT_PREFIX)
    }

    /// Split text into prefix, command and arguments
    pub fn parse(&self, text: &str, custom: Option<&PrefixSpec>) -> Option<PrefixMatch> {
        let used_prefix = self.effective_prefix(custom).find(text)?;
        if used_prefix.is_empty() {
            return None;
        }

        let no_prefix = text.replacen(&used_prefix, "", 1);
        let trimmed = no_prefix.trim();
        let mut tokens = trimmed.split_whitespace();
        let command = tokens.next().unwrap_or_default().to_lowercase();
        let args = tokens.map(str::to_string).collect();
        let rest = trimmed
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_default();

        Some(PrefixMatch {
            used_prefix,
            no_prefix,
            command,
            args,
            text: rest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix_splits_command() {
        let parser = MessageParser::default();
        let m = parser.parse(".Ping  hello   world", None).unwrap();
        assert_eq!(m.used_prefix, ".");
        assert_eq!(m.command, "ping");
        assert_eq!(m.args, vec!["hello", "world"]);
        assert_eq!(m.text, " hello   world");
    }

    #[test]
    fn test_no_prefix_no_match() {
        let parser = MessageParser::default();
        assert!(parser.parse("hello there", None).is_none());
        assert!(parser.parse("", None).is_none());
    }

    #[test]
    fn test_connection_prefix_overrides_default() {
        let parser = MessageParser::from_literals(&["!!".to_string()]);
        assert!(parser.parse(".ping", None).is_none());
        let m = parser.parse("!!ping", None).unwrap();
        assert_eq!(m.used_prefix, "!!");
        assert_eq!(m.command, "ping");
    }

    #[test]
    fn test_custom_prefix_wins() {
        let parser = MessageParser::from_literals(&["!".to_string()]);
        let custom = PrefixSpec::Pattern(Regex::new(r"^(hey|yo)\s+").unwrap());
        let m = parser.parse("yo weather paris", Some(&custom)).unwrap();
        assert_eq!(m.used_prefix, "yo ");
        assert_eq!(m.command, "weather");
        assert_eq!(m.args, vec!["paris"]);
    }

    #[test]
    fn test_literals_are_literal_and_anchored() {
        let spec = PrefixSpec::Literal("$.".to_string());
        assert_eq!(spec.find("$.menu"), Some("$.".to_string()));
        assert_eq!(spec.find("$xmenu"), None);
        assert_eq!(spec.find("say $.menu"), None);
    }

    #[test]
    fn test_first_matching_list_entry_wins() {
        let spec = PrefixSpec::List(vec![
            PrefixEntry::Literal("#".to_string()),
            PrefixEntry::Pattern(Regex::new(r"^bot,?\s*").unwrap()),
            PrefixEntry::Literal("b".to_string()),
        ]);
        assert_eq!(spec.find("bot, status"), Some("bot, ".to_string()));
        assert_eq!(spec.find("#status"), Some("#".to_string()));
        assert_eq!(spec.find("status"), None);
    }

    #[test]
    fn test_command_acceptance() {
        assert!(CommandMatcher::Literal("Ping".to_string()).accepts("ping"));
        assert!(!CommandMatcher::Literal("ping".to_string()).accepts("pingg"));

        let list = CommandMatcher::List(vec![
            CommandItem::Literal("menu".to_string()),
            CommandItem::Pattern(Regex::new(r"^help\d*$").unwrap()),
        ]);
        assert!(list.accepts("menu"));
        assert!(list.accepts("help2"));
        assert!(!list.accepts("helpme"));

        let pattern = CommandMatcher::Pattern(Regex::new(r"^(ban|kick)$").unwrap());
        assert!(pattern.accepts("kick"));
        assert!(!pattern.accepts("kicks"));
    }

    #[test]
    fn test_non_ascii_command() {
        let parser = MessageParser::default();
        let m = parser.parse(".قائمة الكل", None).unwrap();
        assert_eq!(m.command, "قائمة");
        assert_eq!(m.args, vec!["الكل"]);
    }
}
