//! Plugin manifest definition

use serde::{Deserialize, Serialize};

use crate::application::errors::PluginError;
use crate::domain::entities::{
    BanPolicy, CommandItem, CommandMatcher, PermissionRequirements, PrefixEntry, PrefixSpec,
};
use regex_lite::Regex;

/// A literal word or a `{pattern: ...}` regular expression
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PatternOrWord {
    Word(String),
    Pattern { pattern: String },
}

/// `command:` field. `false` declares a listener-only plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Enabled(bool),
    Word(String),
    Pattern { pattern: String },
    List(Vec<PatternOrWord>),
}

/// `custom-prefix:` field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PrefixField {
    Literal(String),
    Pattern { pattern: String },
    List(Vec<PatternOrWord>),
}

/// Plugin metadata, one YAML document per plugin
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PluginManifest {
    /// Defaults to the file stem
    pub name: Option<String>,

    /// Catalog key of the compiled-in handler; defaults to the plugin name
    pub handler: Option<String>,

    pub command: Option<CommandSpec>,
    pub custom_prefix: Option<PrefixField>,
    pub tags: Vec<String>,
    pub help: Vec<String>,
    pub disabled: bool,
    pub permissions: PermissionRequirements,
    pub exp: Option<i64>,
    pub limit: i64,
    pub level: i64,
    pub ban_policy: Option<BanPolicy>,
}

fn compile(name: &str, pattern: &str) -> Result<Regex, PluginError> {
    Regex::new(pattern).map_err(|e| PluginError::Malformed {
        name: name.to_string(),
        reason: format!("invalid pattern '{}': {}", pattern, e),
    })
}

impl PluginManifest {
    pub fn parse(name: &str, source: &str) -> Result<Self, PluginError> {
        let manifest: PluginManifest = serde_yaml::from_str(source).map_err(|e| PluginError::Malformed {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(declared) = &manifest.name {
            if declared != name {
                return Err(PluginError::Malformed {
                    name: name.to_string(),
                    reason: format!("manifest declares name '{}'", declared),
                });
            }
        }
        Ok(manifest)
    }

    pub fn handler_key<'a>(&'a self, name: &'a str) -> &'a str {
        self.handler.as_deref().unwrap_or(name)
    }

    /// `command: false` marks a listener
    pub fn is_listener(&self) -> bool {
        matches!(self.command, Some(CommandSpec::Enabled(false)))
    }

    /// Compile the command field. `None` means never reachable by command.
    pub fn command_matcher(&self, name: &str) -> Result<Option<CommandMatcher>, PluginError> {
        let Some(spec) = &self.command else {
            return Ok(None);
        };
        let matcher = match spec {
            CommandSpec::Enabled(false) => return Ok(None),
            CommandSpec::Enabled(true) => {
                return Err(PluginError::Malformed {
                    name: name.to_string(),
                    reason: "command must be false, a word, a pattern or a list".to_string(),
                })
            }
            CommandSpec::Word(word) => CommandMatcher::Literal(word.clone()),
            CommandSpec::Pattern { pattern } => CommandMatcher::Pattern(compile(name, pattern)?),
            CommandSpec::List(items) => CommandMatcher::List(
                items
                    .iter()
                    .map(|item| match item {
                        PatternOrWord::Word(word) => Ok(CommandItem::Literal(word.clone())),
                        PatternOrWord::Pattern { pattern } => compile(name, pattern).map(CommandItem::Pattern),
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(Some(matcher))
    }

    pub fn prefix(&self, name: &str) -> Result<Option<PrefixSpec>, PluginError> {
        let Some(field) = &self.custom_prefix else {
            return Ok(None);
        };
        let spec = match field {
            PrefixField::Literal(literal) => PrefixSpec::Literal(literal.clone()),
            PrefixField::Pattern { pattern } => PrefixSpec::Pattern(compile(name, pattern)?),
            PrefixField::List(items) => PrefixSpec::List(
                items
                    .iter()
                    .map(|item| match item {
                        PatternOrWord::Word(word) => Ok(PrefixEntry::Literal(word.clone())),
                        PatternOrWord::Pattern { pattern } => compile(name, pattern).map(PrefixEntry::Pattern),
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(Some(spec))
    }
}
