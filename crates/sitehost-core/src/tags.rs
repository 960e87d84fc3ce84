//! Project tags and the operator tag allow-list

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeSet;

/// Tag enabling the shared multilang override pages
pub const MULTILANG_TAG: &str = "multilang";

/// Project tags as stored: either a single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tags {
    Single(String),
    Many(Vec<String>),
}

impl Default for Tags {
    fn default() -> Self {
        Tags::Many(Vec::new())
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Anything that is neither a string nor a list means "no tags"
        Ok(match Value::deserialize(deserializer)? {
            Value::String(tag) => Tags::Single(tag),
            Value::Array(items) => Tags::Many(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(tag) => Some(tag),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Tags::default(),
        })
    }
}

impl Tags {
    /// Canonical set form; empty tags are dropped
    pub fn normalized(&self) -> BTreeSet<&str> {
        let tags: Box<dyn Iterator<Item = &String>> = match self {
            Tags::Single(tag) => Box::new(std::iter::once(tag)),
            Tags::Many(tags) => Box::new(tags.iter()),
        };
        tags.map(String::as_str).filter(|t| !t.is_empty()).collect()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.normalized().contains(tag)
    }

    pub fn is_multilang(&self) -> bool {
        self.contains(MULTILANG_TAG)
    }
}

/// Operator-configured set of tags allowed on the short-id routes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedTags(BTreeSet<String>);

impl AllowedTags {
    /// Parse a comma-separated list, e.g. `landing,promo`
    pub fn parse(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            tags.into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        )
    }

    /// Whether any of the project's tags is on the allow-list
    pub fn permits(&self, tags: &Tags) -> bool {
        tags.normalized().iter().any(|t| self.0.contains(*t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
