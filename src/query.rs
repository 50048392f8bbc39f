use std::str::FromStr;

use serde::Deserialize;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, repeat};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::error::{DiagramError, Result};
use crate::model::Node;

/// Node search criteria. Every supplied field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeQuery {
    /// Case-insensitive substring of the label.
    pub label: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
}

impl NodeQuery {
    pub fn label(label: impl Into<String>) -> Self {
        NodeQuery {
            label: Some(label.into()),
            ..NodeQuery::default()
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        NodeQuery {
            tag: Some(tag.into()),
            ..NodeQuery::default()
        }
    }

    pub fn node_type(node_type: impl Into<String>) -> Self {
        NodeQuery {
            node_type: Some(node_type.into()),
            ..NodeQuery::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn matches(&self, node: &Node) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tags.contains(tag) {
                return false;
            }
        }
        if let Some(node_type) = &self.node_type {
            if &node.node_type != node_type {
                return false;
            }
        }
        match self.label.as_deref().filter(|l| !l.is_empty()) {
            Some(label) => node.label.to_lowercase().contains(&label.to_lowercase()),
            None => true,
        }
    }

    /// Parses `label:api tag:"public edge" type:service gateway`.
    ///
    /// Bare words are joined into the label filter; a later key overrides an
    /// earlier one.
    pub fn parse(input: &str) -> Result<Self> {
        let mut rest = input.trim();
        let terms: Vec<Term> = repeat(0.., delimited(multispace0, term, multispace0))
            .parse_next(&mut rest)
            .map_err(|_| DiagramError::invalid(format!("malformed query `{input}`")))?;
        if !rest.is_empty() {
            return Err(DiagramError::invalid(format!(
                "malformed query near `{}`",
                truncate(rest, 40)
            )));
        }

        let mut query = NodeQuery::default();
        let mut words: Vec<String> = Vec::new();
        for t in terms {
            match t {
                Term::Word(word) => words.push(word),
                Term::Keyed(key, value) => {
                    let value =
                        value.ok_or_else(|| DiagramError::invalid(format!("`{key}:` needs a value")))?;
                    match key.as_str() {
                        "label" => query.label = Some(value),
                        "tag" => query.tag = Some(value),
                        "type" => query.node_type = Some(value),
                        other => {
                            return Err(DiagramError::invalid(format!(
                                "unknown query key `{other}` (expected label, tag or type)"
                            )));
                        }
                    }
                }
            }
        }
        if !words.is_empty() {
            query.label = Some(words.join(" "));
        }
        Ok(query)
    }
}

impl FromStr for NodeQuery {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self> {
        NodeQuery::parse(s)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

#[derive(Debug)]
enum Term {
    Keyed(String, Option<String>),
    Word(String),
}

fn term(input: &mut &str) -> winnow::Result<Term> {
    alt((
        (key, ':', opt(value)).map(|(k, _, v)| Term::Keyed(k.to_string(), v)),
        value.map(Term::Word),
    ))
    .parse_next(input)
}

fn key<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

fn value(input: &mut &str) -> winnow::Result<String> {
    alt((quoted, bare)).parse_next(input)
}

fn quoted(input: &mut &str) -> winnow::Result<String> {
    delimited('"', take_while(0.., |c: char| c != '"'), '"')
        .map(str::to_string)
        .parse_next(input)
}

fn bare(input: &mut &str) -> winnow::Result<String> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '"')
        .map(str::to_string)
        .parse_next(input)
}
