//! Segment definition parsing.
//!
//! A definition is a list of conditions joined by `;` (AND) and `,` (OR),
//! with OR binding tighter: `a==1;b==2,c==3` reads as
//! `a==1 AND (b==2 OR c==3)`. A backslash escapes the next character, so
//! separators can appear inside values. Values are otherwise kept as given,
//! usually URL-encoded.

use std::fmt;

use insight_core::ValidationError;
use serde::{Deserialize, Serialize};

const AND: char = ';';
const OR: char = ',';
const ESCAPE: char = '\\';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOperator {
    Equals,
    NotEquals,
    LessThanOrEqual,
    GreaterThanOrEqual,
    LessThan,
    GreaterThan,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
}

impl MatchOperator {
    /// Two-character tokens first so `<=` is not read as `<`.
    const SCAN_ORDER: [MatchOperator; 10] = [
        Self::Equals,
        Self::NotEquals,
        Self::LessThanOrEqual,
        Self::GreaterThanOrEqual,
        Self::Contains,
        Self::DoesNotContain,
        Self::StartsWith,
        Self::EndsWith,
        Self::LessThan,
        Self::GreaterThan,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::Contains => "=@",
            Self::DoesNotContain => "!@",
            Self::StartsWith => "=^",
            Self::EndsWith => "=$",
        }
    }

    fn at_start_of(s: &str) -> Option<Self> {
        Self::SCAN_ORDER
            .into_iter()
            .find(|op| s.starts_with(op.token()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub dimension: String,
    pub operator: MatchOperator,
    pub value: String,
}

/// Parsed definition: every block must match, and a block matches when any
/// of its conditions does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentExpression {
    pub blocks: Vec<Vec<Condition>>,
}

impl SegmentExpression {
    pub fn parse(definition: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidSegmentDefinition {
            definition: definition.to_string(),
            reason,
        };

        if definition.trim().is_empty() {
            return Err(ValidationError::Required("segment definition"));
        }

        let mut blocks = Vec::new();
        for block in split_unescaped(definition, AND) {
            let mut conditions = Vec::new();
            for raw in split_unescaped(block, OR) {
                conditions.push(parse_condition(raw).map_err(&invalid)?);
            }
            blocks.push(conditions);
        }
        Ok(Self { blocks })
    }

    /// Dimension names in order of appearance, without duplicates.
    pub fn dimensions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for cond in self.blocks.iter().flatten() {
            if !seen.contains(&cond.dimension.as_str()) {
                seen.push(&cond.dimension);
            }
        }
        seen
    }
}

impl fmt::Display for SegmentExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                write!(f, "{AND}")?;
            }
            for (j, cond) in block.iter().enumerate() {
                if j > 0 {
                    write!(f, "{OR}")?;
                }
                write!(f, "{}{}", cond.dimension, cond.operator.token())?;
                for c in cond.value.chars() {
                    if matches!(c, AND | OR | ESCAPE) {
                        write!(f, "{ESCAPE}")?;
                    }
                    write!(f, "{c}")?;
                }
            }
        }
        Ok(())
    }
}

fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == ESCAPE {
            escaped = true;
        } else if c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_condition(raw: &str) -> Result<Condition, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty condition".to_string());
    }

    let (split_at, operator) = raw
        .char_indices()
        .find_map(|(i, _)| MatchOperator::at_start_of(&raw[i..]).map(|op| (i, op)))
        .ok_or_else(|| format!("condition '{raw}' has no comparison operator"))?;

    let dimension = &raw[..split_at];
    if dimension.is_empty() {
        return Err(format!("condition '{raw}' has no dimension"));
    }
    if !dimension
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(format!("invalid dimension name '{dimension}'"));
    }

    let value = unescape(&raw[split_at + operator.token().len()..]);
    Ok(Condition {
        dimension: dimension.to_string(),
        operator,
        value,
    })
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}
