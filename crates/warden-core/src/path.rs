//! # Path Expressions
//!
//! Parsing and evaluation of the path expressions used by lookup keys:
//! dotted field names with optional integer subscripts, e.g.
//! `Tags[0].Value` or `Instances[2].State.Name`.
//!
//! Evaluation is a pure walk over a `serde_json::Value`. An absent field,
//! an out-of-range subscript, or a type mismatch along the way yields
//! `None` — "absent" is an ordinary outcome, not an error. Only a
//! malformed expression is a [`PathError`].

use serde_json::Value;
use thiserror::Error;

/// Errors raised while parsing a path expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The expression is empty or whitespace.
    #[error("path expression is empty")]
    Empty,

    /// A dotted segment carries neither a field name nor a subscript.
    #[error("path expression {expr:?} has an empty segment")]
    EmptySegment {
        /// The full expression being parsed.
        expr: String,
    },

    /// An index subscript is missing its closing bracket.
    #[error("path expression {expr:?} has an unclosed index subscript")]
    UnclosedIndex {
        /// The full expression being parsed.
        expr: String,
    },

    /// An index subscript is not a non-negative integer.
    #[error("path expression {expr:?} has a non-numeric index {index:?}")]
    InvalidIndex {
        /// The full expression being parsed.
        expr: String,
        /// The offending subscript content.
        index: String,
    },

    /// Characters follow a closing bracket inside one segment.
    #[error("path expression {expr:?} has trailing characters after an index subscript")]
    TrailingCharacters {
        /// The full expression being parsed.
        expr: String,
    },
}

/// One step of a parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Descend into an object field.
    Field(String),
    /// Descend into an array element.
    Index(usize),
}

/// A parsed path expression, ready for repeated evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    segments: Vec<Segment>,
}

impl PathExpr {
    /// Parse an expression like `Tags[0].Value` into its segments.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] describing the first syntactic problem
    /// found.
    pub fn parse(expr: &str) -> Result<Self, PathError> {
        if expr.trim().is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        for part in expr.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };

            if name.is_empty() && rest.is_empty() {
                return Err(PathError::EmptySegment {
                    expr: expr.to_string(),
                });
            }
            if !name.is_empty() {
                segments.push(Segment::Field(name.to_string()));
            }

            while !rest.is_empty() {
                if !rest.starts_with('[') {
                    return Err(PathError::TrailingCharacters {
                        expr: expr.to_string(),
                    });
                }
                let close = rest.find(']').ok_or_else(|| PathError::UnclosedIndex {
                    expr: expr.to_string(),
                })?;
                let digits = &rest[1..close];
                let index = digits.parse::<usize>().map_err(|_| PathError::InvalidIndex {
                    expr: expr.to_string(),
                    index: digits.to_string(),
                })?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
            }
        }

        Ok(Self { segments })
    }

    /// Walk the expression down from `root`.
    ///
    /// Returns `None` as soon as a segment cannot be followed.
    pub fn eval<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match segment {
                Segment::Field(name) => current.as_object()?.get(name)?,
                Segment::Index(index) => current.as_array()?.get(*index)?,
            };
        }
        Some(current)
    }
}

/// Parse and evaluate an expression in one step.
///
/// # Errors
///
/// Returns a [`PathError`] if the expression is malformed; an absent
/// value is `Ok(None)`.
pub fn search<'a>(expr: &str, root: &'a Value) -> Result<Option<&'a Value>, PathError> {
    Ok(PathExpr::parse(expr)?.eval(root))
}
