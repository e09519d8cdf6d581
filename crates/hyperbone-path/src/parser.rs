//! Attribute path parser.
//!
//! Grammar: segments separated by `.`, each segment a non-empty name followed
//! by zero or more `[n]` index suffixes. The first segment may be a bare index
//! (`[0].name`) so that paths can be rooted at a collection.

use crate::types::{Path, PathStep};
use crate::util::is_valid_index;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("empty path segment at {position}")]
    EmptySegment { position: usize },
    #[error("unclosed index bracket at {position}")]
    UnclosedIndex { position: usize },
    #[error("invalid index '{text}' at {position}")]
    InvalidIndex { position: usize, text: String },
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedChar { position: usize, ch: char },
}

/// Attribute path parser.
pub struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    /// Parse a path string into steps.
    pub fn parse(input: &'a str) -> Result<Path, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }
        let mut parser = Self { input, pos: 0 };
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<Path, PathError> {
        let mut steps = Vec::new();

        loop {
            let start = self.pos;
            let name = self.parse_name();
            if name.is_empty() {
                let leading_index = steps.is_empty() && self.peek() == Some('[');
                if !leading_index {
                    return Err(PathError::EmptySegment { position: start });
                }
            } else {
                steps.push(PathStep::Key(name.to_string()));
            }

            while self.peek() == Some('[') {
                let index = self.parse_index()?;
                steps.push(PathStep::Index(index));
            }

            match self.peek() {
                None => break,
                Some('.') => self.advance(),
                Some(ch) => {
                    return Err(PathError::UnexpectedChar {
                        position: self.pos,
                        ch,
                    })
                }
            }
        }

        Ok(steps)
    }

    fn parse_name(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if matches!(ch, '.' | '[' | ']') {
                break;
            }
            self.advance();
        }
        &self.input[start..self.pos]
    }

    fn parse_index(&mut self) -> Result<usize, PathError> {
        let open = self.pos;
        self.advance();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == ']' {
                break;
            }
            self.advance();
        }
        if self.is_at_end() {
            return Err(PathError::UnclosedIndex { position: open });
        }
        let text = &self.input[start..self.pos];
        self.advance();

        let invalid = || PathError::InvalidIndex {
            position: start,
            text: text.to_string(),
        };
        if !is_valid_index(text) {
            return Err(invalid());
        }
        text.parse().map_err(|_| invalid())
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}
