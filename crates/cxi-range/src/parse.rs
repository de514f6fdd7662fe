use std::str::FromStr;

use crate::error::RangeSyntaxError;
use crate::range::IdRange;

/// Character-level parser for the id range grammar.
pub(crate) struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Parse one `[from,to]` range.
    pub(crate) fn range<T: FromStr + Clone + PartialEq>(
        &mut self,
    ) -> Result<IdRange<T>, RangeSyntaxError> {
        self.skip_whitespace();
        let from_inclusive = match self.peek() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(RangeSyntaxError::ExpectedOpen { position: self.pos }),
        };
        self.pos += 1;

        let from = self.id::<T>()?;
        let (from, to) = if self.peek() == Some(',') {
            self.pos += 1;
            let to = self.id::<T>()?;
            if let Some(found @ ',') = self.peek() {
                return Err(RangeSyntaxError::Unexpected {
                    position: self.pos,
                    found,
                });
            }
            (from, to)
        } else {
            let to = from.clone();
            (from, to)
        };

        let to_inclusive = match self.peek() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(RangeSyntaxError::ExpectedClose { position: self.pos }),
        };
        self.pos += 1;

        Ok(IdRange::new(from, from_inclusive, to, to_inclusive))
    }

    /// Parse an optional id, stopping at a separator or a closing bracket.
    fn id<T: FromStr>(&mut self) -> Result<Option<T>, RangeSyntaxError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ',' | ']' | ')') {
                break;
            }
            if matches!(c, '[' | '(') {
                return Err(RangeSyntaxError::Unexpected {
                    position: self.pos,
                    found: c,
                });
            }
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(RangeSyntaxError::ExpectedClose { position: self.pos });
        }

        let raw: String = self.chars[start..self.pos].iter().collect();
        let text = raw.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let offset = raw.len() - raw.trim_start().len();
        text.parse().map(Some).map_err(|_| RangeSyntaxError::InvalidId {
            position: start + raw[..offset].chars().count(),
            text: text.to_string(),
        })
    }

    /// Consume a list separator. Returns `false` at end of input.
    pub(crate) fn separator(&mut self) -> Result<bool, RangeSyntaxError> {
        self.skip_whitespace();
        match self.peek() {
            None => Ok(false),
            Some(',') => {
                self.pos += 1;
                Ok(true)
            }
            Some(found) => Err(RangeSyntaxError::Unexpected {
                position: self.pos,
                found,
            }),
        }
    }

    /// Require that only whitespace remains.
    pub(crate) fn finish(&mut self) -> Result<(), RangeSyntaxError> {
        self.skip_whitespace();
        match self.peek() {
            None => Ok(()),
            Some(found) => Err(RangeSyntaxError::Unexpected {
                position: self.pos,
                found,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<IdRange<i64>, RangeSyntaxError> {
        let mut parser = Parser::new(s);
        let range = parser.range()?;
        parser.finish()?;
        Ok(range)
    }

    #[test]
    fn parses_bounds_and_brackets() {
        let range = parse("(8, 2]").unwrap();
        assert_eq!(range.from(), Some(&8));
        assert_eq!(range.to(), Some(&2));
        assert!(!range.is_from_inclusive());
        assert!(range.is_to_inclusive());
    }

    #[test]
    fn single_id_sets_both_bounds() {
        let range = parse("[42]").unwrap();
        assert_eq!(range.from(), Some(&42));
        assert_eq!(range.to(), Some(&42));
    }

    #[test]
    fn omitted_ids() {
        let range = parse("[,9]").unwrap();
        assert_eq!(range.from(), None);
        assert_eq!(range.to(), Some(&9));

        let range = parse("[5,]").unwrap();
        assert_eq!(range.from(), Some(&5));
        assert_eq!(range.to(), None);
    }

    #[test]
    fn missing_open_bracket() {
        assert_eq!(parse("1,2]"), Err(RangeSyntaxError::ExpectedOpen { position: 0 }));
        assert_eq!(parse(""), Err(RangeSyntaxError::ExpectedOpen { position: 0 }));
    }

    #[test]
    fn missing_close_bracket() {
        assert_eq!(parse("[1,2"), Err(RangeSyntaxError::ExpectedClose { position: 4 }));
    }

    #[test]
    fn too_many_ids() {
        assert_eq!(
            parse("[1,2,3]"),
            Err(RangeSyntaxError::Unexpected {
                position: 4,
                found: ','
            })
        );
    }

    #[test]
    fn invalid_id_reports_its_position() {
        let err = parse("[1, x7]").unwrap_err();
        assert_eq!(
            err,
            RangeSyntaxError::InvalidId {
                position: 4,
                text: "x7".into()
            }
        );
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn nested_bracket_is_unexpected() {
        assert_eq!(
            parse("[[1]"),
            Err(RangeSyntaxError::Unexpected {
                position: 1,
                found: '['
            })
        );
    }
}
