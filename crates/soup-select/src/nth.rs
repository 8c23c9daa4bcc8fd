//! `An+B` expressions for the `nth-*` pseudo-classes.

use std::fmt;

use crate::error::SelectorError;

/// The arithmetic sequence `interval * k + offset` for `k >= 0`.
///
/// An interval of 0 selects the single position `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NthExpr {
    /// The step `A`.
    pub interval: i64,
    /// The first position `B`.
    pub offset: i64,
}

impl NthExpr {
    /// `even`: positions 2, 4, 6, ...
    pub const EVEN: Self = Self::new(2, 0);
    /// `odd`: positions 1, 3, 5, ...
    pub const ODD: Self = Self::new(2, 1);

    /// Create an expression from its two coefficients.
    #[must_use]
    pub const fn new(interval: i64, offset: i64) -> Self {
        Self { interval, offset }
    }

    /// Parse the argument of an `nth-*` pseudo-class.
    ///
    /// Accepts `even`, `odd`, a bare integer, and `An+B` with an optional,
    /// `+` or `-` coefficient and an optional signed offset. Whitespace is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::InvalidNth`] naming `query` when there is
    /// more than one `n` or a part is not an integer.
    pub fn parse(query: &str) -> Result<Self, SelectorError> {
        let compact: String = query
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let invalid = || SelectorError::InvalidNth {
            query: query.to_string(),
        };

        match compact.as_str() {
            "even" => return Ok(Self::EVEN),
            "odd" => return Ok(Self::ODD),
            _ => {}
        }

        let Some((coefficient, offset)) = compact.split_once('n') else {
            let offset = compact.parse().map_err(|_| invalid())?;
            return Ok(Self::new(0, offset));
        };
        let interval = match coefficient {
            "" | "+" => 1,
            "-" => -1,
            coefficient => coefficient.parse().map_err(|_| invalid())?,
        };
        let offset = if offset.is_empty() {
            0
        } else {
            offset.parse().map_err(|_| invalid())?
        };
        Ok(Self::new(interval, offset))
    }

    /// Whether the 1-based `position` is in the sequence.
    #[must_use]
    pub fn matches(self, position: usize) -> bool {
        let Ok(position) = i64::try_from(position) else {
            return false;
        };
        if self.interval == 0 {
            return position == self.offset;
        }
        let Some(distance) = position.checked_sub(self.offset) else {
            return false;
        };
        distance.checked_rem(self.interval) == Some(0)
            && distance
                .checked_div(self.interval)
                .is_some_and(|steps| steps >= 0)
    }
}

impl fmt::Display for NthExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.interval, self.offset) {
            (0, offset) => write!(f, "{offset}"),
            (interval, 0) => write!(f, "{interval}n"),
            (interval, offset) => write!(f, "{interval}n{offset:+}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(expr: NthExpr, count: usize) -> Vec<usize> {
        (1..=count).filter(|&p| expr.matches(p)).collect()
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(NthExpr::parse("even").unwrap(), NthExpr::new(2, 0));
        assert_eq!(NthExpr::parse(" ODD ").unwrap(), NthExpr::new(2, 1));
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(NthExpr::parse("5").unwrap(), NthExpr::new(0, 5));
        assert_eq!(NthExpr::parse("3n").unwrap(), NthExpr::new(3, 0));
        assert_eq!(NthExpr::parse("0n+3").unwrap(), NthExpr::new(0, 3));
        assert_eq!(NthExpr::parse("n+4").unwrap(), NthExpr::new(1, 4));
        assert_eq!(NthExpr::parse("+n").unwrap(), NthExpr::new(1, 0));
        assert_eq!(NthExpr::parse("-n+2").unwrap(), NthExpr::new(-1, 2));
        assert_eq!(NthExpr::parse("3n-100").unwrap(), NthExpr::new(3, -100));
        assert_eq!(NthExpr::parse("2n + 1").unwrap(), NthExpr::new(2, 1));
    }

    #[test]
    fn test_parse_errors_name_the_query() {
        for query in ["", "n2n", "xn+1", "2n+x", "1.5", "nn"] {
            assert_eq!(
                NthExpr::parse(query),
                Err(SelectorError::InvalidNth {
                    query: query.to_string()
                }),
                "{query:?}"
            );
        }
    }

    #[test]
    fn test_positions_among_six() {
        assert_eq!(positions(NthExpr::ODD, 6), vec![1, 3, 5]);
        assert_eq!(positions(NthExpr::EVEN, 6), vec![2, 4, 6]);
        assert_eq!(positions(NthExpr::new(3, 0), 6), vec![3, 6]);
        assert_eq!(positions(NthExpr::new(-1, 2), 6), vec![1, 2]);
        assert_eq!(positions(NthExpr::new(1, 4), 6), vec![4, 5, 6]);
        assert_eq!(positions(NthExpr::new(3, -100), 6), vec![2, 5]);
        assert_eq!(positions(NthExpr::new(0, 3), 6), vec![3]);
        assert_eq!(positions(NthExpr::new(-3, 8), 6), vec![2, 5]);
        assert!(positions(NthExpr::new(0, 0), 6).is_empty());
    }

    #[test]
    fn test_extreme_coefficients_do_not_overflow() {
        assert!(!NthExpr::new(-1, i64::MIN).matches(1));
        assert!(!NthExpr::new(i64::MAX, i64::MIN).matches(usize::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(NthExpr::ODD.to_string(), "2n+1");
        assert_eq!(NthExpr::new(-1, 2).to_string(), "-1n+2");
        assert_eq!(NthExpr::new(3, -100).to_string(), "3n-100");
        assert_eq!(NthExpr::new(0, 5).to_string(), "5");
        assert_eq!(NthExpr::new(3, 0).to_string(), "3n");
    }
}
