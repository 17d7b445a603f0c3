//! Saturating score arithmetic over the integers plus the infinity sentinels.
//!
//! Scores express placement preference. `-INFINITY` is a ban, `INFINITY`
//! a mandate, and everything in between a soft preference. Addition
//! saturates: once a score is infinite it stays infinite, and a ban beats
//! a mandate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A placement score: a finite integer or one of the infinity sentinels.
///
/// The derived ordering is total: `MinusInf < Finite(a) < Finite(b) <
/// PlusInf` for `a < b`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub enum Score {
    MinusInf,
    Finite(i32),
    PlusInf,
}

impl Score {
    pub const ZERO: Score = Score::Finite(0);

    /// Add two scores. `MinusInf` dominates `PlusInf`; finite sums
    /// saturate within `i32` and never overflow into an infinity.
    pub fn saturating_add(self, other: Score) -> Score {
        match (self, other) {
            (Score::MinusInf, _) | (_, Score::MinusInf) => Score::MinusInf,
            (Score::PlusInf, _) | (_, Score::PlusInf) => Score::PlusInf,
            (Score::Finite(a), Score::Finite(b)) => Score::Finite(a.saturating_add(b)),
        }
    }

    pub fn is_minus_inf(self) -> bool {
        self == Score::MinusInf
    }

    pub fn is_plus_inf(self) -> bool {
        self == Score::PlusInf
    }

    pub fn is_infinite(self) -> bool {
        matches!(self, Score::MinusInf | Score::PlusInf)
    }

    /// Strictly below zero (a ban counts).
    pub fn is_negative(self) -> bool {
        self < Score::ZERO
    }
}

impl Default for Score {
    fn default() -> Self {
        Score::ZERO
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::MinusInf => f.write_str("-INFINITY"),
            Score::PlusInf => f.write_str("INFINITY"),
            Score::Finite(v) => write!(f, "{v}"),
        }
    }
}

impl FromStr for Score {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "INFINITY" | "+INFINITY" => Ok(Score::PlusInf),
            "-INFINITY" => Ok(Score::MinusInf),
            other => other
                .parse::<i32>()
                .map(Score::Finite)
                .map_err(|_| ModelError::InvalidScore(s.to_string())),
        }
    }
}

impl From<Score> for String {
    fn from(score: Score) -> String {
        score.to_string()
    }
}

impl TryFrom<String> for Score {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order() {
        assert!(Score::MinusInf < Score::Finite(i32::MIN));
        assert!(Score::Finite(-5) < Score::Finite(3));
        assert!(Score::Finite(i32::MAX) < Score::PlusInf);
    }

    #[test]
    fn ban_dominates_mandate() {
        assert_eq!(
            Score::MinusInf.saturating_add(Score::PlusInf),
            Score::MinusInf
        );
        assert_eq!(
            Score::PlusInf.saturating_add(Score::Finite(-1000)),
            Score::PlusInf
        );
    }

    #[test]
    fn finite_addition_saturates() {
        assert_eq!(
            Score::Finite(i32::MAX).saturating_add(Score::Finite(1)),
            Score::Finite(i32::MAX)
        );
        assert_eq!(
            Score::Finite(2).saturating_add(Score::Finite(3)),
            Score::Finite(5)
        );
    }

    #[test]
    fn wire_spellings() {
        assert_eq!("INFINITY".parse::<Score>().unwrap(), Score::PlusInf);
        assert_eq!("+INFINITY".parse::<Score>().unwrap(), Score::PlusInf);
        assert_eq!("-INFINITY".parse::<Score>().unwrap(), Score::MinusInf);
        assert_eq!("42".parse::<Score>().unwrap(), Score::Finite(42));
        assert!("forty-two".parse::<Score>().is_err());

        assert_eq!(Score::MinusInf.to_string(), "-INFINITY");
        assert_eq!(Score::Finite(-7).to_string(), "-7");
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&Score::PlusInf).unwrap();
        assert_eq!(json, "\"INFINITY\"");
        let back: Score = serde_json::from_str("\"-3\"").unwrap();
        assert_eq!(back, Score::Finite(-3));
    }
}
