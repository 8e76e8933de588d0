//! Round lengths and the difficulty ladder offered to the player.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of streets asked in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RoundLengthRepr", into = "RoundLengthRepr")]
pub enum RoundLength {
    /// A fixed number of distinct streets, sampled without replacement.
    Fixed(usize),
    /// Free play: streets are drawn with replacement until the player stops.
    Unlimited,
}

impl RoundLength {
    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }

    #[must_use]
    pub const fn fixed(self) -> Option<usize> {
        match self {
            Self::Fixed(n) => Some(n),
            Self::Unlimited => None,
        }
    }
}

impl Default for RoundLength {
    fn default() -> Self {
        Self::Fixed(crate::constants::BASE_ROUND_LENGTH)
    }
}

impl fmt::Display for RoundLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Unlimited => f.write_str("Free play"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid round length `{0}` (expected a count or `unlimited`)")]
pub struct ParseRoundLengthError(pub String);

impl FromStr for RoundLength {
    type Err = ParseRoundLengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<usize>() {
            return Ok(Self::Fixed(n));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "unlimited" | "free" | "free play" | "free-play" => Ok(Self::Unlimited),
            _ => Err(ParseRoundLengthError(s.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RoundLengthRepr {
    Count(usize),
    Keyword(String),
}

impl TryFrom<RoundLengthRepr> for RoundLength {
    type Error = ParseRoundLengthError;

    fn try_from(repr: RoundLengthRepr) -> Result<Self, Self::Error> {
        match repr {
            RoundLengthRepr::Count(n) => Ok(Self::Fixed(n)),
            RoundLengthRepr::Keyword(keyword) => keyword.parse(),
        }
    }
}

impl From<RoundLength> for RoundLengthRepr {
    fn from(length: RoundLength) -> Self {
        match length {
            RoundLength::Fixed(n) => Self::Count(n),
            RoundLength::Unlimited => Self::Keyword("unlimited".to_string()),
        }
    }
}

/// Round lengths offered for a pool of `street_count` streets.
///
/// Starts at `base` and doubles while below the street count, then offers
/// every street once and finally free play.
#[must_use]
pub fn difficulty_levels(street_count: usize, base: usize) -> Vec<RoundLength> {
    let mut levels = Vec::new();
    let mut length = base.max(1);
    while length < street_count {
        levels.push(RoundLength::Fixed(length));
        length = length.saturating_mul(2);
    }
    if street_count > 0 {
        levels.push(RoundLength::Fixed(street_count));
    }
    levels.push(RoundLength::Unlimited);
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_doubles_then_caps() {
        assert_eq!(
            difficulty_levels(47, 5),
            vec![
                RoundLength::Fixed(5),
                RoundLength::Fixed(10),
                RoundLength::Fixed(20),
                RoundLength::Fixed(40),
                RoundLength::Fixed(47),
                RoundLength::Unlimited,
            ]
        );
        assert_eq!(
            difficulty_levels(5, 5),
            vec![RoundLength::Fixed(5), RoundLength::Unlimited]
        );
        assert_eq!(
            difficulty_levels(3, 5),
            vec![RoundLength::Fixed(3), RoundLength::Unlimited]
        );
        assert_eq!(difficulty_levels(0, 5), vec![RoundLength::Unlimited]);
    }

    #[test]
    fn parses_counts_and_keywords() {
        assert_eq!("10".parse::<RoundLength>(), Ok(RoundLength::Fixed(10)));
        assert_eq!("Unlimited".parse::<RoundLength>(), Ok(RoundLength::Unlimited));
        assert_eq!("free play".parse::<RoundLength>(), Ok(RoundLength::Unlimited));
        assert!("ten".parse::<RoundLength>().is_err());
    }

    #[test]
    fn serde_uses_number_or_keyword() {
        assert_eq!(serde_json::to_string(&RoundLength::Fixed(20)).unwrap(), "20");
        assert_eq!(
            serde_json::to_string(&RoundLength::Unlimited).unwrap(),
            "\"unlimited\""
        );
        let parsed: RoundLength = serde_json::from_str("\"unlimited\"").unwrap();
        assert_eq!(parsed, RoundLength::Unlimited);
        let parsed: RoundLength = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, RoundLength::Fixed(7));
        assert!(serde_json::from_str::<RoundLength>("\"lots\"").is_err());
    }

    #[test]
    fn display_matches_slider_labels() {
        assert_eq!(RoundLength::Fixed(5).to_string(), "5");
        assert_eq!(RoundLength::Unlimited.to_string(), "Free play");
    }
}
