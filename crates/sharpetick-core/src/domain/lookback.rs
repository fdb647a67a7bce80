use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Number of trading sessions in a lookback window, bounded to `[1, 1000]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Lookback(u32);

impl Lookback {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 1000;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(ValidationError::InvalidLookback {
                value,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(value as u32))
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn days(self) -> usize {
        self.0 as usize
    }
}

impl Default for Lookback {
    /// One trading month.
    fn default() -> Self {
        Self(21)
    }
}

impl Display for Lookback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Lookback {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let parsed = trimmed
            .parse::<i64>()
            .map_err(|_| ValidationError::LookbackNotInteger {
                value: trimmed.to_owned(),
            })?;
        Self::new(parsed)
    }
}

impl TryFrom<i64> for Lookback {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Lookback> for u32 {
    fn from(value: Lookback) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds() {
        assert_eq!(Lookback::new(1).expect("min").get(), 1);
        assert_eq!(Lookback::new(1000).expect("max").get(), 1000);
    }

    #[test]
    fn rejects_out_of_range_without_clamping() {
        for value in [0, -5, 1001] {
            let err = Lookback::new(value).expect_err("must fail");
            assert!(matches!(err, ValidationError::InvalidLookback { .. }));
        }
    }

    #[test]
    fn rejects_non_numeric_text() {
        let err = Lookback::from_str("21.5").expect_err("must fail");
        assert!(matches!(err, ValidationError::LookbackNotInteger { .. }));
        assert_eq!(Lookback::from_str(" 63 ").expect("valid").get(), 63);
    }

    #[test]
    fn deserializes_through_validation() {
        let parsed: Lookback = serde_json::from_str("125").expect("valid lookback");
        assert_eq!(parsed.get(), 125);
        assert!(serde_json::from_str::<Lookback>("0").is_err());
    }
}
