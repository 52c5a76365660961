// src/app/quality.rs

//! Quality-tagged fields
//!
//! Several backends can describe the same application with different
//! confidence. A field remembers the quality it was last accepted at and
//! only takes a new value of equal or higher quality.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Confidence of a backend-supplied value
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Unknown,
    Lowest,
    Normal,
    Highest,
}

impl Quality {
    pub fn as_str(&self) -> &str {
        match self {
            Quality::Unknown => "unknown",
            Quality::Lowest => "lowest",
            Quality::Normal => "normal",
            Quality::Highest => "highest",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Quality::Unknown),
            "lowest" => Ok(Quality::Lowest),
            "normal" => Ok(Quality::Normal),
            "highest" => Ok(Quality::Highest),
            _ => Err(Error::InvalidValue(format!("Invalid quality: {}", s))),
        }
    }
}

/// Pick between the current and the incoming pair.
///
/// The incoming pair wins iff `incoming_quality >= current_quality`, so ties
/// favour the newer value.
pub fn choose<T>(
    current_quality: Quality,
    current_value: T,
    incoming_quality: Quality,
    incoming_value: T,
) -> (Quality, T) {
    if incoming_quality >= current_quality {
        (incoming_quality, incoming_value)
    } else {
        (current_quality, current_value)
    }
}

/// The text fields of a record that carry a quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextField {
    Name,
    Summary,
    Description,
}

/// A value together with the quality it was accepted at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged<T> {
    quality: Quality,
    value: Option<T>,
}

impl<T> Default for Tagged<T> {
    fn default() -> Self {
        Self {
            quality: Quality::Unknown,
            value: None,
        }
    }
}

impl<T> Tagged<T> {
    /// Offer a value; returns whether it was accepted
    pub fn set(&mut self, quality: Quality, value: T) -> bool {
        match choose(self.quality, None, quality, Some(value)) {
            (accepted, Some(value)) => {
                self.quality = accepted;
                self.value = Some(value);
                true
            }
            (_, None) => {
                trace!(
                    "Ignoring {} value, field already holds {} data",
                    quality, self.quality
                );
                false
            }
        }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

impl Tagged<String> {
    pub fn as_deref(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_prefers_incoming_on_tie() {
        assert_eq!(
            choose(Quality::Normal, "old", Quality::Normal, "new"),
            (Quality::Normal, "new")
        );
        assert_eq!(
            choose(Quality::Highest, "old", Quality::Lowest, "new"),
            (Quality::Highest, "old")
        );
        assert_eq!(
            choose(Quality::Unknown, "old", Quality::Lowest, "new"),
            (Quality::Lowest, "new")
        );
    }

    #[test]
    fn test_tagged_high_then_low_keeps_high() {
        let mut field = Tagged::default();
        assert!(field.set(Quality::Highest, "Calculator".to_string()));
        assert!(!field.set(Quality::Lowest, "gnome-calculator".to_string()));
        assert_eq!(field.as_deref(), Some("Calculator"));
        assert_eq!(field.quality(), Quality::Highest);
    }

    #[test]
    fn test_tagged_low_then_high_takes_high() {
        let mut field = Tagged::default();
        assert!(field.set(Quality::Lowest, "gnome-calculator".to_string()));
        assert!(field.set(Quality::Highest, "Calculator".to_string()));
        assert_eq!(field.as_deref(), Some("Calculator"));
        assert_eq!(field.quality(), Quality::Highest);
    }

    #[test]
    fn test_tagged_follows_choose() {
        let mut field = Tagged::default();
        assert!(field.set(Quality::Normal, "old".to_string()));
        assert!(field.set(Quality::Normal, "new".to_string()));
        assert_eq!(field.as_deref(), Some("new"));

        let (quality, value) = choose(field.quality(), "new", Quality::Lowest, "low");
        assert!(!field.set(Quality::Lowest, "low".to_string()));
        assert_eq!((field.quality(), field.as_deref()), (quality, Some(value)));
    }

    #[test]
    fn test_quality_order_and_parse() {
        assert!(Quality::Unknown < Quality::Lowest);
        assert!(Quality::Lowest < Quality::Normal);
        assert!(Quality::Normal < Quality::Highest);
        assert_eq!("highest".parse::<Quality>().unwrap(), Quality::Highest);
        assert!(matches!("best".parse::<Quality>(), Err(Error::InvalidValue(_))));
    }
}
