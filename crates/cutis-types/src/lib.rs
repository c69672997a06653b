//! Validated value types shared across the Cutis crates.
//!
//! - [`NonEmptyText`]: trimmed text that is guaranteed to hold at least one character
//! - [`Severity`]: the coarse ordinal rating attached to a skin condition
//! - [`Confidence`]: a classifier score normalised into `[0, 1]`

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Coarse seriousness rating of a skin condition.
///
/// `None` is used both for conditions the catalog marks as harmless and for results whose
/// confidence is too low to attach a concrete rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Severity {
    #[default]
    None,
    Low,
    Moderate,
    High,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
            Severity::Severe => "Severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity label is not one of the known ratings.
#[derive(Debug, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct SeverityParseError(pub String);

impl FromStr for Severity {
    type Err = SeverityParseError;

    /// Case-insensitive. `Medium` is accepted as an alias for `Moderate`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Severity::None),
            "low" => Ok(Severity::Low),
            "moderate" | "medium" => Ok(Severity::Moderate),
            "high" => Ok(Severity::High),
            "severe" => Ok(Severity::Severe),
            _ => Err(SeverityParseError(s.to_string())),
        }
    }
}

/// Errors produced while normalising a classifier score.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfidenceError {
    #[error("confidence is not a finite number")]
    NotFinite,
    #[error("confidence {0} is negative")]
    Negative(f64),
    #[error("confidence {0} is out of range even as a percentage")]
    OutOfRange(f64),
}

/// Classifier score guaranteed to lie in `[0, 1]`.
///
/// Some upstream responses report percentages (`82.93`) instead of fractions (`0.8293`).
/// [`Confidence::normalise`] divides any value above `1` by `100` and rejects whatever is
/// still out of range afterwards.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub fn normalise(raw: f64) -> Result<Self, ConfidenceError> {
        if !raw.is_finite() {
            return Err(ConfidenceError::NotFinite);
        }
        if raw < 0.0 {
            return Err(ConfidenceError::Negative(raw));
        }
        let value = if raw > 1.0 { raw / 100.0 } else { raw };
        if value > 1.0 {
            return Err(ConfidenceError::OutOfRange(raw));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Percentage with one decimal place, e.g. `"92.3"`.
    pub fn percentage(&self) -> String {
        format!("{:.1}", self.0 * 100.0)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}
