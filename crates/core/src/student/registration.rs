//! Registration numbers of the form `<PREFIX>/<year>/<sequence>`.
//!
//! The sequence restarts every year at 1001 and is zero padded to four
//! digits, so the first student of 2025 is `IHN/2025/1001`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First sequence number issued in a year.
pub const SEQUENCE_START: u32 = 1001;

/// Errors from building or parsing registration numbers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The string is not `<PREFIX>/<year>/<sequence>`.
    #[error("Malformed registration number: {0}")]
    Malformed(String),

    /// The prefix is empty or contains a separator.
    #[error("Invalid registration prefix: {0}")]
    InvalidPrefix(String),

    /// The year already has more students than the counter can express.
    #[error("Registration sequence overflow for year {0}")]
    SequenceOverflow(i32),
}

/// A student registration number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistrationNumber {
    prefix: String,
    year: i32,
    sequence: u32,
}

impl RegistrationNumber {
    /// Builds the number for the next student registered in `year`, given how
    /// many students were already registered that year.
    ///
    /// # Errors
    ///
    /// - `InvalidPrefix` if the prefix is blank or contains `/`
    /// - `SequenceOverflow` if the counter does not fit
    pub fn for_year(
        prefix: &str,
        year: i32,
        registered_this_year: u64,
    ) -> Result<Self, RegistrationError> {
        let prefix = prefix.trim();
        if prefix.is_empty() || prefix.contains('/') {
            return Err(RegistrationError::InvalidPrefix(prefix.to_string()));
        }

        let sequence = u32::try_from(registered_this_year)
            .ok()
            .and_then(|count| count.checked_add(SEQUENCE_START))
            .ok_or(RegistrationError::SequenceOverflow(year))?;

        Ok(Self {
            prefix: prefix.to_string(),
            year,
            sequence,
        })
    }

    /// Returns the following number in the same year.
    ///
    /// # Errors
    ///
    /// Returns `SequenceOverflow` at the end of the counter.
    pub fn successor(&self) -> Result<Self, RegistrationError> {
        let sequence = self
            .sequence
            .checked_add(1)
            .ok_or(RegistrationError::SequenceOverflow(self.year))?;
        Ok(Self {
            prefix: self.prefix.clone(),
            year: self.year,
            sequence,
        })
    }

    /// Year of registration.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Sequence within the year.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for RegistrationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{:04}", self.prefix, self.year, self.sequence)
    }
}

impl FromStr for RegistrationNumber {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RegistrationError::Malformed(s.to_string());
        let mut parts = s.split('/');
        let (Some(prefix), Some(year), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if prefix.is_empty() || year.len() != 4 || sequence.len() < 4 {
            return Err(malformed());
        }

        Ok(Self {
            prefix: prefix.to_string(),
            year: year.parse().map_err(|_| malformed())?,
            sequence: sequence.parse().map_err(|_| malformed())?,
        })
    }
}

impl TryFrom<String> for RegistrationNumber {
    type Error = RegistrationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RegistrationNumber> for String {
    fn from(value: RegistrationNumber) -> Self {
        value.to_string()
    }
}

/// Normalizes a name for duplicate detection: trimmed, inner whitespace
/// collapsed, lowercase.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
