//! BusNumber - sharing identifier
//!
//! Uses Arc<str> internally: every sample, upload job and store key clones it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::ContractError;

/// Caller-chosen identifier of a sharing session ("bus number").
///
/// The type itself accepts any string so that wire payloads can be decoded
/// first and validated afterwards; use [`BusNumber::parse`] where a
/// non-empty identifier is required.
///
/// # Examples
/// ```
/// use contracts::BusNumber;
///
/// let id = BusNumber::parse(" 42 ").unwrap();
/// assert_eq!(id, "42");
/// assert!(BusNumber::parse("   ").is_err());
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusNumber(Arc<str>);

impl BusNumber {
    /// Wrap a string without validation.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Trim and validate an identifier.
    ///
    /// # Errors
    /// `ContractError::Validation` on `busNumber` when the trimmed value is empty.
    pub fn parse(s: &str) -> Result<Self, ContractError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ContractError::validation(
                "busNumber",
                "bus number must not be empty",
            ));
        }
        Ok(Self::new(trimmed))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Deref for BusNumber {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for BusNumber {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets HashMap<BusNumber, _> be queried with &str
impl Borrow<str> for BusNumber {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BusNumber {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BusNumber {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for BusNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BusNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BusNumber({:?})", self.0)
    }
}

impl PartialEq<str> for BusNumber {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for BusNumber {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for BusNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BusNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
