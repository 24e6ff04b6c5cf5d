//! Categorical encoding against a frozen vocabulary.
//!
//! A [`Vocabulary`] is the sorted, de-duplicated set of values observed at
//! training time; a value's code is its position. The vocabulary is stored
//! inside the model artifact and never recomputed, so codes used for a
//! prediction always match the codes the regressor was fitted with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Designated bucket for values outside the vocabulary
pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("'{value}' was not seen during training")]
    UnseenCategory { value: String },

    #[error("vocabulary is empty")]
    EmptyVocabulary,

    #[error("vocabulary is not sorted and unique at position {position}")]
    Malformed { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    values: Vec<String>,
}

impl Vocabulary {
    /// Distinct values in lexicographic order
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        values.sort_unstable();
        values.dedup();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn contains(&self, value: &str) -> bool {
        self.lookup(value).is_some()
    }

    fn lookup(&self, value: &str) -> Option<u32> {
        self.values
            .binary_search_by(|v| v.as_str().cmp(value))
            .ok()
            .map(|i| i as u32)
    }

    pub fn encode(&self, value: &str) -> Result<u32, EncodeError> {
        self.lookup(value).ok_or_else(|| EncodeError::UnseenCategory {
            value: value.to_string(),
        })
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.values.get(code as usize).map(String::as_str)
    }

    /// Encode, substituting a code according to `policy` for unseen values
    pub fn encode_or_fallback(&self, value: &str, policy: FallbackPolicy) -> Result<Encoded, EncodeError> {
        if let Some(code) = self.lookup(value) {
            return Ok(Encoded::Known(code));
        }
        match policy {
            FallbackPolicy::Refuse => Err(EncodeError::UnseenCategory {
                value: value.to_string(),
            }),
            FallbackPolicy::UnknownThenLowest => {
                if let Some(code) = self.lookup(UNKNOWN_CATEGORY) {
                    Ok(Encoded::Fallback {
                        code,
                        bucket: FallbackBucket::Unknown,
                    })
                } else if self.is_empty() {
                    Err(EncodeError::EmptyVocabulary)
                } else {
                    Ok(Encoded::Fallback {
                        code: 0,
                        bucket: FallbackBucket::Lowest,
                    })
                }
            }
        }
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = EncodeError;

    fn try_from(values: Vec<String>) -> Result<Self, Self::Error> {
        if let Some(position) = values.windows(2).position(|w| w[0] >= w[1]) {
            return Err(EncodeError::Malformed {
                position: position + 1,
            });
        }
        Ok(Self { values })
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.values
    }
}

/// What to do with a value the vocabulary has never seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Use the `Unknown` bucket if present, else the lowest code
    UnknownThenLowest,
    /// Fail with `UnseenCategory`
    Refuse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackBucket {
    Unknown,
    Lowest,
}

/// Result of a total encode: the code and which path produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    Known(u32),
    Fallback { code: u32, bucket: FallbackBucket },
}

impl Encoded {
    pub fn code(&self) -> u32 {
        match *self {
            Encoded::Known(code) | Encoded::Fallback { code, .. } => code,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Encoded::Fallback { .. })
    }
}
