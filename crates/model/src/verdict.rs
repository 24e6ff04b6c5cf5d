//! Verdict buckets for a predicted rating.
//!
//! Thresholds are half-open on a 0-10 scale:
//!
//! | rating      | verdict     |
//! |-------------|-------------|
//! | [8.5, 10]   | Blockbuster |
//! | [7.5, 8.5)  | Super Hit   |
//! | [6.5, 7.5)  | Hit         |
//! | [5.0, 6.5)  | Average     |
//! | [0, 5.0)    | Flop        |

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Blockbuster,
    SuperHit,
    Hit,
    Average,
    Flop,
}

impl Verdict {
    pub const ALL: [Verdict; 5] = [
        Verdict::Blockbuster,
        Verdict::SuperHit,
        Verdict::Hit,
        Verdict::Average,
        Verdict::Flop,
    ];

    /// Bucket a rating. Ratings above 10 count as Blockbuster, below 0 as Flop.
    pub fn classify(rating: f64) -> Self {
        if rating >= 8.5 {
            Verdict::Blockbuster
        } else if rating >= 7.5 {
            Verdict::SuperHit
        } else if rating >= 6.5 {
            Verdict::Hit
        } else if rating >= 5.0 {
            Verdict::Average
        } else {
            Verdict::Flop
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Blockbuster => "Blockbuster",
            Verdict::SuperHit => "Super Hit",
            Verdict::Hit => "Hit",
            Verdict::Average => "Average",
            Verdict::Flop => "Flop",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Blockbuster => "This movie is expected to dominate the box office!",
            Verdict::SuperHit => "Strong performance expected with high audience appeal.",
            Verdict::Hit => "Likely to perform well in most regions.",
            Verdict::Average => "Might have a mixed response from the audience.",
            Verdict::Flop => "Predicted to underperform at the box office.",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rating as a percentage of the maximum, clamped to [0, 100]
pub fn success_rate(rating: f64) -> f64 {
    (rating / 10.0 * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(Verdict::classify(8.5), Verdict::Blockbuster);
        assert_eq!(Verdict::classify(8.49999), Verdict::SuperHit);
        assert_eq!(Verdict::classify(7.5), Verdict::SuperHit);
        assert_eq!(Verdict::classify(7.4999), Verdict::Hit);
        assert_eq!(Verdict::classify(6.5), Verdict::Hit);
        assert_eq!(Verdict::classify(5.0), Verdict::Average);
        assert_eq!(Verdict::classify(4.999), Verdict::Flop);
        assert_eq!(Verdict::classify(0.0), Verdict::Flop);
        assert_eq!(Verdict::classify(10.0), Verdict::Blockbuster);
    }

    #[test]
    fn test_labels_and_messages_are_distinct() {
        let labels: std::collections::HashSet<_> = Verdict::ALL.iter().map(|v| v.label()).collect();
        let messages: std::collections::HashSet<_> = Verdict::ALL.iter().map(|v| v.message()).collect();
        assert_eq!(labels.len(), 5);
        assert_eq!(messages.len(), 5);
        assert_eq!(Verdict::SuperHit.to_string(), "Super Hit");
    }

    #[test]
    fn test_success_rate_clamped() {
        assert!((success_rate(7.2) - 72.0).abs() < 1e-9);
        assert_eq!(success_rate(10.0), 100.0);
        assert_eq!(success_rate(12.0), 100.0);
        assert_eq!(success_rate(-1.0), 0.0);
    }
}
