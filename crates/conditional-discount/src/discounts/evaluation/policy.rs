use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::rules::Candidate;

/// How a winner is chosen when several rules apply to the same line item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Largest discount among every qualifying rule; earlier rules win ties.
    #[default]
    HighestDiscount,
    /// First qualifying rule in stored order, even if a later one is larger.
    FirstMatch,
}

impl SelectionPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionPolicy::HighestDiscount => "highest_discount",
            SelectionPolicy::FirstMatch => "first_match",
        }
    }

    pub(crate) fn select<I>(&self, mut candidates: I) -> Option<Candidate>
    where
        I: Iterator<Item = Candidate>,
    {
        match self {
            SelectionPolicy::FirstMatch => candidates.next(),
            SelectionPolicy::HighestDiscount => candidates.fold(None, |best, candidate| match best {
                Some(current) if current.discount_percent >= candidate.discount_percent => {
                    Some(current)
                }
                _ => Some(candidate),
            }),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown discount selection policy '{0}' (expected 'highest' or 'first')")]
pub struct UnknownPolicy(pub String);

impl FromStr for SelectionPolicy {
    type Err = UnknownPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "highest" | "highest_discount" | "max" => Ok(Self::HighestDiscount),
            "first" | "first_match" | "legacy" => Ok(Self::FirstMatch),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}
