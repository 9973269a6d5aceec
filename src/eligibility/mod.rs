pub mod classifier;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::criteria::Subject;

/// Risk tier of a program relative to the student's scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Conservative,
    Realistic,
    Ambitious,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Conservative, Tier::Realistic, Tier::Ambitious];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Realistic => "realistic",
            Self::Ambitious => "ambitious",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Conservative => "Conservative",
            Self::Realistic => "Realistic",
            Self::Ambitious => "Ambitious",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown tier: {0}")]
pub struct TierParseError(pub String);

impl FromStr for Tier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "conservative" | "safe" | "保守型" => Ok(Self::Conservative),
            "realistic" | "match" | "務實型" => Ok(Self::Realistic),
            "ambitious" | "reach" | "夢幻型" => Ok(Self::Ambitious),
            _ => Err(TierParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectDelta {
    pub subject: Subject,
    pub raw_key: String,
    pub score: u8,
    pub threshold: u8,
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub tier: Tier,
    pub deltas: Vec<SubjectDelta>,
}

impl Classification {
    pub fn min_delta(&self) -> i32 {
        self.deltas.iter().map(|d| d.delta).min().unwrap_or(0)
    }

    pub fn mean_delta(&self) -> f64 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        let sum: i32 = self.deltas.iter().map(|d| d.delta).sum();
        f64::from(sum) / self.deltas.len() as f64
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnscoredReason {
    /// The student has not entered any score yet.
    NoScores,
    /// No required subject overlaps the entered scores.
    NoOverlap,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Evaluation {
    Unscored { reason: UnscoredReason },
    MissingSubjects { subjects: Vec<Subject> },
    Classified(Classification),
}

impl Evaluation {
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Self::Classified(c) => Some(c.tier),
            _ => None,
        }
    }

    pub fn classification(&self) -> Option<&Classification> {
        match self {
            Self::Classified(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_evaluable(&self) -> bool {
        matches!(self, Self::Classified(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(delta: i32) -> SubjectDelta {
        SubjectDelta {
            subject: Subject::Chinese,
            raw_key: "國".to_string(),
            score: 10,
            threshold: 10,
            delta,
        }
    }

    #[test]
    fn parses_tier_aliases() {
        assert_eq!("Conservative".parse::<Tier>().ok(), Some(Tier::Conservative));
        assert_eq!("務實型".parse::<Tier>().ok(), Some(Tier::Realistic));
        assert_eq!("reach".parse::<Tier>().ok(), Some(Tier::Ambitious));
        assert!("bold".parse::<Tier>().is_err());
    }

    #[test]
    fn summarizes_deltas() {
        let classification = Classification {
            tier: Tier::Ambitious,
            deltas: vec![delta(3), delta(-1), delta(1)],
        };
        assert_eq!(classification.min_delta(), -1);
        assert!((classification.mean_delta() - 1.0).abs() < 1e-9);
    }
}
