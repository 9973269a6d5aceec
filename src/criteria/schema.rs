use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LEVEL_MIN: i64 = 0;
pub const LEVEL_MAX: i64 = 15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub enum Subject {
    Chinese,
    English,
    MathA,
    MathB,
    Social,
    Science,
}

impl Subject {
    pub const ALL: [Subject; 6] = [
        Subject::Chinese,
        Subject::English,
        Subject::MathA,
        Subject::MathB,
        Subject::Social,
        Subject::Science,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Chinese => "國文",
            Self::English => "英文",
            Self::MathA => "數學 A",
            Self::MathB => "數學 B",
            Self::Social => "社會",
            Self::Science => "自然",
        }
    }

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Chinese => "chinese",
            Self::English => "english",
            Self::MathA => "math_a",
            Self::MathB => "math_b",
            Self::Social => "social",
            Self::Science => "science",
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown subject: {0}")]
pub struct SubjectParseError(pub String);

impl FromStr for Subject {
    type Err = SubjectParseError;

    /// Accepts the dataset abbreviations (`國`, `數A`, ...), canonical names,
    /// simplified spellings and ASCII slugs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase()
            .replace('-', "_");
        let subject = match normalized.as_str() {
            "國" | "國文" | "国" | "国文" | "chinese" => Self::Chinese,
            "英" | "英文" | "english" => Self::English,
            "數a" | "數學a" | "数a" | "数学a" | "math_a" | "matha" => Self::MathA,
            "數b" | "數學b" | "数b" | "数学b" | "math_b" | "mathb" => Self::MathB,
            "社" | "社會" | "社会" | "social" => Self::Social,
            "自" | "自然" | "science" => Self::Science,
            _ => return Err(SubjectParseError(s.to_string())),
        };
        Ok(subject)
    }
}

impl TryFrom<String> for Subject {
    type Error = SubjectParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subject> for String {
    fn from(value: Subject) -> Self {
        value.canonical_name().to_string()
    }
}

/// One required subject of a program, keeping the identifier the dataset used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Threshold {
    pub raw_key: String,
    pub subject: Subject,
    pub level: u8,
}

pub fn clamp_level(value: i64) -> u8 {
    value.clamp(LEVEL_MIN, LEVEL_MAX) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_abbreviations_and_aliases() {
        assert_eq!("國".parse::<Subject>(), Ok(Subject::Chinese));
        assert_eq!("數A".parse::<Subject>(), Ok(Subject::MathA));
        assert_eq!("數學 B".parse::<Subject>(), Ok(Subject::MathB));
        assert_eq!("数学A".parse::<Subject>(), Ok(Subject::MathA));
        assert_eq!("Math-B".parse::<Subject>(), Ok(Subject::MathB));
        assert_eq!(" 自然 ".parse::<Subject>(), Ok(Subject::Science));
        assert!("物理".parse::<Subject>().is_err());
    }

    #[test]
    fn canonical_names_round_trip_through_serde() {
        let json = serde_json::to_string(&Subject::MathA).expect("serialize");
        assert_eq!(json, "\"數學 A\"");
        let parsed: Subject = serde_json::from_str("\"social\"").expect("deserialize");
        assert_eq!(parsed, Subject::Social);
    }

    #[test]
    fn clamps_levels_into_range() {
        assert_eq!(clamp_level(-3), 0);
        assert_eq!(clamp_level(9), 9);
        assert_eq!(clamp_level(40), 15);
    }
}
