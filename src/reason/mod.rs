pub mod templates;

use serde::{Deserialize, Serialize};

use crate::eligibility::{Classification, Evaluation, UnscoredReason};
use crate::reason::templates::{render, TemplateLibrary};

pub const TOP_MIN_DELTA: i32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReasonLevel {
    Top,
    Mid,
    Low,
}

impl ReasonLevel {
    pub fn from_min_delta(min_delta: i32) -> Self {
        if min_delta >= TOP_MIN_DELTA {
            Self::Top
        } else if min_delta >= 0 {
            Self::Mid
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reason {
    pub level: Option<ReasonLevel>,
    pub summary: String,
    pub details: String,
    pub min_delta: Option<i32>,
    pub mean_delta: Option<f64>,
}

pub fn summarize(classification: &Classification, group: &str) -> Reason {
    summarize_with(classification, group, TemplateLibrary::shared())
}

pub fn summarize_with(
    classification: &Classification,
    group: &str,
    library: &TemplateLibrary,
) -> Reason {
    let min_delta = classification.min_delta();
    let mean_delta = classification.mean_delta();
    let level = ReasonLevel::from_min_delta(min_delta);
    let summary = render(library.lookup(group, level), mean_delta, f64::from(min_delta));

    Reason {
        level: Some(level),
        summary,
        details: detail_block(classification),
        min_delta: Some(min_delta),
        mean_delta: Some(mean_delta),
    }
}

/// Reason for any evaluation outcome, including the ones that never reach a
/// tier.
pub fn explain(evaluation: &Evaluation, group: &str) -> Reason {
    let summary = match evaluation {
        Evaluation::Classified(classification) => return summarize(classification, group),
        Evaluation::Unscored {
            reason: UnscoredReason::NoScores,
        } => "Enter your GSAT scores first.".to_string(),
        Evaluation::Unscored {
            reason: UnscoredReason::NoOverlap,
        } => "None of your scores match this program's subjects; it cannot be evaluated."
            .to_string(),
        Evaluation::MissingSubjects { subjects } => format!(
            "Missing subjects: {}",
            subjects
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    Reason {
        level: None,
        summary,
        details: String::new(),
        min_delta: None,
        mean_delta: None,
    }
}

fn detail_block(classification: &Classification) -> String {
    let required = classification
        .deltas
        .iter()
        .map(|d| format!("{}: {}", d.subject, d.threshold))
        .collect::<Vec<_>>()
        .join(", ");
    let yours = classification
        .deltas
        .iter()
        .map(|d| format!("{}: {}", d.subject, d.score))
        .collect::<Vec<_>>()
        .join(", ");
    let differences = classification
        .deltas
        .iter()
        .map(|d| format!("{}: {:+.1}", d.subject, f64::from(d.delta)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Required: {required}\nYour scores: {yours}\nDifference: {differences}")
}
