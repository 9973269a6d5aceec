use std::collections::BTreeMap;

use crate::catalog::Program;
use crate::criteria::Subject;
use crate::eligibility::{Classification, Evaluation, SubjectDelta, Tier, UnscoredReason};

/// Every delta must reach this margin for a program to count as conservative.
pub const CONSERVATIVE_MARGIN: i32 = 2;

pub fn evaluate_program(program: &Program, scores: &BTreeMap<Subject, u8>) -> Evaluation {
    if scores.is_empty() {
        return Evaluation::Unscored {
            reason: UnscoredReason::NoScores,
        };
    }

    let missing: Vec<Subject> = program
        .thresholds()
        .iter()
        .map(|t| t.subject)
        .filter(|subject| !scores.contains_key(subject))
        .collect();
    if !missing.is_empty() {
        return Evaluation::MissingSubjects { subjects: missing };
    }

    if !program
        .thresholds()
        .iter()
        .any(|t| scores.contains_key(&t.subject))
    {
        return Evaluation::Unscored {
            reason: UnscoredReason::NoOverlap,
        };
    }

    let deltas: Vec<SubjectDelta> = program
        .thresholds()
        .iter()
        .filter_map(|t| {
            let score = *scores.get(&t.subject)?;
            Some(SubjectDelta {
                subject: t.subject,
                raw_key: t.raw_key.clone(),
                score,
                threshold: t.level,
                delta: i32::from(score) - i32::from(t.level),
            })
        })
        .collect();

    Evaluation::Classified(Classification {
        tier: classify_deltas(&deltas),
        deltas,
    })
}

pub fn classify_deltas(deltas: &[SubjectDelta]) -> Tier {
    if deltas.iter().any(|d| d.delta < 0) {
        Tier::Ambitious
    } else if deltas.iter().all(|d| d.delta >= CONSERVATIVE_MARGIN) {
        Tier::Conservative
    } else {
        Tier::Realistic
    }
}
