use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info, warn};

use crate::catalog::{
    Catalog, CatalogReport, Program, RawProgramRecord, SkipReason, SkippedRecord,
};
use crate::criteria::{parse_score_map, Subject, Threshold, LEVEL_MAX};

const UNIVERSITY_SUFFIX: &str = "大學";
const COLLEGE_SUFFIX: &str = "學院";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRejection {
    pub reason: SkipReason,
    pub detail: String,
    pub invalid_subjects: Vec<String>,
}

impl RecordRejection {
    fn new(reason: SkipReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
            invalid_subjects: Vec::new(),
        }
    }
}

/// Splits a display name into (school, department).
///
/// The school is the longest prefix of the first token ending in `大學`,
/// then `學院`, and otherwise the whole first token.
pub fn split_school(name: &str) -> (String, String) {
    let trimmed = name.trim();
    let first_token = trimmed.split_whitespace().next().unwrap_or("");
    let school = school_prefix(first_token, UNIVERSITY_SUFFIX)
        .or_else(|| school_prefix(first_token, COLLEGE_SUFFIX))
        .unwrap_or(first_token);
    let department = trimmed
        .strip_prefix(school)
        .unwrap_or(trimmed)
        .trim()
        .to_string();
    (school.to_string(), department)
}

fn school_prefix<'a>(token: &'a str, suffix: &str) -> Option<&'a str> {
    token
        .rfind(suffix)
        .filter(|idx| *idx > 0)
        .map(|idx| &token[..idx + suffix.len()])
}

pub fn normalize_thresholds(raw_scores: &str) -> Result<Vec<Threshold>, RecordRejection> {
    let entries = parse_score_map(raw_scores)
        .map_err(|error| RecordRejection::new(SkipReason::MalformedScores, error.to_string()))?;

    let mut invalid_subjects = Vec::new();
    let mut mapped = Vec::with_capacity(entries.len());
    for (raw_key, value) in entries {
        match raw_key.parse::<Subject>() {
            Ok(subject) => mapped.push((raw_key, subject, value.max(0))),
            Err(_) => invalid_subjects.push(raw_key),
        }
    }
    if !invalid_subjects.is_empty() {
        return Err(RecordRejection {
            reason: SkipReason::InvalidSubjects,
            detail: format!("invalid subjects: {}", invalid_subjects.join(", ")),
            invalid_subjects,
        });
    }

    let out_of_range: Vec<String> = mapped
        .iter()
        .filter(|(_, _, level)| *level > LEVEL_MAX)
        .map(|(raw_key, _, level)| format!("{raw_key}={level}"))
        .collect();
    if !out_of_range.is_empty() {
        return Err(RecordRejection::new(
            SkipReason::ScoreOutOfRange,
            format!("scores outside 0-{LEVEL_MAX}: {}", out_of_range.join(", ")),
        ));
    }

    Ok(mapped
        .into_iter()
        .map(|(raw_key, subject, level)| Threshold {
            raw_key,
            subject,
            level: level as u8,
        })
        .collect())
}

pub fn normalize_record(record: &RawProgramRecord) -> Result<Program, RecordRejection> {
    let thresholds = normalize_thresholds(&record.expanded_score_dict)?;
    Ok(Program::new(
        record.program_name.trim(),
        record.group.trim(),
        thresholds,
    ))
}

/// Validates every record, skipping (never aborting on) bad ones.
///
/// Rows are 1-based dataset row numbers. `pre_skipped` carries rows the
/// loader could not deserialize at all.
pub fn normalize_records(
    records: &[(usize, RawProgramRecord)],
    pre_skipped: Vec<SkippedRecord>,
    source: impl Into<String>,
) -> (Catalog, CatalogReport) {
    let mut report = CatalogReport {
        source: source.into(),
        total_records: records.len() + pre_skipped.len(),
        skipped: pre_skipped,
        ..CatalogReport::default()
    };
    let mut programs = Vec::with_capacity(records.len());
    let mut groups = BTreeSet::new();
    let mut schools = BTreeSet::new();
    let mut invalid_subjects = BTreeSet::new();
    let mut seen_names = HashSet::new();

    for (row, record) in records {
        let group = record.group.trim();
        if !group.is_empty() {
            groups.insert(group.to_string());
        }
        let (school, department) = split_school(&record.program_name);
        if !school.is_empty() {
            schools.insert(school);
        }
        if department.is_empty() {
            warn!("row {row}: empty department for {:?}", record.program_name);
            report.empty_departments.push(record.program_name.clone());
        }

        match normalize_record(record) {
            Ok(program) if !seen_names.insert(program.name().to_string()) => {
                warn!("row {row}: duplicate program {}, keeping the first", program.name());
                report.skipped.push(SkippedRecord {
                    row: *row,
                    name: record.program_name.clone(),
                    reason: SkipReason::DuplicateProgram,
                    detail: format!("{} already accepted from an earlier row", program.name()),
                });
            }
            Ok(program) => {
                debug!("row {row}: accepted {}", program.name());
                programs.push(program);
            }
            Err(rejection) => {
                warn!(
                    "row {row}: skipping {} ({})",
                    record.program_name, rejection.detail
                );
                invalid_subjects.extend(rejection.invalid_subjects);
                report.skipped.push(SkippedRecord {
                    row: *row,
                    name: record.program_name.clone(),
                    reason: rejection.reason,
                    detail: rejection.detail,
                });
            }
        }
    }

    report.accepted = programs.len();
    report.invalid_subjects = invalid_subjects.into_iter().collect();
    report.skipped.sort_by_key(|s| s.row);
    if !report.skipped.is_empty() {
        warn!(
            "skipped {} of {} program records from {}",
            report.skipped.len(),
            report.total_records,
            report.source
        );
    }
    info!(
        "catalog ready: {} programs, {} groups, {} schools",
        programs.len(),
        groups.len(),
        schools.len()
    );

    (Catalog::new(programs, groups, schools), report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(records: Vec<RawProgramRecord>) -> Vec<(usize, RawProgramRecord)> {
        records
            .into_iter()
            .enumerate()
            .map(|(idx, r)| (idx + 1, r))
            .collect()
    }

    #[test]
    fn splits_school_and_department() {
        assert_eq!(
            split_school("世新大學 企業管理學系"),
            ("世新大學".to_string(), "企業管理學系".to_string())
        );
        assert_eq!(
            split_school("國立臺灣大學外國語文學系"),
            ("國立臺灣大學".to_string(), "外國語文學系".to_string())
        );
        assert_eq!(
            split_school("長庚科技學院 護理系"),
            ("長庚科技學院".to_string(), "護理系".to_string())
        );
        assert_eq!(
            split_school("某機構 資訊組"),
            ("某機構".to_string(), "資訊組".to_string())
        );
        assert_eq!(split_school("世新大學"), ("世新大學".to_string(), String::new()));
    }

    #[test]
    fn maps_abbreviations_and_clamps_negative_thresholds() {
        let program = normalize_record(&RawProgramRecord::new(
            "某大學 資訊工程學系",
            "{'數A': 12, '自': -1}",
            " 資訊 ",
        ))
        .expect("valid record");
        assert_eq!(program.required_subjects(), vec![Subject::MathA, Subject::Science]);
        assert_eq!(program.raw_subject_keys(), vec!["數A", "自"]);
        assert_eq!(program.threshold_for(Subject::Science), Some(0));
        assert_eq!(program.total_threshold(), 12);
        assert_eq!(program.group(), "資訊");
        assert_eq!(program.school(), "某大學");
    }

    #[test]
    fn rejects_invalid_subjects_and_out_of_range_scores() {
        let invalid = normalize_record(&RawProgramRecord::new("甲大學 物理系", "{'物': 12}", "理學"))
            .expect_err("invalid subject");
        assert_eq!(invalid.reason, SkipReason::InvalidSubjects);
        assert_eq!(invalid.invalid_subjects, vec!["物".to_string()]);

        let out_of_range =
            normalize_record(&RawProgramRecord::new("甲大學 化學系", "{'自': 16}", "理學"))
                .expect_err("score out of range");
        assert_eq!(out_of_range.reason, SkipReason::ScoreOutOfRange);

        let malformed = normalize_record(&RawProgramRecord::new("甲大學 數學系", "not a dict", "理學"))
            .expect_err("malformed");
        assert_eq!(malformed.reason, SkipReason::MalformedScores);
    }

    #[test]
    fn skips_bad_records_without_aborting() {
        let (catalog, report) = normalize_records(
            &rows(vec![
                RawProgramRecord::new("世新大學 企業管理學系", "{'國': 12, '社': 12}", "管理"),
                RawProgramRecord::new("甲大學 物理系", "{'物': 12}", "理學"),
                RawProgramRecord::new("乙大學 化學系", "{'自': 99}", "理學"),
                RawProgramRecord::new("丙大學", "{'國': 10}", "文史哲"),
            ]),
            Vec::new(),
            "test",
        );
        assert_eq!(catalog.len(), 2);
        assert_eq!(report.total_records, 4);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.skipped_count(SkipReason::InvalidSubjects), 1);
        assert_eq!(report.skipped_count(SkipReason::ScoreOutOfRange), 1);
        assert_eq!(report.invalid_subjects, vec!["物".to_string()]);
        assert_eq!(report.empty_departments, vec!["丙大學".to_string()]);
        assert_eq!(catalog.groups, vec!["文史哲", "理學", "管理"]);
        assert_eq!(catalog.schools, vec!["世新大學", "丙大學", "乙大學", "甲大學"]);
        assert_eq!(catalog.fingerprint.len(), 64);
    }

    #[test]
    fn repeated_program_names_keep_the_first_record() {
        let (catalog, report) = normalize_records(
            &rows(vec![
                RawProgramRecord::new("甲大學 一系", "{'國': 10}", "管理"),
                RawProgramRecord::new("乙大學 二系", "{'國': 11}", "管理"),
                RawProgramRecord::new(" 甲大學 一系 ", "{'國': 12}", "管理"),
            ]),
            Vec::new(),
            "test",
        );
        assert_eq!(catalog.len(), 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.skipped_count(SkipReason::DuplicateProgram), 1);
        assert_eq!(report.skipped[0].row, 3);
        let kept = catalog.find("甲大學 一系").expect("first record kept");
        assert_eq!(kept.total_threshold(), 10);
    }
}
