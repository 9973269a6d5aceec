pub mod cache;
pub mod loader;
pub mod normalize;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::criteria::{Subject, Threshold};

/// A dataset row before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawProgramRecord {
    pub program_name: String,
    pub expanded_score_dict: String,
    pub group: String,
}

impl RawProgramRecord {
    pub fn new(
        program_name: impl Into<String>,
        expanded_score_dict: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            program_name: program_name.into(),
            expanded_score_dict: expanded_score_dict.into(),
            group: group.into(),
        }
    }
}

/// A validated program. Thresholds keep the dataset order and are never
/// mutated after construction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Program {
    name: String,
    group: String,
    school: String,
    department: String,
    thresholds: Vec<Threshold>,
    total_threshold: u32,
}

impl Program {
    pub fn new(name: impl Into<String>, group: impl Into<String>, thresholds: Vec<Threshold>) -> Self {
        let name = name.into();
        let (school, department) = normalize::split_school(&name);
        let total_threshold = thresholds.iter().map(|t| u32::from(t.level)).sum();
        Self {
            name,
            group: group.into().trim().to_string(),
            school,
            department,
            thresholds,
            total_threshold,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn school(&self) -> &str {
        &self.school
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn thresholds(&self) -> &[Threshold] {
        &self.thresholds
    }

    pub fn required_subjects(&self) -> Vec<Subject> {
        self.thresholds.iter().map(|t| t.subject).collect()
    }

    pub fn raw_subject_keys(&self) -> Vec<&str> {
        self.thresholds.iter().map(|t| t.raw_key.as_str()).collect()
    }

    pub fn threshold_for(&self, subject: Subject) -> Option<u8> {
        self.thresholds
            .iter()
            .find(|t| t.subject == subject)
            .map(|t| t.level)
    }

    pub fn total_threshold(&self) -> u32 {
        self.total_threshold
    }

    pub fn subject_count(&self) -> usize {
        self.thresholds.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub programs: Vec<Program>,
    pub groups: Vec<String>,
    pub schools: Vec<String>,
    pub fingerprint: String,
}

impl Catalog {
    pub fn new(programs: Vec<Program>, groups: BTreeSet<String>, schools: BTreeSet<String>) -> Self {
        let fingerprint = content_fingerprint(&programs);
        Self {
            programs,
            groups: groups.into_iter().collect(),
            schools: schools.into_iter().collect(),
            fingerprint,
        }
    }

    pub fn find(&self, name: &str) -> Option<&Program> {
        let needle = name.trim();
        self.programs.iter().find(|p| p.name == needle)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// SHA-256 over every program's name, group and ordered thresholds. Fields
/// are length-prefixed so adjacent values cannot run together.
fn content_fingerprint(programs: &[Program]) -> String {
    fn field(hasher: &mut Sha256, value: &str) {
        hasher.update((value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }

    let mut hasher = Sha256::new();
    hasher.update((programs.len() as u64).to_le_bytes());
    for program in programs {
        field(&mut hasher, &program.name);
        field(&mut hasher, &program.group);
        hasher.update((program.thresholds.len() as u64).to_le_bytes());
        for threshold in &program.thresholds {
            field(&mut hasher, &threshold.raw_key);
            field(&mut hasher, threshold.subject.as_slug());
            hasher.update([threshold.level]);
        }
    }
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MalformedRecord,
    MalformedScores,
    InvalidSubjects,
    ScoreOutOfRange,
    /// A later record repeating an accepted program name.
    DuplicateProgram,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub row: usize,
    pub name: String,
    pub reason: SkipReason,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogReport {
    pub source: String,
    pub total_records: usize,
    pub accepted: usize,
    pub skipped: Vec<SkippedRecord>,
    pub invalid_subjects: Vec<String>,
    pub empty_departments: Vec<String>,
}

impl CatalogReport {
    pub fn skipped_count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(name: &str, level: u8) -> Program {
        Program::new(
            name,
            "管理",
            vec![Threshold {
                raw_key: "國".to_string(),
                subject: Subject::Chinese,
                level,
            }],
        )
    }

    fn catalog(programs: Vec<Program>) -> Catalog {
        Catalog::new(programs, BTreeSet::new(), BTreeSet::new())
    }

    #[test]
    fn fingerprint_tracks_program_content() {
        let base = catalog(vec![program("甲大學 一系", 10), program("乙大學 二系", 11)]);
        let same = catalog(vec![program("甲大學 一系", 10), program("乙大學 二系", 11)]);
        assert_eq!(base.fingerprint, same.fingerprint);
        assert_eq!(base.fingerprint.len(), 64);

        let changed_level = catalog(vec![program("甲大學 一系", 10), program("乙大學 二系", 12)]);
        let reordered = catalog(vec![program("乙大學 二系", 11), program("甲大學 一系", 10)]);
        let empty = catalog(Vec::new());
        assert_ne!(base.fingerprint, changed_level.fingerprint);
        assert_ne!(base.fingerprint, reordered.fingerprint);
        assert_ne!(base.fingerprint, empty.fingerprint);
    }
}
