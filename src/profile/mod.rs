pub mod allocation;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::criteria::{clamp_level, Subject};

pub use allocation::{Allocation, AllocationAdjustment, DEFAULT_TOTAL};

/// Sentinel names that mean "no school filter".
const ALL_SCHOOLS: [&str; 3] = ["全部學校", "all", "*"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum SchoolFilter {
    #[default]
    All,
    Only(String),
}

impl SchoolFilter {
    pub fn matches(&self, school: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => name == school,
        }
    }
}

impl From<Option<String>> for SchoolFilter {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() || ALL_SCHOOLS.iter().any(|s| s.eq_ignore_ascii_case(trimmed)) {
                    Self::All
                } else {
                    Self::Only(trimmed.to_string())
                }
            }
            None => Self::All,
        }
    }
}

impl From<SchoolFilter> for Option<String> {
    fn from(value: SchoolFilter) -> Self {
        match value {
            SchoolFilter::All => None,
            SchoolFilter::Only(name) => Some(name),
        }
    }
}

/// Everything the student submitted. Two profiles that compare equal produce
/// the same session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentProfile {
    #[serde(default)]
    pub scores: BTreeMap<Subject, u8>,
    #[serde(default)]
    pub interests: BTreeSet<String>,
    #[serde(default)]
    pub school: SchoolFilter,
    #[serde(default)]
    pub allocation: Allocation,
}

impl StudentProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(mut self, subject: Subject, level: i64) -> Self {
        self.scores.insert(subject, clamp_level(level));
        self
    }

    pub fn with_interest(mut self, group: &str) -> Self {
        let group = group.trim();
        if !group.is_empty() {
            self.interests.insert(group.to_string());
        }
        self
    }

    pub fn with_school(mut self, school: SchoolFilter) -> Self {
        self.school = school;
        self
    }

    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn score(&self, subject: Subject) -> Option<u8> {
        self.scores.get(&subject).copied()
    }

    pub fn has_scores(&self) -> bool {
        !self.scores.is_empty()
    }

    pub fn accepts_group(&self, group: &str) -> bool {
        self.interests.is_empty() || self.interests.contains(group)
    }

    /// Clamps every level into range; used for profiles deserialized from
    /// untrusted input.
    pub fn normalized(mut self) -> Self {
        for level in self.scores.values_mut() {
            *level = clamp_level(i64::from(*level));
        }
        self.interests = self
            .interests
            .into_iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_clamps_levels() {
        let profile = StudentProfile::new()
            .with_score(Subject::Chinese, 20)
            .with_score(Subject::English, -1);
        assert_eq!(profile.score(Subject::Chinese), Some(15));
        assert_eq!(profile.score(Subject::English), Some(0));
        assert_eq!(profile.score(Subject::Science), None);
    }

    #[test]
    fn empty_interest_set_accepts_every_group() {
        let open = StudentProfile::new();
        assert!(open.accepts_group("管理"));
        let narrowed = StudentProfile::new().with_interest("資訊");
        assert!(narrowed.accepts_group("資訊"));
        assert!(!narrowed.accepts_group("管理"));
    }

    #[test]
    fn school_sentinels_mean_all_schools() {
        assert_eq!(SchoolFilter::from(Some("全部學校".to_string())), SchoolFilter::All);
        assert_eq!(SchoolFilter::from(Some("  ".to_string())), SchoolFilter::All);
        assert_eq!(
            SchoolFilter::from(Some("世新大學".to_string())),
            SchoolFilter::Only("世新大學".to_string())
        );
        assert!(SchoolFilter::All.matches("任何大學"));
    }

    #[test]
    fn deserializes_scores_by_subject_alias() {
        let profile: StudentProfile = serde_json::from_str(
            r#"{"scores": {"國文": 12, "math_a": 13}, "interests": ["資訊"], "school": null}"#,
        )
        .expect("profile json");
        assert_eq!(profile.score(Subject::Chinese), Some(12));
        assert_eq!(profile.score(Subject::MathA), Some(13));
        assert_eq!(profile.school, SchoolFilter::All);
        assert_eq!(profile.allocation, Allocation::default());
    }
}
