pub mod builder;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::Program;
use crate::criteria::Subject;
use crate::eligibility::{Classification, Tier};

/// A classified program waiting in a tier pool.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PoolEntry {
    pub program: Program,
    pub classification: Classification,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PoolDiagnostics {
    pub catalog_size: usize,
    pub duplicate_programs: usize,
    pub filtered_by_group: usize,
    pub filtered_by_school: usize,
    pub considered: usize,
    pub unscored: usize,
    pub missing_subject_programs: usize,
    pub missing_subjects: BTreeMap<Subject, usize>,
    pub pool_sizes: BTreeMap<Tier, usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TierPools {
    pub pools: BTreeMap<Tier, Vec<PoolEntry>>,
    pub diagnostics: PoolDiagnostics,
}

impl TierPools {
    pub fn pool(&self, tier: Tier) -> &[PoolEntry] {
        self.pools.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_pool(&mut self, tier: Tier) -> Vec<PoolEntry> {
        self.pools.remove(&tier).unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }
}
