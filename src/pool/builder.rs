use std::cmp::Reverse;
use std::collections::HashSet;

use tracing::{debug, info};

use crate::catalog::Program;
use crate::eligibility::classifier::evaluate_program;
use crate::eligibility::{Evaluation, Tier};
use crate::pool::{PoolDiagnostics, PoolEntry, TierPools};
use crate::profile::StudentProfile;

/// Filters the catalog by interest and school, classifies what remains and
/// ranks each tier's pool.
pub fn build_pools(programs: &[Program], profile: &StudentProfile) -> TierPools {
    let mut pools = TierPools::default();
    for tier in Tier::ALL {
        pools.pools.insert(tier, Vec::new());
    }
    let mut diagnostics = PoolDiagnostics {
        catalog_size: programs.len(),
        ..PoolDiagnostics::default()
    };

    let mut seen_names = HashSet::new();
    for program in programs {
        if !seen_names.insert(program.name()) {
            debug!("{} repeats an earlier program, skipping", program.name());
            diagnostics.duplicate_programs += 1;
            continue;
        }
        if !profile.accepts_group(program.group()) {
            diagnostics.filtered_by_group += 1;
            continue;
        }
        if !profile.school.matches(program.school()) {
            diagnostics.filtered_by_school += 1;
            continue;
        }
        diagnostics.considered += 1;

        match evaluate_program(program, &profile.scores) {
            Evaluation::Classified(classification) => {
                pools
                    .pools
                    .entry(classification.tier)
                    .or_default()
                    .push(PoolEntry {
                        program: program.clone(),
                        classification,
                    });
            }
            Evaluation::MissingSubjects { subjects } => {
                debug!("{} missing subjects {:?}", program.name(), subjects);
                diagnostics.missing_subject_programs += 1;
                for subject in subjects {
                    *diagnostics.missing_subjects.entry(subject).or_default() += 1;
                }
            }
            Evaluation::Unscored { reason } => {
                debug!("{} unscored ({reason:?})", program.name());
                diagnostics.unscored += 1;
            }
        }
    }

    for (tier, pool) in pools.pools.iter_mut() {
        rank_pool(pool);
        diagnostics.pool_sizes.insert(*tier, pool.len());
    }
    info!(
        "pool sizes - conservative: {}, realistic: {}, ambitious: {}",
        pools.pool(Tier::Conservative).len(),
        pools.pool(Tier::Realistic).len(),
        pools.pool(Tier::Ambitious).len()
    );

    pools.diagnostics = diagnostics;
    pools
}

/// Higher total threshold first, then more required subjects. The sort is
/// stable so ties keep catalog order.
pub fn rank_pool(pool: &mut [PoolEntry]) {
    pool.sort_by_key(|entry| {
        Reverse((
            entry.program.total_threshold(),
            entry.program.subject_count(),
        ))
    });
}
