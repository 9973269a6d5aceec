pub mod store;

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{Catalog, Program};
use crate::eligibility::Tier;
use crate::pool::builder::build_pools;
use crate::pool::{PoolDiagnostics, PoolEntry};
use crate::profile::{Allocation, AllocationAdjustment, StudentProfile};
use crate::reason::{summarize, Reason};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("item {item_id} not found in {tier} recommendations")]
    ItemNotFound { tier: Tier, item_id: String },
    #[error("session {0} not found")]
    SessionNotFound(String),
}

/// One surfaced recommendation. The id is minted per inclusion, so a program
/// that comes back through replenishment gets a new one.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendationItem {
    pub id: String,
    pub tier: Tier,
    pub program: Program,
    pub reason: Reason,
}

impl RecommendationItem {
    fn from_entry(tier: Tier, entry: PoolEntry) -> Self {
        let reason = summarize(&entry.classification, entry.program.group());
        Self {
            id: Uuid::new_v4().to_string(),
            tier,
            program: entry.program,
            reason,
        }
    }

    pub fn name(&self) -> &str {
        self.program.name()
    }
}

#[derive(Debug, Clone)]
pub struct TierState {
    pub target: u32,
    pub shown: Vec<RecommendationItem>,
    pub available: VecDeque<PoolEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TierCounts {
    pub tier: Tier,
    pub shown: usize,
    pub target: u32,
    pub available: usize,
}

impl TierCounts {
    pub fn is_satisfied(&self) -> bool {
        self.shown >= self.target as usize
    }

    pub fn status_message(&self) -> String {
        if self.shown == 0 && self.target > 0 {
            format!(
                "{}: no eligible programs; required subjects may be missing or scores too low.",
                self.tier
            )
        } else if !self.is_satisfied() {
            format!(
                "{}: only {}/{} recommendations available, no more replacements.",
                self.tier, self.shown, self.target
            )
        } else {
            format!(
                "{}: {} shown of {} target, {} more available.",
                self.tier, self.shown, self.target, self.available
            )
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalOutcome {
    pub tier: Tier,
    pub removed: RecommendationItem,
    pub replacement: Option<RecommendationItem>,
    pub counts: TierCounts,
    pub message: String,
}

/// Shown/available state for one submitted profile. Any change to the
/// profile means building a new session.
#[derive(Debug, Clone)]
pub struct AllocationSession {
    pub created_at: DateTime<Utc>,
    pub profile: StudentProfile,
    pub total: u32,
    pub allocation: Allocation,
    pub adjustment: Option<AllocationAdjustment>,
    pub catalog_fingerprint: String,
    pub diagnostics: PoolDiagnostics,
    tiers: BTreeMap<Tier, TierState>,
}

impl AllocationSession {
    pub fn build(catalog: &Catalog, profile: StudentProfile, total: u32) -> Self {
        let (allocation, adjustment) = profile.allocation.repaired(total);
        if let Some(adjustment) = &adjustment {
            warn!("{}", adjustment.message());
        }

        let mut pools = build_pools(&catalog.programs, &profile);
        let mut tiers = BTreeMap::new();
        for tier in Tier::ALL {
            let target = allocation.count(tier);
            let mut available: VecDeque<PoolEntry> = pools.into_pool(tier).into();
            let take = (target as usize).min(available.len());
            let shown = available
                .drain(..take)
                .map(|entry| RecommendationItem::from_entry(tier, entry))
                .collect::<Vec<_>>();
            if shown.len() < target as usize {
                warn!(
                    "{tier} has only {} eligible programs, fewer than the requested {target}",
                    shown.len()
                );
            }
            tiers.insert(
                tier,
                TierState {
                    target,
                    shown,
                    available,
                },
            );
        }

        info!(
            "session built: {} conservative, {} realistic, {} ambitious shown",
            tiers[&Tier::Conservative].shown.len(),
            tiers[&Tier::Realistic].shown.len(),
            tiers[&Tier::Ambitious].shown.len()
        );

        Self {
            created_at: Utc::now(),
            profile,
            total,
            allocation,
            adjustment,
            catalog_fingerprint: catalog.fingerprint.clone(),
            diagnostics: pools.diagnostics,
            tiers,
        }
    }

    /// True when a resubmission would rebuild exactly this session.
    pub fn matches_inputs(&self, profile: &StudentProfile, total: u32, catalog: &Catalog) -> bool {
        self.profile == *profile
            && self.total == total
            && self.catalog_fingerprint == catalog.fingerprint
    }

    pub fn shown(&self, tier: Tier) -> &[RecommendationItem] {
        self.tiers
            .get(&tier)
            .map(|state| state.shown.as_slice())
            .unwrap_or(&[])
    }

    pub fn available(&self, tier: Tier) -> impl Iterator<Item = &PoolEntry> {
        self.tiers
            .get(&tier)
            .into_iter()
            .flat_map(|state| state.available.iter())
    }

    pub fn counts(&self, tier: Tier) -> TierCounts {
        let state = self.tiers.get(&tier);
        TierCounts {
            tier,
            shown: state.map(|s| s.shown.len()).unwrap_or(0),
            target: state.map(|s| s.target).unwrap_or(0),
            available: state.map(|s| s.available.len()).unwrap_or(0),
        }
    }

    pub fn tier_status(&self, tier: Tier) -> String {
        self.counts(tier).status_message()
    }

    pub fn find_shown_by_name(&self, name: &str) -> Option<&RecommendationItem> {
        let needle = name.trim();
        Tier::ALL
            .iter()
            .flat_map(|tier| self.shown(*tier))
            .find(|item| item.name() == needle)
    }

    /// Drops `item_id` from the tier's shown list and promotes the head of
    /// that tier's queue, if any. Other tiers are never touched.
    pub fn remove_and_replenish(
        &mut self,
        tier: Tier,
        item_id: &str,
    ) -> Result<RemovalOutcome, SessionError> {
        let not_found = || SessionError::ItemNotFound {
            tier,
            item_id: item_id.to_string(),
        };
        let state = self.tiers.get_mut(&tier).ok_or_else(not_found)?;
        let Some(position) = state.shown.iter().position(|item| item.id == item_id) else {
            warn!("removal failed: {item_id} is not shown in {tier}");
            return Err(not_found());
        };

        let removed = state.shown.remove(position);
        let replacement = state.available.pop_front().map(|entry| {
            let item = RecommendationItem::from_entry(tier, entry);
            state.shown.push(item.clone());
            item
        });

        let message = match &replacement {
            Some(next) => format!("{} replaced by {}", removed.name(), next.name()),
            None => format!("{}, no replacement available", removed.name()),
        };
        info!("{tier}: {message}");

        Ok(RemovalOutcome {
            tier,
            removed,
            replacement,
            counts: self.counts(tier),
            message,
        })
    }

    pub fn view(&self, session_id: &str) -> SessionView {
        SessionView {
            session_id: session_id.to_string(),
            created_at: self.created_at,
            catalog_fingerprint: self.catalog_fingerprint.clone(),
            allocation: self.allocation,
            adjustment: self.adjustment.clone(),
            tiers: Tier::ALL
                .iter()
                .map(|tier| {
                    let counts = self.counts(*tier);
                    TierView {
                        tier: *tier,
                        status: self.tier_status(*tier),
                        counts,
                        items: self.shown(*tier).to_vec(),
                    }
                })
                .collect(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TierView {
    pub tier: Tier,
    pub counts: TierCounts,
    pub status: String,
    pub items: Vec<RecommendationItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub catalog_fingerprint: String,
    pub allocation: Allocation,
    pub adjustment: Option<AllocationAdjustment>,
    pub tiers: Vec<TierView>,
    pub diagnostics: PoolDiagnostics,
}
