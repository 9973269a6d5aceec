use serde::{Deserialize, Serialize};

use crate::eligibility::Tier;

pub const DEFAULT_TOTAL: u32 = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Allocation {
    pub conservative: u32,
    pub realistic: u32,
    pub ambitious: u32,
}

impl Default for Allocation {
    fn default() -> Self {
        Self::new(2, 2, 2)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllocationAdjustment {
    pub requested: Allocation,
    pub applied: Allocation,
    pub target_total: u32,
}

impl AllocationAdjustment {
    pub fn message(&self) -> String {
        format!(
            "allocation summed to {}, adjusted to {}: conservative {}, realistic {}, ambitious {}",
            self.requested.total(),
            self.target_total,
            self.applied.conservative,
            self.applied.realistic,
            self.applied.ambitious
        )
    }
}

impl Allocation {
    pub fn new(conservative: u32, realistic: u32, ambitious: u32) -> Self {
        Self {
            conservative,
            realistic,
            ambitious,
        }
    }

    /// Widened so that any three `u32` counts sum without overflow.
    pub fn total(&self) -> u64 {
        u64::from(self.conservative) + u64::from(self.realistic) + u64::from(self.ambitious)
    }

    pub fn count(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Conservative => self.conservative,
            Tier::Realistic => self.realistic,
            Tier::Ambitious => self.ambitious,
        }
    }

    /// Forces the counts to sum to `target`. A deficit goes to ambitious; a
    /// surplus is drained from ambitious, then realistic, then conservative.
    pub fn repaired(self, target: u32) -> (Allocation, Option<AllocationAdjustment>) {
        let total = self.total();
        let wide_target = u64::from(target);
        if total == wide_target {
            return (self, None);
        }

        let mut applied = self;
        if total < wide_target {
            // total < target, so every bucket and the deficit fit in u32.
            applied.ambitious += target - total as u32;
        } else {
            let mut excess = total - wide_target;
            for bucket in [
                &mut applied.ambitious,
                &mut applied.realistic,
                &mut applied.conservative,
            ] {
                let take = u64::from(*bucket).min(excess);
                *bucket -= take as u32;
                excess -= take;
            }
        }

        let adjustment = AllocationAdjustment {
            requested: self,
            applied,
            target_total: target,
        };
        (applied, Some(adjustment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_allocation_is_untouched() {
        let (applied, adjustment) = Allocation::new(1, 3, 2).repaired(DEFAULT_TOTAL);
        assert_eq!(applied, Allocation::new(1, 3, 2));
        assert!(adjustment.is_none());
    }

    #[test]
    fn deficit_goes_to_ambitious() {
        let (applied, adjustment) = Allocation::new(1, 1, 0).repaired(DEFAULT_TOTAL);
        assert_eq!(applied, Allocation::new(1, 1, 4));
        let adjustment = adjustment.expect("adjusted");
        assert_eq!(adjustment.requested.total(), 2);
        assert!(adjustment.message().contains("adjusted to 6"));
    }

    #[test]
    fn surplus_drains_ambitious_then_realistic_then_conservative() {
        let (applied, _) = Allocation::new(3, 3, 3).repaired(DEFAULT_TOTAL);
        assert_eq!(applied, Allocation::new(3, 3, 0));

        let (applied, _) = Allocation::new(5, 4, 1).repaired(DEFAULT_TOTAL);
        assert_eq!(applied, Allocation::new(5, 1, 0));

        let (applied, _) = Allocation::new(9, 0, 0).repaired(DEFAULT_TOTAL);
        assert_eq!(applied, Allocation::new(6, 0, 0));
    }

    #[test]
    fn repair_always_sums_to_target() {
        for c in 0..8 {
            for r in 0..8 {
                for a in 0..8 {
                    let (applied, _) = Allocation::new(c, r, a).repaired(DEFAULT_TOTAL);
                    assert_eq!(applied.total(), u64::from(DEFAULT_TOTAL), "input {c}/{r}/{a}");
                }
            }
        }
    }

    #[test]
    fn repair_handles_counts_that_overflow_u32() {
        let extremes = [0, 1, DEFAULT_TOTAL, u32::MAX - 1, u32::MAX];
        for c in extremes {
            for r in extremes {
                for a in extremes {
                    let (applied, _) = Allocation::new(c, r, a).repaired(DEFAULT_TOTAL);
                    assert_eq!(applied.total(), u64::from(DEFAULT_TOTAL), "input {c}/{r}/{a}");
                }
            }
        }

        let (applied, adjustment) = Allocation::new(u32::MAX, u32::MAX, 0).repaired(DEFAULT_TOTAL);
        assert_eq!(applied, Allocation::new(6, 0, 0));
        let adjustment = adjustment.expect("adjusted");
        assert_eq!(adjustment.requested.total(), 2 * u64::from(u32::MAX));
    }
}
