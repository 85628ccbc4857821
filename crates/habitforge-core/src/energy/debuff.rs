//! Pure debuff derivation from the current energy level.
//!
//! A drained pool yields at most one debuff; callers fold the stat penalties
//! into their own gameplay computations, nothing is applied here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::EnergyState;

/// Below this the pool is considered fatigued.
pub const FATIGUED_THRESHOLD: i64 = 30;

/// Below this the pool is considered exhausted.
pub const EXHAUSTED_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebuffKind {
    Fatigued,
    Exhausted,
}

/// An active penalty derived from low energy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debuff {
    pub kind: DebuffKind,
    pub description: String,
    /// Stat name to signed delta, consumed by the caller's stat computation.
    pub stat_penalties: BTreeMap<String, i64>,
}

/// Derive zero or one debuff from the pool level.
pub fn derive_debuffs(state: &EnergyState) -> Vec<Debuff> {
    if state.current < EXHAUSTED_THRESHOLD {
        vec![exhausted()]
    } else if state.current < FATIGUED_THRESHOLD {
        vec![fatigued()]
    } else {
        Vec::new()
    }
}

fn fatigued() -> Debuff {
    Debuff {
        kind: DebuffKind::Fatigued,
        description: "Running low on energy; everything takes a little longer.".to_string(),
        stat_penalties: BTreeMap::from([
            ("focus".to_string(), -2),
            ("discipline".to_string(), -1),
        ]),
    }
}

fn exhausted() -> Debuff {
    Debuff {
        kind: DebuffKind::Exhausted,
        description: "Nothing left in the tank; rest before taking on more.".to_string(),
        stat_penalties: BTreeMap::from([
            ("focus".to_string(), -5),
            ("discipline".to_string(), -3),
            ("vitality".to_string(), -2),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state_with(current: i64) -> EnergyState {
        EnergyState {
            current,
            max: 100,
            bonus: 0,
            last_regen_at: Utc::now(),
        }
    }

    #[test]
    fn healthy_pool_has_no_debuffs() {
        assert!(derive_debuffs(&state_with(30)).is_empty());
        assert!(derive_debuffs(&state_with(100)).is_empty());
    }

    #[test]
    fn low_pool_is_fatigued() {
        let debuffs = derive_debuffs(&state_with(29));
        assert_eq!(debuffs.len(), 1);
        assert_eq!(debuffs[0].kind, DebuffKind::Fatigued);
        assert_eq!(debuffs[0].stat_penalties["focus"], -2);
    }

    #[test]
    fn drained_pool_is_exhausted_only() {
        let debuffs = derive_debuffs(&state_with(0));
        assert_eq!(debuffs.len(), 1);
        assert_eq!(debuffs[0].kind, DebuffKind::Exhausted);
        assert_eq!(debuffs[0].stat_penalties["vitality"], -2);
    }

    #[test]
    fn boundary_at_ten_is_fatigued_not_exhausted() {
        let debuffs = derive_debuffs(&state_with(10));
        assert_eq!(debuffs[0].kind, DebuffKind::Fatigued);
    }
}
