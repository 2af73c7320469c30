//! Ability levels, upgrade costs and branch choices.
//!
//! Levels only go up through [`Simulation::upgrade_ability`], which charges
//! insight. Branch points sit at levels 3, 6 and 9; each can be chosen once
//! after the level is reached and never changes for the rest of the run.
//!
//! [`Simulation::upgrade_ability`]: crate::simulation::Simulation::upgrade_ability

use serde::{Deserialize, Serialize};

use super::AbilityKind;
use crate::config::ProgressionConfig;

/// Levels at which a branch choice unlocks.
pub const BRANCH_THRESHOLDS: [u8; 3] = [3, 6, 9];

/// One side of a branch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    /// First option.
    Left,
    /// Second option.
    Right,
}

/// Per-ability progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AbilityRecord {
    level: u8,
    branches: [Option<Branch>; 3],
}

impl AbilityRecord {
    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Branch chosen at threshold `index` (0, 1 or 2).
    #[must_use]
    pub fn branch(&self, index: usize) -> Option<Branch> {
        self.branches.get(index).copied().flatten()
    }

    /// Whether threshold `index` is reached and still unchosen.
    #[must_use]
    pub fn can_choose(&self, index: usize) -> bool {
        match (BRANCH_THRESHOLDS.get(index), self.branches.get(index)) {
            (Some(&threshold), Some(None)) => self.level >= threshold,
            _ => false,
        }
    }

    /// Record a branch choice. Returns `false` (and changes nothing) when
    /// the threshold is not reached or already chosen.
    pub fn choose(&mut self, index: usize, branch: Branch) -> bool {
        if !self.can_choose(index) {
            return false;
        }
        self.branches[index] = Some(branch);
        true
    }
}

/// Insight cost to go from `level` to `level + 1`:
/// `round(base_cost * cost_growth^level)`.
#[must_use]
pub fn upgrade_cost(config: &ProgressionConfig, level: u8) -> u32 {
    let cost = (config.base_cost * config.cost_growth.powi(i32::from(level))).round();
    if cost.is_finite() && cost > 0.0 {
        cost.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Records for all nine abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AbilityProgression {
    records: [AbilityRecord; 9],
}

impl AbilityProgression {
    /// Every ability at level 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `kind`.
    #[must_use]
    pub fn record(&self, kind: AbilityKind) -> &AbilityRecord {
        &self.records[kind.index()]
    }

    /// Level of `kind`.
    #[must_use]
    pub fn level(&self, kind: AbilityKind) -> u8 {
        self.record(kind).level
    }

    /// Cost of the next level, or `None` at `max_level`.
    #[must_use]
    pub fn next_cost(&self, kind: AbilityKind, config: &ProgressionConfig) -> Option<u32> {
        let level = self.level(kind);
        (level < config.max_level).then(|| upgrade_cost(config, level))
    }

    /// Raise `kind` one level. Callers pay first.
    pub(crate) fn level_up(&mut self, kind: AbilityKind) {
        let record = &mut self.records[kind.index()];
        record.level = record.level.saturating_add(1);
    }

    /// Choose a branch for `kind` at threshold `index`.
    pub(crate) fn choose_branch(&mut self, kind: AbilityKind, index: usize, branch: Branch) -> bool {
        self.records[kind.index()].choose(index, branch)
    }

    /// Sum of all levels.
    #[must_use]
    pub fn total_levels(&self) -> u32 {
        self.records.iter().map(|r| u32::from(r.level)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_cost_curve() {
        let config = ProgressionConfig::default();
        assert_eq!(upgrade_cost(&config, 0), 10);
        assert_eq!(upgrade_cost(&config, 1), 15);
        assert_eq!(upgrade_cost(&config, 2), 23);
        assert_eq!(upgrade_cost(&config, 3), 34);
    }

    #[test]
    fn test_next_cost_stops_at_max() {
        let config = ProgressionConfig {
            max_level: 2,
            ..ProgressionConfig::default()
        };
        let mut progression = AbilityProgression::new();
        assert_eq!(progression.next_cost(AbilityKind::Beam, &config), Some(10));
        progression.level_up(AbilityKind::Beam);
        progression.level_up(AbilityKind::Beam);
        assert_eq!(progression.next_cost(AbilityKind::Beam, &config), None);
        assert_eq!(progression.level(AbilityKind::Ripple), 0);
    }

    #[test]
    fn test_branch_needs_threshold_and_is_permanent() {
        let mut record = AbilityRecord::default();
        assert!(!record.choose(0, Branch::Left));
        record.level = 3;
        assert!(!record.can_choose(1));
        assert!(record.choose(0, Branch::Left));
        assert!(!record.choose(0, Branch::Right));
        assert_eq!(record.branch(0), Some(Branch::Left));
        assert!(!record.choose(5, Branch::Left));
    }
}
