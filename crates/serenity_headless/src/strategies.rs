//! Scripted upgrade strategies for headless playtesting.
//!
//! A strategy decides which ability to buy next from what the run can
//! currently afford. The runner asks it at a fixed interval and keeps
//! buying until it declines.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serenity_core::abilities::AbilityKind;
use serenity_core::simulation::Simulation;
use thiserror::Error;

/// Error type for strategy operations.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// Unknown strategy or ability name.
    #[error("Unknown strategy '{0}' (expected none, cheapest, balanced or focused:<ability>,...)")]
    UnknownName(String),
    /// Failed to read file.
    #[error("Failed to read strategy file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse strategy: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// How insight gets spent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeStrategy {
    /// Never upgrade.
    None,
    /// Buy whatever enabled ability is cheapest right now.
    Cheapest,
    /// Keep levels even: always raise the lowest enabled ability.
    #[default]
    Balanced,
    /// Buy in priority order; move down the list once an ability is maxed.
    Focused(Vec<AbilityKind>),
}

impl UpgradeStrategy {
    /// Load a strategy from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StrategyError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, StrategyError> {
        Ok(ron::from_str(ron)?)
    }

    /// Short name for reports.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::None => "none".to_string(),
            Self::Cheapest => "cheapest".to_string(),
            Self::Balanced => "balanced".to_string(),
            Self::Focused(order) => {
                let names: Vec<_> = order.iter().map(|kind| kind.name()).collect();
                format!("focused:{}", names.join(","))
            }
        }
    }

    /// Ability to buy next, if any is wanted and affordable.
    #[must_use]
    pub fn choose(&self, sim: &Simulation) -> Option<AbilityKind> {
        let insight = sim.run_state().insight;
        let affordable = |kind: &AbilityKind| {
            kind.enabled(sim.config()) && sim.upgrade_cost(*kind).is_some_and(|cost| cost <= insight)
        };

        match self {
            Self::None => None,
            Self::Cheapest => AbilityKind::ALL
                .into_iter()
                .filter(affordable)
                .min_by_key(|&kind| sim.upgrade_cost(kind)),
            Self::Balanced => {
                let lowest = AbilityKind::ALL
                    .into_iter()
                    .filter(|kind| kind.enabled(sim.config()) && sim.upgrade_cost(*kind).is_some())
                    .min_by_key(|&kind| sim.progression().level(kind))?;
                affordable(&lowest).then_some(lowest)
            }
            Self::Focused(order) => {
                let next = order.iter().copied().find(|&kind| {
                    kind.enabled(sim.config()) && sim.upgrade_cost(kind).is_some()
                })?;
                affordable(&next).then_some(next)
            }
        }
    }
}

impl FromStr for UpgradeStrategy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "none" => Ok(Self::None),
            "cheapest" => Ok(Self::Cheapest),
            "balanced" => Ok(Self::Balanced),
            _ => {
                let Some(list) = lower.strip_prefix("focused:") else {
                    return Err(StrategyError::UnknownName(s.to_string()));
                };
                let order = list
                    .split(',')
                    .map(|name| AbilityKind::from_name(name.trim()).ok_or_else(|| StrategyError::UnknownName(s.to_string())))
                    .collect::<Result<Vec<_>, _>>()?;
                if order.is_empty() {
                    return Err(StrategyError::UnknownName(s.to_string()));
                }
                Ok(Self::Focused(order))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity_test_utils::fixtures::wealthy_simulation;

    #[test]
    fn test_parse_names() {
        assert_eq!("none".parse::<UpgradeStrategy>().unwrap(), UpgradeStrategy::None);
        assert_eq!("Cheapest".parse::<UpgradeStrategy>().unwrap(), UpgradeStrategy::Cheapest);
        assert_eq!(
            "focused:beam, ripple".parse::<UpgradeStrategy>().unwrap(),
            UpgradeStrategy::Focused(vec![AbilityKind::Beam, AbilityKind::Ripple])
        );
        assert!("aggressive".parse::<UpgradeStrategy>().is_err());
        assert!("focused:lasers".parse::<UpgradeStrategy>().is_err());
    }

    #[test]
    fn test_name_roundtrips_through_parse() {
        let strategy = UpgradeStrategy::Focused(vec![AbilityKind::Echo, AbilityKind::Field]);
        assert_eq!(strategy.name().parse::<UpgradeStrategy>().unwrap(), strategy);
    }

    #[test]
    fn test_ron_strategy() {
        let strategy = UpgradeStrategy::from_ron_str("Focused([Barrier, Breath])").unwrap();
        assert_eq!(strategy, UpgradeStrategy::Focused(vec![AbilityKind::Barrier, AbilityKind::Breath]));
    }

    #[test]
    fn test_none_never_buys() {
        let sim = wealthy_simulation(1, 1_000);
        assert_eq!(UpgradeStrategy::None.choose(&sim), None);
    }

    #[test]
    fn test_nothing_affordable() {
        let sim = wealthy_simulation(1, 5);
        assert_eq!(UpgradeStrategy::Cheapest.choose(&sim), None);
        assert_eq!(UpgradeStrategy::Balanced.choose(&sim), None);
    }

    #[test]
    fn test_balanced_picks_lowest_level() {
        let mut sim = wealthy_simulation(1, 1_000);
        assert!(sim.upgrade_ability(AbilityKind::Breath));
        let choice = UpgradeStrategy::Balanced.choose(&sim).unwrap();
        assert_ne!(choice, AbilityKind::Breath);
        assert_eq!(sim.progression().level(choice), 0);
    }

    #[test]
    fn test_focused_moves_on_when_maxed() {
        let mut config = serenity_core::config::SimConfig::default();
        config.progression.max_level = 1;
        let mut sim = Simulation::new(config, 2).unwrap();
        sim.apply_state_delta(serenity_core::simulation::RunStateDelta {
            insight: Some(100),
            ..Default::default()
        });
        let strategy = UpgradeStrategy::Focused(vec![AbilityKind::Beam, AbilityKind::Echo]);
        assert_eq!(strategy.choose(&sim), Some(AbilityKind::Beam));
        assert!(sim.upgrade_ability(AbilityKind::Beam));
        assert_eq!(strategy.choose(&sim), Some(AbilityKind::Echo));
    }
}
