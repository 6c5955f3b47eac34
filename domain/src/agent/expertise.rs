//! Expertise profiles: per-agent pillar weights and the derived band partition.

use crate::core::error::DomainError;
use crate::pillar::{Pillar, PillarRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight at or above which a pillar is PRIMARY for an agent.
pub const PRIMARY_MIN_WEIGHT: f64 = 0.4;
/// Weight at or above which a pillar is SECONDARY (below PRIMARY).
pub const SECONDARY_MIN_WEIGHT: f64 = 0.15;

/// Expertise band of a pillar for one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertiseBand {
    Primary,
    Secondary,
    Tertiary,
}

impl ExpertiseBand {
    pub const ALL: [ExpertiseBand; 3] = [
        ExpertiseBand::Primary,
        ExpertiseBand::Secondary,
        ExpertiseBand::Tertiary,
    ];

    /// Band for a raw weight.
    pub fn for_weight(weight: f64) -> Self {
        if weight >= PRIMARY_MIN_WEIGHT {
            ExpertiseBand::Primary
        } else if weight >= SECONDARY_MIN_WEIGHT {
            ExpertiseBand::Secondary
        } else {
            ExpertiseBand::Tertiary
        }
    }

    /// Share of the clarity score contributed by this band.
    pub fn clarity_share(&self) -> f64 {
        match self {
            ExpertiseBand::Primary => 0.6,
            ExpertiseBand::Secondary => 0.3,
            ExpertiseBand::Tertiary => 0.1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpertiseBand::Primary => "primary",
            ExpertiseBand::Secondary => "secondary",
            ExpertiseBand::Tertiary => "tertiary",
        }
    }
}

impl std::fmt::Display for ExpertiseBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable pillar → weight mapping owned by an agent definition
///
/// The PRIMARY/SECONDARY/TERTIARY partition is always derived from the
/// weights on demand. Pillars without an explicit weight count as 0.
///
/// # Example
///
/// ```
/// use council_domain::agent::{ExpertiseBand, ExpertiseProfile};
/// use council_domain::pillar::Pillar;
///
/// let profile = ExpertiseProfile::new([
///     (Pillar::TestCoverage, 0.5),
///     (Pillar::CodeQuality, 0.2),
/// ]).unwrap();
///
/// assert_eq!(profile.band(Pillar::TestCoverage), ExpertiseBand::Primary);
/// assert_eq!(profile.band(Pillar::CodeQuality), ExpertiseBand::Secondary);
/// assert_eq!(profile.band(Pillar::CodeComplexity), ExpertiseBand::Tertiary);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertiseProfile {
    weights: BTreeMap<Pillar, f64>,
}

impl ExpertiseProfile {
    /// Build a profile, validating that every weight lies in `[0, 1]`.
    ///
    /// An empty weight set is a configuration error: without weights the
    /// clarity weighting is meaningless.
    pub fn new(weights: impl IntoIterator<Item = (Pillar, f64)>) -> Result<Self, DomainError> {
        let weights: BTreeMap<Pillar, f64> = weights.into_iter().collect();
        if weights.is_empty() {
            return Err(DomainError::MissingConfiguration(
                "expertise profile has no pillar weights".to_string(),
            ));
        }
        for (pillar, weight) in &weights {
            if !(0.0..=1.0).contains(weight) {
                return Err(DomainError::InvalidWeight {
                    pillar: pillar.key().to_string(),
                    weight: *weight,
                });
            }
        }
        Ok(Self { weights })
    }

    /// Parse a profile keyed by pillar names (as found in config files).
    pub fn from_named<'a>(
        weights: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<Self, DomainError> {
        let parsed = weights
            .into_iter()
            .map(|(name, w)| name.parse::<Pillar>().map(|p| (p, w)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    pub fn weight(&self, pillar: Pillar) -> f64 {
        self.weights.get(&pillar).copied().unwrap_or(0.0)
    }

    pub fn band(&self, pillar: Pillar) -> ExpertiseBand {
        ExpertiseBand::for_weight(self.weight(pillar))
    }

    /// Registry pillars falling in `band`, in canonical order.
    pub fn pillars_in(&self, band: ExpertiseBand, registry: &PillarRegistry) -> Vec<Pillar> {
        registry
            .pillars()
            .iter()
            .copied()
            .filter(|p| self.band(*p) == band)
            .collect()
    }

    pub fn primary_pillars(&self, registry: &PillarRegistry) -> Vec<Pillar> {
        self.pillars_in(ExpertiseBand::Primary, registry)
    }

    pub fn weights(&self) -> impl Iterator<Item = (Pillar, f64)> + '_ {
        self.weights.iter().map(|(p, w)| (*p, *w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_thresholds() {
        assert_eq!(ExpertiseBand::for_weight(0.4), ExpertiseBand::Primary);
        assert_eq!(ExpertiseBand::for_weight(0.39), ExpertiseBand::Secondary);
        assert_eq!(ExpertiseBand::for_weight(0.15), ExpertiseBand::Secondary);
        assert_eq!(ExpertiseBand::for_weight(0.149), ExpertiseBand::Tertiary);
        assert_eq!(ExpertiseBand::for_weight(0.0), ExpertiseBand::Tertiary);
    }

    #[test]
    fn test_band_shares_sum_to_one() {
        let total: f64 = ExpertiseBand::ALL.iter().map(|b| b.clarity_share()).sum();
        assert!((total - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_out_of_range_weight() {
        let err = ExpertiseProfile::new([(Pillar::CodeQuality, 1.2)]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidWeight { .. }));
    }

    #[test]
    fn test_rejects_empty_profile() {
        let err = ExpertiseProfile::new(Vec::new()).unwrap_err();
        assert!(matches!(err, DomainError::MissingConfiguration(_)));
    }

    #[test]
    fn test_from_named() {
        let profile =
            ExpertiseProfile::from_named([("functionalImpact", 0.5), ("code_quality", 0.1)])
                .unwrap();
        assert_eq!(profile.weight(Pillar::FunctionalImpact), 0.5);
        assert_eq!(profile.weight(Pillar::CodeQuality), 0.1);
        assert!(ExpertiseProfile::from_named([("velocity", 0.5)]).is_err());
    }

    #[test]
    fn test_partition_over_registry() {
        let profile = ExpertiseProfile::new([
            (Pillar::FunctionalImpact, 0.5),
            (Pillar::IdealTimeHours, 0.2),
        ])
        .unwrap();
        let registry = PillarRegistry::standard();

        assert_eq!(
            profile.primary_pillars(&registry),
            vec![Pillar::FunctionalImpact]
        );
        assert_eq!(
            profile.pillars_in(ExpertiseBand::Secondary, &registry),
            vec![Pillar::IdealTimeHours]
        );
        assert_eq!(
            profile
                .pillars_in(ExpertiseBand::Tertiary, &registry)
                .len(),
            5
        );
    }
}
