//! Pillar values and the per-result metric map.

use super::registry::{Pillar, PillarRegistry};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Value of one pillar in an agent's result
///
/// `Unknown` is the agent's explicit "cannot determine" answer; `Absent`
/// means no usable value was produced at all (missing key, wrong type,
/// unparseable output). Both serialize as JSON `null`, so the wire shape
/// never distinguishes them, but clarity scoring does.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PillarValue {
    Scored(f64),
    Unknown,
    #[default]
    Absent,
}

impl PillarValue {
    pub fn as_score(&self) -> Option<f64> {
        match self {
            PillarValue::Scored(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, PillarValue::Scored(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PillarValue::Unknown)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PillarValue::Absent)
    }
}

impl std::fmt::Display for PillarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PillarValue::Scored(v) => write!(f, "{}", v),
            PillarValue::Unknown | PillarValue::Absent => write!(f, "null"),
        }
    }
}

impl Serialize for PillarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PillarValue::Scored(v) => serializer.serialize_f64(*v),
            PillarValue::Unknown | PillarValue::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for PillarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<f64>::deserialize(deserializer)? {
            Some(v) => PillarValue::Scored(v),
            None => PillarValue::Unknown,
        })
    }
}

/// Metric map of one result: exactly one entry per registry pillar.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PillarScores(BTreeMap<Pillar, PillarValue>);

impl PillarScores {
    /// Every registry pillar marked absent.
    pub fn absent(registry: &PillarRegistry) -> Self {
        Self(
            registry
                .pillars()
                .iter()
                .map(|p| (*p, PillarValue::Absent))
                .collect(),
        )
    }

    /// Value for `pillar`; `Absent` when the pillar is not in the map.
    pub fn get(&self, pillar: Pillar) -> PillarValue {
        self.0.get(&pillar).copied().unwrap_or_default()
    }

    pub fn set(&mut self, pillar: Pillar, value: PillarValue) {
        self.0.insert(pillar, value);
    }

    /// Builder-style `set`.
    pub fn with(mut self, pillar: Pillar, value: PillarValue) -> Self {
        self.set(pillar, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pillar, PillarValue)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }

    pub fn pillars(&self) -> impl Iterator<Item = Pillar> + '_ {
        self.0.keys().copied()
    }

    /// Pillars carrying a numeric value.
    pub fn scored(&self) -> impl Iterator<Item = (Pillar, f64)> + '_ {
        self.0
            .iter()
            .filter_map(|(p, v)| v.as_score().map(|s| (*p, s)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact single-line rendering, e.g. `codeQuality=7, testCoverage=null`.
    pub fn to_compact_string(&self) -> String {
        self.iter()
            .map(|(p, v)| format!("{}={}", p.key(), v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<(Pillar, PillarValue)> for PillarScores {
    fn from_iter<T: IntoIterator<Item = (Pillar, PillarValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_map_covers_registry() {
        let scores = PillarScores::absent(&PillarRegistry::standard());
        assert_eq!(scores.len(), 7);
        assert!(scores.iter().all(|(_, v)| v.is_absent()));
    }

    #[test]
    fn test_serialize_absent_and_unknown_as_null() {
        let scores = PillarScores::default()
            .with(Pillar::CodeQuality, PillarValue::Scored(7.0))
            .with(Pillar::TestCoverage, PillarValue::Unknown)
            .with(Pillar::CodeComplexity, PillarValue::Absent);
        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json["codeQuality"], 7.0);
        assert!(json["testCoverage"].is_null());
        assert!(json["codeComplexity"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_deserialize_null_as_unknown() {
        let scores: PillarScores =
            serde_json::from_str(r#"{"codeQuality": 6.5, "testCoverage": null}"#).unwrap();
        assert_eq!(scores.get(Pillar::CodeQuality), PillarValue::Scored(6.5));
        assert_eq!(scores.get(Pillar::TestCoverage), PillarValue::Unknown);
        assert_eq!(scores.get(Pillar::FunctionalImpact), PillarValue::Absent);
    }

    #[test]
    fn test_compact_string_in_canonical_order() {
        let scores = PillarScores::default()
            .with(Pillar::TestCoverage, PillarValue::Unknown)
            .with(Pillar::FunctionalImpact, PillarValue::Scored(8.0));
        assert_eq!(
            scores.to_compact_string(),
            "functionalImpact=8, testCoverage=null"
        );
    }
}
