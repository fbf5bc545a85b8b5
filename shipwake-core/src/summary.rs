//! Aggregate statistics over a set of encounters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::encounter::{EncounterType, Severity, VesselEncounter};

/// Counts and extremes for a batch of encounters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterSummary {
    pub total: usize,

    /// Every type is present, with zero when none were found
    pub by_type: BTreeMap<EncounterType, usize>,

    /// Every severity is present, with zero when none were found
    pub by_severity: BTreeMap<Severity, usize>,

    pub suspicious: usize,

    /// Distinct vessels involved in at least one encounter
    pub vessels: usize,

    /// Sum of encounter durations (ms)
    pub total_duration: i64,

    /// Id of the longest encounter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longest: Option<String>,

    /// Mean confidence, 0 when there are no encounters
    pub mean_confidence: f64,

    /// Sum of estimated STS transfer volumes (barrels)
    pub estimated_transfer_volume: f64,
}

impl EncounterSummary {
    pub fn from_encounters(encounters: &[VesselEncounter]) -> Self {
        let mut by_type: BTreeMap<EncounterType, usize> = EncounterType::iter().map(|t| (t, 0)).collect();
        let mut by_severity: BTreeMap<Severity, usize> = Severity::iter().map(|s| (s, 0)).collect();
        let mut vessels = std::collections::BTreeSet::new();

        for e in encounters {
            *by_type.entry(e.encounter_type).or_default() += 1;
            *by_severity.entry(e.severity).or_default() += 1;
            vessels.insert(e.vessel_ids.0.as_str());
            vessels.insert(e.vessel_ids.1.as_str());
        }

        let mean_confidence = if encounters.is_empty() {
            0.0
        } else {
            encounters.iter().map(|e| e.confidence).sum::<f64>() / encounters.len() as f64
        };

        EncounterSummary {
            total: encounters.len(),
            by_type,
            by_severity,
            suspicious: encounters.iter().filter(|e| e.metadata.suspicious_activity).count(),
            vessels: vessels.len(),
            total_duration: encounters.iter().map(|e| e.duration).sum(),
            longest: encounters.iter().max_by_key(|e| e.duration).map(|e| e.id.clone()),
            mean_confidence,
            estimated_transfer_volume: encounters
                .iter()
                .filter_map(|e| e.metadata.estimated_transfer_volume)
                .sum(),
        }
    }

    /// Highest severity seen, if any
    pub fn worst_severity(&self) -> Option<Severity> {
        self.by_severity
            .iter()
            .rev()
            .find(|(_, count)| **count > 0)
            .map(|(&severity, _)| severity)
    }
}
