//! Encounter output types

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::geo::Position;

/// Kind of encounter, from most to least specific
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EncounterType {
    /// Ship-to-ship transfer: very close, very slow, sustained
    StsTransfer,
    /// Close with at least one vessel slow or stopped
    Rendezvous,
    /// Very close with at least one vessel moving fast
    CollisionRisk,
    CloseApproach,
    /// Vessels keeping loose company
    Formation,
}

/// Operational risk, ordered from `Low` to `Critical`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Derived and enrichment fields attached to an encounter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterMetadata {
    /// Barrels; only set for STS transfers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_transfer_volume: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cargo_type: Option<String>,

    pub suspicious_activity: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_conditions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sea_state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulatory_zone: Option<String>,

    /// Mean separation over the encounter (m)
    pub avg_distance: f64,

    /// Widest separation over the encounter (m)
    pub max_distance: f64,

    /// 1 for a perfectly steady separation, towards 0 as it fluctuates
    pub position_consistency: f64,

    /// Mean speed of each vessel in knots, in `vessel_ids` order
    pub average_speeds: (f64, f64),

    /// Both vessels at or below the stop speed on average
    pub stationary: bool,

    /// Number of observations the encounter was built from
    pub sample_count: usize,
}

/// A classified encounter between two vessels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselEncounter {
    pub id: String,

    /// Midpoint of the encounter (epoch ms)
    pub timestamp: i64,

    pub vessel_ids: (String, String),

    #[serde(rename = "type")]
    pub encounter_type: EncounterType,

    /// Centroid of both vessels over the encounter
    pub location: Position,

    /// Minimum observed separation (m)
    pub distance: f64,

    /// Milliseconds
    pub duration: i64,

    pub confidence: f64,

    pub severity: Severity,

    pub metadata: EncounterMetadata,
}

impl VesselEncounter {
    /// Encounter id built from its start time and the vessel pair
    pub fn make_id(start_time: i64, vessel1: &str, vessel2: &str) -> String {
        format!("{}-{}-{}", start_time, vessel1, vessel2)
    }

    /// Start of the encounter (epoch ms)
    pub fn start_time(&self) -> i64 {
        self.timestamp - self.duration / 2
    }

    /// End of the encounter (epoch ms)
    pub fn end_time(&self) -> i64 {
        self.start_time() + self.duration
    }

    pub fn involves(&self, vessel_id: &str) -> bool {
        self.vessel_ids.0 == vessel_id || self.vessel_ids.1 == vessel_id
    }

    /// Same vessels, regardless of order
    pub fn same_pair(&self, other: &VesselEncounter) -> bool {
        let (a, b) = (&self.vessel_ids.0, &self.vessel_ids.1);
        let (c, d) = (&other.vessel_ids.0, &other.vessel_ids.1);
        (a == c && b == d) || (a == d && b == c)
    }

    /// Same pair and intersecting time spans
    pub fn overlaps(&self, other: &VesselEncounter) -> bool {
        self.same_pair(other) && self.start_time() <= other.end_time() && other.start_time() <= self.end_time()
    }
}

/// Order encounters by time, then id, so merged results are deterministic
pub fn sort_encounters(encounters: &mut [VesselEncounter]) {
    encounters.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}
