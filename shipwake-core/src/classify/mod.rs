//! Encounter classification
//!
//! Turns a finished [`PotentialEncounterSession`] into a typed
//! [`VesselEncounter`]. Rules are evaluated most specific first and the first
//! match wins:
//!
//! | Type             | Condition                                                        |
//! |------------------|------------------------------------------------------------------|
//! | `sts_transfer`   | min ≤ STS band, both vessels slow, ≥ 30 min                      |
//! | `rendezvous`     | min ≤ rendezvous band, either vessel slow, ≥ 10 min              |
//! | `collision_risk` | min ≤ 200 m, either vessel above 10 kn                           |
//! | `close_approach` | min ≤ close approach band                                        |
//! | `formation`      | anything else inside the formation band                          |

pub mod scoring;

use crate::config::DetectionConfig;
use crate::encounter::{EncounterMetadata, EncounterType, VesselEncounter};
use crate::enrich::Enrichment;
use crate::geo::{centroid, Position};
use crate::scan::session::PotentialEncounterSession;

pub use scoring::EncounterFeatures;
use scoring::{
    COLLISION_RISK_DISTANCE, COLLISION_RISK_SPEED, RENDEZVOUS_MIN_DURATION_MS, STS_MIN_DURATION_MS,
};

/// Aggregates computed over a session's ticks
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAggregates {
    pub avg_distance: f64,
    pub average_speeds: (f64, f64),
    pub center_position: Position,
    pub position_consistency: f64,
}

impl SessionAggregates {
    pub fn from_session(session: &PotentialEncounterSession) -> Self {
        let distances: Vec<f64> = session.samples.iter().map(|s| s.distance).collect();
        let midpoints: Vec<Position> = session
            .samples
            .iter()
            .map(|s| s.position1.midpoint(&s.position2))
            .collect();

        SessionAggregates {
            avg_distance: mean(&distances),
            average_speeds: average_speeds(&session.speeds),
            center_position: centroid(midpoints.iter()).unwrap_or_default(),
            position_consistency: consistency(&distances),
        }
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Per-vessel mean speed, counting missing speeds as 0
pub(crate) fn average_speeds(speeds: &[(Option<f64>, Option<f64>)]) -> (f64, f64) {
    let first: Vec<f64> = speeds.iter().map(|s| s.0.unwrap_or(0.0)).collect();
    let second: Vec<f64> = speeds.iter().map(|s| s.1.unwrap_or(0.0)).collect();
    (mean(&first), mean(&second))
}

/// `1 - stddev / mean` of the separation, clamped to `[0, 1]`
fn consistency(distances: &[f64]) -> f64 {
    let avg = mean(distances);
    if distances.is_empty() || avg <= 0.0 {
        return 1.0;
    }
    let variance = distances.iter().map(|d| (d - avg).powi(2)).sum::<f64>() / distances.len() as f64;
    (1.0 - variance.sqrt() / avg).clamp(0.0, 1.0)
}

/// Applies the classification rules, scorers and enrichment
#[derive(Debug)]
pub struct EncounterClassifier<'a> {
    config: &'a DetectionConfig,
    enrichment: &'a Enrichment,
}

impl<'a> EncounterClassifier<'a> {
    pub fn new(config: &'a DetectionConfig, enrichment: &'a Enrichment) -> Self {
        EncounterClassifier { config, enrichment }
    }

    /// First matching encounter type for the given features
    pub fn encounter_type(&self, features: &EncounterFeatures) -> EncounterType {
        let config = self.config;
        let slow = config.slow_speed_threshold;

        if features.min_distance <= config.sts_transfer_threshold
            && features.both_at_or_below(slow)
            && features.duration >= STS_MIN_DURATION_MS
        {
            EncounterType::StsTransfer
        } else if features.min_distance <= config.rendezvous_threshold
            && features.either_at_or_below(slow)
            && features.duration >= RENDEZVOUS_MIN_DURATION_MS
        {
            EncounterType::Rendezvous
        } else if features.min_distance <= COLLISION_RISK_DISTANCE && features.either_above(COLLISION_RISK_SPEED) {
            EncounterType::CollisionRisk
        } else if features.min_distance <= config.close_approach_threshold {
            EncounterType::CloseApproach
        } else {
            EncounterType::Formation
        }
    }

    /// Classify a finished session
    pub fn classify(&self, session: &PotentialEncounterSession) -> VesselEncounter {
        let aggregates = SessionAggregates::from_session(session);
        let features = EncounterFeatures {
            min_distance: session.min_distance,
            duration: session.duration(),
            average_speeds: aggregates.average_speeds,
        };
        let encounter_type = self.encounter_type(&features);
        let timestamp = session.start_time + session.duration() / 2;

        let mut metadata = EncounterMetadata {
            avg_distance: aggregates.avg_distance,
            max_distance: session.max_distance,
            position_consistency: aggregates.position_consistency,
            sample_count: session.samples.len(),
            ..Default::default()
        };
        self.fill_metadata(
            &mut metadata,
            encounter_type,
            &features,
            &session.vessel_ids,
            &aggregates.center_position,
            timestamp,
        );

        VesselEncounter {
            id: VesselEncounter::make_id(session.start_time, &session.vessel_ids.0, &session.vessel_ids.1),
            timestamp,
            vessel_ids: session.vessel_ids.clone(),
            encounter_type,
            location: aggregates.center_position,
            distance: session.min_distance,
            duration: features.duration,
            confidence: scoring::encounter_confidence(encounter_type, &features),
            severity: scoring::severity(encounter_type, session.min_distance),
            metadata,
        }
    }

    /// Suspicion flag, transfer estimates and optional environmental labels
    pub(crate) fn fill_metadata(
        &self,
        metadata: &mut EncounterMetadata,
        encounter_type: EncounterType,
        features: &EncounterFeatures,
        vessel_ids: &(String, String),
        location: &Position,
        timestamp: i64,
    ) {
        let config = self.config;
        let enrichment = self.enrichment;

        metadata.average_speeds = features.average_speeds;
        metadata.stationary = features.both_at_or_below(config.stop_speed_threshold);
        metadata.suspicious_activity = scoring::is_suspicious(encounter_type, features, timestamp);

        if encounter_type == EncounterType::StsTransfer {
            metadata.estimated_transfer_volume = Some(enrichment.volume.estimate(
                features.duration,
                features.average_speeds,
                config.slow_speed_threshold,
            ));
            metadata.estimated_cargo_type = enrichment.cargo.classify(&vessel_ids.0, &vessel_ids.1);
        }

        if config.include_weather_data {
            metadata.weather_conditions = Some(enrichment.weather.lookup(location, timestamp));
        }
        if config.include_sea_state {
            metadata.sea_state = Some(enrichment.sea_state.lookup(location, timestamp));
        }
        if config.include_regulatory_zone {
            metadata.regulatory_zone = Some(enrichment.regulatory_zone.lookup(location, timestamp));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::Severity;
    use crate::enrich::{FixedLabel, DEFAULT_REGULATORY_ZONE};
    use crate::trip::VesselSample;

    const MINUTE: i64 = 60_000;
    // 2024-03-01T12:00:00Z
    const NOON: i64 = 1_709_294_400_000;

    fn sample(id: &str, speed: f64) -> VesselSample<'_> {
        VesselSample {
            vessel_id: id,
            timestamp: 0,
            position: Position::new(56.0, 26.0),
            speed: Some(speed),
            heading: Some(0.0),
        }
    }

    /// Session with a constant separation, one tick per minute
    fn session(distance: f64, minutes: i64, speeds: (f64, f64)) -> PotentialEncounterSession {
        let a = sample("a", speeds.0);
        let b = sample("b", speeds.1);
        let mut session = PotentialEncounterSession::open(NOON, &a, &b, distance);
        for m in 1..=minutes {
            session.extend(NOON + m * MINUTE, &a, &b, distance);
        }
        session
    }

    fn features(min_distance: f64, minutes: i64, speeds: (f64, f64)) -> EncounterFeatures {
        EncounterFeatures {
            min_distance,
            duration: minutes * MINUTE,
            average_speeds: speeds,
        }
    }

    #[test]
    fn test_sts_wins_over_rendezvous() {
        let config = DetectionConfig::default();
        let enrichment = Enrichment::default();
        let classifier = EncounterClassifier::new(&config, &enrichment);
        // Satisfies both the STS and the rendezvous rule
        let f = features(50.0, 45, (1.0, 1.5));
        assert_eq!(classifier.encounter_type(&f), EncounterType::StsTransfer);
    }

    #[test]
    fn test_rule_order() {
        let config = DetectionConfig::default();
        let enrichment = Enrichment::default();
        let classifier = EncounterClassifier::new(&config, &enrichment);

        // Too short for STS, long enough for rendezvous
        assert_eq!(
            classifier.encounter_type(&features(50.0, 20, (1.0, 1.0))),
            EncounterType::Rendezvous
        );
        // One vessel fast: not STS, still a rendezvous
        assert_eq!(
            classifier.encounter_type(&features(50.0, 45, (1.0, 12.0))),
            EncounterType::Rendezvous
        );
        // Both fast and close
        assert_eq!(
            classifier.encounter_type(&features(150.0, 5, (12.0, 11.0))),
            EncounterType::CollisionRisk
        );
        // Close but at moderate speed
        assert_eq!(
            classifier.encounter_type(&features(150.0, 5, (8.0, 8.0))),
            EncounterType::CloseApproach
        );
        assert_eq!(
            classifier.encounter_type(&features(1000.0, 5, (8.0, 8.0))),
            EncounterType::CloseApproach
        );
        assert_eq!(
            classifier.encounter_type(&features(1000.1, 5, (8.0, 8.0))),
            EncounterType::Formation
        );
    }

    #[test]
    fn test_short_slow_pass_is_collision_risk_only_when_fast() {
        let config = DetectionConfig::default();
        let enrichment = Enrichment::default();
        let classifier = EncounterClassifier::new(&config, &enrichment);
        // Slow but under ten minutes: skips rendezvous, not fast enough for collision risk
        assert_eq!(
            classifier.encounter_type(&features(150.0, 5, (1.0, 1.0))),
            EncounterType::CloseApproach
        );
    }

    #[test]
    fn test_classify_sts_session() {
        let config = DetectionConfig::default();
        let enrichment = Enrichment::default();
        let classifier = EncounterClassifier::new(&config, &enrichment);

        let encounter = classifier.classify(&session(40.0, 90, (0.5, 0.4)));

        assert_eq!(encounter.encounter_type, EncounterType::StsTransfer);
        assert_eq!(encounter.severity, Severity::High);
        assert_eq!(encounter.confidence, 1.0);
        assert_eq!(encounter.duration, 90 * MINUTE);
        assert_eq!(encounter.timestamp, NOON + 45 * MINUTE);
        assert_eq!(encounter.id, format!("{}-a-b", NOON));
        assert_eq!(encounter.distance, 40.0);
        assert!(!encounter.metadata.suspicious_activity);
        assert!(encounter.metadata.estimated_transfer_volume.unwrap() > 7_500.0);
        assert!(encounter.metadata.estimated_cargo_type.is_some());
        assert!(encounter.metadata.stationary);
        assert_eq!(encounter.metadata.sample_count, 91);
        assert_eq!(encounter.metadata.position_consistency, 1.0);
        // Enrichment toggles are off by default
        assert!(encounter.metadata.weather_conditions.is_none());
    }

    #[test]
    fn test_non_sts_has_no_transfer_estimates() {
        let config = DetectionConfig::default();
        let enrichment = Enrichment::default();
        let classifier = EncounterClassifier::new(&config, &enrichment);

        let encounter = classifier.classify(&session(1500.0, 20, (9.0, 9.0)));
        assert_eq!(encounter.encounter_type, EncounterType::Formation);
        assert!(encounter.metadata.estimated_transfer_volume.is_none());
        assert!(encounter.metadata.estimated_cargo_type.is_none());
        assert!(!encounter.metadata.stationary);
    }

    #[test]
    fn test_missing_speeds_count_as_zero() {
        let a = VesselSample {
            speed: None,
            ..sample("a", 0.0)
        };
        let b = sample("b", 4.0);
        let mut s = PotentialEncounterSession::open(0, &a, &b, 100.0);
        s.extend(MINUTE, &a, &b, 100.0);
        let aggregates = SessionAggregates::from_session(&s);
        assert_eq!(aggregates.average_speeds, (0.0, 4.0));
    }

    #[test]
    fn test_center_and_consistency() {
        let a = VesselSample {
            position: Position::new(0.0, 0.0),
            ..sample("a", 0.0)
        };
        let b = VesselSample {
            position: Position::new(2.0, 2.0),
            ..sample("b", 0.0)
        };
        let mut s = PotentialEncounterSession::open(0, &a, &b, 100.0);
        s.extend(MINUTE, &a, &b, 300.0);
        let aggregates = SessionAggregates::from_session(&s);

        assert_eq!(aggregates.center_position, Position::new(1.0, 1.0));
        assert_eq!(aggregates.avg_distance, 200.0);
        // stddev 100, mean 200
        assert!((aggregates.position_consistency - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_enrichment_toggles() {
        let config = DetectionConfig {
            include_weather_data: true,
            include_regulatory_zone: true,
            ..Default::default()
        };
        let enrichment = Enrichment {
            weather: Box::new(FixedLabel::new("fog")),
            ..Default::default()
        };
        let classifier = EncounterClassifier::new(&config, &enrichment);

        let encounter = classifier.classify(&session(1500.0, 20, (9.0, 9.0)));
        assert_eq!(encounter.metadata.weather_conditions.as_deref(), Some("fog"));
        assert_eq!(encounter.metadata.regulatory_zone.as_deref(), Some(DEFAULT_REGULATORY_ZONE));
        assert!(encounter.metadata.sea_state.is_none());
    }

    #[test]
    fn test_night_session_is_suspicious() {
        let config = DetectionConfig::default();
        let enrichment = Enrichment::default();
        let classifier = EncounterClassifier::new(&config, &enrichment);

        let mut s = session(1500.0, 20, (9.0, 9.0));
        // Shift to 23:00 UTC
        let shift = 11 * 60 * MINUTE;
        s.start_time += shift;
        s.end_time += shift;
        let encounter = classifier.classify(&s);
        assert!(encounter.metadata.suspicious_activity);
    }
}
