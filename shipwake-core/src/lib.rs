//! Shipwake Core
//!
//! Platform-independent vessel encounter detection. Given a batch of recorded
//! vessel trajectories, finds the periods where two vessels stayed close to
//! each other and classifies them as ship-to-ship transfers, rendezvous,
//! collision risks, close approaches or loose formations.
//!
//! Everything here is pure computation over data the caller hands in: no
//! I/O, no async, no clocks. Environmental context is supplied through the
//! traits in [`enrich`].
//!
//! # Modules
//!
//! - **geo**: haversine distance and position helpers
//! - **trip**: trajectories and nearest-sample lookup
//! - **config**: detection thresholds and their validation
//! - **scan**: pairwise proximity scan over a shared time grid
//! - **classify**: encounter rules and scoring
//! - **sts**: timestamp-matched ship-to-ship transfer pass
//! - **engine**: facade running the passes over a batch
//! - **summary**: aggregate statistics
//!
//! # Example
//!
//! ```
//! use shipwake_core::{DetectionConfig, EncounterEngine, Position, VesselTrip};
//!
//! let mut a = VesselTrip::new("538007801");
//! let mut b = VesselTrip::new("636092755");
//! for k in 0..25 {
//!     let t = 1_709_294_400_000 + k * 300_000;
//!     a.push(t, Position::new(56.3, 26.1), Some(0.5), None);
//!     b.push(t, Position::new(56.3, 26.1004), Some(0.5), None);
//! }
//!
//! let engine = EncounterEngine::new(DetectionConfig::default()).unwrap();
//! let encounters = engine.detect_encounters(&[a, b], 1_709_294_400_000, 1_709_301_600_000);
//! assert_eq!(encounters.len(), 1);
//! assert_eq!(encounters[0].encounter_type.to_string(), "sts_transfer");
//! ```

pub mod classify;
pub mod config;
pub mod encounter;
pub mod engine;
pub mod enrich;
pub mod geo;
pub mod scan;
pub mod sts;
pub mod summary;
pub mod trip;

pub use config::{ConfigError, DetectionConfig};
pub use encounter::{EncounterMetadata, EncounterType, Severity, VesselEncounter};
pub use engine::EncounterEngine;
pub use enrich::Enrichment;
pub use geo::{haversine_distance, Position};
pub use summary::EncounterSummary;
pub use trip::{TimeRange, VesselSample, VesselTrip};
