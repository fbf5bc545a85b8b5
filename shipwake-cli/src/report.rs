//! Rendering encounters for humans and machines

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat};
use clap::ValueEnum;
use serde::Serialize;
use shipwake_core::{EncounterSummary, EncounterType, Severity, VesselEncounter};
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Fixed-width text table
    Table,
}

/// Epoch milliseconds as RFC 3339 (UTC), or the raw number if out of range
pub fn format_time(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| timestamp.to_string())
}

fn format_duration(ms: i64) -> String {
    let minutes = ms / 60_000;
    format!("{}h{:02}m", minutes / 60, minutes % 60)
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

pub fn encounters_table(encounters: &[VesselEncounter]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20}  {:<14}  {:<14}  {:<14}  {:>8}  {:>7}  {:>5}  {:<8}  {}",
        "time", "type", "vessel 1", "vessel 2", "min m", "length", "conf", "severity", "flags"
    );
    for e in encounters {
        let mut flags = Vec::new();
        if e.metadata.suspicious_activity {
            flags.push("suspicious".to_string());
        }
        if let Some(volume) = e.metadata.estimated_transfer_volume {
            flags.push(format!("~{:.0} bbl", volume));
        }
        if let Some(cargo) = &e.metadata.estimated_cargo_type {
            flags.push(cargo.clone());
        }
        let _ = writeln!(
            out,
            "{:<20}  {:<14}  {:<14}  {:<14}  {:>8.0}  {:>7}  {:>5.2}  {:<8}  {}",
            format_time(e.timestamp),
            e.encounter_type.to_string(),
            e.vessel_ids.0,
            e.vessel_ids.1,
            e.distance,
            format_duration(e.duration),
            e.confidence,
            e.severity.to_string(),
            flags.join(", ")
        );
    }
    out
}

pub fn summary_table(summary: &EncounterSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "encounters:        {}", summary.total);
    let _ = writeln!(out, "vessels involved:  {}", summary.vessels);
    let _ = writeln!(out, "suspicious:        {}", summary.suspicious);
    if let Some(worst) = summary.worst_severity() {
        let _ = writeln!(out, "worst severity:    {}", worst);
    }
    let _ = writeln!(out, "total duration:    {}", format_duration(summary.total_duration));
    let _ = writeln!(out, "mean confidence:   {:.2}", summary.mean_confidence);
    if summary.estimated_transfer_volume > 0.0 {
        let _ = writeln!(out, "transfer volume:   ~{:.0} bbl", summary.estimated_transfer_volume);
    }
    let _ = writeln!(out, "by type:");
    for t in EncounterType::iter() {
        let _ = writeln!(out, "  {:<16} {}", t.to_string(), summary.by_type.get(&t).copied().unwrap_or(0));
    }
    let _ = writeln!(out, "by severity:");
    for s in Severity::iter().rev() {
        let _ = writeln!(out, "  {:<16} {}", s.to_string(), summary.by_severity.get(&s).copied().unwrap_or(0));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipwake_core::{EncounterMetadata, Position};

    fn encounter() -> VesselEncounter {
        VesselEncounter {
            id: "1709294400000-538007801-636092755".to_string(),
            timestamp: 1_709_298_000_000,
            vessel_ids: ("538007801".to_string(), "636092755".to_string()),
            encounter_type: EncounterType::StsTransfer,
            location: Position::new(56.3, 26.1),
            distance: 40.2,
            duration: 7_200_000,
            confidence: 1.0,
            severity: Severity::High,
            metadata: EncounterMetadata {
                suspicious_activity: true,
                estimated_transfer_volume: Some(12_500.0),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(1_709_294_400_000), "2024-03-01T12:00:00Z");
        assert_eq!(format_time(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(7_200_000), "2h00m");
        assert_eq!(format_duration(5_400_000), "1h30m");
        assert_eq!(format_duration(59_999), "0h00m");
    }

    #[test]
    fn test_encounters_table() {
        let table = encounters_table(&[encounter()]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("time"));
        assert!(lines[1].contains("sts_transfer"));
        assert!(lines[1].contains("2024-03-01T13:00:00Z"));
        assert!(lines[1].contains("suspicious, ~12500 bbl"));
    }

    #[test]
    fn test_summary_table() {
        let summary = EncounterSummary::from_encounters(&[encounter()]);
        let table = summary_table(&summary);
        assert!(table.contains("encounters:        1"));
        assert!(table.contains("  sts_transfer     1"));
        assert!(table.contains("  critical         0"));
        assert!(table.contains("~12500 bbl"));
        assert!(table.contains("worst severity:    high"));
        assert!(!summary_table(&EncounterSummary::from_encounters(&[])).contains("worst severity"));
    }

    #[test]
    fn test_json_round_trip_shape() {
        let json = to_json(&[encounter()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["type"], "sts_transfer");
        assert_eq!(value[0]["metadata"]["estimatedTransferVolume"], 12_500.0);
    }
}
