//! Loading trips and detection config from disk

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use shipwake_core::{ConfigError, DetectionConfig, TimeRange, VesselTrip};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum InputError {
    #[error("Unable to read {}", .path.display())]
    #[diagnostic(code(shipwake::input::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid {what} JSON", .path.display())]
    #[diagnostic(code(shipwake::input::parse))]
    Parse {
        path: PathBuf,
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid detection config in {}", .path.display())]
    #[diagnostic(code(shipwake::input::config))]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("No trip has any samples, cannot work out a time range")]
    #[diagnostic(code(shipwake::input::empty), help("pass --start and --end explicitly"))]
    NoSamples,

    #[error("Scan range ends ({end}) before it starts ({start})")]
    #[diagnostic(code(shipwake::input::range))]
    InvalidRange { start: i64, end: i64 },
}

fn read(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_owned(),
        source,
    })
}

/// Read a JSON array of trips
pub fn load_trips(path: &Path) -> Result<Vec<VesselTrip>, InputError> {
    let text = read(path)?;
    let trips: Vec<VesselTrip> = serde_json::from_str(&text).map_err(|source| InputError::Parse {
        path: path.to_owned(),
        what: "trip",
        source,
    })?;

    for trip in &trips {
        let speeds = trip.speeds.as_ref().map(Vec::len);
        let headings = trip.headings.as_ref().map(Vec::len);
        let aligned = trip.path.len() == trip.timestamps.len()
            && speeds.map_or(true, |n| n == trip.path.len())
            && headings.map_or(true, |n| n == trip.path.len());
        if !aligned {
            log::warn!(
                "{}: arrays differ in length (path {}, timestamps {}, speeds {:?}, headings {:?}), using the common prefix",
                trip.vessel_id,
                trip.path.len(),
                trip.timestamps.len(),
                speeds,
                headings
            );
        }
        if trip.timestamps.windows(2).any(|w| w[1] < w[0]) {
            log::warn!("{}: timestamps are not sorted, lookups will be unreliable", trip.vessel_id);
        }
    }

    log::info!(
        "Loaded {} trips ({} samples) from {}",
        trips.len(),
        trips.iter().map(VesselTrip::len).sum::<usize>(),
        path.display()
    );
    Ok(trips)
}

/// Read a (partial) detection config, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<DetectionConfig, InputError> {
    let Some(path) = path else {
        log::debug!("No config file, using default thresholds");
        return Ok(DetectionConfig::default());
    };

    let text = read(path)?;
    let config = DetectionConfig::from_json(&text).map_err(|source| InputError::Parse {
        path: path.to_owned(),
        what: "config",
        source,
    })?;
    config.validate().map_err(|source| InputError::Config {
        path: path.to_owned(),
        source,
    })?;
    log::debug!("Config from {}: {:?}", path.display(), config);
    Ok(config)
}

/// Scan bounds: explicit values win, the rest come from the trips themselves
pub fn resolve_range(trips: &[VesselTrip], start: Option<i64>, end: Option<i64>) -> Result<TimeRange, InputError> {
    let range = match (start, end) {
        (Some(start), Some(end)) => TimeRange::new(start, end),
        _ => {
            let covering = TimeRange::covering(trips).ok_or(InputError::NoSamples)?;
            TimeRange::new(start.unwrap_or(covering.start), end.unwrap_or(covering.end))
        }
    };
    if range.end < range.start {
        return Err(InputError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    Ok(range)
}
