//! Geolocation capture for the submission form.
//!
//! The platform location service is reached through a configured command
//! (`termux-location`, `CoreLocationCLI`, a gpsd wrapper, ...). Its output is
//! either a JSON object with `latitude`/`longitude` or a `lat, lon` line.

use std::fmt;
use std::io::Read;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Environment variable the location command receives the accuracy hint in.
pub const HIGH_ACCURACY_ENV: &str = "CIVIC_DESK_GEO_HIGH_ACCURACY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("geolocation unavailable")]
    Unavailable,

    #[error("geolocation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("failed to get geolocation: {0}")]
    Failed(String),

    #[error("invalid coordinates: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::Invalid(format!("latitude {} out of range", latitude)));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::Invalid(format!("longitude {} out of range", longitude)));
        }
        Ok(Coordinates {
            latitude,
            longitude,
        })
    }
}

/// `lat, lon` with five decimals, the way the capture result is displayed.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(GeoError::Invalid(format!("expected 'lat, lon', got '{}'", s.trim())));
        };
        let parse = |v: &str| {
            v.parse::<f64>()
                .map_err(|_| GeoError::Invalid(format!("'{}' is not a number", v)))
        };
        Coordinates::new(parse(lat)?, parse(lon)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

impl Default for GeoOptions {
    fn default() -> Self {
        GeoOptions {
            high_accuracy: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub trait Locator {
    fn locate(&self, options: &GeoOptions) -> Result<Coordinates, GeoError>;
}

/// Runs an external command and reads one position fix from its stdout.
#[derive(Debug, Clone)]
pub struct CommandLocator {
    program: String,
    args: Vec<String>,
}

impl CommandLocator {
    /// `argv[0]` is the program. Returns `None` for an empty command line.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(CommandLocator {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Locator for CommandLocator {
    fn locate(&self, options: &GeoOptions) -> Result<Coordinates, GeoError> {
        tracing::debug!(program = %self.program, timeout_secs = options.timeout.as_secs(), "requesting position fix");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(HIGH_ACCURACY_ENV, if options.high_accuracy { "1" } else { "0" })
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => GeoError::Unavailable,
                _ => GeoError::Failed(e.to_string()),
            })?;

        let deadline = Instant::now() + options.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(GeoError::Timeout(options.timeout));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(GeoError::Failed(e.to_string())),
            }
        };

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout
                .read_to_string(&mut output)
                .map_err(|e| GeoError::Failed(e.to_string()))?;
        }

        if !status.success() {
            return Err(GeoError::Failed(format!("{} exited with {}", self.program, status)));
        }
        parse_fix(&output)
    }
}

#[derive(Deserialize)]
struct Fix {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    longitude: f64,
}

fn parse_fix(output: &str) -> Result<Coordinates, GeoError> {
    if let Ok(fix) = serde_json::from_str::<Fix>(output.trim()) {
        return Coordinates::new(fix.latitude, fix.longitude);
    }
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| GeoError::Failed("location command printed nothing".into()))?;
    line.parse()
}

/// State of the "use my location" control on the form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GeoCapture {
    #[default]
    Idle,
    Captured(Coordinates),
    Unavailable,
}

impl GeoCapture {
    /// Ask `locator` for a fix. A failed attempt leaves the previous state
    /// untouched, except that a missing location service marks the control
    /// unavailable.
    pub fn capture(&mut self, locator: &dyn Locator, options: &GeoOptions) -> Result<Coordinates, GeoError> {
        match locator.locate(options) {
            Ok(coords) => {
                tracing::info!(%coords, "location captured");
                *self = GeoCapture::Captured(coords);
                Ok(coords)
            }
            Err(GeoError::Unavailable) => {
                *self = GeoCapture::Unavailable;
                Err(GeoError::Unavailable)
            }
            Err(e) => {
                tracing::warn!(error = %e, "location capture failed");
                Err(e)
            }
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            GeoCapture::Captured(coords) => Some(*coords),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        self.coordinates().map(|c| c.to_string()).unwrap_or_default()
    }

    pub fn reset(&mut self) {
        *self = GeoCapture::Idle;
    }
}
