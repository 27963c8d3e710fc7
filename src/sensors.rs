/*
 * This file is part of Pangomon.
 *
 * Copyright (C) 2025 Pangomon contributors
 *
 * Pangomon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pangomon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pangomon. If not, see <https://www.gnu.org/licenses/>.
 */

//! Fan/thermal telemetry from the privileged Clevo EC helper.
//!
//! The helper prints a single JSON object, but EC access races interleave
//! `wait_ec error` diagnostics into the stream and can mangle the payload
//! outright. Decode order: strip the noise lines and try a strict JSON
//! decode; if that fails, scavenge the three fields individually with
//! regexes over the original, unfiltered text.

use std::io;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;
use crate::exec::{self, ExecError, Runner};

/// Diagnostic marker the EC helper interleaves into its JSON payload.
pub const EC_NOISE_MARKER: &str = "wait_ec error";

/// Readings above these are EC glitches, not physics.
const MAX_TEMP_C: i64 = 150;
const MAX_RPM: i64 = 10_000;

lazy_static! {
    static ref RE_DUTY: Regex = Regex::new(r#""duty":\s*(\d+)"#).unwrap();
    static ref RE_RPMS: Regex = Regex::new(r#""rpms":\s*(\d+)"#).unwrap();
    static ref RE_TEMP: Regex = Regex::new(r#""cpu_temp_cels":\s*(\d+)"#).unwrap();
}

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("fan helper not found: {0}")]
    HelperMissing(String),
    #[error("fan helper permission denied: {0}")]
    PermissionDenied(String),
    #[error("fan helper timed out")]
    TimedOut,
    #[error("fan helper exited with {code}: {detail}")]
    HelperFailed { code: i32, detail: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ExecError> for SensorError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::Missing(p) => SensorError::HelperMissing(p),
            ExecError::PermissionDenied(p) => SensorError::PermissionDenied(p),
            ExecError::TimedOut { .. } => SensorError::TimedOut,
            ExecError::Io(e) => SensorError::Io(e),
        }
    }
}

/// One EC telemetry sample. All fields default to 0 when extraction fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SensorReading {
    pub cpu_temp_cels: i64,
    pub rpms: i64,
    pub duty: i64,
}

impl SensorReading {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Discard physically implausible values (EC read glitches).
    fn clamped(mut self) -> Self {
        if self.cpu_temp_cels > MAX_TEMP_C {
            self.cpu_temp_cels = 0;
        }
        if self.rpms > MAX_RPM {
            self.rpms = 0;
        }
        self
    }
}

/// Parse raw helper output into a reading. Never fails: unparsable text
/// degrades to per-field regex scavenging, and fields that cannot be
/// recovered at all come back as 0.
///
/// `clamp_decoded` extends the sanity bounds to the strict-JSON path;
/// the reference tool only bounds the scavenged path, so this is off by
/// default and controlled from the config file.
pub fn parse_helper_output(raw: &str, clamp_decoded: bool) -> SensorReading {
    let cleaned: String = raw
        .lines()
        .filter(|l| !l.contains(EC_NOISE_MARKER))
        .collect::<Vec<_>>()
        .join("\n");

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => {
            let reading = SensorReading {
                cpu_temp_cels: int_field(&map, "cpu_temp_cels"),
                rpms: int_field(&map, "rpms"),
                duty: int_field(&map, "duty"),
            };
            if clamp_decoded {
                reading.clamped()
            } else {
                reading
            }
        }
        // Scavenge over the ORIGINAL text: a noise line can split a field
        // across the cleaned rejoin, but the raw bytes still match.
        _ => scavenge_fields(raw).clamped(),
    }
}

fn int_field(map: &serde_json::Map<String, Value>, key: &str) -> i64 {
    map.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn scavenge_fields(raw: &str) -> SensorReading {
    SensorReading {
        cpu_temp_cels: capture_int(&RE_TEMP, raw),
        rpms: capture_int(&RE_RPMS, raw),
        duty: capture_int(&RE_DUTY, raw),
    }
}

fn capture_int(re: &Regex, text: &str) -> i64 {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Invoke the EC helper and parse its output.
///
/// The caller decides the display policy; see `snapshot::poll_once` for the
/// zero-reading fallback layered on top of these errors.
pub fn read_sensors(runner: &dyn Runner, cfg: &AppConfig) -> Result<SensorReading, SensorError> {
    let (program, args) = exec::elevated_read(&cfg.fan_helper_path);
    let out = runner.run(&program, &args)?;
    if !out.success() {
        return Err(SensorError::HelperFailed {
            code: out.code.unwrap_or(-1),
            detail: out.stderr.trim().to_string(),
        });
    }
    Ok(parse_helper_output(&out.merged(), cfg.clamp_decoded_values))
}
