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

//! Instantaneous battery draw from the power_supply sysfs interface.

use std::fs;
use std::path::Path;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChargeStatus {
    Discharging,
    Charging,
    Full,
    Unknown,
}

impl ChargeStatus {
    pub fn from_token(token: &str) -> Self {
        match token {
            "Discharging" => ChargeStatus::Discharging,
            "Charging" => ChargeStatus::Charging,
            "Full" => ChargeStatus::Full,
            _ => ChargeStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChargeStatus::Discharging => "Discharging",
            ChargeStatus::Charging => "Charging",
            ChargeStatus::Full => "Full",
            ChargeStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatteryReading {
    pub power_watts: f64,
    pub status: ChargeStatus,
}

impl BatteryReading {
    pub fn unknown() -> Self {
        Self {
            power_watts: 0.0,
            status: ChargeStatus::Unknown,
        }
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

// current_now is signed (negative while discharging on some firmwares),
// voltage_now unsigned; any unreadable value degrades to 0.
fn read_micro(path: &Path) -> i64 {
    read_trimmed(path)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0)
}

/// Read status/current/voltage for one battery device directory.
///
/// Power is |current| x |voltage| with both scaled from micro units, so the
/// result is sign-independent wattage. An absent device directory yields
/// the unknown reading; an unreadable individual file only zeroes its own
/// contribution.
pub fn read_battery(dir: &Path) -> BatteryReading {
    if !dir.is_dir() {
        return BatteryReading::unknown();
    }
    let status = read_trimmed(&dir.join("status"))
        .map(|s| ChargeStatus::from_token(&s))
        .unwrap_or(ChargeStatus::Unknown);
    let current_ua = read_micro(&dir.join("current_now"));
    let voltage_uv = read_micro(&dir.join("voltage_now"));
    let power_watts = (current_ua.abs() as f64 / 1_000_000.0) * (voltage_uv.abs() as f64 / 1_000_000.0);
    BatteryReading {
        power_watts,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fake_battery(status: &str, current: &str, voltage: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("status"), status).unwrap();
        fs::write(dir.path().join("current_now"), current).unwrap();
        fs::write(dir.path().join("voltage_now"), voltage).unwrap();
        dir
    }

    #[test]
    fn test_power_is_sign_independent() {
        let dir = fake_battery("Discharging\n", "-500000\n", "12000000\n");
        let r = read_battery(dir.path());
        assert!((r.power_watts - 6.0).abs() < 1e-9);
        assert_eq!(r.status, ChargeStatus::Discharging);

        let dir = fake_battery("Charging\n", "500000\n", "12000000\n");
        let r = read_battery(dir.path());
        assert!((r.power_watts - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_device_dir() {
        let r = read_battery(Path::new("/nonexistent/BAT9"));
        assert_eq!(r.power_watts, 0.0);
        assert_eq!(r.status, ChargeStatus::Unknown);
    }

    #[test]
    fn test_unreadable_subvalue_defaults_to_zero() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("status"), "Full\n").unwrap();
        fs::write(dir.path().join("voltage_now"), "12000000\n").unwrap();
        // current_now absent: power collapses to 0 but status survives.
        let r = read_battery(dir.path());
        assert_eq!(r.power_watts, 0.0);
        assert_eq!(r.status, ChargeStatus::Full);
    }

    #[test]
    fn test_garbage_current_defaults_to_zero() {
        let dir = fake_battery("Discharging\n", "not-a-number\n", "12000000\n");
        let r = read_battery(dir.path());
        assert_eq!(r.power_watts, 0.0);
    }

    #[test]
    fn test_unknown_status_token() {
        let dir = fake_battery("Not charging\n", "0\n", "0\n");
        let r = read_battery(dir.path());
        assert_eq!(r.status, ChargeStatus::Unknown);
    }
}
