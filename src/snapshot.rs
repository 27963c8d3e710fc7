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

//! One immutable snapshot per poll tick.
//!
//! Readers return typed errors; this layer is where the display policy
//! lives: a failed read collapses to its zero value, the error text is
//! kept for the status line, and the UI renders whatever the snapshot
//! says without touching the readers. Nothing is cached between ticks.

use serde::Serialize;
use serde_json::json;

use crate::battery::{self, BatteryReading};
use crate::config::AppConfig;
use crate::exec::Runner;
use crate::logger;
use crate::power::{self, PowerLimits};
use crate::sensors::{self, SensorReading};
use crate::service;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceSnapshot {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub sensors: SensorReading,
    pub battery: BatteryReading,
    pub limits: PowerLimits,
    /// Index into the config profile table; `None` means Unknown (no
    /// usable ryzenadj reading), which leaves every mode control enabled.
    pub active_profile: Option<usize>,
    pub services: Vec<ServiceSnapshot>,
    /// Read failures already collapsed to zero values above.
    pub errors: Vec<String>,
}

impl Snapshot {
    /// Pre-first-poll state: zeros everywhere, services presumed inactive.
    pub fn empty(cfg: &AppConfig) -> Self {
        Self {
            sensors: SensorReading::zero(),
            battery: BatteryReading::unknown(),
            limits: PowerLimits::default(),
            active_profile: None,
            services: cfg
                .services
                .iter()
                .map(|name| ServiceSnapshot {
                    name: name.clone(),
                    active: false,
                })
                .collect(),
            errors: Vec::new(),
        }
    }

    pub fn profile_name<'a>(&self, cfg: &'a AppConfig) -> &'a str {
        match self.active_profile.and_then(|i| cfg.profiles.get(i)) {
            Some(p) => &p.name,
            None => "Unknown",
        }
    }
}

/// Run all four readers once, synchronously, and fold the results into a
/// snapshot. Never fails; each tick is an independent attempt with no
/// retry state.
pub fn poll_once(runner: &dyn Runner, cfg: &AppConfig) -> Snapshot {
    let mut errors = Vec::new();

    let sensors = sensors::read_sensors(runner, cfg).unwrap_or_else(|e| {
        logger::log_event("sensor_poll_failed", json!({ "error": e.to_string() }));
        errors.push(format!("sensors: {}", e));
        SensorReading::zero()
    });

    let battery = battery::read_battery(&cfg.battery_dir);

    let (limits, active_profile) = match power::read_power_limits(runner, cfg) {
        Ok(l) => (l, power::classify(&cfg.profiles, &l)),
        Err(e) => {
            logger::log_event("power_poll_failed", json!({ "error": e.to_string() }));
            errors.push(format!("power: {}", e));
            (PowerLimits::default(), None)
        }
    };

    let services = cfg
        .services
        .iter()
        .map(|name| ServiceSnapshot {
            name: name.clone(),
            active: service::query_state(runner, name).is_active(),
        })
        .collect();

    Snapshot {
        sensors,
        battery,
        limits,
        active_profile,
        services,
        errors,
    }
}
