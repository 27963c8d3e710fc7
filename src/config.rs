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

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One row of the power-profile table.
///
/// The match bounds classify the live limits reported by ryzenadj; the
/// limit/tctl fields are what gets applied when the user selects the
/// profile. A bound of `None` matches any value, so the final row acts as
/// the catch-all tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileSpec {
    pub name: String,
    #[serde(default)]
    pub max_fast_w: Option<f64>,
    #[serde(default)]
    pub max_slow_w: Option<f64>,
    pub slow_limit_mw: u32,
    pub fast_limit_mw: u32,
    pub tctl_temp_c: u32,
}

fn default_fan_helper() -> String {
    "/usr/local/bin/clevo-fancontrol".to_string()
}

fn default_ryzenadj() -> String {
    "/usr/bin/ryzenadj".to_string()
}

fn default_battery_dir() -> PathBuf {
    PathBuf::from("/sys/class/power_supply/BAT0")
}

fn default_services() -> Vec<String> {
    vec!["clevo-fancontrol".to_string(), "auto-cpufreq".to_string()]
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_glyph_interval_ms() -> u64 {
    50
}

fn default_exec_timeout_ms() -> u64 {
    3000
}

/// Three-tier table matching the stock Pangolin setup. A two-tier
/// Battery/Performance table is just this list without the middle row.
pub fn default_profiles() -> Vec<ProfileSpec> {
    vec![
        ProfileSpec {
            name: "Battery".to_string(),
            max_fast_w: Some(15.0),
            max_slow_w: Some(10.0),
            slow_limit_mw: 8000,
            fast_limit_mw: 12000,
            tctl_temp_c: 80,
        },
        ProfileSpec {
            name: "Quiet".to_string(),
            max_fast_w: Some(22.0),
            max_slow_w: Some(17.0),
            slow_limit_mw: 15000,
            fast_limit_mw: 20000,
            tctl_temp_c: 90,
        },
        ProfileSpec {
            name: "Performance".to_string(),
            max_fast_w: None,
            max_slow_w: None,
            slow_limit_mw: 20000,
            fast_limit_mw: 30000,
            tctl_temp_c: 98,
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_fan_helper")]
    pub fan_helper_path: String,
    #[serde(default = "default_ryzenadj")]
    pub ryzenadj_path: String,
    #[serde(default = "default_battery_dir")]
    pub battery_dir: PathBuf,
    #[serde(default = "default_services")]
    pub services: Vec<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_glyph_interval_ms")]
    pub glyph_interval_ms: u64,
    #[serde(default = "default_exec_timeout_ms")]
    pub exec_timeout_ms: u64,
    /// Extend the temp/rpm sanity bounds to the strict-JSON decode path.
    /// Off by default to stay contract-compatible with the EC helper.
    #[serde(default)]
    pub clamp_decoded_values: bool,
    #[serde(default = "default_profiles")]
    pub profiles: Vec<ProfileSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fan_helper_path: default_fan_helper(),
            ryzenadj_path: default_ryzenadj(),
            battery_dir: default_battery_dir(),
            services: default_services(),
            poll_interval_ms: default_poll_interval_ms(),
            glyph_interval_ms: default_glyph_interval_ms(),
            exec_timeout_ms: default_exec_timeout_ms(),
            clamp_decoded_values: false,
            profiles: default_profiles(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("pangomon").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("pangomon")
            .join("config.json");
    }
    PathBuf::from("/etc/pangomon/config.json")
}

pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/pangomon/config.json")
}

pub fn load_saved_config() -> Option<AppConfig> {
    let data = fs::read_to_string(config_path()).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn try_load_system_config() -> Result<AppConfig, String> {
    let data = fs::read_to_string(system_config_path()).map_err(|e| e.to_string())?;
    let cfg: AppConfig = serde_json::from_str(&data).map_err(|e| format!("parse error: {}", e))?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// User config first, system config second, compiled defaults last.
/// A config that fails validation is ignored rather than fatal.
pub fn load_effective_config() -> AppConfig {
    if let Some(cfg) = load_saved_config() {
        if validate_config(&cfg).is_ok() {
            return cfg;
        }
    }
    if let Ok(cfg) = try_load_system_config() {
        return cfg;
    }
    AppConfig::default()
}

pub fn write_config(cfg: &AppConfig) -> io::Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(cfg).unwrap_or_else(|_| "{}".to_string());
    fs::write(path, json)
}

pub fn validate_config(cfg: &AppConfig) -> Result<(), String> {
    if cfg.profiles.is_empty() {
        return Err("profile table must not be empty".to_string());
    }
    if cfg.profiles.len() > 16 {
        return Err("too many profiles (max 16)".to_string());
    }
    for (i, p) in cfg.profiles.iter().enumerate() {
        if p.name.is_empty() || p.name.len() > 32 {
            return Err(format!("invalid profile name in entry #{}", i + 1));
        }
        if p.slow_limit_mw == 0 || p.fast_limit_mw == 0 {
            return Err(format!("profile '{}' has a zero watt limit", p.name));
        }
        if !(40..=110).contains(&p.tctl_temp_c) {
            return Err(format!("profile '{}' tctl out of range (40..110)", p.name));
        }
        if cfg.profiles[..i].iter().any(|q| q.name == p.name) {
            return Err(format!("duplicate profile name '{}'", p.name));
        }
    }
    // The last row must match anything so classification is total.
    let last = &cfg.profiles[cfg.profiles.len() - 1];
    if last.max_fast_w.is_some() || last.max_slow_w.is_some() {
        return Err("last profile entry must be unbounded (catch-all)".to_string());
    }
    if cfg.services.is_empty() || cfg.services.len() > 8 {
        return Err("monitored services must be 1..8 entries".to_string());
    }
    if cfg.poll_interval_ms < 100 {
        return Err("poll interval below 100 ms".to_string());
    }
    if !(500..=30_000).contains(&cfg.exec_timeout_ms) {
        return Err("exec timeout out of range (500..30000 ms)".to_string());
    }
    Ok(())
}
