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

//! Ryzen power limits: read them from `ryzenadj --info`, bucket them into
//! a named profile via the config table, and apply a profile through the
//! polkit prompt.
//!
//! There is no persisted "current mode" anywhere. The active profile is
//! re-derived every poll from the limits the tool itself reports, so a
//! change made behind our back self-corrects within one tick.

use std::io;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::config::{AppConfig, ProfileSpec};
use crate::exec::{self, ExecError, Runner};

lazy_static! {
    // ryzenadj prints a pipe-framed table:  | STAPM LIMIT  |  25.000 | ...
    static ref RE_STAPM: Regex = Regex::new(r"STAPM LIMIT\s+\|\s+(\d+\.\d+)").unwrap();
    static ref RE_FAST: Regex = Regex::new(r"PPT LIMIT FAST\s+\|\s+(\d+\.\d+)").unwrap();
    static ref RE_SLOW: Regex = Regex::new(r"PPT LIMIT SLOW\s+\|\s+(\d+\.\d+)").unwrap();
}

#[derive(Error, Debug)]
pub enum PowerError {
    #[error("ryzenadj not found: {0}")]
    ToolMissing(String),
    #[error("ryzenadj permission denied: {0}")]
    PermissionDenied(String),
    #[error("ryzenadj timed out")]
    TimedOut,
    #[error("ryzenadj exited with {code}: {detail}")]
    ToolFailed { code: i32, detail: String },
    #[error("power limit fields missing from ryzenadj output")]
    FieldsMissing,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ExecError> for PowerError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::Missing(p) => PowerError::ToolMissing(p),
            ExecError::PermissionDenied(p) => PowerError::PermissionDenied(p),
            ExecError::TimedOut { .. } => PowerError::TimedOut,
            ExecError::Io(e) => PowerError::Io(e),
        }
    }
}

/// The three watt limits ryzenadj reports (sustained / short burst / medium
/// burst).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PowerLimits {
    pub stapm_w: f64,
    pub fast_w: f64,
    pub slow_w: f64,
}

/// Extract all three limits from the info table. `None` when any of the
/// three labels is absent: a partial table is treated as no reading.
pub fn parse_info_table(text: &str) -> Option<PowerLimits> {
    Some(PowerLimits {
        stapm_w: capture_float(&RE_STAPM, text)?,
        fast_w: capture_float(&RE_FAST, text)?,
        slow_w: capture_float(&RE_SLOW, text)?,
    })
}

fn capture_float(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn read_power_limits(runner: &dyn Runner, cfg: &AppConfig) -> Result<PowerLimits, PowerError> {
    let (program, mut args) = exec::elevated_read(&cfg.ryzenadj_path);
    args.push("--info".to_string());
    let out = runner.run(&program, &args)?;
    if !out.success() {
        return Err(PowerError::ToolFailed {
            code: out.code.unwrap_or(-1),
            detail: out.stderr.trim().to_string(),
        });
    }
    parse_info_table(&out.stdout).ok_or(PowerError::FieldsMissing)
}

/// Bucket live limits into the profile table: first row whose bounds all
/// hold wins. Config validation guarantees the last row is unbounded, so
/// a non-empty table always classifies.
pub fn classify(profiles: &[ProfileSpec], limits: &PowerLimits) -> Option<usize> {
    profiles.iter().position(|p| {
        p.max_fast_w.map_or(true, |m| limits.fast_w <= m)
            && p.max_slow_w.map_or(true, |m| limits.slow_w <= m)
    })
}

/// Push a profile's limit triple through the polkit prompt. Does NOT
/// re-poll: the caller refreshes to pick up the new classification.
pub fn apply_profile(
    runner: &dyn Runner,
    cfg: &AppConfig,
    spec: &ProfileSpec,
) -> Result<(), PowerError> {
    let args = vec![
        format!("--slow-limit={}", spec.slow_limit_mw),
        format!("--fast-limit={}", spec.fast_limit_mw),
        format!("--tctl-temp={}", spec.tctl_temp_c),
    ];
    let (program, args) = exec::elevated_write(&cfg.ryzenadj_path, &args);
    let out = runner.run(&program, &args)?;
    if !out.success() {
        return Err(PowerError::ToolFailed {
            code: out.code.unwrap_or(-1),
            detail: out.stderr.trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_profiles;
    use crate::exec::{CmdOutput, MockRunner};

    const INFO_TABLE: &str = "\
| Name               |   Value   | Parameter          |\n\
|--------------------+-----------+--------------------|\n\
| STAPM LIMIT        |    25.000 | stapm-limit        |\n\
| STAPM VALUE        |     7.342 |                    |\n\
| PPT LIMIT FAST     |    30.000 | fast-limit         |\n\
| PPT VALUE FAST     |     7.335 |                    |\n\
| PPT LIMIT SLOW     |    20.000 | slow-limit         |\n\
| PPT VALUE SLOW     |     7.316 |                    |\n\
| THM LIMIT CORE     |    98.000 | tctl-temp          |\n";

    fn limits(fast: f64, slow: f64) -> PowerLimits {
        PowerLimits {
            stapm_w: slow,
            fast_w: fast,
            slow_w: slow,
        }
    }

    #[test]
    fn test_parse_info_table() {
        let l = parse_info_table(INFO_TABLE).unwrap();
        assert_eq!(l.stapm_w, 25.0);
        assert_eq!(l.fast_w, 30.0);
        assert_eq!(l.slow_w, 20.0);
    }

    #[test]
    fn test_parse_partial_table_is_none() {
        let text = "| STAPM LIMIT        |    25.000 |\n| PPT LIMIT FAST     |    30.000 |\n";
        assert!(parse_info_table(text).is_none());
    }

    #[test]
    fn test_parse_limit_value_rows_not_confused() {
        // "PPT VALUE FAST" rows must not satisfy the LIMIT patterns.
        let text = "| PPT VALUE FAST     |     7.335 |\n";
        assert!(parse_info_table(text).is_none());
    }

    #[test]
    fn test_classify_battery() {
        let table = default_profiles();
        let idx = classify(&table, &limits(12.0, 8.0)).unwrap();
        assert_eq!(table[idx].name, "Battery");
    }

    #[test]
    fn test_classify_quiet() {
        let table = default_profiles();
        let idx = classify(&table, &limits(20.0, 15.0)).unwrap();
        assert_eq!(table[idx].name, "Quiet");
    }

    #[test]
    fn test_classify_performance() {
        let table = default_profiles();
        let idx = classify(&table, &limits(30.0, 20.0)).unwrap();
        assert_eq!(table[idx].name, "Performance");
    }

    #[test]
    fn test_classify_low_fast_high_slow_skips_battery() {
        // fast under the Battery cap but slow above it: falls to Quiet.
        let table = default_profiles();
        let idx = classify(&table, &limits(14.0, 16.0)).unwrap();
        assert_eq!(table[idx].name, "Quiet");
    }

    #[test]
    fn test_classify_two_tier_table() {
        let mut table = default_profiles();
        table.remove(1);
        let idx = classify(&table, &limits(20.0, 15.0)).unwrap();
        assert_eq!(table[idx].name, "Performance");
    }

    #[test]
    fn test_classify_empty_table() {
        assert!(classify(&[], &limits(20.0, 15.0)).is_none());
    }

    #[test]
    fn test_read_limits_nonzero_exit() {
        let mut runner = MockRunner::new();
        runner.expect_run().returning(|_, _| {
            Ok(CmdOutput {
                code: Some(255),
                stdout: String::new(),
                stderr: "unable to init ryzenadj".to_string(),
            })
        });
        let err = read_power_limits(&runner, &AppConfig::default()).unwrap_err();
        assert!(matches!(err, PowerError::ToolFailed { code: 255, .. }));
    }

    #[test]
    fn test_apply_profile_argument_triple() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|program, args| {
                program == "pkexec"
                    && args
                        == [
                            "/usr/bin/ryzenadj",
                            "--slow-limit=8000",
                            "--fast-limit=12000",
                            "--tctl-temp=80",
                        ]
            })
            .returning(|_, _| Ok(CmdOutput { code: Some(0), ..Default::default() }));
        let cfg = AppConfig::default();
        apply_profile(&runner, &cfg, &cfg.profiles[0]).unwrap();
    }

    #[test]
    fn test_apply_profile_failure_carries_stderr() {
        let mut runner = MockRunner::new();
        runner.expect_run().returning(|_, _| {
            Ok(CmdOutput {
                code: Some(126),
                stdout: String::new(),
                stderr: "Request dismissed".to_string(),
            })
        });
        let cfg = AppConfig::default();
        let err = apply_profile(&runner, &cfg, &cfg.profiles[2]).unwrap_err();
        match err {
            PowerError::ToolFailed { code, detail } => {
                assert_eq!(code, 126);
                assert_eq!(detail, "Request dismissed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
