/*
 * Test utilities and mock helpers for Pangomon
 *
 * This module provides common fixtures and helper functions shared by the
 * unit tests across modules.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::battery::{BatteryReading, ChargeStatus};
    use crate::config::AppConfig;
    use crate::exec::CmdOutput;
    use crate::sensors::SensorReading;
    use crate::snapshot::{ServiceSnapshot, Snapshot};

    /// Canonical well-formed EC helper output, noise line included.
    pub fn sample_helper_output() -> String {
        "{\"cpu_temp_cels\": 55, \"rpms\": 2400, \"duty\": 40}\nwait_ec error\n".to_string()
    }

    /// Canonical ryzenadj info table at the Performance tier.
    pub fn sample_info_table() -> String {
        "| STAPM LIMIT        |    25.000 | stapm-limit        |\n\
         | PPT LIMIT FAST     |    30.000 | fast-limit         |\n\
         | PPT LIMIT SLOW     |    20.000 | slow-limit         |\n"
            .to_string()
    }

    pub fn ok_output(stdout: &str) -> CmdOutput {
        CmdOutput {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed_output(code: i32, stderr: &str) -> CmdOutput {
        CmdOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    pub fn reading(temp: i64, rpm: i64, duty: i64) -> SensorReading {
        SensorReading {
            cpu_temp_cels: temp,
            rpms: rpm,
            duty,
        }
    }

    /// A populated snapshot for render/handler tests.
    pub fn sample_snapshot(cfg: &AppConfig) -> Snapshot {
        let mut snap = Snapshot::empty(cfg);
        snap.sensors = reading(55, 2400, 40);
        snap.battery = BatteryReading {
            power_watts: 6.0,
            status: ChargeStatus::Discharging,
        };
        snap.active_profile = Some(cfg.profiles.len() - 1);
        snap.services = cfg
            .services
            .iter()
            .enumerate()
            .map(|(i, name)| ServiceSnapshot {
                name: name.clone(),
                active: i == 0,
            })
            .collect();
        snap
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::config::AppConfig;
    use crate::sensors;

    #[test]
    fn test_sample_helper_output_parses() {
        let r = sensors::parse_helper_output(&sample_helper_output(), false);
        assert_eq!(r, reading(55, 2400, 40));
    }

    #[test]
    fn test_sample_info_table_classifies_performance() {
        let cfg = AppConfig::default();
        let limits = crate::power::parse_info_table(&sample_info_table()).unwrap();
        let idx = crate::power::classify(&cfg.profiles, &limits).unwrap();
        assert_eq!(cfg.profiles[idx].name, "Performance");
    }

    #[test]
    fn test_output_builders() {
        assert!(ok_output("x").success());
        let f = failed_output(1, "boom");
        assert!(!f.success());
        assert_eq!(f.stderr, "boom");
    }

    #[test]
    fn test_sample_snapshot_shape() {
        let cfg = AppConfig::default();
        let snap = sample_snapshot(&cfg);
        assert_eq!(snap.services.len(), cfg.services.len());
        assert!(snap.services[0].active);
        assert_eq!(snap.profile_name(&cfg), "Performance");
    }
}
