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

//! Control actions behind the key bindings. Read failures stay silent
//! (zero values on the dashboard); control failures raise the warning
//! popup with the captured detail.

use serde_json::json;

use crate::app::App;
use crate::logger;
use crate::power;
use crate::service;

pub fn apply_selected_profile(app: &mut App) {
    let idx = app.profiles_idx;
    apply_profile_at(app, idx);
}

pub fn apply_profile_at(app: &mut App, idx: usize) {
    let Some(spec) = app.cfg.profiles.get(idx).cloned() else {
        return;
    };
    if !app.profile_selectable(idx) {
        app.status = format!("{} is already active", spec.name);
        return;
    }
    match power::apply_profile(app.runner(), &app.cfg, &spec) {
        Ok(()) => {
            logger::log_event("profile_applied", json!({ "profile": spec.name }));
            app.status = format!("Applied profile {}", spec.name);
            // apply does not re-poll on its own; refresh to re-derive the
            // displayed profile from what ryzenadj now reports.
            app.refresh();
        }
        Err(e) => {
            logger::log_event(
                "profile_apply_failed",
                json!({ "profile": spec.name, "error": e.to_string() }),
            );
            app.warn(format!("Failed to apply {}: {}", spec.name, e));
        }
    }
}

/// Enter on a service row: start it when stopped, stop it when running.
pub fn toggle_selected_service(app: &mut App) {
    let Some(svc) = app.snapshot.services.get(app.services_idx).cloned() else {
        return;
    };
    if svc.active {
        stop_service(app, &svc.name);
    } else {
        start_service(app, &svc.name);
    }
}

pub fn start_selected_service(app: &mut App) {
    let Some(svc) = app.snapshot.services.get(app.services_idx).cloned() else {
        return;
    };
    if svc.active {
        app.status = format!("{} is already running", svc.name);
        return;
    }
    start_service(app, &svc.name);
}

pub fn stop_selected_service(app: &mut App) {
    let Some(svc) = app.snapshot.services.get(app.services_idx).cloned() else {
        return;
    };
    if !svc.active {
        app.status = format!("{} is not running", svc.name);
        return;
    }
    stop_service(app, &svc.name);
}

fn start_service(app: &mut App, name: &str) {
    match service::start(app.runner(), name) {
        Ok(()) => {
            logger::log_event("service_started", json!({ "service": name }));
            app.status = format!("Started {}", name);
            app.refresh();
        }
        Err(e) => {
            logger::log_event(
                "service_start_failed",
                json!({ "service": name, "error": e.to_string() }),
            );
            app.warn(e.to_string());
        }
    }
}

fn stop_service(app: &mut App, name: &str) {
    match service::stop(app.runner(), name) {
        Ok(()) => {
            logger::log_event("service_stopped", json!({ "service": name }));
            app.status = format!("Stopped {}", name);
            app.refresh();
        }
        Err(e) => {
            logger::log_event(
                "service_stop_failed",
                json!({ "service": name, "error": e.to_string() }),
            );
            app.warn(e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::exec::{CmdOutput, MockRunner};

    fn app_with_mock<F>(setup: F) -> App
    where
        F: FnOnce(&mut MockRunner),
    {
        let mut runner = MockRunner::new();
        setup(&mut runner);
        App::with_parts(AppConfig::default(), Box::new(runner))
    }

    #[test]
    fn test_apply_refuses_active_profile() {
        // No expectations on the runner: applying the active tier must not
        // spawn anything.
        let mut app = app_with_mock(|_| {});
        app.snapshot.active_profile = Some(0);
        app.profiles_idx = 0;
        apply_selected_profile(&mut app);
        assert!(app.status.contains("already active"));
        assert!(!app.show_warning_popup);
    }

    #[test]
    fn test_apply_failure_raises_warning_popup() {
        let mut app = app_with_mock(|runner| {
            runner.expect_run().returning(|program, _| {
                if program == "pkexec" {
                    Ok(CmdOutput {
                        code: Some(126),
                        stdout: String::new(),
                        stderr: "Request dismissed".to_string(),
                    })
                } else {
                    Ok(CmdOutput {
                        code: Some(1),
                        stdout: String::new(),
                        stderr: String::new(),
                    })
                }
            });
        });
        app.snapshot.active_profile = Some(2);
        app.profiles_idx = 0;
        apply_selected_profile(&mut app);
        assert!(app.show_warning_popup);
        assert!(app.warning_message.contains("Battery"));
    }

    #[test]
    fn test_apply_success_refreshes_state() {
        let mut app = app_with_mock(|runner| {
            runner.expect_run().returning(|program, args| {
                let line = format!("{} {}", program, args.join(" "));
                if program == "pkexec" {
                    Ok(CmdOutput { code: Some(0), ..Default::default() })
                } else if line.contains("--info") {
                    // Limits now inside the Battery tier.
                    Ok(CmdOutput {
                        code: Some(0),
                        stdout: "| STAPM LIMIT        |     8.000 |\n\
                                 | PPT LIMIT FAST     |    12.000 |\n\
                                 | PPT LIMIT SLOW     |     8.000 |\n"
                            .to_string(),
                        stderr: String::new(),
                    })
                } else {
                    Ok(CmdOutput {
                        code: Some(1),
                        stdout: String::new(),
                        stderr: String::new(),
                    })
                }
            });
        });
        app.snapshot.active_profile = Some(2);
        app.profiles_idx = 0;
        apply_selected_profile(&mut app);
        assert!(app.status.contains("Applied profile Battery"));
        // Refresh re-derived the active tier from the live limits.
        assert_eq!(app.snapshot.active_profile, Some(0));
    }

    #[test]
    fn test_start_refused_when_already_running() {
        let mut app = app_with_mock(|_| {});
        app.snapshot.services[0].active = true;
        app.services_idx = 0;
        start_selected_service(&mut app);
        assert!(app.status.contains("already running"));
    }

    #[test]
    fn test_toggle_stops_running_service() {
        let mut app = app_with_mock(|runner| {
            runner.expect_run().returning(|program, args| {
                if program == "pkexec" {
                    assert_eq!(args[1], "stop");
                    Ok(CmdOutput { code: Some(0), ..Default::default() })
                } else {
                    Ok(CmdOutput {
                        code: Some(1),
                        stdout: String::new(),
                        stderr: String::new(),
                    })
                }
            });
        });
        app.snapshot.services[0].active = true;
        app.services_idx = 0;
        toggle_selected_service(&mut app);
        assert!(app.status.contains("Stopped clevo-fancontrol"));
    }
}
