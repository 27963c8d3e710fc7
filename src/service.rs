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

//! systemd service state and control for the monitored units.

use serde::Serialize;
use thiserror::Error;

use crate::exec::{self, Runner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceState {
    Active,
    Inactive,
}

impl ServiceState {
    pub fn is_active(&self) -> bool {
        matches!(self, ServiceState::Active)
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("systemctl {action} {service} failed: {detail}")]
    ControlFailed {
        action: &'static str,
        service: String,
        detail: String,
    },
}

/// `systemctl is-active` reports the state token on stdout and exits
/// non-zero for anything but active, so only the token is compared; any
/// invocation failure reads as inactive.
pub fn query_state(runner: &dyn Runner, service: &str) -> ServiceState {
    let args = vec!["is-active".to_string(), service.to_string()];
    match runner.run("systemctl", &args) {
        Ok(out) if out.stdout.trim() == "active" => ServiceState::Active,
        _ => ServiceState::Inactive,
    }
}

pub fn start(runner: &dyn Runner, service: &str) -> Result<(), ServiceError> {
    control(runner, "start", service)
}

pub fn stop(runner: &dyn Runner, service: &str) -> Result<(), ServiceError> {
    control(runner, "stop", service)
}

fn control(runner: &dyn Runner, action: &'static str, service: &str) -> Result<(), ServiceError> {
    let (program, args) =
        exec::elevated_write("systemctl", &[action.to_string(), service.to_string()]);
    let out = runner
        .run(&program, &args)
        .map_err(|e| ServiceError::ControlFailed {
            action,
            service: service.to_string(),
            detail: e.to_string(),
        })?;
    if out.success() {
        Ok(())
    } else {
        Err(ServiceError::ControlFailed {
            action,
            service: service.to_string(),
            detail: out.stderr.trim().to_string(),
        })
    }
}
