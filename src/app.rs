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

use std::time::{Duration, Instant};

use crate::config::{self, AppConfig};
use crate::exec::{Runner, WatchdogRunner};
use crate::history::History;
use crate::snapshot::{self, Snapshot};
use crate::system::{read_board_name, read_cpu_name};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    Services,
    Profiles,
}

/// Spinner frames for the decorative fan glyph.
const GLYPH_FRAMES: [char; 4] = ['|', '/', '-', '\\'];

pub struct App {
    pub cfg: AppConfig,
    runner: Box<dyn Runner>,
    pub snapshot: Snapshot,
    pub temp_history: History,
    pub rpm_history: History,
    pub power_history: History,
    pub last_refresh: Instant,
    pub refresh_interval: Duration,
    pub glyph_interval: Duration,
    pub last_glyph_tick: Instant,
    glyph_angle: f64,
    // header
    pub cpu_name: String,
    pub board_name: String,
    pub focus: Focus,
    pub services_idx: usize,
    pub profiles_idx: usize,
    pub show_warning_popup: bool,
    pub warning_message: String,
    pub status: String,
}

impl App {
    pub fn new() -> Self {
        let cfg = config::load_effective_config();
        let runner = Box::new(WatchdogRunner::new(Duration::from_millis(
            cfg.exec_timeout_ms,
        )));
        Self::with_parts(cfg, runner)
    }

    /// Construction seam so tests can substitute the runner.
    pub fn with_parts(cfg: AppConfig, runner: Box<dyn Runner>) -> Self {
        let snapshot = Snapshot::empty(&cfg);
        let refresh_interval = Duration::from_millis(cfg.poll_interval_ms);
        let glyph_interval = Duration::from_millis(cfg.glyph_interval_ms);
        Self {
            cfg,
            runner,
            snapshot,
            temp_history: History::default(),
            rpm_history: History::default(),
            power_history: History::default(),
            last_refresh: Instant::now() - Duration::from_secs(10),
            refresh_interval,
            glyph_interval,
            last_glyph_tick: Instant::now(),
            glyph_angle: 0.0,
            cpu_name: read_cpu_name(),
            board_name: read_board_name(),
            focus: Focus::Profiles,
            services_idx: 0,
            profiles_idx: 0,
            show_warning_popup: false,
            warning_message: String::new(),
            status: String::from(
                "Tab/←→: switch | ↑/↓: move | Enter: apply/toggle | 1-9: profile | R: refresh | q: quit",
            ),
        }
    }

    pub fn runner(&self) -> &dyn Runner {
        self.runner.as_ref()
    }

    /// One data tick: poll everything, then feed the chart series.
    pub fn refresh(&mut self) {
        self.snapshot = snapshot::poll_once(self.runner.as_ref(), &self.cfg);
        self.temp_history.push(self.snapshot.sensors.cpu_temp_cels as f64);
        self.rpm_history.push(self.snapshot.sensors.rpms as f64);
        self.power_history.push(self.snapshot.battery.power_watts);
        self.last_refresh = Instant::now();
    }

    /// Advance the fan glyph. Rotation rate tracks the live RPM: stopped
    /// fan, stopped glyph; slow fans spin at a fixed low rate; beyond
    /// 2000 RPM the rate scales up with the reading.
    pub fn advance_glyph(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_glyph_tick).as_secs_f64();
        self.last_glyph_tick = now;

        let rpm = self.snapshot.sensors.rpms;
        let deg_per_sec = if rpm == 0 {
            0.0
        } else if rpm < 2000 {
            180.0
        } else {
            360.0 + (rpm as f64 / 5000.0) * 360.0
        };
        self.glyph_angle = (self.glyph_angle + deg_per_sec * dt) % 360.0;
    }

    pub fn glyph(&self) -> char {
        GLYPH_FRAMES[((self.glyph_angle / 90.0) as usize) % GLYPH_FRAMES.len()]
    }

    /// The control for the live profile is disabled: re-applying the
    /// active tier is a no-op the UI refuses up front. Unknown enables all.
    pub fn profile_selectable(&self, idx: usize) -> bool {
        self.snapshot.active_profile != Some(idx)
    }

    pub fn warn(&mut self, message: String) {
        self.warning_message = message;
        self.show_warning_popup = true;
    }
}
