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

//! Fixed-capacity rolling series backing the history charts.

use std::collections::VecDeque;

/// One minute of 1 Hz samples.
pub const CHART_SAMPLES: usize = 60;

/// FIFO ring of the last `cap` samples, pre-seeded with zeros so the
/// charts render a full window from the first tick.
#[derive(Debug, Clone)]
pub struct History {
    cap: usize,
    data: VecDeque<f64>,
}

impl History {
    pub fn zero_seeded(cap: usize) -> Self {
        let mut data = VecDeque::with_capacity(cap);
        data.extend(std::iter::repeat(0.0).take(cap));
        Self { cap, data }
    }

    pub fn push(&mut self, value: f64) {
        if self.data.len() == self.cap {
            self.data.pop_front();
        }
        self.data.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn latest(&self) -> f64 {
        self.data.back().copied().unwrap_or(0.0)
    }

    pub fn peak(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    /// Oldest-first integer samples for the sparkline widgets.
    pub fn sparkline_points(&self) -> Vec<u64> {
        self.data
            .iter()
            .map(|v| v.max(0.0).round() as u64)
            .collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::zero_seeded(CHART_SAMPLES)
    }
}
