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

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Focus};
use crate::handlers::*;

/// Main event handler. Returns Ok(true) when the app should exit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> anyhow::Result<bool> {
    let KeyEvent { code, modifiers, .. } = key_event;

    // Popups swallow everything first.
    if app.show_warning_popup {
        if matches!(code, KeyCode::Esc | KeyCode::Enter) {
            app.show_warning_popup = false;
            app.warning_message.clear();
        }
        return Ok(false);
    }

    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(true);
    }

    match code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Char('R') | KeyCode::Char('r') => {
            app.refresh();
            app.status = "Refreshed".to_string();
        }
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
            app.focus = match app.focus {
                Focus::Services => Focus::Profiles,
                Focus::Profiles => Focus::Services,
            };
        }
        KeyCode::Up => move_selection(app, -1),
        KeyCode::Down => move_selection(app, 1),
        KeyCode::Enter => match app.focus {
            Focus::Profiles => apply_selected_profile(app),
            Focus::Services => toggle_selected_service(app),
        },
        KeyCode::Char('s') => {
            if app.focus == Focus::Services {
                start_selected_service(app);
            }
        }
        KeyCode::Char('x') => {
            if app.focus == Focus::Services {
                stop_selected_service(app);
            }
        }
        KeyCode::Char(c @ '1'..='9') => {
            let idx = (c as usize) - ('1' as usize);
            if idx < app.cfg.profiles.len() {
                apply_profile_at(app, idx);
            }
        }
        _ => {}
    }

    Ok(false)
}

fn move_selection(app: &mut App, delta: i32) {
    let (idx, len) = match app.focus {
        Focus::Services => (&mut app.services_idx, app.snapshot.services.len()),
        Focus::Profiles => (&mut app.profiles_idx, app.cfg.profiles.len()),
    };
    if len == 0 {
        return;
    }
    if delta < 0 {
        *idx = idx.saturating_sub(1);
    } else if *idx + 1 < len {
        *idx += 1;
    }
}
