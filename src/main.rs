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

mod app;
mod battery;
mod config;
mod events;
mod exec;
mod handlers;
mod history;
mod logger;
mod power;
mod sensors;
mod service;
mod snapshot;
mod system;
mod ui;

use std::io::stdout;
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::Terminal;

use app::App;
use events::handle_key_event;
use exec::WatchdogRunner;
use ui::ui;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Optional event logging to /etc/pangomon/logs.json
    let logging_enabled = args.iter().any(|a| a == "--logging");
    if logging_enabled {
        logger::init_logging();
        logger::log_event(
            "startup",
            serde_json::json!({
                "mode": "cli",
                "args": args,
            }),
        );
    }

    // Headless single poll: `pangomon --once` prints the snapshot as JSON.
    // Useful for debugging helper output without the dashboard.
    if args.iter().any(|a| a == "--once") {
        let cfg = config::load_effective_config();
        let runner = WatchdogRunner::new(Duration::from_millis(cfg.exec_timeout_ms));
        let snap = snapshot::poll_once(&runner, &cfg);
        println!("{}", serde_json::to_string_pretty(&snap)?);
        return Ok(());
    }

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if logging_enabled {
        logger::log_event("tui_start", serde_json::json!({}));
    }
    let res = run_app(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if logging_enabled {
        logger::log_event("shutdown", serde_json::json!({}));
    }

    if let Err(err) = res {
        eprintln!("error: {err}");
        if logging_enabled {
            logger::log_event("fatal_error", serde_json::json!({ "error": err.to_string() }));
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
) -> anyhow::Result<()> {
    let mut app = App::new();
    app.refresh();

    loop {
        terminal.draw(|f| ui(f, &app))?;

        // Wake for whichever tick comes first: the 1 s data poll or the
        // fast decorative glyph tick.
        let until_data = app
            .refresh_interval
            .saturating_sub(app.last_refresh.elapsed());
        let until_glyph = app
            .glyph_interval
            .saturating_sub(app.last_glyph_tick.elapsed());
        let timeout = until_data.min(until_glyph);

        if event::poll(timeout).unwrap_or(false) {
            if let Event::Key(key_event) = event::read()? {
                if handle_key_event(&mut app, key_event)? {
                    return Ok(());
                }
            }
        }

        if app.last_glyph_tick.elapsed() >= app.glyph_interval {
            app.advance_glyph();
        }
        if app.last_refresh.elapsed() >= app.refresh_interval {
            app.refresh();
        }
    }
}
