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

//! Dashboard rendering. Pure function of the current App state: the poll
//! produces a snapshot, this maps it to widgets, nothing here mutates.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Gauge, List, ListItem, Paragraph, Sparkline, Wrap};

use crate::app::{App, Focus};
use crate::history::History;

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(3),
        ])
        .split(size);

    draw_title(f, app, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(30)])
        .split(rows[1]);

    let services_height = (app.snapshot.services.len() as u16) + 2;
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(services_height),
            Constraint::Min(6),
        ])
        .split(columns[0]);

    draw_status_card(f, app, left[0]);
    draw_services_card(f, app, left[1]);
    draw_profiles_card(f, app, left[2]);

    let charts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(columns[1]);

    draw_chart(
        f,
        " Temperature History (°C) ",
        &app.temp_history,
        temp_scale(app.temp_history.peak()),
        Color::Red,
        charts[0],
    );
    draw_chart(
        f,
        " Fan Speed History (RPM) ",
        &app.rpm_history,
        rpm_scale(app.rpm_history.peak()),
        Color::Cyan,
        charts[1],
    );
    draw_chart(
        f,
        " Power Draw History (W) ",
        &app.power_history,
        power_scale(app.power_history.peak()),
        Color::Yellow,
        charts[2],
    );

    draw_status_bar(f, app, rows[2]);

    if app.show_warning_popup {
        draw_warning_popup(f, app, size);
    }
}

fn draw_title(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let mut text = String::from("PANGOLIN SYSTEM MONITOR");
    if !app.board_name.is_empty() {
        text = format!("{}  |  {}", text, app.board_name);
    }
    if !app.cpu_name.is_empty() {
        text = format!("{}  |  {}", text, app.cpu_name);
    }
    let title = Paragraph::new(text)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(title, area);
}

fn draw_status_card(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" System Status ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let s = &app.snapshot.sensors;
    let b = &app.snapshot.battery;
    let lines = vec![
        Line::from(Span::styled(
            format!("[{}] CPU: {}°C", app.glyph(), s.cpu_temp_cels),
            Style::default().fg(temp_color(s.cpu_temp_cels)),
        )),
        Line::from(Span::styled(
            format!("FAN: {} RPM ({}%)", s.rpms, s.duty),
            Style::default().fg(rpm_color(s.rpms)),
        )),
        Line::from(Span::styled(
            format!("POWER: {:.2} W", b.power_watts),
            Style::default().fg(power_color(b.power_watts)),
        )),
        Line::from(format!("BATTERY: {}", b.status.label())),
    ];
    f.render_widget(Paragraph::new(lines), chunks[0]);

    let duty = s.duty.clamp(0, 100) as u16;
    let duty_gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Blue))
        .label(format!("duty {}%", duty))
        .percent(duty);
    f.render_widget(duty_gauge, chunks[1]);
}

fn draw_services_card(f: &mut Frame, app: &App, area: Rect) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Services (Enter toggle, s start, x stop) ");
    if app.focus == Focus::Services {
        block = block.border_style(Style::default().fg(Color::Cyan));
    }

    let mut items: Vec<ListItem> = Vec::new();
    for (i, svc) in app.snapshot.services.iter().enumerate() {
        let sel = if app.focus == Focus::Services && i == app.services_idx {
            "> "
        } else {
            "  "
        };
        let (marker, state, color) = if svc.active {
            ("●", "Running", Color::Green)
        } else {
            ("○", "Stopped", Color::Red)
        };
        items.push(ListItem::new(Line::from(vec![
            Span::raw(format!("{}{: <20}", sel, svc.name)),
            Span::styled(format!("{} {}", marker, state), Style::default().fg(color)),
        ])));
    }
    if app.snapshot.services.is_empty() {
        items.push(ListItem::new("(no services configured)"));
    }
    f.render_widget(List::new(items).block(block), area);
}

fn draw_profiles_card(f: &mut Frame, app: &App, area: Rect) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Power Profiles (Enter apply) ");
    if app.focus == Focus::Profiles {
        block = block.border_style(Style::default().fg(Color::Cyan));
    }
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let l = &app.snapshot.limits;
    let current = if app.snapshot.active_profile.is_some() {
        format!(
            "Current: {} ({:.0}W/{:.0}W)",
            app.snapshot.profile_name(&app.cfg),
            l.fast_w,
            l.slow_w
        )
    } else {
        "Current: Unknown".to_string()
    };
    f.render_widget(
        Paragraph::new(current).style(Style::default().add_modifier(Modifier::BOLD)),
        chunks[0],
    );

    let mut items: Vec<ListItem> = Vec::new();
    for (i, p) in app.cfg.profiles.iter().enumerate() {
        let sel = if app.focus == Focus::Profiles && i == app.profiles_idx {
            "> "
        } else {
            "  "
        };
        let watts = format!(
            "{}W/{}W",
            p.fast_limit_mw / 1000,
            p.slow_limit_mw / 1000
        );
        let text = format!("{}{: <14}{: <10}", sel, p.name, watts);
        let item = if app.profile_selectable(i) {
            ListItem::new(text)
        } else {
            // The live tier cannot be re-applied; show it dimmed.
            ListItem::new(format!("{}(active)", text))
                .style(Style::default().fg(Color::DarkGray))
        };
        items.push(item);
    }
    f.render_widget(List::new(items), chunks[1]);
}

fn draw_chart(f: &mut Frame, title: &str, series: &History, scale: u64, color: Color, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!("{}now {:.0} ", title, series.latest()));
    let points = series.sparkline_points();
    let spark = Sparkline::default()
        .block(block)
        .data(&points)
        .max(scale)
        .style(Style::default().fg(color));
    f.render_widget(spark, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let mut text = app.status.clone();
    if !app.snapshot.errors.is_empty() {
        text = format!("{} | {} read error(s) last poll", text, app.snapshot.errors.len());
    }
    let bar = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(block);
    f.render_widget(bar, area);
}

fn draw_warning_popup(f: &mut Frame, app: &App, size: Rect) {
    let area = centered_rect(60, 30, size);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Error ")
        .border_style(Style::default().fg(Color::Red));
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    f.render_widget(
        Paragraph::new(app.warning_message.clone()).wrap(Wrap { trim: true }),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new("Esc/Enter to dismiss")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray)),
        chunks[1],
    );
}

// Color breakpoints and chart scale floors follow the desktop variant of
// this dashboard so thresholds read identically across both.

fn temp_color(temp_c: i64) -> Color {
    if temp_c > 80 {
        Color::Red
    } else if temp_c > 60 {
        Color::Yellow
    } else {
        Color::Blue
    }
}

fn rpm_color(rpm: i64) -> Color {
    if rpm > 4000 {
        Color::Red
    } else if rpm > 2000 {
        Color::Yellow
    } else {
        Color::Magenta
    }
}

fn power_color(watts: f64) -> Color {
    if watts > 30.0 {
        Color::Red
    } else if watts > 20.0 {
        Color::Yellow
    } else {
        Color::Cyan
    }
}

fn temp_scale(peak: f64) -> u64 {
    (peak + 10.0).max(100.0).round() as u64
}

fn rpm_scale(peak: f64) -> u64 {
    (peak + 500.0).max(5000.0).round() as u64
}

fn power_scale(peak: f64) -> u64 {
    (peak + 5.0).max(50.0).round() as u64
}
