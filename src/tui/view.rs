use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::shared::{DisplayState, NUM_PADS, NUM_STEPS};
use crate::visual;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),  // readouts
            Constraint::Length(3),  // waveform strip
            Constraint::Length(3),  // pad row
            Constraint::Min(10),    // step grid
            Constraint::Length(1),  // help line
        ])
        .split(area);

    draw_readouts(frame, sections[0], state);
    draw_waveform(frame, sections[1], state);
    draw_pad_row(frame, sections[2], state);
    draw_step_grid(frame, sections[3], state);
    draw_help(frame, sections[4]);
}

fn draw_readouts(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let transport = if state.playing { "playing" } else { "stopped" };
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" bpm {:>5.1} ", state.bpm),
                Style::default().fg(Color::White),
            ),
            Span::raw(format!("swing {:.2}  ", state.swing)),
            Span::styled(
                transport,
                if state.playing {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                },
            ),
        ]),
        Line::from(format!(
            " page {:<5}  {} {:>8.2}   {} {:>8.2}",
            state.param_page.label(),
            state.knob_a_label,
            state.knob_a_value,
            state.knob_b_label,
            state.knob_b_value,
        )),
        Line::from(format!(
            " fx  delay {:.2}s  fdbk {:.2}  wet {:.2}  {} {:.0}hz",
            state.delay_time, state.feedback, state.wet, state.filter_label, state.filter_freq,
        )),
        Line::from(Span::styled(
            format!(" {}", state.status),
            Style::default().fg(Color::Yellow),
        )),
    ];
    let block = Block::default().borders(Borders::ALL).title("padloop");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_waveform(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let width = state.waveform.len();
    // trim_span is already normalized, so the overlay sees a unit duration
    let (lo, hi) = visual::trim_overlay(state.trim_span.0, state.trim_span.1, 1.0, width);

    let mut spans = Vec::with_capacity(width);
    for (i, peak) in state.waveform.iter().enumerate() {
        let bar = BARS[((peak * 7.0).round() as usize).min(7)];
        // cells outside the trim window are dimmed, the played region pops
        let style = if i >= lo && i < hi {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(bar.to_string(), style));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            "no clip",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default().borders(Borders::ALL).title("waveform");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_pad_row(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, NUM_PADS as u32); NUM_PADS])
        .split(area);

    for (i, cell) in cells.iter().enumerate() {
        let recording = state.recording_pad == Some(i as u8);
        let selected = state.selected == i as u8;
        let loaded = state.pads_loaded[i];

        let style = if recording {
            Style::default().fg(Color::White).bg(Color::Red)
        } else if selected {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD)
        } else if loaded {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let label = format!("{}", i + 1);
        let block = Block::default().borders(Borders::ALL).border_style(style);
        frame.render_widget(
            Paragraph::new(Span::styled(label, style)).block(block),
            *cell,
        );
    }
}

fn draw_step_grid(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mut lines = Vec::with_capacity(NUM_PADS);
    for row in 0..NUM_PADS {
        let selected_row = state.selected == row as u8;
        let mut spans = vec![Span::styled(
            format!(" {} ", row + 1),
            if selected_row {
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            },
        )];
        for step in 0..NUM_STEPS {
            let active = state.grid[row][step];
            let playing = state.playing_step == Some(step as u8);
            let symbol = if active { "[#]" } else { "[ ]" };
            let style = match (active, playing) {
                (true, true) => Style::default().fg(Color::White).bg(Color::Magenta),
                (false, true) => Style::default().fg(Color::Magenta),
                (true, false) => Style::default().fg(Color::Green),
                (false, false) => Style::default().fg(Color::DarkGray),
            };
            spans.push(Span::styled(symbol, style));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    let block = Block::default().borders(Borders::ALL).title("steps");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = " 1-8 pads   qwertyui steps   space play   c rec   x del   tab page   [ ] - = knobs   f filter   arrows bpm/swing   esc quit";
    frame.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray))),
        area,
    );
}
