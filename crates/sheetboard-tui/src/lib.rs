// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use sheetboard_app::dates::{format_wall_clock, local_now, today_millis};
use sheetboard_app::{
    BoardCommand, BoardEvent, BoardState, LayoutMode, RefreshGuard, RefreshTicket, RowEmphasis,
    SourceError, TransformedView, Urgency, ViewBody, ViewConfig, ViewSnapshot, ViewState,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use time::PrimitiveDateTime;
use tracing::{debug, info};

const MAX_COLUMN_WIDTH: usize = 32;
const MIN_COLUMN_WIDTH: usize = 3;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const KEY_HINTS: &str = "tab/1-9 view · m maximize · l layout · r refresh · p pause · q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardTiming {
    pub refresh_interval: Duration,
    pub clock_interval: Duration,
    pub scroll_tick: Duration,
}

impl Default for BoardTiming {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(15),
            clock_interval: Duration::from_secs(1),
            scroll_tick: Duration::from_millis(25),
        }
    }
}

/// Everything one refresh needs. The ticket is held until the cycle is
/// finished so the next timer firing is skipped instead of overlapping.
#[derive(Debug)]
pub struct RefreshRequest {
    pub views: Vec<ViewConfig>,
    pub today: i64,
    pub ticket: RefreshTicket,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    RefreshFinished {
        outcome: Result<Vec<TransformedView>, SourceError>,
        finished_at: PrimitiveDateTime,
    },
}

pub trait BoardRuntime {
    fn run_refresh(
        &mut self,
        views: &[ViewConfig],
        today: i64,
    ) -> Result<Vec<TransformedView>, SourceError>;

    fn now(&self) -> PrimitiveDateTime {
        local_now()
    }

    /// Runs the cycle inline. Runtimes with a shareable source override this
    /// to fetch off the UI thread.
    fn spawn_refresh(&mut self, request: RefreshRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let RefreshRequest {
            views,
            today,
            ticket,
        } = request;
        let outcome = self.run_refresh(&views, today);
        let finished_at = self.now();
        drop(ticket);
        tx.send(InternalEvent::RefreshFinished {
            outcome,
            finished_at,
        })
        .map_err(|_| anyhow!("refresh event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Quit,
    Refresh,
    Board(BoardCommand),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    clock: String,
    view_areas: Vec<(usize, Rect)>,
    viewport_rows: Vec<usize>,
    status_token: u64,
}

pub fn run_app<R: BoardRuntime>(
    state: &mut BoardState,
    runtime: &mut R,
    timing: BoardTiming,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let result = match Terminal::new(backend).context("create terminal") {
        Ok(mut terminal) => run_loop(&mut terminal, state, runtime, timing),
        Err(error) => Err(error),
    };

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn run_loop<B: Backend, R: BoardRuntime>(
    terminal: &mut Terminal<B>,
    state: &mut BoardState,
    runtime: &mut R,
    timing: BoardTiming,
) -> Result<()> {
    let (internal_tx, internal_rx) = mpsc::channel();
    let guard = RefreshGuard::default();
    let mut view_data = ViewData {
        clock: clock_text(runtime.now()),
        ..ViewData::default()
    };
    info!(views = state.views.len(), "dashboard started");

    start_refresh(state, runtime, &mut view_data, &guard, &internal_tx);
    let mut last_refresh = Instant::now();
    let mut last_clock = Instant::now();
    let mut last_scroll = Instant::now();

    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        let now = Instant::now();
        if now.duration_since(last_refresh) >= timing.refresh_interval {
            last_refresh = now;
            start_refresh(state, runtime, &mut view_data, &guard, &internal_tx);
        }
        if now.duration_since(last_clock) >= timing.clock_interval {
            last_clock = now;
            view_data.clock = clock_text(runtime.now());
        }
        let dt = now.duration_since(last_scroll);
        if dt >= timing.scroll_tick {
            last_scroll = now;
            let viewport_rows = &view_data.viewport_rows;
            state.tick_scroll(dt, |index| viewport_rows.get(index).copied().unwrap_or(0));
        }

        terminal
            .draw(|frame| render(frame, state, &mut view_data))
            .context("draw frame")?;

        if !event::poll(timing.scroll_tick).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let quit = handle_key_event(
                    state,
                    runtime,
                    &mut view_data,
                    &guard,
                    &internal_tx,
                    key,
                );
                if quit {
                    break;
                }
            }
            Event::Mouse(mouse) => handle_mouse_event(state, &view_data, mouse),
            Event::FocusLost => {
                state.dispatch(BoardCommand::Hover(None));
            }
            _ => {}
        }
    }

    info!("dashboard stopped");
    Ok(())
}

fn process_internal_events(
    state: &mut BoardState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(BoardCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::RefreshFinished {
                outcome,
                finished_at,
            } => {
                for event in state.apply_cycle(outcome, finished_at) {
                    debug!(?event, "refresh applied");
                }
            }
        }
    }
}

fn start_refresh<R: BoardRuntime>(
    state: &mut BoardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    guard: &RefreshGuard,
    tx: &Sender<InternalEvent>,
) {
    let Some(ticket) = guard.try_begin() else {
        debug!("refresh skipped; previous cycle still in flight");
        state.dispatch(BoardCommand::RefreshSkipped);
        bump_status_token(view_data, tx);
        return;
    };

    state.dispatch(BoardCommand::RefreshStarted);
    let request = RefreshRequest {
        views: state.view_configs(),
        today: today_millis(runtime.now()),
        ticket,
    };
    if let Err(error) = runtime.spawn_refresh(request, tx.clone()) {
        state.refreshing = false;
        state.status_line = Some(format!("refresh failed to start: {error}"));
        bump_status_token(view_data, tx);
    }
}

fn bump_status_token(view_data: &mut ViewData, tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    let token = view_data.status_token;
    let sender = tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyAction::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('r') => KeyAction::Refresh,
        KeyCode::Tab => KeyAction::Board(BoardCommand::NextView),
        KeyCode::BackTab => KeyAction::Board(BoardCommand::PrevView),
        KeyCode::Char('m') => KeyAction::Board(BoardCommand::ToggleMaximize),
        KeyCode::Char('l') => KeyAction::Board(BoardCommand::ToggleLayout),
        KeyCode::Char('p') => KeyAction::Board(BoardCommand::TogglePause),
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit.to_digit(10).map_or(0, |value| value as usize - 1);
            KeyAction::Board(BoardCommand::SelectView(index))
        }
        _ => return None,
    };
    Some(action)
}

fn handle_key_event<R: BoardRuntime>(
    state: &mut BoardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    guard: &RefreshGuard,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key_action(key) {
        Some(KeyAction::Quit) => true,
        Some(KeyAction::Refresh) => {
            start_refresh(state, runtime, view_data, guard, tx);
            false
        }
        Some(KeyAction::Board(command)) => {
            let events = state.dispatch(command);
            if events
                .iter()
                .any(|event| matches!(event, BoardEvent::StatusUpdated(_)))
            {
                bump_status_token(view_data, tx);
            }
            false
        }
        None => false,
    }
}

fn handle_mouse_event(state: &mut BoardState, view_data: &ViewData, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            let hovered = view_at(&view_data.view_areas, mouse.column, mouse.row);
            state.dispatch(BoardCommand::Hover(hovered));
        }
        _ => {}
    }
}

fn view_at(areas: &[(usize, Rect)], column: u16, row: u16) -> Option<usize> {
    areas
        .iter()
        .find(|(_, area)| {
            column >= area.x
                && column < area.x.saturating_add(area.width)
                && row >= area.y
                && row < area.y.saturating_add(area.height)
        })
        .map(|(index, _)| *index)
}

fn clock_text(now: PrimitiveDateTime) -> String {
    format_wall_clock(now).unwrap_or_default()
}

/// Where each visible view is drawn inside `area`.
fn view_layout(area: Rect, state: &BoardState) -> Vec<(usize, Rect)> {
    let visible = state.visible_views();
    if visible.is_empty() {
        return Vec::new();
    }
    let direction = match state.layout {
        LayoutMode::SideBySide => Direction::Horizontal,
        LayoutMode::Stacked => Direction::Vertical,
    };
    let count = visible.len() as u32;
    let areas = Layout::default()
        .direction(direction)
        .constraints(visible.iter().map(|_| Constraint::Ratio(1, count)))
        .split(area);
    visible.into_iter().zip(areas.iter().copied()).collect()
}

fn render(frame: &mut ratatui::Frame<'_>, state: &BoardState, view_data: &mut ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(Paragraph::new(header_line(state, &view_data.clock)), layout[0]);

    let areas = view_layout(layout[1], state);
    let mut viewport_rows = vec![0; state.views.len()];
    for (index, area) in &areas {
        let Some(view) = state.views.get(*index) else {
            continue;
        };
        let is_active = *index == state.active_view;
        viewport_rows[*index] = render_view(frame, *area, view, is_active);
    }
    view_data.view_areas = areas;
    view_data.viewport_rows = viewport_rows;

    let status = Paragraph::new(status_text(state)).style(Style::default().fg(Color::Yellow));
    frame.render_widget(status, layout[2]);
}

fn header_line(state: &BoardState, clock: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            state.title.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(clock.to_owned()),
    ])
}

fn status_text(state: &BoardState) -> String {
    let mut parts = Vec::new();
    if let Some(status) = &state.status_line {
        parts.push(status.clone());
    } else if state.refreshing {
        parts.push("refreshing…".to_owned());
    } else if let Some(at) = state.last_refresh {
        let verb = if state.last_error.is_some() {
            "failed"
        } else {
            "updated"
        };
        parts.push(format!("{verb} {}", clock_text(at)));
    }
    parts.push(KEY_HINTS.to_owned());
    parts.join("  |  ")
}

fn view_title(view: &ViewState) -> String {
    let mut title = format!(" {} · {} ", view.snapshot.name, view.snapshot.count_text);
    if view.scroll.enabled && view.scroll.paused {
        title.push_str("(paused) ");
    }
    title
}

/// Draws one view and returns how many body rows fit.
fn render_view(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &ViewState,
    is_active: bool,
) -> usize {
    let border = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(view_title(view));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let snapshot = &view.snapshot;
    let widths = column_widths(snapshot);
    let header = Row::new(snapshot.headers.iter().map(|label| {
        Cell::from(label.clone()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let body_rows = usize::from(inner.height.saturating_sub(1));

    match &snapshot.body {
        ViewBody::Rows(rows) => {
            let offset = view.scroll.row_offset().min(rows.len());
            let visible = rows.iter().skip(offset).take(body_rows).map(|row| {
                Row::new(row.cells.iter().map(|cell| Cell::from(cell.clone())))
                    .style(row_style(&row.emphasis))
            });
            let table = Table::new(visible, widths).header(header).column_spacing(1);
            frame.render_widget(table, inner);
        }
        ViewBody::Loading | ViewBody::Error(_) => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(0)])
                .split(inner);
            let empty: [Row<'_>; 0] = [];
            frame.render_widget(
                Table::new(empty, widths).header(header).column_spacing(1),
                parts[0],
            );
            let message = match &snapshot.body {
                ViewBody::Error(message) => Paragraph::new(message.clone())
                    .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                _ => Paragraph::new("loading…").style(Style::default().fg(Color::DarkGray)),
            };
            frame.render_widget(message, parts[1]);
        }
    }
    body_rows
}

fn column_widths(snapshot: &ViewSnapshot) -> Vec<Constraint> {
    let count = snapshot.headers.len();
    if count == 0 {
        return vec![Constraint::Fill(1)];
    }
    let mut widths = snapshot
        .headers
        .iter()
        .map(|label| label.chars().count())
        .collect::<Vec<_>>();
    if let ViewBody::Rows(rows) = &snapshot.body {
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(&row.cells) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }
    widths
        .into_iter()
        .enumerate()
        .map(|(index, width)| {
            if index + 1 == count {
                Constraint::Fill(1)
            } else {
                let width = width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
                Constraint::Length(u16::try_from(width).unwrap_or(u16::MAX))
            }
        })
        .collect()
}

fn row_style(emphasis: &RowEmphasis) -> Style {
    let mut style = Style::default();
    match emphasis.urgency {
        Some(Urgency::Red) => style = style.fg(Color::Red),
        Some(Urgency::Yellow) => style = style.fg(Color::Yellow),
        Some(Urgency::Clear) | None => {}
    }
    if emphasis.sample {
        style = style.bg(Color::Indexed(236));
    }
    if emphasis.hot {
        style = style.add_modifier(Modifier::BOLD);
    }
    if emphasis.hold {
        style = style.add_modifier(Modifier::DIM);
    }
    style
}

/// Plain-text rendering of every view, for headless runs.
pub fn dump_text(state: &BoardState) -> String {
    let mut out = String::new();
    for view in &state.views {
        let snapshot = &view.snapshot;
        out.push_str(&format!("== {} ({}) ==\n", snapshot.name, snapshot.count_text));

        let mut widths = snapshot
            .headers
            .iter()
            .map(|label| label.chars().count())
            .collect::<Vec<_>>();
        if let ViewBody::Rows(rows) = &snapshot.body {
            for row in rows {
                for (width, cell) in widths.iter_mut().zip(&row.cells) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        if !snapshot.headers.is_empty() {
            out.push_str(&pad_line(&snapshot.headers, &widths));
        }
        match &snapshot.body {
            ViewBody::Rows(rows) => {
                for row in rows {
                    out.push_str(&pad_line(&row.cells, &widths));
                }
            }
            ViewBody::Error(message) => {
                out.push_str(message);
                out.push('\n');
            }
            ViewBody::Loading => out.push_str("(not loaded)\n"),
        }
        out.push('\n');
    }
    out
}

fn pad_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    format!("{}\n", line.trim_end())
}
