use std::{
    fs::{self, File},
    io::{self, Stdout},
    path::Path,
    time::Duration,
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lifeview_core::{
    Action, ApplicationMode, CellRecord, CellVariant, Command, ReportState, Session,
    SimulationSnapshot, SpeedSetting,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use serde::Serialize;
use supports_color::{ColorLevel, Stream, on_cached};
use tracing::{debug, info};

use crate::client::SimulationApi;
use crate::driver::SessionDriver;

const UI_TICK_MILLIS: u64 = 100;
const CONTROL_PANEL_WIDTH: u16 = 30;

/// Interactive terminal front end for a [`SessionDriver`].
pub struct TerminalHud {
    draw_interval: Duration,
}

impl Default for TerminalHud {
    fn default() -> Self {
        Self {
            draw_interval: Duration::from_millis(UI_TICK_MILLIS),
        }
    }
}

impl TerminalHud {
    /// Takes over the terminal until the operator quits.
    pub fn run<A: SimulationApi>(&self, driver: &mut SessionDriver<A>) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enable raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to build terminal backend")?;
        terminal.hide_cursor().ok();

        let result = self.event_loop(&mut terminal, driver);

        terminal.show_cursor().ok();
        if let Err(err) = disable_raw_mode() {
            tracing::error!(?err, "failed to disable raw mode");
        }
        if let Err(err) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
            tracing::error!(?err, "failed to leave alternate screen");
        }

        result
    }

    fn event_loop<A: SimulationApi>(
        &self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        driver: &mut SessionDriver<A>,
    ) -> Result<()> {
        let palette = Palette::detect();
        let mut ui = HudState::default();

        loop {
            driver.pump();
            terminal
                .draw(|frame| draw(frame, driver.session(), &ui, &palette))
                .context("failed to draw HUD")?;

            if !event::poll(self.draw_interval).context("failed to poll terminal events")? {
                continue;
            }
            let TermEvent::Key(key) = event::read().context("failed to read terminal event")?
            else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key_input(driver.session(), key) {
                Some(Input::Quit) => break,
                Some(Input::ToggleHelp) => ui.help_visible = !ui.help_visible,
                Some(Input::Act(action)) => ui.notice = match driver.perform(action) {
                    Ok(()) => None,
                    Err(err) => {
                        debug!(%action, error = %err, "action rejected");
                        Some(err.to_string())
                    }
                },
                None => {}
            }
        }

        Ok(())
    }

    /// Begins a session and renders `frames` frames off-screen, one per draw interval.
    pub fn run_headless<A: SimulationApi>(
        &self,
        driver: &mut SessionDriver<A>,
        frames: usize,
    ) -> Result<HeadlessReport> {
        let backend = ratatui::backend::TestBackend::new(100, 36);
        let mut terminal = Terminal::new(backend).context("failed to build test backend")?;
        let palette = Palette::plain();
        let ui = HudState::default();

        driver
            .perform(Action::Begin)
            .context("failed to begin headless session")?;
        for _ in 0..frames {
            std::thread::sleep(self.draw_interval);
            driver.pump();
            terminal.draw(|frame| draw(frame, driver.session(), &ui, &palette))?;
        }

        let report = HeadlessReport::capture(driver, frames);
        info!(
            frames = report.frames,
            polls_applied = report.polls_applied,
            stale_discarded = report.stale_discarded,
            commands_dispatched = report.commands_dispatched,
            final_alive = report.final_alive,
            reachable = report.reachable,
            "terminal headless run completed"
        );
        Ok(report)
    }
}

/// Outcome of a headless run, written as JSON on request.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlessReport {
    pub frames: usize,
    pub polls_applied: u64,
    pub stale_discarded: u64,
    pub commands_dispatched: u64,
    pub final_alive: Option<u32>,
    pub final_food: Option<u32>,
    pub reachable: bool,
    pub mode: String,
}

impl HeadlessReport {
    fn capture<A: SimulationApi>(driver: &SessionDriver<A>, frames: usize) -> Self {
        let session = driver.session();
        let stats = driver.stats();
        Self {
            frames,
            polls_applied: stats.polls_applied,
            stale_discarded: stats.stale_discarded,
            commands_dispatched: stats.commands_dispatched,
            final_alive: session.mirror().map(|mirror| mirror.alive_count),
            final_food: session.mirror().map(|mirror| mirror.available_food),
            reachable: session.connectivity().is_reachable(),
            mode: session.mode().to_string(),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).context("failed to serialize headless report")?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct HudState {
    help_visible: bool,
    /// Last rejected action, shown in the footer until the next accepted one.
    notice: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Quit,
    ToggleHelp,
    Act(Action),
}

fn key_input(session: &Session, key: KeyEvent) -> Option<Input> {
    if session.pending_confirmation().is_some() {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Input::Act(Action::Confirm(true))),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                Some(Input::Act(Action::Confirm(false)))
            }
            _ => None,
        };
    }

    let action = match (key.code, key.modifiers) {
        (KeyCode::Esc, _)
        | (KeyCode::Char('q'), _)
        | (KeyCode::Char('Q'), _)
        | (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Some(Input::Quit),
        (KeyCode::Char('?') | KeyCode::Char('h'), _) => return Some(Input::ToggleHelp),
        (KeyCode::Enter, _) => Action::Begin,
        (KeyCode::Char('m'), _) => Action::Navigate(ApplicationMode::Menu),
        (KeyCode::Char('g'), _) => Action::Navigate(ApplicationMode::Running),
        (KeyCode::Char('l'), _) => Action::Navigate(ApplicationMode::Report),
        (KeyCode::Char(' '), _) => Action::Issue(Command::TogglePause),
        (KeyCode::Char('s'), _) => Action::Issue(Command::Start),
        (KeyCode::Char('r'), _) => Action::Restart,
        (KeyCode::Char('a'), _) => Action::Issue(Command::AddCell(CellVariant::Asexual)),
        (KeyCode::Char('x'), _) => Action::Issue(Command::AddCell(CellVariant::Sexual)),
        (KeyCode::Char('f'), _) => Action::Issue(Command::AddFood),
        (KeyCode::Char('k'), _) => Action::Issue(Command::KillAll),
        (KeyCode::Char('+') | KeyCode::Char('='), _) => {
            Action::Issue(Command::Speed(SpeedSetting::Fast))
        }
        (KeyCode::Char('-') | KeyCode::Char('_'), _) => {
            Action::Issue(Command::Speed(SpeedSetting::Slow))
        }
        (KeyCode::Char('0'), _) => Action::Issue(Command::Speed(SpeedSetting::Normal)),
        _ => return None,
    };
    Some(Input::Act(action))
}

fn draw(frame: &mut Frame<'_>, session: &Session, ui: &HudState, palette: &Palette) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, outer[0], session, palette);
    match session.mode() {
        ApplicationMode::Menu => draw_menu(frame, outer[1], palette),
        ApplicationMode::Running => draw_running(frame, outer[1], session.mirror(), palette),
        ApplicationMode::Report => draw_report(frame, outer[1], session.report(), palette),
    }
    draw_footer(frame, outer[2], session.mode(), ui, palette);

    if let Some(command) = session.pending_confirmation() {
        draw_confirmation(frame, command, palette);
    }
    if ui.help_visible {
        draw_help(frame, palette);
    }
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, session: &Session, palette: &Palette) {
    let mirror = session.mirror();
    let alive = mirror.map_or(0, |m| m.alive_count);
    let food = mirror.map_or(0, |m| m.available_food);

    let connectivity = session.connectivity();
    let signal = if connectivity.is_reachable() {
        Span::styled(" ONLINE ", palette.online_style())
    } else {
        Span::styled(
            format!(" NO SIGNAL ({}) ", connectivity.consecutive_failures()),
            palette.offline_style(),
        )
    };

    let line = Line::from(vec![
        Span::styled("POPULATION ", palette.label_style(Color::LightMagenta)),
        Span::styled(format!("{alive:>5}"), palette.value_style()),
        Span::raw("   "),
        Span::styled("RESOURCES ", palette.label_style(Color::LightRed)),
        Span::styled(format!("{food:>5}"), palette.value_style()),
        Span::raw("   "),
        signal,
    ]);

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .title(palette.title("GAME OF LIFE"))
            .borders(Borders::ALL),
    );
    frame.render_widget(paragraph, area);
}

fn draw_menu(frame: &mut Frame<'_>, area: Rect, palette: &Palette) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let top_padding = inner.height.saturating_sub(5) / 2;
    let mut lines = vec![Line::raw(""); top_padding as usize];
    lines.push(Line::from(Span::styled(
        "GAME OF LIFE",
        palette.header_style().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "cellular ecosystem observer",
        palette.accent_style(),
    )));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "press ENTER to insert coin",
        palette.value_style().add_modifier(Modifier::SLOW_BLINK),
    )));

    frame.render_widget(
        Paragraph::new(Text::from(lines)).alignment(Alignment::Center),
        inner,
    );
}

fn draw_running(
    frame: &mut Frame<'_>,
    area: Rect,
    mirror: Option<&SimulationSnapshot>,
    palette: &Palette,
) {
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(CONTROL_PANEL_WIDTH), Constraint::Min(0)])
        .split(area);

    draw_controls(frame, body[0], mirror, palette);
    draw_arena(frame, body[1], mirror, palette);
}

fn draw_controls(
    frame: &mut Frame<'_>,
    area: Rect,
    mirror: Option<&SimulationSnapshot>,
    palette: &Palette,
) {
    let status = match mirror {
        None => Span::styled(" WAITING ", palette.paused_style()),
        Some(m) if m.paused => Span::styled(" PAUSED ", palette.paused_style()),
        Some(_) => Span::styled(" RUNNING ", palette.running_style()),
    };

    let (asexual, sexual, hungry) = mirror.map_or((0, 0, 0), |m| {
        (
            m.variant_count(CellVariant::Asexual),
            m.variant_count(CellVariant::Sexual),
            m.hungry_count(),
        )
    });
    let pause_label = if mirror.is_some_and(|m| m.paused) {
        "resume"
    } else {
        "pause"
    };

    let lines = vec![
        Line::from(vec![Span::raw("STATUS "), status]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("asexual ", palette.variant_style(CellVariant::Asexual)),
            Span::raw(format!("{asexual:>4}")),
        ]),
        Line::from(vec![
            Span::styled("sexual  ", palette.variant_style(CellVariant::Sexual)),
            Span::raw(format!("{sexual:>4}")),
        ]),
        Line::from(vec![
            Span::styled("hungry  ", palette.hungry_style()),
            Span::raw(format!("{hungry:>4}")),
        ]),
        Line::raw(""),
        Line::raw(" s      start"),
        Line::raw(format!(" space  {pause_label}")),
        Line::raw(" r      reset"),
        Line::raw(" a / x  add asexual/sexual"),
        Line::raw(" f      feed"),
        Line::raw(" + - 0  fast/slow/normal"),
        Line::from(Span::styled(" k      terminate", palette.danger_style())),
    ];

    let paragraph = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .title(palette.title("CONTROLS"))
            .borders(Borders::ALL),
    );
    frame.render_widget(paragraph, area);
}

fn draw_arena(
    frame: &mut Frame<'_>,
    area: Rect,
    mirror: Option<&SimulationSnapshot>,
    palette: &Palette,
) {
    let block = Block::default()
        .title(palette.title("ARENA"))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width < 2 || inner.height < 2 {
        return;
    }

    let cells = mirror.map_or(&[][..], |m| m.cells.as_slice());
    if cells.is_empty() {
        let top_padding = inner.height.saturating_sub(1) / 2;
        let mut lines = vec![Line::raw(""); top_padding as usize];
        lines.push(Line::from(Span::styled(
            "SYSTEM READY",
            palette.accent_style().add_modifier(Modifier::SLOW_BLINK),
        )));
        frame.render_widget(
            Paragraph::new(Text::from(lines)).alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let width = inner.width as usize;
    let height = inner.height as usize;
    let mut grid = vec![(' ', Style::default()); width * height];

    if let Some(mirror) = mirror {
        for item in &mirror.food {
            let idx = grid_index(item.x, item.y, width, height);
            grid[idx] = ('·', palette.food_style());
        }
    }
    for cell in cells {
        let idx = grid_index(cell.x, cell.y, width, height);
        grid[idx] = palette.cell_glyph(cell);
    }

    let lines: Vec<Line> = grid
        .chunks(width)
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|(ch, style)| Span::styled(ch.to_string(), *style))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

/// Maps percent coordinates onto a `width`×`height` grid.
fn grid_index(x: f64, y: f64, width: usize, height: usize) -> usize {
    let col = (x / 100.0 * width as f64)
        .floor()
        .clamp(0.0, (width - 1) as f64) as usize;
    let row = (y / 100.0 * height as f64)
        .floor()
        .clamp(0.0, (height - 1) as f64) as usize;
    row * width + col
}

fn draw_report(frame: &mut Frame<'_>, area: Rect, report: &ReportState, palette: &Palette) {
    let block = Block::default()
        .title(palette.title("MISSION REPORT"))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let summary = match (&report.summary, report.loading) {
        (Some(summary), false) => summary,
        _ => {
            let banner = Paragraph::new(Span::styled(
                "ACCESSING MAINFRAME...",
                palette.accent_style().add_modifier(Modifier::SLOW_BLINK),
            ))
            .alignment(Alignment::Center);
            frame.render_widget(banner, inner);
            return;
        }
    };

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(4)])
        .split(inner);

    let analysis_style = if summary.is_unavailable() {
        palette.danger_style()
    } else {
        palette.value_style()
    };
    frame.render_widget(
        Paragraph::new(Span::styled(summary.analysis.as_str(), analysis_style))
            .wrap(Wrap { trim: false }),
        sections[0],
    );

    let stats = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(sections[1]);
    let tiles = [
        ("SURVIVORS", summary.alive_count, Color::Cyan),
        ("DIVISIONS (A)", summary.divisions, Color::Green),
        ("REPRODUCTIONS (S)", summary.generations, Color::LightMagenta),
    ];
    for ((label, value, color), area) in tiles.into_iter().zip(stats.iter()) {
        let tile = Paragraph::new(Span::styled(value.to_string(), palette.value_style()))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(Span::styled(label, palette.label_style(color)))
                    .borders(Borders::ALL),
            );
        frame.render_widget(tile, *area);
    }
}

fn draw_footer(
    frame: &mut Frame<'_>,
    area: Rect,
    mode: ApplicationMode,
    ui: &HudState,
    palette: &Palette,
) {
    let mut spans = Vec::new();
    for (key, target) in [
        ('m', ApplicationMode::Menu),
        ('g', ApplicationMode::Running),
        ('l', ApplicationMode::Report),
    ] {
        let style = if target == mode {
            palette.header_style().add_modifier(Modifier::REVERSED)
        } else {
            palette.accent_style()
        };
        spans.push(Span::styled(format!(" [{key}] {} ", target.title()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(" ? help  q quit"));
    if let Some(notice) = &ui.notice {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(notice.as_str(), palette.danger_style()));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_confirmation(frame: &mut Frame<'_>, command: Command, palette: &Palette) {
    let area = centered(frame.area(), 44, 5);
    let prompt = match command {
        Command::KillAll => "TERMINATE SIMULATION?".to_string(),
        other => format!("SEND {other}?"),
    };
    let lines = vec![
        Line::from(Span::styled(prompt, palette.danger_style())),
        Line::raw(""),
        Line::raw("[y] yes    [n] no"),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(palette.title("CONFIRM"))
                    .borders(Borders::ALL),
            ),
        area,
    );
}

fn draw_help(frame: &mut Frame<'_>, palette: &Palette) {
    let size = frame.area();
    let area = centered(size, (size.width as f32 * 0.6).round() as u16, 14);

    let help_lines = vec![
        Line::from(vec![Span::styled(
            "Controls",
            palette.header_style().add_modifier(Modifier::BOLD),
        )]),
        Line::raw(" enter  Begin (from menu)"),
        Line::raw(" m g l  Menu / simulation / logs"),
        Line::raw(" space  Toggle pause"),
        Line::raw(" s / r  Start / reset and restart"),
        Line::raw(" a / x  Inject asexual / sexual cell"),
        Line::raw(" f      Feed"),
        Line::raw(" + - 0  Speed fast / slow / normal"),
        Line::raw(" k      Terminate (asks first)"),
        Line::raw(" ?      Toggle this help"),
        Line::raw(" q      Quit"),
    ];

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(help_lines).block(
            Block::default()
                .title(palette.title("Help"))
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Black).fg(Color::White)),
        ),
        area,
    );
}

fn centered(outer: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(outer.width);
    let height = height.min(outer.height);
    Rect::new(
        outer.x + (outer.width - width) / 2,
        outer.y + (outer.height - height) / 2,
        width,
        height,
    )
}

struct Palette {
    level: Option<ColorLevel>,
}

impl Palette {
    fn detect() -> Self {
        Self {
            level: on_cached(Stream::Stdout),
        }
    }

    fn plain() -> Self {
        Self { level: None }
    }

    fn has_color(&self) -> bool {
        self.level.is_some()
    }

    fn fg(&self, color: Color) -> Style {
        if self.has_color() {
            Style::default().fg(color)
        } else {
            Style::default()
        }
    }

    fn header_style(&self) -> Style {
        self.fg(Color::LightMagenta).add_modifier(Modifier::BOLD)
    }

    fn accent_style(&self) -> Style {
        self.fg(Color::Magenta)
    }

    fn label_style(&self, color: Color) -> Style {
        self.fg(color)
    }

    fn value_style(&self) -> Style {
        self.fg(Color::White).add_modifier(Modifier::BOLD)
    }

    fn danger_style(&self) -> Style {
        self.fg(Color::Red).add_modifier(Modifier::BOLD)
    }

    fn online_style(&self) -> Style {
        self.fg(Color::Green)
    }

    fn offline_style(&self) -> Style {
        self.fg(Color::Red)
            .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK)
    }

    fn paused_style(&self) -> Style {
        self.fg(Color::Yellow).add_modifier(Modifier::BOLD)
    }

    fn running_style(&self) -> Style {
        self.fg(Color::Green).add_modifier(Modifier::BOLD)
    }

    fn food_style(&self) -> Style {
        self.fg(Color::LightRed)
    }

    fn hungry_style(&self) -> Style {
        self.fg(Color::Blue).add_modifier(Modifier::BOLD)
    }

    fn variant_style(&self, variant: CellVariant) -> Style {
        match variant {
            CellVariant::Asexual => self.fg(Color::Cyan),
            CellVariant::Sexual => self.fg(Color::LightMagenta),
        }
    }

    fn title<T: Into<String>>(&self, title: T) -> Span<'static> {
        Span::styled(title.into(), self.header_style())
    }

    fn cell_glyph(&self, cell: &CellRecord) -> (char, Style) {
        let glyph = match cell.variant {
            CellVariant::Asexual => 'a',
            CellVariant::Sexual => 's',
        };
        if cell.hungry {
            (glyph.to_ascii_uppercase(), self.hungry_style())
        } else if cell.reproducing {
            (glyph, self.variant_style(cell.variant).add_modifier(Modifier::BOLD))
        } else {
            (glyph, self.variant_style(cell.variant))
        }
    }
}
