use crate::app::AppState;
use crate::celebrate::Confetti;
use crate::feed::FeedClient;
use crate::model::Theme;
use crate::notify::{PingPrefs, ping};
use crate::pipeline::RenderOutput;
use crate::refresh::{FeedUpdate, RefreshScheduler, RequestIds, SchedulerSlot, spawn_fetch};
use crate::rng::XorShift64;
use crate::theme::ThemeStore;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::tty::IsTty;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use std::io::{self, Stdout};
use std::process::Command;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Lines per card: headline, meta, spacer.
const CARD_HEIGHT: u16 = 3;

pub struct TuiContext {
    pub runtime: Handle,
    pub client: FeedClient,
    pub refresh_period: Duration,
    pub theme_store: ThemeStore,
    pub ping: PingPrefs,
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    fg: Color,
    bg: Color,
    accent: Color,
    dim: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            fg: Color::Rgb(244, 244, 255),
            bg: Color::Rgb(15, 16, 32),
            accent: Color::Rgb(255, 196, 0),
            dim: Color::Rgb(140, 142, 170),
        },
        Theme::Light => Palette {
            fg: Color::Rgb(27, 29, 54),
            bg: Color::Rgb(250, 250, 250),
            accent: Color::Rgb(200, 80, 0),
            dim: Color::Rgb(110, 110, 125),
        },
    }
}

fn truncate_ellipsis(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }

    let mut out = String::new();
    let mut w = 0usize;
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        // Leave one column for the ellipsis.
        if w + cw + 1 > max_width {
            break;
        }
        out.push(ch);
        w += cw;
    }
    out.push('…');
    out
}

fn open_in_browser(url: &str) {
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        let _ = url;
        return;
    }

    #[cfg(target_os = "macos")]
    let mut cmd = {
        let mut c = Command::new("open");
        c.arg(url);
        c
    };

    #[cfg(target_os = "linux")]
    let mut cmd = {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    };

    if let Err(e) = cmd.spawn() {
        log::warn!("Failed to open {url}: {e}");
    }
}

/// First card index to draw so the selected one stays on screen.
fn first_visible_card(selected: usize, inner_height: u16) -> usize {
    let per_page = usize::from((inner_height / CARD_HEIGHT).max(1));
    selected.saturating_sub(per_page - 1)
}

fn build_card_lines(
    view: &RenderOutput,
    selected: usize,
    inner_width: u16,
    inner_height: u16,
    colors: Palette,
) -> Vec<Line<'static>> {
    let iw = inner_width as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    if view.cards.is_empty() {
        lines.push(Line::from(Span::styled(
            "No pull requests to celebrate (yet).".to_string(),
            Style::default().fg(colors.dim),
        )));
        return lines;
    }

    let start = first_visible_card(selected, inner_height);
    for (idx, card) in view.cards.iter().enumerate().skip(start) {
        if lines.len() + 2 > inner_height as usize {
            break;
        }
        let is_selected = idx == selected;
        let marker = if is_selected { "▶ " } else { "  " };

        let headline = truncate_ellipsis(&format!("{} {}", card.icon, card.title), iw.saturating_sub(2));
        let mut title_style = Style::default().fg(colors.fg).add_modifier(Modifier::BOLD);
        if is_selected {
            title_style = title_style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), Style::default().fg(colors.accent)),
            Span::styled(headline, title_style),
        ]));

        let meta = truncate_ellipsis(&card.meta_line(), iw.saturating_sub(5));
        lines.push(Line::from(Span::styled(
            format!("     {meta}"),
            Style::default().fg(colors.dim),
        )));

        if lines.len() < inner_height as usize {
            lines.push(Line::from(""));
        }
    }
    lines
}

fn leaderboard_line(view: &RenderOutput, colors: Palette) -> Line<'static> {
    if view.leaderboard.is_empty() {
        return Line::from(Span::styled(
            "Nobody on the board yet".to_string(),
            Style::default().fg(colors.dim),
        ));
    }
    let mut spans = Vec::new();
    for entry in &view.leaderboard {
        spans.push(Span::styled(
            format!(" 👑 {}: {} ", entry.author, entry.count),
            Style::default().fg(colors.accent).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn header_line(state: &AppState, refresh_secs: u64, colors: Palette) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            "🎉 PR Party  ".to_string(),
            Style::default().fg(colors.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled("🔍 ".to_string(), Style::default().fg(colors.dim)),
        Span::styled(
            format!("{}▏", state.search_input),
            Style::default().fg(colors.fg),
        ),
        Span::styled(
            format!("   {}", state.view.label),
            Style::default().fg(colors.fg).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   ⟳ {refresh_secs}s   "),
            Style::default().fg(colors.dim),
        ),
        Span::styled(
            state.theme.button_label().to_string(),
            Style::default().fg(colors.fg),
        ),
    ])
}

fn draw(f: &mut Frame, state: &AppState, refresh_secs: u64, confetti: Option<&Confetti>) {
    let colors = palette(state.theme);
    let base = Style::default().fg(colors.fg).bg(colors.bg);
    let area = f.area();
    f.render_widget(Block::default().style(base), area);

    let chunks = Layout::default()
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let block = |title: &'static str| {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.dim))
            .title(title)
            .style(base)
    };

    f.render_widget(
        Paragraph::new(header_line(state, refresh_secs, colors)).block(block("")),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(leaderboard_line(&state.view, colors)).block(block(" Leaderboard ")),
        chunks[1],
    );

    let cards_area = chunks[2];
    let lines = build_card_lines(
        &state.view,
        state.selected_idx,
        cards_area.width.saturating_sub(2),
        cards_area.height.saturating_sub(2),
        colors,
    );
    f.render_widget(Paragraph::new(Text::from(lines)).block(block(" Cards ")), cards_area);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "type to search · ↑↓ select · Enter open · ^T theme · ^R refresh · ^U clear · Esc quit"
                .to_string(),
            Style::default().fg(colors.dim),
        ))),
        chunks[3],
    );

    if let Some(confetti) = confetti {
        paint_confetti(f, area, confetti);
    }
}

fn paint_confetti(f: &mut Frame, area: Rect, confetti: &Confetti) {
    let buf = f.buffer_mut();
    for speck in confetti.specks(area.width, area.height) {
        let (r, g, b) = speck.rgb;
        if let Some(cell) = buf.cell_mut((area.x + speck.x, area.y + speck.y)) {
            cell.set_char(speck.glyph).set_fg(Color::Rgb(r, g, b));
        }
    }
}

enum KeyAction {
    Quit,
    Continue,
}

fn handle_key(
    k: KeyEvent,
    state: &mut AppState,
    ctx: &TuiContext,
    ids: &RequestIds,
    tx: &UnboundedSender<FeedUpdate>,
) -> KeyAction {
    let now = Utc::now();
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    match k.code {
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Char('t') if ctrl => match state.toggle_theme(&ctx.theme_store) {
            Ok(theme) => log::info!("Theme set to {}", theme.as_str()),
            Err(e) => log::warn!("Theme switched but not saved: {e}"),
        },
        KeyCode::Char('r') if ctrl => {
            let id = spawn_fetch(&ctx.runtime, ctx.client.clone(), ids, tx.clone());
            log::debug!("Manual refresh #{id}");
        }
        KeyCode::Char('u') if ctrl => state.set_search_input(String::new(), now),
        KeyCode::Char(c) if !ctrl => state.push_search_char(c, now),
        KeyCode::Backspace => state.pop_search_char(now),
        KeyCode::Up => state.select_prev(),
        KeyCode::Down => state.select_next(),
        KeyCode::Enter => {
            if let Some(url) = state.selected_url() {
                open_in_browser(url);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ctx: &TuiContext,
    state: &mut AppState,
    tx: UnboundedSender<FeedUpdate>,
    mut rx: UnboundedReceiver<FeedUpdate>,
    ids: RequestIds,
) -> Result<(), String> {
    let refresh_secs = ctx.refresh_period.as_secs();
    let mut scheduler = SchedulerSlot::default();
    let mut confetti: Option<Confetti> = None;
    let mut rng = XorShift64::from_clock();

    loop {
        while let Ok(update) = rx.try_recv() {
            let effects = state.handle_update(update, Utc::now());
            if effects.first_load {
                scheduler.ensure_started(|| {
                    RefreshScheduler::start(
                        &ctx.runtime,
                        ctx.client.clone(),
                        ids.clone(),
                        ctx.refresh_period,
                        tx.clone(),
                    )
                });
            }
            if effects.celebrate {
                let width = terminal.size().map(|s| s.width).unwrap_or(80);
                confetti = Some(Confetti::new(width, &mut rng));
                ping(ctx.ping, state.records.len());
            }
        }

        if let Some(c) = confetti.as_mut() {
            c.step();
            if c.is_done() {
                confetti = None;
            }
        }

        terminal
            .draw(|f| draw(f, state, refresh_secs, confetti.as_ref()))
            .map_err(|e| format!("Draw failed: {e}"))?;

        let wait = if confetti.is_some() {
            Duration::from_millis(30)
        } else {
            Duration::from_millis(100)
        };
        if event::poll(wait).map_err(|e| format!("Event poll failed: {e}"))? {
            if let Event::Key(k) = event::read().map_err(|e| format!("Event read failed: {e}"))? {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if let KeyAction::Quit = handle_key(k, state, ctx, &ids, &tx) {
                    return Ok(());
                }
            }
        }
    }
}

pub fn run_tui(ctx: TuiContext, mut state: AppState) -> Result<(), String> {
    if !io::stdin().is_tty() || !io::stdout().is_tty() {
        return Err("Not a TTY: run `prparty` in an interactive terminal (or use --snapshot).".to_string());
    }
    enable_raw_mode().map_err(|e| format!("Failed to enable raw mode: {e}"))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| format!("Failed to enter alt screen: {e}"))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal: Terminal<CrosstermBackend<Stdout>> =
        Terminal::new(backend).map_err(|e| format!("Failed to init terminal: {e}"))?;

    let (tx, rx) = mpsc::unbounded_channel();
    let ids = RequestIds::default();
    state.rerender(Utc::now());
    spawn_fetch(&ctx.runtime, ctx.client.clone(), &ids, tx.clone());

    let result = event_loop(&mut terminal, &ctx, &mut state, tx, rx, ids);

    disable_raw_mode().map_err(|e| format!("Failed to disable raw mode: {e}"))?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .map_err(|e| format!("Failed to leave alt screen: {e}"))?;
    terminal.show_cursor().map_err(|e| format!("Failed to show cursor: {e}"))?;
    result
}
