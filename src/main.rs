mod display;
mod engine;
mod error;
mod prizes;
mod report;
mod temple;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tui_textarea::TextArea;

use display::{ImageRender, ImageRenderer};
use engine::{GameEngine, GameEvent, GameStatus, RngSampler, SystemClock, TimeWarning};
use prizes::{load_prizes, PrizeTable};
use temple::{load_temple, RoomId, Temple};

const TICK: Duration = Duration::from_millis(250);
const IMAGE_SIZE: (u16, u16) = (40, 16);

const FLAVOR: [&str; 5] = [
    "The ancient mechanisms groan as a door opens...",
    "Stone grinds against stone...",
    "You hear whispers from the temple spirits...",
    "The path ahead beckons...",
    "Your footsteps echo through the ancient halls...",
];

enum Screen {
    Running,
    Finished,
}

struct App<'a> {
    engine: GameEngine<SystemClock>,
    artifact: String,
    image_dir: PathBuf,
    prizes: Option<PrizeTable>,
    images: ImageRenderer,
    image: Option<(RoomId, Option<String>)>,
    input: TextArea<'a>,
    narration: Vec<Line<'static>>,
    message: String,
    message_style: Style,
    report: Vec<Line<'static>>,
    report_scroll: u16,
    screen: Screen,
}

impl<'a> App<'a> {
    fn new(temple: Temple, prizes: Option<PrizeTable>, images: ImageRenderer) -> Self {
        let mut sampler = RngSampler(rand::thread_rng());
        let engine = GameEngine::from_temple(&temple, &mut sampler, SystemClock);

        App {
            engine,
            artifact: temple.config.artifact.clone(),
            image_dir: temple.root.join(&temple.config.image_dir),
            prizes,
            images,
            image: None,
            input: new_input(),
            narration: Vec::new(),
            message: String::from("What do you do? (Enter number)"),
            message_style: Style::default().fg(Color::Yellow),
            report: Vec::new(),
            report_scroll: 0,
            screen: Screen::Running,
        }
    }

    fn start(&mut self) {
        let minutes = self.engine.player().time_limit.as_secs() / 60;
        self.olmec_speaks("Welcome to my temple!", Color::Yellow);
        self.olmec_speaks(
            &format!(
                "You have {} MINUTES to retrieve the {} and return to the temple gates...",
                minutes, self.artifact
            ),
            Color::Yellow,
        );
        self.olmec_speaks("Or you will be locked in my temple... FOREVER!", Color::Red);
        self.say(
            "The temple doors open with a grinding sound of ancient stone...",
            Color::Cyan,
        );

        let events = self.engine.start();
        self.narrate(events);
    }

    fn olmec_speaks(&mut self, message: &str, color: Color) {
        self.narration.push(Line::from(Span::styled(
            format!("[OLMEC]: {}", message),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
    }

    fn say(&mut self, message: &str, color: Color) {
        self.narration.push(Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(color),
        )));
    }

    fn narrate(&mut self, events: Vec<GameEvent>) {
        for event in events {
            match event {
                GameEvent::TimeWarning(TimeWarning::OneMinute) => {
                    self.olmec_speaks("ONE MINUTE REMAINING!", Color::Yellow)
                }
                GameEvent::TimeWarning(TimeWarning::ThirtySeconds) => {
                    self.olmec_speaks("THIRTY SECONDS!", Color::Red)
                }
                GameEvent::TimeUp => {
                    self.olmec_speaks("TIME'S UP!", Color::Red);
                    self.say("The temple doors seal shut! You are trapped forever!", Color::Red);
                }
                GameEvent::GuardPaidOff { .. } => {
                    self.olmec_speaks("TEMPLE GUARD!", Color::Red);
                    self.say("A Temple Guard emerges from the shadows!", Color::Red);
                    self.say(
                        "You give the guard a Pendant of Life and continue...",
                        Color::Yellow,
                    );
                }
                GameEvent::Captured { .. } => {
                    self.olmec_speaks("TEMPLE GUARD!", Color::Red);
                    self.say("A Temple Guard emerges from the shadows!", Color::Red);
                    self.say(
                        "You're out of Pendants! The Temple Guard captures you!",
                        Color::Red,
                    );
                }
                GameEvent::Moved { .. } => {
                    self.say("You make your choice...", Color::Cyan);
                    let mut rng = rand::thread_rng();
                    if rng.gen_bool(0.3) {
                        if let Some(flavor) = FLAVOR.choose(&mut rng) {
                            self.say(flavor, Color::Magenta);
                        }
                    }
                }
                GameEvent::ArtifactFound => {
                    let artifact = self.artifact.to_uppercase();
                    self.olmec_speaks(&format!("YOU'VE FOUND THE {}!", artifact), Color::Green);
                    self.say("🎉 It glimmers with ancient power! 🎉", Color::Green);
                    self.say("Now race back to the temple entrance!", Color::Yellow);
                }
                GameEvent::Escaped => {
                    self.olmec_speaks(
                        &format!("CONGRATULATIONS! You've escaped with the {}!", self.artifact),
                        Color::Green,
                    );
                    self.say("🏆 TEMPLE RUN SUCCESSFUL! 🏆", Color::Green);
                }
                GameEvent::Aborted => {
                    self.say(
                        "Temple run aborted! The temple keeps its secrets...",
                        Color::Yellow,
                    );
                }
            }
        }

        if self.engine.status().is_terminal() && matches!(self.screen, Screen::Running) {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.screen = Screen::Finished;
        self.report = report::final_stats(&self.engine);

        // An aborted run still gets its stats but no ceremony
        if self.engine.status() != GameStatus::Aborted {
            if let Some(table) = &self.prizes {
                self.report
                    .extend(report::prize_ceremony(&self.engine, table));
            }
        }

        self.report.push(Line::default());
        self.report.push(Line::from(Span::styled(
            "Thanks for playing Legends of the Hidden Temple!",
            Style::default().fg(Color::Yellow),
        )));
    }

    fn submit(&mut self) {
        let choice = self.input.lines().join("");
        self.input = new_input();

        match self.engine.choose(&choice) {
            Ok(events) => {
                self.message = String::from("What do you do? (Enter number)");
                self.message_style = Style::default().fg(Color::Yellow);
                self.narrate(events);
            }
            Err(e) => {
                self.message = e.to_string();
                self.message_style = Style::default().fg(Color::Red);
            }
        }
    }

    /// Renders the current room's picture once per room visit.
    fn refresh_image(&mut self) {
        let room = self.engine.current_room();
        if matches!(&self.image, Some((id, _)) if *id == room.id) {
            return;
        }

        let art = match &room.image_file {
            Some(file) => {
                let (w, h) = IMAGE_SIZE;
                match self.images.render(&self.image_dir.join(file), w, h) {
                    ImageRender::Rendered(art) => Some(art),
                    ImageRender::Missing | ImageRender::Failed(_) => None,
                }
            }
            None => None,
        };
        self.image = Some((room.id.clone(), art));
    }

    /// Returns false once the player is done with the game.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return true;
        }

        match self.screen {
            Screen::Finished => match key.code {
                KeyCode::PageDown | KeyCode::Down => {
                    let lines = self.report.len() as u16;
                    if self.report_scroll < lines.saturating_sub(5) {
                        self.report_scroll += 3;
                    }
                    true
                }
                KeyCode::PageUp | KeyCode::Up => {
                    self.report_scroll = self.report_scroll.saturating_sub(3);
                    true
                }
                _ => false,
            },
            Screen::Running => {
                match (key.code, key.modifiers) {
                    (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                        let events = self.engine.abort();
                        self.narrate(events);
                    }
                    (KeyCode::Enter, _) => self.submit(),
                    _ => {
                        self.input.input(key);
                    }
                }
                true
            }
        }
    }
}

fn new_input<'a>() -> TextArea<'a> {
    let mut input = TextArea::default();
    input.set_cursor_line_style(Style::default());
    input
}

fn temple_dir() -> PathBuf {
    std::env::var_os("TEMPLE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("temple"))
}

/// Logs go to the file named by `TEMPLE_RUN_LOG`, never to the screen.
fn init_logging() {
    let Some(path) = std::env::var_os("TEMPLE_RUN_LOG") else {
        return;
    };
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("could not open log file {:?}: {}", path, e);
            return;
        }
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_default_env();
    builder.write_style(env_logger::WriteStyle::Never);
    builder.target(env_logger::Target::Pipe(Box::new(file)));
    let _ = builder.try_init();
}

fn load_prize_table(dir: &Path) -> Option<PrizeTable> {
    match load_prizes(&dir.join("prizes.toml")) {
        Ok(table) => Some(table),
        Err(e) => {
            warn!("prize ceremony unavailable: {}", e);
            None
        }
    }
}

fn main() -> Result<()> {
    init_logging();

    let dir = temple_dir();
    let temple = load_temple(&dir)
        .with_context(|| format!("failed to load the temple from {}", dir.display()))?;
    let prizes = load_prize_table(&dir);
    let images = ImageRenderer::detect();
    info!("starting temple run, images {}", if images.is_enabled() { "on" } else { "off" });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(temple, prizes, images);
    app.start();

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res?;

    if !app.report.is_empty() {
        println!("\n{}\n", report::to_plain_text(&app.report));
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        if matches!(app.screen, Screen::Running) {
            let events = app.engine.tick();
            app.narrate(events);
            app.refresh_image();
        }

        terminal.draw(|f| draw_ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if !app.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

fn draw_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10)])
        .split(f.area());

    draw_status(f, app, chunks[0]);

    match app.screen {
        Screen::Running => draw_temple(f, app, chunks[1]),
        Screen::Finished => draw_report(f, app, chunks[1]),
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let remaining = app.engine.remaining();
    let secs = remaining.as_secs();
    let time_color = if secs > 60 {
        Color::Green
    } else if secs > 30 {
        Color::Yellow
    } else {
        Color::Red
    };

    let mut spans = vec![
        Span::styled(
            " TEMPLE RUN ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(
            format!(" ⏱️  {}:{:02} ", secs / 60, secs % 60),
            Style::default().fg(time_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!(" 🏅 Pendants: {} ", app.engine.player().pendants),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format!(" 📍 {} ", app.engine.current_room().name),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        ),
    ];
    if app.engine.player().has_artifact {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!(" 👑 {} ", app.artifact),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }

    let status = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(status, area);
}

fn draw_temple(f: &mut Frame, app: &App, area: Rect) {
    let choices = app.engine.choices();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(choices.len() as u16 + 2),
            Constraint::Length(3),
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[0]);

    // Room: picture (if any) above the description
    let room = app.engine.current_room();
    let mut text: Vec<Line> = Vec::new();
    if let Some((_, Some(art))) = &app.image {
        text.extend(art.lines().map(|l| Line::from(l.to_string())));
        text.push(Line::default());
    }
    text.push(Line::from(room.description.as_str()));
    let room_panel = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", room.name.to_uppercase()))
                .border_style(Style::default().fg(Color::Magenta)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(room_panel, body[0]);

    // Keep the newest narration in view
    let visible = body[1].height.saturating_sub(2) as usize;
    let start = app.narration.len().saturating_sub(visible);
    let narration = Paragraph::new(app.narration[start..].to_vec())
        .block(Block::default().borders(Borders::ALL).title(" Olmec "))
        .wrap(Wrap { trim: false });
    f.render_widget(narration, body[1]);

    let menu: Vec<Line> = choices
        .iter()
        .map(|c| {
            if c.key == "b" {
                return Line::from(format!("  B. {}", c.label));
            }
            let marker = if c.artifact_ahead {
                " 👑"
            } else if c.visited {
                " ✓"
            } else {
                ""
            };
            Line::from(format!(
                "  {}. {} → [{}{}]",
                c.key, c.label, c.destination_name, marker
            ))
        })
        .collect();
    let menu = Paragraph::new(menu).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Available actions ")
            .border_style(Style::default().fg(Color::Green)),
    );
    f.render_widget(menu, chunks[1]);

    let mut input = app.input.clone();
    input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} [Esc: give up] ", app.message))
            .border_style(app.message_style),
    );
    f.render_widget(&input, chunks[2]);
}

fn draw_report(f: &mut Frame, app: &App, area: Rect) {
    let scroll_keys = if cfg!(target_os = "macos") {
        "Fn+Up/Down"
    } else {
        "PgUp/PgDn"
    };
    let report = Paragraph::new(app.report.clone())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Game over [{} to scroll, any other key to exit] ", scroll_keys)),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.report_scroll, 0));
    f.render_widget(report, area);
}
