mod keys;

use anyhow::Result;
use baukasten_editor_config::{Config, DecoratorConfig, SuggestionConfig, TriggerConfig};
use baukasten_editor_engine::editing::{
    Cmd, Editor, EditorEvent, Patch, RenderLine, RunKind, Snapshot,
};
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange,
        Event, KeyEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
    str::FromStr,
};

struct App {
    editor: Editor,
    segments_json: String,
    submitted: Vec<String>,
}

impl App {
    fn new(config: &Config) -> Result<Self> {
        let mut editor = Editor::new(config.to_options()?);
        editor.focus();
        let mut app = Self {
            editor,
            segments_json: String::new(),
            submitted: Vec::new(),
        };
        app.refresh_segments()?;
        Ok(app)
    }

    fn handle(&mut self, patch: Patch) -> Result<()> {
        for event in patch.events {
            match event {
                EditorEvent::Change(change) => {
                    self.segments_json = serde_json::to_string(&change.segments)?;
                }
                EditorEvent::Submit(content) => {
                    log::info!("submitted {:?}", content.text);
                    self.submitted.push(content.text);
                    self.editor.apply(Cmd::SetValue {
                        text: String::new(),
                    });
                    self.refresh_segments()?;
                }
            }
        }
        Ok(())
    }

    fn refresh_segments(&mut self) -> Result<()> {
        self.segments_json = serde_json::to_string(&self.editor.segments())?;
        Ok(())
    }
}

fn demo_config() -> Config {
    let people = [("Alice", "U01"), ("Alan", "U02"), ("Bob", "U03"), ("Carol", "U04")]
        .into_iter()
        .map(|(label, id)| SuggestionConfig::new(label).with_data(format!(r#"{{"id": "{id}"}}"#)))
        .collect();

    Config {
        placeholder: Some("Type a message, @ to mention, # for a channel".to_string()),
        triggers: vec![
            TriggerConfig {
                trigger: "@".to_string(),
                serialize_field: Some("id".to_string()),
                suggestions: people,
            },
            TriggerConfig {
                trigger: "#".to_string(),
                serialize_field: None,
                suggestions: vec![
                    SuggestionConfig::new("general"),
                    SuggestionConfig::new("random"),
                    SuggestionConfig::new("archived").disabled(),
                ],
            },
        ],
        decorators: vec![
            DecoratorConfig {
                pattern: r"https?://\S+".to_string(),
                class: "link".to_string(),
                style: Some("blue".to_string()),
            },
            DecoratorConfig {
                pattern: r"\*\*[^*]+\*\*".to_string(),
                class: "bold".to_string(),
                style: None,
            },
        ],
        ..Default::default()
    }
}

fn init_logging() {
    // The terminal belongs to the UI, so logs go to a file when enabled.
    if env::var_os("RUST_LOG").is_none() {
        return;
    }
    let path = env::temp_dir().join("baukasten-editor.log");
    match std::fs::File::create(&path) {
        Ok(file) => env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init(),
        Err(e) => eprintln!("Warning: cannot open log file {}: {e}", path.display()),
    }
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let config = if args.len() == 2 {
        let config_path = PathBuf::from(&args[1]);
        match Config::load_from_path(&config_path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                eprintln!("Error: No config file at '{}'", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => config,
            Ok(None) => {
                log::info!(
                    "no config at {}, using the demo setup",
                    Config::config_path().display()
                );
                demo_config()
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [config.toml]", args[0]);
        process::exit(1);
    };

    let mut app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: Invalid configuration: {e}");
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    for message in &app.submitted {
        println!("{message}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if keys::is_quit(&key) {
                    return Ok(());
                }
                if let Some(input) = keys::to_key_input(&key) {
                    let patch = app.editor.handle_key(input);
                    app.handle(patch)?;
                }
            }
            Event::Paste(text) => {
                let patch = app.editor.apply(Cmd::Paste { text });
                app.handle(patch)?;
            }
            other => {
                let patch = match keys::focus_change(&other) {
                    Some(true) => app.editor.focus(),
                    Some(false) => app.editor.blur(false),
                    None => continue,
                };
                app.handle(patch)?;
            }
        }
    }
}

fn run_style(kind: &RunKind) -> Style {
    match kind {
        RunKind::Plain => Style::default(),
        RunKind::Mention { .. } => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        RunKind::Decorated { style, .. } => style
            .as_deref()
            .and_then(|s| Color::from_str(s).ok())
            .map(|c| Style::default().fg(c))
            .unwrap_or_else(|| Style::default().add_modifier(Modifier::UNDERLINED)),
    }
}

fn render_line(line: &RenderLine) -> Line<'static> {
    Line::from(
        line.runs
            .iter()
            .map(|run| Span::styled(run.text.clone(), run_style(&run.kind)))
            .collect::<Vec<_>>(),
    )
}

fn ui(f: &mut Frame, app: &mut App) {
    let snapshot = app.editor.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Min(5),
                Constraint::Length(5),
                Constraint::Length(6),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    // Editor panel
    let title = match (snapshot.disabled, snapshot.read_only) {
        (true, _) => "Message (disabled)",
        (false, true) => "Message (read-only)",
        _ => "Message",
    };
    let editor_block = Block::default().borders(Borders::ALL).title(title);
    let inner = editor_block.inner(chunks[0]);

    let text: Vec<Line> = match &snapshot.placeholder {
        Some(placeholder) => vec![Line::from(Span::styled(
            placeholder.clone(),
            Style::default().fg(Color::DarkGray),
        ))],
        None => snapshot.lines.iter().map(render_line).collect(),
    };
    f.render_widget(Paragraph::new(text).block(editor_block), chunks[0]);

    if let Some(caret) = snapshot.caret {
        let x = inner.x + (caret.column as u16).min(inner.width.saturating_sub(1));
        let y = inner.y + (caret.line as u16).min(inner.height.saturating_sub(1));
        f.set_cursor_position((x, y));
        render_menu(f, &snapshot, Rect::new(x, y + 1, 0, 0));
    }

    // Serialized segments
    let segments = Paragraph::new(app.segments_json.clone())
        .block(Block::default().borders(Borders::ALL).title("Segments"))
        .wrap(Wrap { trim: false });
    f.render_widget(segments, chunks[1]);

    // Submitted messages
    let history: Vec<ListItem> = app
        .submitted
        .iter()
        .rev()
        .map(|m| ListItem::new(Line::from(m.clone())))
        .collect();
    let history = List::new(history).block(Block::default().borders(Borders::ALL).title("Sent"));
    f.render_widget(history, chunks[2]);

    // Instructions
    let help_text = Line::from(vec![
        Span::raw("Ctrl+Q: Quit | "),
        Span::raw("Enter: Send | "),
        Span::raw("Shift+Enter: New line | "),
        Span::raw("↑/↓ Enter/Tab Esc: Suggestions"),
    ]);
    f.render_widget(Paragraph::new(vec![help_text]), chunks[3]);
}

fn render_menu(f: &mut Frame, snapshot: &Snapshot, anchor: Rect) {
    let Some(menu) = &snapshot.menu else {
        return;
    };
    let area = f.area();
    let width = menu
        .items
        .iter()
        .map(|item| item.text.chars().count())
        .max()
        .unwrap_or(0) as u16
        + 4;
    let height = menu.items.len() as u16 + 2;
    let popup = Rect::new(
        anchor.x.min(area.width.saturating_sub(width)),
        anchor.y.min(area.height.saturating_sub(height)),
        width.min(area.width),
        height.min(area.height),
    );

    let items: Vec<ListItem> = menu
        .items
        .iter()
        .map(|item| {
            let style = match (item.highlighted, item.disabled) {
                (true, _) => Style::default().bg(Color::Yellow).fg(Color::Black),
                (false, true) => Style::default().fg(Color::DarkGray),
                (false, false) => Style::default(),
            };
            ListItem::new(Line::from(Span::styled(format!(" {}", item.text), style)))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{}{}", menu.trigger, menu.query)),
    );
    f.render_widget(Clear, popup);
    f.render_widget(list, popup);
}
