use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use markdown_live_config::Config;
use markdown_live_engine::{
    Editor, EditorOptions, RawEdit,
    editing::document_len,
    io::{self, SessionState},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env,
    fs::File,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

mod render;

const LOG_ENV: &str = "MARKDOWN_LIVE_LOG";

enum Control {
    Continue,
    Quit,
}

struct App {
    editor: Editor,
    state_path: PathBuf,
    /// Fixed end of a keyboard selection while Shift is held
    anchor: Option<usize>,
    status: String,
}

impl App {
    fn new(config: &Config, state_path: PathBuf) -> Self {
        let options = EditorOptions {
            history_limit: Some(config.history_limit),
        };
        let (editor, status) = match io::load_state(&state_path) {
            Ok(Some(state)) => (
                Editor::from_state(&state, options),
                format!("Resumed {}", state_path.display()),
            ),
            Ok(None) => (Editor::welcome(), "New session".to_string()),
            Err(e) => {
                log::warn!("could not resume session: {e}");
                (Editor::welcome(), format!("Could not resume: {e}"))
            }
        };
        Self {
            editor,
            state_path,
            anchor: None,
            status,
        }
    }

    fn save(&mut self) {
        let state: SessionState = self.editor.state();
        self.status = match io::save_state(&self.state_path, &state) {
            Ok(()) => format!("Saved {}", self.state_path.display()),
            Err(e) => {
                log::error!("save failed: {e}");
                format!("Save failed: {e}")
            }
        };
    }

    fn move_caret(&mut self, offset: usize) {
        self.anchor = None;
        self.editor.set_caret_offset(offset);
    }

    fn extend_selection(&mut self, focus: usize) {
        let anchor = *self.anchor.get_or_insert(self.editor.caret_offset());
        self.editor.set_selection_offsets(anchor, focus);
        if !self.editor.is_selecting() {
            self.anchor = None;
        }
    }

    fn step(&mut self, forward: bool, extend: bool) {
        let caret = self.editor.caret_offset();
        let end = document_len(self.editor.document());
        let target = if forward {
            (caret + 1).min(end)
        } else {
            caret.saturating_sub(1)
        };
        if extend {
            self.extend_selection(target);
        } else {
            self.move_caret(target);
        }
    }

    fn edit(&mut self, edit: RawEdit) {
        self.anchor = None;
        let patch = self.editor.edit(edit);
        if let Some(transform) = patch.transform {
            self.status = format!("{transform:?}");
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Control {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => return Control::Quit,
            KeyCode::Char('q') if ctrl => return Control::Quit,
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('z') if ctrl => {
                self.anchor = None;
                if !self.editor.undo() {
                    self.status = "Nothing to undo".to_string();
                }
            }
            KeyCode::Char('y') if ctrl => {
                self.anchor = None;
                if !self.editor.redo() {
                    self.status = "Nothing to redo".to_string();
                }
            }
            KeyCode::Char(c) if !ctrl => self.edit(RawEdit::InsertText(c.to_string())),
            KeyCode::Enter if alt || shift => self.edit(RawEdit::InsertLineBreak),
            KeyCode::Enter => self.edit(RawEdit::SplitBlock),
            KeyCode::Backspace => self.edit(RawEdit::DeleteBackward),
            KeyCode::Delete => self.edit(RawEdit::DeleteForward),
            KeyCode::Tab => {
                self.anchor = None;
                self.editor.indent();
            }
            KeyCode::BackTab => {
                self.anchor = None;
                self.editor.outdent();
            }
            KeyCode::Left => self.step(false, shift),
            KeyCode::Right => self.step(true, shift),
            KeyCode::Home => {
                if shift {
                    self.extend_selection(0);
                } else {
                    self.move_caret(0);
                }
            }
            KeyCode::End => {
                let end = document_len(self.editor.document());
                if shift {
                    self.extend_selection(end);
                } else {
                    self.move_caret(end);
                }
            }
            _ => {}
        }
        Control::Continue
    }
}

fn init_logging() {
    // The terminal belongs to the editor, so logs only go to a file when asked
    let Ok(path) = env::var(LOG_ENV) else {
        return;
    };
    match File::create(&path) {
        Ok(file) => {
            env_logger::Builder::from_default_env()
                .filter_level(log::LevelFilter::Debug)
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
            log::info!("markdown-live starting up");
        }
        Err(e) => eprintln!("Warning: cannot open log file {path}: {e}"),
    }
}

fn main() -> Result<()> {
    init_logging();

    // Determine state path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let state_path = match args.len() {
        1 => config.state_path.clone(),
        2 => PathBuf::from(&args[1]),
        _ => {
            eprintln!("Usage: {} [session-file]", args[0]);
            process::exit(1);
        }
    };
    log::info!("session file: {}", state_path.display());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(&config, state_path);

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Control::Quit = app.handle_key(key)
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    // Document panel
    let editor = &app.editor;
    let rendered = render::render(
        editor.document(),
        editor.caret_offset(),
        editor.selection_offsets(),
    );
    let area = chunks[0];
    let inner_height = area.height.saturating_sub(2);
    let (cursor_col, cursor_row) = rendered.cursor;
    let scroll = cursor_row.saturating_sub(inner_height.saturating_sub(1));

    let content = Paragraph::new(rendered.lines)
        .block(Block::default().borders(Borders::ALL).title("markdown-live"))
        .scroll((scroll, 0));
    f.render_widget(content, area);
    f.set_cursor_position(Position::new(
        area.x + 1 + cursor_col,
        area.y + 1 + cursor_row - scroll,
    ));

    // Status and instructions
    let history = format!(
        "undo {} | v{}",
        editor.history().undo_len(),
        editor.version()
    );
    let status = Line::from(vec![
        Span::styled(app.status.clone(), Style::default().fg(Color::Green)),
        Span::raw(" | "),
        Span::raw(history),
    ]);
    let help_text = Line::from(vec![
        Span::raw("Esc/Ctrl+Q: Quit | "),
        Span::raw("Ctrl+S: Save | "),
        Span::raw("Ctrl+Z/Y: Undo/Redo | "),
        Span::raw("Tab/Shift+Tab: Indent | "),
        Span::raw("Alt+Enter: Line break"),
    ]);

    f.render_widget(Paragraph::new(vec![status, help_text]), chunks[1]);
}
