//! Terminal UI for hrm using ratatui
//!
//! A single window with a search box, the people list, sort buttons and
//! modal prompts. Key presses become [`Action`]s for [`App`]; the outcome is
//! shown in a modal message box.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

use crate::app::{Action, App, Outcome, PersonForm, ViewQuery};
use crate::models::{DisplayFont, Position, SortKey};

const ADD_PERSON_PROMPTS: [&str; 5] = [
    "Enter username:",
    "Enter age:",
    "Enter position:",
    "Enter email:",
    "Enter phone:",
];

/// What currently has keyboard focus
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    EditSearch,
    AddPerson { step: usize, form: PersonForm },
    AddNote,
    Message { title: String, body: String, error: bool },
}

/// Main TUI application state
pub struct Shell {
    app: App,
    list_state: ListState,
    mode: Mode,
    search_input: String,
    prompt_input: String,
    should_quit: bool,
}

impl Shell {
    /// Create the shell and load the initial name-sorted list
    pub fn new(mut app: App) -> Result<Self> {
        app.refresh()?;
        Ok(Self {
            app,
            list_state: ListState::default(),
            mode: Mode::Browse,
            search_input: String::new(),
            prompt_input: String::new(),
            should_quit: false,
        })
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn into_app(self) -> App {
        self.app
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        // Once raw mode is on, every exit path goes through restore_terminal
        restoring(
            || {
                let mut stdout = io::stdout();
                execute!(stdout, EnterAlternateScreen)?;
                let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
                self.run_app(&mut terminal)?;
                terminal.show_cursor()?;
                Ok(())
            },
            restore_terminal,
        )
    }

    /// Main event loop
    fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        info!("event=shell_start module=tui rows={}", self.app.people().len());
        loop {
            terminal.draw(|f| self.ui(f))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }
        info!("event=shell_stop module=tui");
        Ok(())
    }

    /// React to one key press
    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.mode.clone() {
            Mode::Message { .. } => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.mode = Mode::Browse;
                }
            }
            Mode::EditSearch => match key.code {
                KeyCode::Enter => {
                    self.mode = Mode::Browse;
                    self.apply(Action::Search(self.search_input.clone()));
                }
                KeyCode::Esc => self.mode = Mode::Browse,
                KeyCode::Backspace => {
                    self.search_input.pop();
                }
                KeyCode::Char(c) => self.search_input.push(c),
                _ => {}
            },
            Mode::AddPerson { step, mut form } => match key.code {
                KeyCode::Enter => {
                    let value = std::mem::take(&mut self.prompt_input);
                    *form_field(&mut form, step) = Some(value);
                    if step + 1 < ADD_PERSON_PROMPTS.len() {
                        self.mode = Mode::AddPerson {
                            step: step + 1,
                            form,
                        };
                    } else {
                        self.mode = Mode::Browse;
                        self.apply(Action::AddPerson(form));
                    }
                }
                KeyCode::Esc => {
                    // Remaining fields stay None, so the flow is rejected.
                    self.prompt_input.clear();
                    self.mode = Mode::Browse;
                    self.apply(Action::AddPerson(form));
                }
                KeyCode::Backspace => {
                    self.prompt_input.pop();
                }
                KeyCode::Char(c) => self.prompt_input.push(c),
                _ => {}
            },
            Mode::AddNote => match key.code {
                KeyCode::Enter => {
                    let text = std::mem::take(&mut self.prompt_input);
                    self.mode = Mode::Browse;
                    self.apply(Action::AddNote(Some(text)));
                }
                KeyCode::Esc => {
                    self.prompt_input.clear();
                    self.mode = Mode::Browse;
                    self.apply(Action::AddNote(None));
                }
                KeyCode::Backspace => {
                    self.prompt_input.pop();
                }
                KeyCode::Char(c) => self.prompt_input.push(c),
                _ => {}
            },
            Mode::Browse => self.handle_browse_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.next_person(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_person(),
            KeyCode::Char('/') => self.mode = Mode::EditSearch,
            KeyCode::Char('1') => self.apply(Action::Sort(SortKey::Name)),
            KeyCode::Char('2') => self.apply(Action::Sort(SortKey::Age)),
            KeyCode::Char('3') => self.apply(Action::Sort(SortKey::Position)),
            KeyCode::Char('a') => {
                self.prompt_input.clear();
                self.mode = Mode::AddPerson {
                    step: 0,
                    form: PersonForm::default(),
                };
            }
            KeyCode::Char('v') | KeyCode::Enter => self.apply(Action::ViewInfo),
            KeyCode::Char('d') => self.apply(Action::DeletePerson),
            KeyCode::Char('n') => {
                // Selection is checked before prompting, like the other flows.
                if self.app.selected().is_none() {
                    self.apply(Action::AddNote(None));
                } else {
                    self.prompt_input.clear();
                    self.mode = Mode::AddNote;
                }
            }
            KeyCode::Char('f') => {
                let next = self.app.font().next();
                self.apply(Action::ChangeFont(next));
            }
            _ => {}
        }
    }

    /// Dispatch an action and turn its result into the next mode
    fn apply(&mut self, action: Action) {
        match self.app.dispatch(action) {
            Ok(Outcome::Info(body)) => {
                self.mode = Mode::Message {
                    title: "Info".to_string(),
                    body,
                    error: false,
                };
            }
            Ok(Outcome::Detail(body)) => {
                self.mode = Mode::Message {
                    title: "User Info".to_string(),
                    body,
                    error: false,
                };
            }
            Ok(Outcome::Refreshed) | Ok(Outcome::Nothing) => {}
            Err(e) => {
                warn!("event=action_failed module=tui error={}", e);
                self.mode = Mode::Message {
                    title: "Error".to_string(),
                    body: e.to_string(),
                    error: true,
                };
            }
        }
        self.list_state.select(self.app.selected());
    }

    /// Navigate to next person
    fn next_person(&mut self) {
        let len = self.app.people().len();
        if len == 0 {
            return;
        }
        let i = match self.app.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.apply(Action::Select(Some(i)));
    }

    /// Navigate to previous person
    fn previous_person(&mut self) {
        let len = self.app.people().len();
        if len == 0 {
            return;
        }
        let i = match self.app.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.apply(Action::Select(Some(i)));
    }

    /// Draw the UI
    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search + font
                Constraint::Min(0),    // List
                Constraint::Length(3), // Sort buttons
                Constraint::Length(3), // Footer
            ])
            .split(f.area());

        self.render_search_bar(f, chunks[0]);
        self.render_person_list(f, chunks[1]);
        self.render_sort_bar(f, chunks[2]);
        self.render_footer(f, chunks[3]);

        match &self.mode {
            Mode::AddPerson { step, .. } => {
                let mut prompt = ADD_PERSON_PROMPTS[*step].to_string();
                if *step == 2 {
                    let ladder: Vec<&str> = Position::ALL.iter().map(|p| p.title()).collect();
                    prompt.push_str(&format!("\n({})", ladder.join(" < ")));
                }
                self.render_prompt(f, "Add User", &prompt);
            }
            Mode::AddNote => self.render_prompt(f, "Add Note", "Enter note content:"),
            Mode::Message { title, body, error } => {
                render_message(f, title, body, *error, self.typeface())
            }
            Mode::Browse | Mode::EditSearch => {}
        }
    }

    fn typeface(&self) -> Style {
        typeface(self.app.font())
    }

    fn render_search_bar(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(24)])
            .split(area);

        let editing = self.mode == Mode::EditSearch;
        let cursor = if editing { "_" } else { "" };
        let search = Paragraph::new(Line::from(vec![
            Span::styled("Search User: ", self.typeface()),
            Span::raw(format!("{}{}", self.search_input, cursor)),
        ]))
        .block(Block::default().borders(Borders::ALL).border_style(
            if editing {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            },
        ));
        f.render_widget(search, chunks[0]);

        let font = Paragraph::new(self.app.font().to_string())
            .style(self.typeface())
            .block(Block::default().borders(Borders::ALL).title("Font"));
        f.render_widget(font, chunks[1]);
    }

    fn render_person_list(&mut self, f: &mut Frame, area: Rect) {
        let title = match self.app.query() {
            ViewQuery::Sorted(key) => format!("Users by {} ({})", key, self.app.people().len()),
            ViewQuery::Search(text) => {
                format!("Users matching '{}' ({})", text, self.app.people().len())
            }
        };

        let items: Vec<ListItem> = self.app.rows().into_iter().map(ListItem::new).collect();
        let list = List::new(items)
            .style(self.typeface())
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD))
            .highlight_symbol(">> ");

        self.list_state.select(self.app.selected());
        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_sort_bar(&self, f: &mut Frame, area: Rect) {
        let active = match self.app.query() {
            ViewQuery::Sorted(key) => Some(*key),
            ViewQuery::Search(_) => None,
        };
        let buttons = [
            ("1", "Sort by Name", SortKey::Name),
            ("2", "Sort by Age", SortKey::Age),
            ("3", "Sort by Position", SortKey::Position),
        ];

        let mut spans = Vec::new();
        for (hotkey, label, key) in buttons {
            let style = if active == Some(key) {
                self.typeface().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                self.typeface()
            };
            spans.push(Span::styled(format!(" [{}] {} ", hotkey, label), style));
        }

        let bar = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        f.render_widget(bar, area);
    }

    /// Render footer with keybindings
    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let text = match self.mode {
            Mode::EditSearch => "  Type to search  Enter: Search  Esc: Back",
            _ => "  a: Add User  v: View Info  n: Add Note  d: Delete User  /: Search  f: Font  q: Quit",
        };
        let footer = Paragraph::new(text)
            .style(self.typeface().fg(Color::White).bg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(footer, area);
    }

    fn render_prompt(&self, f: &mut Frame, title: &str, prompt: &str) {
        let area = centered_rect(60, 40, f.area());
        f.render_widget(Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        let label = Paragraph::new(prompt.to_string())
            .style(self.typeface())
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: true });
        f.render_widget(label, chunks[0]);

        let input = Paragraph::new(format!("{}_", self.prompt_input))
            .style(Style::default().fg(Color::Yellow))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Enter: OK  Esc: Cancel"),
            );
        f.render_widget(input, chunks[1]);
    }
}

/// Run `body`, then `restore` whether or not `body` failed. The body's
/// error wins when both fail.
fn restoring<T>(
    body: impl FnOnce() -> Result<T>,
    restore: impl FnOnce() -> Result<()>,
) -> Result<T> {
    let result = body();
    let restored = restore();
    if let Err(e) = &restored {
        warn!("event=terminal_restore module=tui status=error error={}", e);
    }
    let value = result?;
    restored?;
    Ok(value)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Map a font menu entry onto the closest terminal text style
fn typeface(font: DisplayFont) -> Style {
    match font {
        DisplayFont::Arial => Style::default(),
        DisplayFont::TimesNewRoman => Style::default().add_modifier(Modifier::ITALIC),
        DisplayFont::Helvetica => Style::default().add_modifier(Modifier::BOLD),
        DisplayFont::Courier => Style::default().add_modifier(Modifier::DIM),
    }
}

/// Modal info/error box
fn render_message(f: &mut Frame, title: &str, body: &str, error: bool, typeface: Style) {
    let area = centered_rect(60, 40, f.area());
    f.render_widget(Clear, area);

    let color = if error { Color::Red } else { Color::Green };
    let paragraph = Paragraph::new(format!("{}\n\n(Enter to close)", body))
        .style(typeface.fg(color))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn form_field(form: &mut PersonForm, step: usize) -> &mut Option<String> {
    match step {
        0 => &mut form.name,
        1 => &mut form.age,
        2 => &mut form.position,
        3 => &mut form.email,
        _ => &mut form.phone,
    }
}

/// Helper function to create a centered rect
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Note;
    use ratatui::backend::TestBackend;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn shell() -> Shell {
        Shell::new(App::new(Database::open_in_memory().unwrap())).unwrap()
    }

    fn press(shell: &mut Shell, code: KeyCode) {
        shell.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(shell: &mut Shell, text: &str) {
        for c in text.chars() {
            press(shell, KeyCode::Char(c));
        }
    }

    fn add_person(shell: &mut Shell, fields: [&str; 5]) {
        press(shell, KeyCode::Char('a'));
        for field in fields {
            type_text(shell, field);
            press(shell, KeyCode::Enter);
        }
    }

    fn screen_lines(shell: &mut Shell) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| shell.ui(f)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    #[test]
    fn test_add_person_through_prompts() {
        let mut shell = shell();
        add_person(&mut shell, ["Kim", "29", "CEO", "kim@x.com", "010-1111-2222"]);

        assert_eq!(
            shell.mode,
            Mode::Message {
                title: "Info".to_string(),
                body: "User added successfully!".to_string(),
                error: false,
            }
        );
        press(&mut shell, KeyCode::Enter);
        assert_eq!(shell.mode, Mode::Browse);
        assert_eq!(shell.app().rows(), vec!["Kim - CEO - 29"]);
    }

    #[test]
    fn test_cancelled_prompt_stores_nothing() {
        let mut shell = shell();
        press(&mut shell, KeyCode::Char('a'));
        type_text(&mut shell, "Kim");
        press(&mut shell, KeyCode::Enter);
        press(&mut shell, KeyCode::Esc);

        match &shell.mode {
            Mode::Message { title, error, .. } => {
                assert_eq!(title, "Error");
                assert!(*error);
            }
            other => panic!("expected error message, got {:?}", other),
        }
        assert_eq!(shell.app().database().count_people().unwrap(), 0);
    }

    #[test]
    fn test_view_without_selection_shows_error() {
        let mut shell = shell();
        press(&mut shell, KeyCode::Char('v'));
        assert_eq!(
            shell.mode,
            Mode::Message {
                title: "Error".to_string(),
                body: "Please select a user from the list".to_string(),
                error: true,
            }
        );
    }

    #[test]
    fn test_search_box_filters_list() {
        let mut shell = shell();
        add_person(&mut shell, ["Kim", "29", "CEO", "", ""]);
        press(&mut shell, KeyCode::Enter);
        add_person(&mut shell, ["Lee", "45", "CTO", "", ""]);
        press(&mut shell, KeyCode::Enter);

        press(&mut shell, KeyCode::Char('/'));
        type_text(&mut shell, "Le");
        press(&mut shell, KeyCode::Enter);

        assert_eq!(shell.mode, Mode::Browse);
        assert_eq!(shell.app().rows(), vec!["Lee - CTO - 45"]);
    }

    #[test]
    fn test_navigation_wraps_and_note_prompt_opens() {
        let mut shell = shell();
        add_person(&mut shell, ["Kim", "29", "CEO", "", ""]);
        press(&mut shell, KeyCode::Enter);

        press(&mut shell, KeyCode::Down);
        assert_eq!(shell.app().selected(), Some(0));
        press(&mut shell, KeyCode::Down);
        assert_eq!(shell.app().selected(), Some(0));

        press(&mut shell, KeyCode::Char('n'));
        assert_eq!(shell.mode, Mode::AddNote);
        type_text(&mut shell, "hello");
        press(&mut shell, KeyCode::Enter);

        let id = shell.app().ids()[0];
        assert_eq!(
            shell.app().database().list_notes(id).unwrap(),
            vec![Note::new(id, "hello")]
        );
    }

    #[test]
    fn test_delete_twice_needs_a_new_pick() {
        let mut shell = shell();
        add_person(&mut shell, ["Kim", "29", "CEO", "", ""]);
        press(&mut shell, KeyCode::Enter);
        add_person(&mut shell, ["Lee", "45", "CTO", "", ""]);
        press(&mut shell, KeyCode::Enter);

        press(&mut shell, KeyCode::Down);
        press(&mut shell, KeyCode::Char('d'));
        press(&mut shell, KeyCode::Enter);
        assert_eq!(shell.list_state.selected(), None);

        press(&mut shell, KeyCode::Char('d'));
        assert_eq!(
            shell.mode,
            Mode::Message {
                title: "Error".to_string(),
                body: "Please select a user from the list".to_string(),
                error: true,
            }
        );
        assert_eq!(shell.app().rows(), vec!["Lee - CTO - 45"]);
    }

    #[test]
    fn test_storage_failure_shows_error_box() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("users.db");
        let mut shell = Shell::new(App::new(Database::open(&path).unwrap())).unwrap();
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute("DROP TABLE users", [])
            .unwrap();

        add_person(&mut shell, ["Kim", "29", "CEO", "", ""]);

        match &shell.mode {
            Mode::Message { title, body, error } => {
                assert_eq!(title, "Error");
                assert!(*error);
                assert!(body.contains("no such table"));
            }
            other => panic!("expected error message, got {:?}", other),
        }
        assert!(!shell.should_quit);
    }

    #[test]
    fn test_restore_runs_when_body_fails() {
        let restored = Cell::new(false);
        let result: Result<()> = restoring(
            || Err(anyhow::anyhow!("alternate screen unavailable")),
            || {
                restored.set(true);
                Ok(())
            },
        );
        assert!(restored.get());
        assert_eq!(result.unwrap_err().to_string(), "alternate screen unavailable");
    }

    #[test]
    fn test_restore_failure_surfaces_after_clean_body() {
        let result = restoring(|| Ok(5), || Err(anyhow::anyhow!("tty gone")));
        assert_eq!(result.unwrap_err().to_string(), "tty gone");

        let result = restoring(
            || Err::<(), _>(anyhow::anyhow!("draw failed")),
            || Err(anyhow::anyhow!("tty gone")),
        );
        assert_eq!(result.unwrap_err().to_string(), "draw failed");
    }

    #[test]
    fn test_render_shows_rows_and_font() {
        let mut shell = shell();
        add_person(&mut shell, ["Kim", "29", "CEO", "kim@x.com", "010"]);
        press(&mut shell, KeyCode::Enter);
        press(&mut shell, KeyCode::Char('f'));

        let lines = screen_lines(&mut shell);
        assert!(lines.iter().any(|l| l.contains("Kim - CEO - 29")));
        assert!(!lines.iter().any(|l| l.contains("kim@x.com")));
        assert!(lines.iter().any(|l| l.contains("Times New Roman")));
        assert!(lines.iter().any(|l| l.contains("Sort by Position")));
    }

    #[test]
    fn test_ctrl_c_quits_from_any_mode() {
        let mut shell = shell();
        press(&mut shell, KeyCode::Char('a'));
        shell.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(shell.should_quit);
    }
}
