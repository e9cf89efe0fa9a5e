//! Application state and action handlers
//!
//! `App` owns the database and the state of the visible list. The terminal
//! shell turns key presses into [`Action`]s and hands them to
//! [`App::dispatch`]; everything that touches data lives here so it can be
//! driven without a terminal.

use log::{debug, warn};

use crate::db::{Database, StorageError};
use crate::models::{DisplayFont, NewPerson, Note, Person, SortKey};

/// Lifecycle of the visible list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading,
    Rendered,
}

/// Query that produced the visible list, re-run after every mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewQuery {
    Sorted(SortKey),
    Search(String),
}

impl Default for ViewQuery {
    fn default() -> Self {
        ViewQuery::Sorted(SortKey::Name)
    }
}

/// Values collected by the add-person prompts. `None` marks a prompt that
/// was dismissed without input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonForm {
    pub name: Option<String>,
    pub age: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl PersonForm {
    /// Form with every prompt answered
    pub fn filled(name: &str, age: &str, position: &str, email: &str, phone: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            age: Some(age.to_string()),
            position: Some(position.to_string()),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
        }
    }

    fn into_new_person(self) -> Result<NewPerson, AppError> {
        let (Some(name), Some(age), Some(position), Some(email), Some(phone)) =
            (self.name, self.age, self.position, self.email, self.phone)
        else {
            return Err(AppError::InputCancelled);
        };
        let age = age
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::InvalidAge(age.clone()))?;

        Ok(NewPerson {
            name,
            age,
            position,
            email,
            phone,
        })
    }
}

/// User-triggered actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddPerson(PersonForm),
    ViewInfo,
    DeletePerson,
    /// Note text from the prompt, `None` if it was cancelled
    AddNote(Option<String>),
    Search(String),
    Sort(SortKey),
    ChangeFont(DisplayFont),
    Select(Option<usize>),
}

/// What the shell should show after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Confirmation message
    Info(String),
    /// Read-only person summary
    Detail(String),
    /// The list changed, nothing else to report
    Refreshed,
    Nothing,
}

/// Errors surfaced to the user at the end of a flow
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Please select a user from the list")]
    SelectionRequired,

    #[error("Input cancelled; nothing was saved")]
    InputCancelled,

    #[error("Age must be a whole number, got '{0}'")]
    InvalidAge(String),

    #[error("User {0} no longer exists")]
    PersonNotFound(i64),

    /// The change was written but re-running the list query failed
    #[error("{done}, but the list could not be reloaded: {source}")]
    RefreshFailed {
        done: &'static str,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Application state held by the shell
pub struct App {
    db: Database,
    people: Vec<Person>,
    ids: Vec<i64>,
    query: ViewQuery,
    selected: Option<usize>,
    state: ViewState,
    font: DisplayFont,
}

impl App {
    /// Wrap an open database. The list stays empty until [`App::refresh`].
    pub fn new(db: Database) -> Self {
        Self {
            db,
            people: Vec::new(),
            ids: Vec::new(),
            query: ViewQuery::default(),
            selected: None,
            state: ViewState::Idle,
            font: DisplayFont::default(),
        }
    }

    pub fn with_font(mut self, font: DisplayFont) -> Self {
        self.font = font;
        self
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// Person ids, parallel to [`App::people`]
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Display rows for the visible list
    pub fn rows(&self) -> Vec<String> {
        self.people.iter().map(Person::list_row).collect()
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn font(&self) -> DisplayFont {
        self.font
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Give the database back, e.g. to close it on shutdown
    pub fn into_database(self) -> Database {
        self.db
    }

    /// Re-run the current view query and rebuild the id list. The selection
    /// is cleared, since row positions no longer name the same people.
    pub fn refresh(&mut self) -> Result<(), StorageError> {
        self.state = ViewState::Loading;
        self.selected = None;
        let people = match &self.query {
            ViewQuery::Sorted(key) => self.db.list_people(*key),
            ViewQuery::Search(text) => self.db.search_people(text),
        };
        let people = match people {
            Ok(people) => people,
            Err(e) => {
                self.state = ViewState::Idle;
                return Err(e);
            }
        };

        self.ids = people.iter().map(|p| p.id).collect();
        self.people = people;
        self.state = ViewState::Rendered;
        debug!(
            "event=view_refresh module=app query={:?} rows={}",
            self.query,
            self.people.len()
        );
        Ok(())
    }

    /// Run one user action
    pub fn dispatch(&mut self, action: Action) -> Result<Outcome, AppError> {
        debug!("event=dispatch module=app action={:?}", action);
        match action {
            Action::AddPerson(form) => self.add_person(form),
            Action::ViewInfo => self.view_info(),
            Action::DeletePerson => self.delete_person(),
            Action::AddNote(content) => self.add_note(content),
            Action::Search(text) => self.load(ViewQuery::Search(text)),
            Action::Sort(key) => self.load(ViewQuery::Sorted(key)),
            Action::ChangeFont(font) => {
                self.font = font;
                Ok(Outcome::Nothing)
            }
            Action::Select(index) => {
                self.selected = index.filter(|i| *i < self.people.len());
                Ok(Outcome::Nothing)
            }
        }
    }

    fn selected_id(&self) -> Result<i64, AppError> {
        self.selected
            .and_then(|i| self.ids.get(i).copied())
            .ok_or(AppError::SelectionRequired)
    }

    fn load(&mut self, query: ViewQuery) -> Result<Outcome, AppError> {
        self.query = query;
        self.refresh()?;
        Ok(Outcome::Refreshed)
    }

    fn add_person(&mut self, form: PersonForm) -> Result<Outcome, AppError> {
        let person = form.into_new_person()?;
        let id = self.db.add_person(&person)?;
        self.refresh_after("User added", id)?;
        Ok(Outcome::Info("User added successfully!".to_string()))
    }

    fn view_info(&self) -> Result<Outcome, AppError> {
        let id = self.selected_id()?;
        let person = self
            .db
            .get_person(id)?
            .ok_or(AppError::PersonNotFound(id))?;
        let notes = self.db.list_notes(id)?;
        Ok(Outcome::Detail(format_detail(&person, &notes)))
    }

    fn delete_person(&mut self) -> Result<Outcome, AppError> {
        let id = self.selected_id()?;
        self.db.delete_person(id)?;
        self.refresh_after("User deleted", id)?;
        Ok(Outcome::Info("User deleted successfully!".to_string()))
    }

    /// Refresh following a write that already succeeded
    fn refresh_after(&mut self, done: &'static str, id: i64) -> Result<(), AppError> {
        self.refresh().map_err(|source| {
            warn!(
                "event=view_refresh module=app status=error after_write=ok id={} error={}",
                id, source
            );
            AppError::RefreshFailed { done, source }
        })
    }

    fn add_note(&mut self, content: Option<String>) -> Result<Outcome, AppError> {
        let id = self.selected_id()?;
        match content {
            Some(text) if !text.is_empty() => {
                self.db.add_note(id, &text)?;
                Ok(Outcome::Info("Note added successfully!".to_string()))
            }
            _ => Ok(Outcome::Nothing),
        }
    }
}

/// Consolidated read-only summary of one person and their notes
pub fn format_detail(person: &Person, notes: &[Note]) -> String {
    let notes: Vec<&str> = notes.iter().map(|n| n.content.as_str()).collect();
    format!(
        "ID: {}, Username: {}, Age: {}, Position: {}, Email: {}, Phone: {}\nNotes:\n{}",
        person.id,
        person.name,
        person.age,
        person.position,
        person.email,
        person.phone,
        notes.join("\n")
    )
}
