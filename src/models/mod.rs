//! Data models for hrm
//!
//! Person and Note rows as stored in SQLite, plus the rank ladder used for
//! position ordering.

use serde::{Deserialize, Serialize};

/// A personnel record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub position: String,
    pub email: String,
    pub phone: String,
}

impl Person {
    /// Summary row shown in the list. Email and phone only appear in the
    /// detail view.
    pub fn list_row(&self) -> String {
        format!("{} - {} - {}", self.name, self.position, self.age)
    }

    /// Rank of this person's position on the ladder, `None` when the title
    /// is not on it.
    pub fn rank(&self) -> Option<usize> {
        self.position.parse::<Position>().ok().map(|p| p.rank())
    }
}

/// Field values for a person that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub age: i64,
    pub position: String,
    pub email: String,
    pub phone: String,
}

/// A free-text note attached to a person by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub user_id: i64,
    pub content: String,
}

impl Note {
    pub fn new(user_id: i64, content: &str) -> Self {
        Self {
            user_id,
            content: content.to_string(),
        }
    }
}

/// Workplace rank ladder, lowest to highest seniority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    Intern,
    Staff,
    SeniorStaff,
    AssistantManager,
    Manager,
    DeputyGeneralManager,
    GeneralManager,
    Director,
    ManagingDirector,
    SeniorManagingDirector,
    VicePresident,
    President,
}

impl Position {
    /// Every position in ladder order
    pub const ALL: [Position; 12] = [
        Position::Intern,
        Position::Staff,
        Position::SeniorStaff,
        Position::AssistantManager,
        Position::Manager,
        Position::DeputyGeneralManager,
        Position::GeneralManager,
        Position::Director,
        Position::ManagingDirector,
        Position::SeniorManagingDirector,
        Position::VicePresident,
        Position::President,
    ];

    /// Stored title
    pub fn title(&self) -> &'static str {
        match self {
            Position::Intern => "인턴",
            Position::Staff => "사원",
            Position::SeniorStaff => "주임",
            Position::AssistantManager => "대리",
            Position::Manager => "과장",
            Position::DeputyGeneralManager => "차장",
            Position::GeneralManager => "부장",
            Position::Director => "이사",
            Position::ManagingDirector => "상무",
            Position::SeniorManagingDirector => "전무",
            Position::VicePresident => "부사장",
            Position::President => "사장",
        }
    }

    /// Zero-based index on the ladder
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::ALL
            .iter()
            .copied()
            .find(|p| p.title() == s)
            .ok_or_else(|| format!("Unknown position: {}", s))
    }
}

/// Ordering applied by `Database::list_people`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Age,
    Position,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Name => write!(f, "name"),
            SortKey::Age => write!(f, "age"),
            SortKey::Position => write!(f, "position"),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" | "username" => Ok(SortKey::Name),
            "age" => Ok(SortKey::Age),
            "position" => Ok(SortKey::Position),
            _ => Err(format!("Invalid sort key: {}. Use: name, age, position", s)),
        }
    }
}

/// Typeface choices offered by the font menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayFont {
    #[default]
    Arial,
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    Helvetica,
    Courier,
}

impl DisplayFont {
    pub const ALL: [DisplayFont; 4] = [
        DisplayFont::Arial,
        DisplayFont::TimesNewRoman,
        DisplayFont::Helvetica,
        DisplayFont::Courier,
    ];

    /// Next entry in the menu, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for DisplayFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayFont::Arial => write!(f, "Arial"),
            DisplayFont::TimesNewRoman => write!(f, "Times New Roman"),
            DisplayFont::Helvetica => write!(f, "Helvetica"),
            DisplayFont::Courier => write!(f, "Courier"),
        }
    }
}

impl std::str::FromStr for DisplayFont {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayFont::ALL
            .iter()
            .copied()
            .find(|f| f.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Invalid font: {}. Use: Arial, Times New Roman, Helvetica, Courier",
                    s
                )
            })
    }
}
