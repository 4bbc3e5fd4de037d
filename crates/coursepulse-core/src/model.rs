//! Core data model types for coursepulse.
//!
//! These are the records kept in the store: users, forms with their
//! questions, and submitted responses. Field names serialize in camelCase
//! so the on-disk collections keep their established shape.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default upper bound of a rating question.
pub const DEFAULT_RATING_SCALE_MAX: u8 = 5;

/// Current on-disk version of [`Response`] records.
pub const RESPONSE_SCHEMA_VERSION: u32 = 2;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Faculty => write!(f, "faculty"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "faculty" | "teacher" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A registered account. Passwords are kept in plaintext, as the
/// collection always has been.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub name: String,
    /// Lower-cased; unique across the collection.
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub register_no: String,
    #[serde(default)]
    pub department: String,
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Form identifier: the creation time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(pub u64);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FormId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(FormId)
    }
}

/// The kinds of question a form can ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Rating,
    SingleChoice,
    MultiChoice,
    Text,
}

impl QuestionKind {
    /// Whether answers pick from the question's options.
    pub fn is_choice(self) -> bool {
        matches!(self, QuestionKind::SingleChoice | QuestionKind::MultiChoice)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Rating => write!(f, "rating"),
            QuestionKind::SingleChoice => write!(f, "single_choice"),
            QuestionKind::MultiChoice => write!(f, "multi_choice"),
            QuestionKind::Text => write!(f, "text"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "rating" => Ok(QuestionKind::Rating),
            "single_choice" | "single" => Ok(QuestionKind::SingleChoice),
            "multi_choice" | "multi" => Ok(QuestionKind::MultiChoice),
            "text" => Ok(QuestionKind::Text),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// One question of a form. Its position in the form is its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(alias = "question")]
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// Only meaningful for choice questions.
    #[serde(default)]
    pub options: Vec<String>,
}

impl Question {
    pub fn new(text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            text: text.into(),
            kind,
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// A feedback form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: FormId,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default = "default_scale_max")]
    pub rating_scale_max: u8,
    #[serde(default)]
    pub assigned_faculty_emails: Vec<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_scale_max() -> u8 {
    DEFAULT_RATING_SCALE_MAX
}

impl Form {
    /// Effective rating scale; a stored zero means the default.
    pub fn scale_max(&self) -> u8 {
        if self.rating_scale_max == 0 {
            DEFAULT_RATING_SCALE_MAX
        } else {
            self.rating_scale_max
        }
    }

    /// Whether `email` is among the assigned faculty.
    pub fn is_assigned_to(&self, email: &str) -> bool {
        self.assigned_faculty_emails
            .iter()
            .any(|assigned| assigned.eq_ignore_ascii_case(email))
    }

    /// Human-readable label used in listings.
    ///
    /// `course - instructor` when an instructor is set, otherwise
    /// `course • description`, falling back to `Form {id}`.
    pub fn display_label(&self) -> String {
        let instructor = self.instructor.trim();
        let (parts, separator) = if instructor.is_empty() {
            ([self.course.trim(), self.description.trim()], " \u{2022} ")
        } else {
            ([self.course.trim(), instructor], " - ")
        };
        let label = parts
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(separator);
        if label.is_empty() {
            format!("Form {}", self.id)
        } else {
            label
        }
    }
}

/// The author-supplied part of a form, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDraft {
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default = "default_scale_max")]
    pub rating_scale_max: u8,
    #[serde(default)]
    pub assigned_faculty_emails: Vec<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Default for FormDraft {
    fn default() -> Self {
        Self {
            course: String::new(),
            instructor: String::new(),
            created_by: None,
            description: String::new(),
            published: false,
            rating_scale_max: DEFAULT_RATING_SCALE_MAX,
            assigned_faculty_emails: Vec::new(),
            questions: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A single answer, typed by the question it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Rating(u8),
    SingleChoice(String),
    MultiChoice(Vec<String>),
    Text(String),
}

impl Answer {
    /// The question kind this answer belongs to.
    pub fn kind(&self) -> QuestionKind {
        match self {
            Answer::Rating(_) => QuestionKind::Rating,
            Answer::SingleChoice(_) => QuestionKind::SingleChoice,
            Answer::MultiChoice(_) => QuestionKind::MultiChoice,
            Answer::Text(_) => QuestionKind::Text,
        }
    }

    /// Parse a raw command-line value as an answer to a question of `kind`.
    ///
    /// Multi-choice values are separated by `|`.
    pub fn parse_for(kind: QuestionKind, raw: &str) -> Result<Self, String> {
        match kind {
            QuestionKind::Rating => raw
                .trim()
                .parse::<u8>()
                .map(Answer::Rating)
                .map_err(|_| format!("'{}' is not a rating", raw.trim())),
            QuestionKind::SingleChoice => Ok(Answer::SingleChoice(raw.trim().to_string())),
            QuestionKind::MultiChoice => Ok(Answer::MultiChoice(
                raw.split('|')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            )),
            QuestionKind::Text => Ok(Answer::Text(raw.to_string())),
        }
    }
}

/// Answers keyed by question index.
pub type Answers = BTreeMap<usize, Answer>;

/// One submitter's answers to one form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub schema_version: u32,
    pub id: Uuid,
    pub form_id: FormId,
    pub submitted_by: String,
    #[serde(default)]
    pub answers: Answers,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Response {
    /// The answer at `index` if it has the expected kind.
    pub fn answer_of_kind(&self, index: usize, kind: QuestionKind) -> Option<&Answer> {
        self.answers.get(&index).filter(|a| a.kind() == kind)
    }
}
