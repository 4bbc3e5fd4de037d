//! Error types.
//!
//! Validation failures are kept apart from store failures so callers can
//! show the former as inline messages and treat the latter as fatal.

use thiserror::Error;

use crate::model::{FormId, QuestionKind};

/// Result alias for service operations.
pub type Result<T, E = FeedbackError> = std::result::Result<T, E>;

/// Errors returned by the feedback services.
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Input was rejected; the message is meant for the user.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No form with this id exists.
    #[error("form {0} not found")]
    FormNotFound(FormId),

    /// The form exists but has not been sent to students yet.
    #[error("form {0} is not published")]
    FormNotPublished(FormId),

    /// The submitter already answered this form.
    #[error("{email} has already submitted feedback for form {form_id}")]
    AlreadySubmitted { form_id: FormId, email: String },

    /// No matching email/password pair.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No user with this email (and role, where one is implied).
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Reading or writing the backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FeedbackError {
    /// Returns `true` for errors caused by user input rather than the store.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, FeedbackError::Store(_))
    }
}

/// Input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields are required.")]
    MissingFields,

    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Email must be from a valid domain (e.g., {}).", .allowed.join(", "))]
    EmailDomainNotAllowed { domain: String, allowed: Vec<String> },

    #[error("Password and Confirm Password do not match.")]
    PasswordMismatch,

    #[error("Password is missing: {}.", .0.join(", "))]
    WeakPassword(Vec<&'static str>),

    #[error("Only student and faculty accounts can self-register.")]
    RoleNotAllowed,

    #[error("User already exists with this email or register number.")]
    DuplicateUser,

    #[error("Faculty with this email already exists.")]
    DuplicateFaculty,

    #[error("A form needs at least one question.")]
    NoQuestions,

    #[error("Question {} has no text.", .0 + 1)]
    EmptyQuestion(usize),

    #[error("Question {} needs at least one option.", .0 + 1)]
    MissingOptions(usize),

    #[error("Rating scale must be between 2 and 10, got {0}.")]
    InvalidScale(u8),

    #[error("Question {} does not exist.", .0 + 1)]
    UnknownQuestion(usize),

    #[error("Question {} expects a {expected} answer.", .index + 1)]
    AnswerTypeMismatch { index: usize, expected: QuestionKind },

    #[error("Question {} rating must be between 1 and {max}, got {value}.", .index + 1)]
    RatingOutOfRange { index: usize, value: u8, max: u8 },

    #[error("Question {} has no option '{option}'.", .index + 1)]
    UnknownOption { index: usize, option: String },
}

/// Failures of the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize store key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
