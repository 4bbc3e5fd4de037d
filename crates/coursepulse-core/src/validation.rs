//! Input checks for registrations, form drafts, and submitted answers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::model::{Answer, Answers, FormDraft, Question};

/// Email domains accepted at self-registration unless configured otherwise.
pub const DEFAULT_ALLOWED_DOMAINS: [&str; 5] = [
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "kluniversity.in",
    "klu.ac.in",
];

/// Smallest and largest rating scale a form may use.
pub const SCALE_RANGE: std::ops::RangeInclusive<u8> = 2..=10;

/// Whether `email` looks like `local@host.tld`.
pub fn is_valid_email(email: &str) -> bool {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));
    RE.is_match(email)
}

/// Check `email` against the pattern and the domain allow-list.
///
/// An empty allow-list accepts every domain.
pub fn check_email(email: &str, allowed_domains: &[String]) -> Result<(), ValidationError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    let domain = email.rsplit('@').next().unwrap_or_default();
    if !allowed_domains.is_empty() && !allowed_domains.iter().any(|d| d.eq_ignore_ascii_case(domain)) {
        return Err(ValidationError::EmailDomainNotAllowed {
            domain: domain.to_string(),
            allowed: allowed_domains.to_vec(),
        });
    }
    Ok(())
}

/// Everything a password lacks, in a fixed order. Empty means strong enough.
pub fn password_issues(password: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if password.chars().count() < 8 {
        issues.push("at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push("1 uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("1 number");
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        issues.push("1 special character");
    }
    issues
}

pub fn check_password(password: &str) -> Result<(), ValidationError> {
    let issues = password_issues(password);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword(issues))
    }
}

/// Check a form draft before it is stored.
pub fn check_draft(draft: &FormDraft) -> Result<(), ValidationError> {
    if draft.course.trim().is_empty() {
        return Err(ValidationError::MissingField("Course name"));
    }
    if !SCALE_RANGE.contains(&draft.rating_scale_max) {
        return Err(ValidationError::InvalidScale(draft.rating_scale_max));
    }
    if draft.questions.is_empty() {
        return Err(ValidationError::NoQuestions);
    }
    for (index, question) in draft.questions.iter().enumerate() {
        if question.text.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion(index));
        }
        if question.kind.is_choice() && !question.options.iter().any(|o| !o.trim().is_empty()) {
            return Err(ValidationError::MissingOptions(index));
        }
    }
    Ok(())
}

/// Check submitted answers against the questions they answer.
pub fn check_answers(
    questions: &[Question],
    answers: &Answers,
    scale_max: u8,
) -> Result<(), ValidationError> {
    for (&index, answer) in answers {
        let question = questions
            .get(index)
            .ok_or(ValidationError::UnknownQuestion(index))?;
        if answer.kind() != question.kind {
            return Err(ValidationError::AnswerTypeMismatch {
                index,
                expected: question.kind,
            });
        }
        match answer {
            Answer::Rating(value) if !(1..=scale_max).contains(value) => {
                return Err(ValidationError::RatingOutOfRange {
                    index,
                    value: *value,
                    max: scale_max,
                });
            }
            Answer::SingleChoice(option) => check_option(question, index, option)?,
            Answer::MultiChoice(options) => {
                for option in options {
                    check_option(question, index, option)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_option(question: &Question, index: usize, option: &str) -> Result<(), ValidationError> {
    if question.options.iter().any(|o| o.trim() == option.trim()) {
        Ok(())
    } else {
        Err(ValidationError::UnknownOption {
            index,
            option: option.to_string(),
        })
    }
}
