//! TOML form definition parser.
//!
//! Loads form drafts from TOML files and lints them for likely mistakes
//! that are still valid forms.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{FormDraft, Question, QuestionKind, DEFAULT_RATING_SCALE_MAX};
use crate::templates;

/// Intermediate TOML structure for form definition files.
#[derive(Debug, Deserialize)]
struct TomlFormFile {
    form: TomlFormHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlFormHeader {
    #[serde(default)]
    course: String,
    #[serde(default)]
    instructor: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    published: bool,
    #[serde(default)]
    rating_scale_max: Option<u8>,
    #[serde(default)]
    assigned_faculty: Vec<String>,
    /// Built-in template whose questions come before the listed ones.
    #[serde(default)]
    template: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    text: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    options: Vec<String>,
}

fn default_kind() -> String {
    "rating".to_string()
}

/// Parse a form definition file into a draft.
pub fn parse_form_file(path: &Path) -> Result<FormDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read form file: {}", path.display()))?;

    parse_form_str(&content, path)
}

/// Parse a TOML string into a draft.
pub fn parse_form_str(content: &str, source_path: &Path) -> Result<FormDraft> {
    let parsed: TomlFormFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
    let header = parsed.form;

    let mut questions = match &header.template {
        Some(name) => {
            let template = templates::find_template(name)
                .ok_or_else(|| anyhow::anyhow!("unknown template: {name}"))?;
            template.questions
        }
        None => Vec::new(),
    };
    for (index, q) in parsed.questions.into_iter().enumerate() {
        let kind: QuestionKind = q
            .kind
            .parse()
            .map_err(|e: String| anyhow::anyhow!("question {}: {}", index + 1, e))?;
        questions.push(Question::new(q.text, kind).with_options(q.options));
    }

    Ok(FormDraft {
        course: header.course,
        instructor: header.instructor,
        created_by: header.created_by,
        description: header.description,
        published: header.published,
        rating_scale_max: header.rating_scale_max.unwrap_or(DEFAULT_RATING_SCALE_MAX),
        assigned_faculty_emails: header.assigned_faculty,
        questions,
    })
}

/// A warning from form linting.
#[derive(Debug, Clone)]
pub struct LintWarning {
    /// Zero-based question index (if applicable).
    pub question: Option<usize>,
    pub message: String,
}

/// Check a draft for things that are allowed but probably unintended.
pub fn lint_draft(draft: &FormDraft) -> Vec<LintWarning> {
    let mut warnings = Vec::new();

    let mut seen = std::collections::HashSet::new();
    for (index, question) in draft.questions.iter().enumerate() {
        if !seen.insert(question.text.trim().to_lowercase()) {
            warnings.push(LintWarning {
                question: Some(index),
                message: format!("duplicate question text: {}", question.text.trim()),
            });
        }
    }

    for (index, question) in draft.questions.iter().enumerate() {
        if !question.kind.is_choice() && !question.options.is_empty() {
            warnings.push(LintWarning {
                question: Some(index),
                message: format!("options are ignored for {} questions", question.kind),
            });
        }
        if question.kind.is_choice() {
            let mut options = std::collections::HashSet::new();
            if question.options.iter().any(|o| !options.insert(o.trim())) {
                warnings.push(LintWarning {
                    question: Some(index),
                    message: "repeated option".into(),
                });
            }
        }
    }

    if !draft.questions.is_empty()
        && !draft.questions.iter().any(|q| q.kind == QuestionKind::Rating)
    {
        warnings.push(LintWarning {
            question: None,
            message: "no rating questions; the overall rating will stay at 0".into(),
        });
    }

    if draft.published && draft.assigned_faculty_emails.is_empty() {
        warnings.push(LintWarning {
            question: None,
            message: "published without assigned faculty".into(),
        });
    }

    warnings
}
