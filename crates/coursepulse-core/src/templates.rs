//! Built-in question sets a new form can start from.

use crate::model::{FormDraft, Question, QuestionKind};

/// A named starting point for a form.
#[derive(Debug, Clone)]
pub struct FormTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub questions: Vec<Question>,
}

impl FormTemplate {
    /// A draft pre-filled with this template's questions.
    pub fn to_draft(&self) -> FormDraft {
        FormDraft {
            description: self.description.to_string(),
            questions: self.questions.clone(),
            ..Default::default()
        }
    }
}

/// All built-in templates.
pub fn builtin_templates() -> Vec<FormTemplate> {
    vec![
        FormTemplate {
            name: "Course Feedback",
            description: "End-of-term feedback on teaching and course content",
            questions: vec![
                Question::new("How clear were the explanations?", QuestionKind::Rating),
                Question::new("How well was the course paced?", QuestionKind::Rating),
                Question::new("How useful was the course material?", QuestionKind::Rating),
                Question::new("Which issues did you face?", QuestionKind::MultiChoice)
                    .with_options([
                        "Teaching pace",
                        "Clarity of explanation",
                        "Course material",
                        "Assessment difficulty",
                        "No issues",
                    ]),
                Question::new("Any suggestions for improvement?", QuestionKind::Text),
            ],
        },
        FormTemplate {
            name: "Lab Feedback",
            description: "Feedback on lab sessions and equipment",
            questions: vec![
                Question::new("How well did the lab support the lectures?", QuestionKind::Rating),
                Question::new("Was the equipment in working order?", QuestionKind::SingleChoice)
                    .with_options(["Always", "Mostly", "Rarely"]),
                Question::new("Which problems did you run into?", QuestionKind::MultiChoice)
                    .with_options([
                        "Not enough systems",
                        "Software not installed",
                        "Unclear instructions",
                        "Not enough time",
                        "No issues",
                    ]),
                Question::new("Anything else about the lab?", QuestionKind::Text),
            ],
        },
        FormTemplate {
            name: "Quick Pulse",
            description: "A short mid-term check-in",
            questions: vec![
                Question::new("How is the course going so far?", QuestionKind::Rating),
                Question::new("What should change?", QuestionKind::Text),
            ],
        },
    ]
}

/// Look a template up by name, ignoring case.
pub fn find_template(name: &str) -> Option<FormTemplate> {
    builtin_templates()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}
