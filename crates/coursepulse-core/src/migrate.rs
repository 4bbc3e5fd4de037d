//! Upgrades of legacy records to the current schema.
//!
//! Older responses stored untyped answers in an object keyed by question
//! index, and the oldest ones carried flat `rating` / `issues` /
//! `suggestion` fields with no question list at all. Both shapes are
//! converted to typed [`Answer`]s here, once, when the collections are read.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::model::{
    Answer, Answers, Form, FormId, Question, QuestionKind, Response, RESPONSE_SCHEMA_VERSION,
};

/// Counts of records rewritten by a migration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub forms: usize,
    pub responses: usize,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool {
        self.forms == 0 && self.responses == 0
    }
}

/// Questions implied by the flat legacy answer fields, in field order.
pub fn legacy_questions() -> Vec<Question> {
    vec![
        Question::new("Overall rating", QuestionKind::Rating),
        Question::new("Issues faced", QuestionKind::MultiChoice).with_options([
            "Teaching pace",
            "Clarity of explanation",
            "Course material",
            "Assessment difficulty",
            "No issues",
        ]),
        Question::new("Suggestions", QuestionKind::Text),
    ]
}

/// Give a question-less legacy form the legacy question set.
///
/// Returns whether the form changed.
pub fn upgrade_form(form: &mut Form) -> bool {
    if form.questions.is_empty() {
        form.questions = legacy_questions();
        true
    } else {
        false
    }
}

/// Upgrade every readable response record; unreadable ones are dropped.
pub fn upgrade_responses(raw: Vec<Value>, forms: &[Form]) -> Vec<Response> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let upgraded = upgrade_response(value, forms);
            if upgraded.is_none() {
                tracing::warn!("skipping unreadable response record #{index}");
            }
            upgraded
        })
        .collect()
}

/// Whether a raw record is already in the current schema.
pub fn is_current(raw: &Value) -> bool {
    raw.get("schemaVersion").and_then(Value::as_u64) == Some(u64::from(RESPONSE_SCHEMA_VERSION))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyResponse {
    #[serde(default)]
    id: Option<Value>,
    form_id: Value,
    #[serde(default)]
    submitted_by: Option<String>,
    #[serde(default)]
    answers: Map<String, Value>,
    #[serde(default)]
    submitted_at: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

/// Upgrade one raw response record.
pub fn upgrade_response(raw: Value, forms: &[Form]) -> Option<Response> {
    if is_current(&raw) {
        return serde_json::from_value(raw)
            .map_err(|e| tracing::warn!("invalid response record: {e}"))
            .ok();
    }

    let legacy: LegacyResponse = serde_json::from_value(raw)
        .map_err(|e| tracing::warn!("invalid legacy response record: {e}"))
        .ok()?;
    let form_id = parse_form_id(&legacy.form_id)?;

    let answers = match forms.iter().find(|f| f.id == form_id) {
        Some(form) => decode_answers(&legacy.answers, &form.questions),
        None => {
            tracing::warn!("legacy response references missing form {form_id}; answers dropped");
            Answers::new()
        }
    };

    Some(Response {
        schema_version: RESPONSE_SCHEMA_VERSION,
        id: legacy_id(legacy.id.as_ref()),
        form_id,
        submitted_by: legacy.submitted_by.unwrap_or_default(),
        answers,
        submitted_at: legacy
            .submitted_at
            .as_deref()
            .or(legacy.date.as_deref())
            .and_then(parse_timestamp),
    })
}

fn parse_form_id(value: &Value) -> Option<FormId> {
    match value {
        Value::Number(n) => n.as_u64().map(FormId),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Numeric ids map onto a fixed UUID so repeated upgrades agree.
fn legacy_id(value: Option<&Value>) -> Uuid {
    match value {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(n) => Uuid::from_u64_pair(0, n),
            None => Uuid::new_v4(),
        },
        Some(Value::String(s)) => Uuid::parse_str(s)
            .ok()
            .or_else(|| s.parse::<u64>().ok().map(|n| Uuid::from_u64_pair(0, n)))
            .unwrap_or_else(Uuid::new_v4),
        _ => Uuid::new_v4(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn decode_answers(raw: &Map<String, Value>, questions: &[Question]) -> Answers {
    let mut answers = Answers::new();

    for (key, value) in raw {
        let Ok(index) = key.parse::<usize>() else {
            continue;
        };
        let Some(question) = questions.get(index) else {
            tracing::debug!("dropping answer for missing question {index}");
            continue;
        };
        match decode_value(question.kind, value) {
            Some(answer) => {
                answers.insert(index, answer);
            }
            None => tracing::debug!(
                "dropping {} answer that does not fit question {index} ({})",
                json_type(value),
                question.kind
            ),
        }
    }

    for (field, kind) in [
        ("rating", QuestionKind::Rating),
        ("issues", QuestionKind::MultiChoice),
        ("suggestion", QuestionKind::Text),
    ] {
        let Some(value) = raw.get(field) else {
            continue;
        };
        let Some(answer) = decode_value(kind, value) else {
            continue;
        };
        let slot = questions
            .iter()
            .enumerate()
            .find(|(i, q)| q.kind == kind && !answers.contains_key(i))
            .map(|(i, _)| i);
        if let Some(index) = slot {
            answers.insert(index, answer);
        }
    }

    answers
}

/// Interpret an untyped value as an answer of `kind`.
fn decode_value(kind: QuestionKind, value: &Value) -> Option<Answer> {
    match (kind, value) {
        (QuestionKind::Rating, Value::Number(n)) => {
            let rating = n.as_u64()?;
            match u8::try_from(rating) {
                // 0 was the "not rated" placeholder.
                Ok(0) | Err(_) => None,
                Ok(r) => Some(Answer::Rating(r)),
            }
        }
        (QuestionKind::SingleChoice, Value::String(s)) if !s.trim().is_empty() => {
            Some(Answer::SingleChoice(s.clone()))
        }
        (QuestionKind::MultiChoice, Value::Array(items)) => {
            let options: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect();
            (!options.is_empty()).then_some(Answer::MultiChoice(options))
        }
        (QuestionKind::Text, Value::String(s)) if !s.trim().is_empty() => {
            Some(Answer::Text(s.clone()))
        }
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "numeric",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form_with(id: u64, questions: Vec<Question>) -> Form {
        serde_json::from_value::<Form>(json!({ "id": id }))
            .map(|mut f| {
                f.questions = questions;
                f
            })
            .unwrap()
    }

    fn indexed_form() -> Form {
        form_with(
            7,
            vec![
                Question::new("Clarity", QuestionKind::Rating),
                Question::new("Mode", QuestionKind::SingleChoice).with_options(["Online"]),
                Question::new("Issues", QuestionKind::MultiChoice).with_options(["Noise"]),
                Question::new("Comments", QuestionKind::Text),
            ],
        )
    }

    #[test]
    fn current_records_pass_through() {
        let id = Uuid::new_v4();
        let raw = json!({
            "schemaVersion": 2,
            "id": id,
            "formId": 7,
            "submittedBy": "s@gmail.com",
            "answers": { "0": { "type": "rating", "value": 4 } },
            "submittedAt": "2025-01-01T00:00:00Z"
        });
        let response = upgrade_response(raw, &[]).unwrap();
        assert_eq!(response.id, id);
        assert_eq!(response.answers[&0], Answer::Rating(4));
        assert!(response.submitted_at.is_some());
    }

    #[test]
    fn indexed_values_are_typed_by_question() {
        let raw = json!({
            "id": 1700000000000u64,
            "formId": 7,
            "submittedBy": "s@gmail.com",
            "answers": { "0": 4, "1": "Online", "2": ["Noise"], "3": "Great course" },
            "submittedAt": "2025-03-04T10:00:00.000Z"
        });
        let response = upgrade_response(raw, &[indexed_form()]).unwrap();

        assert_eq!(response.schema_version, RESPONSE_SCHEMA_VERSION);
        assert_eq!(response.id, Uuid::from_u64_pair(0, 1_700_000_000_000));
        assert_eq!(response.answers[&0], Answer::Rating(4));
        assert_eq!(response.answers[&1], Answer::SingleChoice("Online".into()));
        assert_eq!(response.answers[&2], Answer::MultiChoice(vec!["Noise".into()]));
        assert_eq!(response.answers[&3], Answer::Text("Great course".into()));
    }

    #[test]
    fn mismatched_values_are_dropped() {
        let raw = json!({
            "formId": 7,
            "submittedBy": "s@gmail.com",
            "answers": { "0": "five", "1": 3, "2": "Noise", "3": "", "9": 5 }
        });
        let response = upgrade_response(raw, &[indexed_form()]).unwrap();
        assert!(response.answers.is_empty());
    }

    #[test]
    fn zero_and_oversized_ratings_are_dropped() {
        let raw = json!({ "formId": 7, "submittedBy": "s", "answers": { "0": 0 } });
        assert!(upgrade_response(raw, &[indexed_form()]).unwrap().answers.is_empty());

        let raw = json!({ "formId": 7, "submittedBy": "s", "answers": { "0": 300 } });
        assert!(upgrade_response(raw, &[indexed_form()]).unwrap().answers.is_empty());
    }

    #[test]
    fn flat_legacy_fields_fill_legacy_questions() {
        let mut form = form_with(42, vec![]);
        assert!(upgrade_form(&mut form));
        assert!(!upgrade_form(&mut form));

        let raw = json!({
            "formId": 42,
            "student": null,
            "submittedBy": "s@gmail.com",
            "answers": { "rating": 5, "issues": ["Teaching pace"], "suggestion": "More labs" },
            "date": "3/4/2025, 10:00:00 AM"
        });
        let response = upgrade_response(raw, &[form]).unwrap();

        assert_eq!(response.answers[&0], Answer::Rating(5));
        assert_eq!(
            response.answers[&1],
            Answer::MultiChoice(vec!["Teaching pace".into()])
        );
        assert_eq!(response.answers[&2], Answer::Text("More labs".into()));
        assert!(response.submitted_at.is_none());
    }

    #[test]
    fn flat_fields_do_not_overwrite_indexed_answers() {
        let raw = json!({
            "formId": 7,
            "submittedBy": "s",
            "answers": { "0": 2, "rating": 5 }
        });
        let response = upgrade_response(raw, &[indexed_form()]).unwrap();
        assert_eq!(response.answers[&0], Answer::Rating(2));
        assert_eq!(response.answers.len(), 1);
    }

    #[test]
    fn string_form_ids_and_ids_are_accepted() {
        let raw = json!({ "id": "15", "formId": "7", "submittedBy": "s", "answers": {} });
        let response = upgrade_response(raw, &[indexed_form()]).unwrap();
        assert_eq!(response.form_id, FormId(7));
        assert_eq!(response.id, Uuid::from_u64_pair(0, 15));
    }

    #[test]
    fn unreadable_records_are_skipped() {
        let raw = vec![
            json!({ "formId": 7, "submittedBy": "a", "answers": { "0": 3 } }),
            json!({ "submittedBy": "no form" }),
            json!({ "formId": true }),
            json!("garbage"),
        ];
        let responses = upgrade_responses(raw, &[indexed_form()]);
        assert_eq!(responses.len(), 1);
    }

    #[test]
    fn responses_to_missing_forms_keep_their_identity() {
        let raw = json!({ "id": 3, "formId": 1234, "submittedBy": "s", "answers": { "0": 4 } });
        let response = upgrade_response(raw, &[]).unwrap();
        assert_eq!(response.form_id, FormId(1234));
        assert!(response.answers.is_empty());
    }
}
