//! Cross-form overviews shown on the dashboards.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::{self, AnalyticsByForm, ChoiceCount};
use crate::error::Result;
use crate::model::{Answer, Form, FormId, QuestionKind, Response};
use crate::service::FeedbackService;
use crate::store::KeyValueStore;

/// Number of issues listed as "top issues".
pub const TOP_ISSUES: usize = 3;

/// Aggregated results over a set of responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOverview {
    pub total_responses: usize,
    /// Mean of every valid rating, one decimal. `None` without ratings.
    pub average_rating: Option<f64>,
    /// Multi-choice selections, most frequent first.
    pub issue_counts: Vec<ChoiceCount>,
}

impl StudentOverview {
    pub fn top_issues(&self) -> &[ChoiceCount] {
        &self.issue_counts[..TOP_ISSUES.min(self.issue_counts.len())]
    }
}

/// How far one student is through the published forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub email: String,
    pub total_forms: usize,
    pub submitted: usize,
    pub pending: usize,
}

/// A faculty member's view of the forms assigned to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyOverview {
    pub email: String,
    pub assigned_forms: usize,
    pub total_responses: usize,
    /// Mean of the forms' cached overall ratings, two decimals.
    pub average_rating: f64,
}

/// The ratings and selections of one response, flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDigest {
    pub response_id: Uuid,
    pub form_id: FormId,
    pub submitted_by: String,
    pub ratings: Vec<u8>,
    pub selections: Vec<String>,
    pub comments: Vec<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Summarize `responses` against the forms they answer.
///
/// Responses to forms missing from `forms` still count towards the total.
pub fn student_overview(forms: &[Form], responses: &[Response]) -> StudentOverview {
    let by_id: HashMap<FormId, &Form> = forms.iter().map(|f| (f.id, f)).collect();
    let mut ratings: Vec<u8> = Vec::new();
    let mut issues: HashMap<String, usize> = HashMap::new();

    for response in responses {
        let Some(form) = by_id.get(&response.form_id) else {
            continue;
        };
        for (index, question) in form.questions.iter().enumerate() {
            match question.kind {
                QuestionKind::Rating => {
                    ratings.extend(analytics::valid_rating(response, index, form.scale_max()));
                }
                QuestionKind::MultiChoice => {
                    if let Some(Answer::MultiChoice(selected)) = response.answers.get(&index) {
                        for option in selected.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
                            *issues.entry(option.to_string()).or_default() += 1;
                        }
                    }
                }
                _ => {}
            }
        }
    }

    let average_rating = (!ratings.is_empty()).then(|| {
        let sum: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
        analytics::round1(sum as f64 / ratings.len() as f64)
    });
    StudentOverview {
        total_responses: responses.len(),
        average_rating,
        issue_counts: analytics::sort_counts(issues),
    }
}

/// Count the published forms `email` has and has not answered.
pub fn student_progress(email: &str, forms: &[Form], responses: &[Response]) -> StudentProgress {
    let email = email.trim();
    let published: HashSet<FormId> = forms.iter().filter(|f| f.published).map(|f| f.id).collect();
    let submitted = responses
        .iter()
        .filter(|r| r.submitted_by.eq_ignore_ascii_case(email))
        .map(|r| r.form_id)
        .filter(|id| published.contains(id))
        .collect::<HashSet<_>>()
        .len();
    StudentProgress {
        email: email.to_lowercase(),
        total_forms: published.len(),
        submitted,
        pending: published.len().saturating_sub(submitted),
    }
}

/// Summarize the forms assigned to `email` using the analytics cache.
pub fn faculty_overview(
    email: &str,
    forms: &[Form],
    responses: &[Response],
    analytics: &AnalyticsByForm,
) -> FacultyOverview {
    let email = email.trim();
    let assigned: Vec<&Form> = forms.iter().filter(|f| f.is_assigned_to(email)).collect();
    let total_responses = responses
        .iter()
        .filter(|r| assigned.iter().any(|f| f.id == r.form_id))
        .count();
    let average_rating = if assigned.is_empty() {
        0.0
    } else {
        let total: f64 = assigned
            .iter()
            .map(|f| analytics.get(&f.id).map_or(0.0, |a| a.overall_rating))
            .sum();
        analytics::round2(total / assigned.len() as f64)
    };
    FacultyOverview {
        email: email.to_lowercase(),
        assigned_forms: assigned.len(),
        total_responses,
        average_rating,
    }
}

/// Flatten one response. Answers that do not fit the form are left out.
pub fn digest(form: Option<&Form>, response: &Response) -> ResponseDigest {
    let mut ratings = Vec::new();
    let mut selections = Vec::new();
    let mut comments = Vec::new();

    if let Some(form) = form {
        for (index, question) in form.questions.iter().enumerate() {
            match response.answer_of_kind(index, question.kind) {
                Some(Answer::Rating(_)) => {
                    ratings.extend(analytics::valid_rating(response, index, form.scale_max()));
                }
                Some(Answer::SingleChoice(option)) => selections.push(option.trim().to_string()),
                Some(Answer::MultiChoice(options)) => {
                    selections.extend(options.iter().map(|o| o.trim().to_string()));
                }
                Some(Answer::Text(text)) if !text.trim().is_empty() => {
                    comments.push(text.trim().to_string());
                }
                _ => {}
            }
        }
    }
    selections.retain(|s| !s.is_empty());

    ResponseDigest {
        response_id: response.id,
        form_id: response.form_id,
        submitted_by: response.submitted_by.clone(),
        ratings,
        selections,
        comments,
        submitted_at: response.submitted_at,
    }
}

impl<S: KeyValueStore> FeedbackService<S> {
    /// Aggregated results over every response, or over one form's.
    pub fn student_overview(&self, form_id: Option<FormId>) -> Result<StudentOverview> {
        let forms = self.repo.forms()?;
        let mut responses = self.repo.responses_for(&forms)?;
        if let Some(form_id) = form_id {
            responses.retain(|r| r.form_id == form_id);
        }
        Ok(student_overview(&forms, &responses))
    }

    pub fn student_progress(&self, email: &str) -> Result<StudentProgress> {
        let forms = self.repo.forms()?;
        let responses = self.repo.responses_for(&forms)?;
        Ok(student_progress(email, &forms, &responses))
    }

    pub fn faculty_overview(&mut self, email: &str) -> Result<FacultyOverview> {
        let analytics = self.analytics_by_form()?;
        let forms = self.repo.forms()?;
        let responses = self.repo.responses_for(&forms)?;
        Ok(faculty_overview(email, &forms, &responses, &analytics))
    }

    /// Digests of one form's responses, or of all responses.
    pub fn response_digests(&self, form_id: Option<FormId>) -> Result<Vec<ResponseDigest>> {
        let forms = self.repo.forms()?;
        let responses = self.repo.responses_for(&forms)?;
        Ok(responses
            .iter()
            .filter(|r| form_id.map_or(true, |id| r.form_id == id))
            .map(|r| digest(forms.iter().find(|f| f.id == r.form_id), r))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Answers;
    use crate::service::tests::{rating_draft, service};

    fn answers(pairs: Vec<(usize, Answer)>) -> Answers {
        pairs.into_iter().collect()
    }

    #[test]
    fn student_overview_counts_ratings_and_issues() {
        let mut service = service();
        let form = service.create_form(rating_draft("CS 220")).unwrap();
        let submissions = [
            ("a@gmail.com", 5, 4, vec!["Noise", "Slides"]),
            ("b@gmail.com", 3, 2, vec!["Noise"]),
            ("c@gmail.com", 4, 4, vec!["Pace", "Noise", "Slides"]),
        ];
        for (email, clarity, pace, issues) in submissions {
            service
                .submit(
                    form.id,
                    email,
                    answers(vec![
                        (0, Answer::Rating(clarity)),
                        (1, Answer::Rating(pace)),
                        (
                            2,
                            Answer::MultiChoice(issues.into_iter().map(String::from).collect()),
                        ),
                    ]),
                )
                .unwrap();
        }

        let overview = service.student_overview(None).unwrap();
        assert_eq!(overview.total_responses, 3);
        // 22 / 6
        assert_eq!(overview.average_rating, Some(3.7));
        let top: Vec<(&str, usize)> = overview
            .top_issues()
            .iter()
            .map(|c| (c.option.as_str(), c.count))
            .collect();
        assert_eq!(top, [("Noise", 3), ("Slides", 2), ("Pace", 1)]);
    }

    #[test]
    fn student_overview_without_ratings() {
        let service = service();
        let overview = service.student_overview(None).unwrap();
        assert_eq!(overview.total_responses, 0);
        assert_eq!(overview.average_rating, None);
        assert!(overview.top_issues().is_empty());
    }

    #[test]
    fn faculty_overview_averages_assigned_forms() {
        let mut service = service();
        let mut rated = rating_draft("CS 220");
        rated.assigned_faculty_emails = vec!["faculty1@college.edu".into()];
        let rated = service.create_form(rated).unwrap();
        let mut silent = rating_draft("CS 221");
        silent.assigned_faculty_emails = vec!["faculty1@college.edu".into()];
        service.create_form(silent).unwrap();
        service.create_form(rating_draft("CS 222")).unwrap();

        service
            .submit(
                rated.id,
                "a@gmail.com",
                answers(vec![(0, Answer::Rating(5)), (1, Answer::Rating(4))]),
            )
            .unwrap();

        let overview = service.faculty_overview("faculty1@college.edu").unwrap();
        assert_eq!(overview.assigned_forms, 2);
        assert_eq!(overview.total_responses, 1);
        // (4.5 + 0) / 2
        assert_eq!(overview.average_rating, 2.25);

        let padded = service.faculty_overview(" Faculty1@college.edu ").unwrap();
        assert_eq!(padded.email, "faculty1@college.edu");
        assert_eq!(padded.assigned_forms, 2);
        assert_eq!(padded.total_responses, 1);
        assert_eq!(
            padded.assigned_forms,
            service.list_assigned_to(" Faculty1@college.edu ").unwrap().len()
        );

        let nobody = service.faculty_overview("faculty2@college.edu").unwrap();
        assert_eq!(nobody.assigned_forms, 0);
        assert_eq!(nobody.average_rating, 0.0);
    }

    #[test]
    fn student_progress_counts_published_forms() {
        let mut service = service();
        let answered = service.create_form(rating_draft("CS 220")).unwrap();
        service.create_form(rating_draft("CS 221")).unwrap();
        let mut draft = rating_draft("CS 222");
        draft.published = false;
        service.create_form(draft).unwrap();

        service
            .submit(answered.id, "student1@college.edu", answers(vec![(0, Answer::Rating(4))]))
            .unwrap();
        service
            .submit(answered.id, "student2@college.edu", answers(vec![(0, Answer::Rating(2))]))
            .unwrap();

        let progress = service.student_progress(" Student1@college.edu").unwrap();
        assert_eq!(progress.email, "student1@college.edu");
        assert_eq!(progress.total_forms, 2);
        assert_eq!(progress.submitted, 1);
        assert_eq!(progress.pending, 1);

        let newcomer = service.student_progress("student3@college.edu").unwrap();
        assert_eq!((newcomer.submitted, newcomer.pending), (0, 2));
    }

    #[test]
    fn digest_flattens_answers() {
        let mut service = service();
        let form = service.create_form(rating_draft("CS 220")).unwrap();
        service
            .submit(
                form.id,
                "a@gmail.com",
                answers(vec![
                    (0, Answer::Rating(4)),
                    (2, Answer::MultiChoice(vec!["Slides".into()])),
                    (3, Answer::Text("  More examples  ".into())),
                ]),
            )
            .unwrap();

        let digests = service.response_digests(Some(form.id)).unwrap();
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].ratings, [4]);
        assert_eq!(digests[0].selections, ["Slides"]);
        assert_eq!(digests[0].comments, ["More examples"]);
        assert!(service.response_digests(Some(FormId(1))).unwrap().is_empty());
    }
}
