//! Per-form summary statistics.
//!
//! [`compute_form_analytics`] is a pure function of a form, its responses,
//! and the stamp it is given. The cache in the store is always rebuilt in
//! full from the current forms and responses, never patched.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Answer, Form, FormId, QuestionKind, Response};

/// Cached analytics keyed by form.
pub type AnalyticsByForm = BTreeMap<FormId, FormAnalytics>;

/// Summary statistics for one form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormAnalytics {
    pub form_id: FormId,
    pub rating_scale_max: u8,
    /// Number of responses to the form.
    pub total_submissions: usize,
    /// One entry per question, in form order.
    pub average_per_question: Vec<QuestionAverage>,
    /// Mean of the rating-question averages.
    pub overall_rating: f64,
    /// Answer counts for each point of the rating scale, all rating
    /// questions combined.
    pub distribution: Vec<RatingBucket>,
    /// How often each choice option was selected, most frequent first.
    #[serde(default)]
    pub choice_counts: Vec<ChoiceCount>,
    pub last_updated: DateTime<Utc>,
}

/// Average of one question. `None` for questions that are not ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAverage {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBucket {
    pub rating: u8,
    pub count: usize,
}

impl RatingBucket {
    /// Label shown on charts, e.g. "4 Star".
    pub fn label(&self) -> String {
        format!("{} Star", self.rating)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceCount {
    pub option: String,
    pub count: usize,
}

impl FormAnalytics {
    /// Placeholder for a form nothing has been computed for yet.
    pub fn empty(form_id: FormId, rating_scale_max: u8, as_of: DateTime<Utc>) -> Self {
        Self {
            form_id,
            rating_scale_max,
            total_submissions: 0,
            average_per_question: Vec::new(),
            overall_rating: 0.0,
            distribution: (1..=rating_scale_max)
                .map(|rating| RatingBucket { rating, count: 0 })
                .collect(),
            choice_counts: Vec::new(),
            last_updated: as_of,
        }
    }

    /// The `n` most selected options.
    pub fn top_choices(&self, n: usize) -> &[ChoiceCount] {
        &self.choice_counts[..n.min(self.choice_counts.len())]
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// The rating stored at `index`, if it is a rating on the form's scale.
pub(crate) fn valid_rating(response: &Response, index: usize, scale_max: u8) -> Option<u8> {
    match response.answers.get(&index) {
        Some(Answer::Rating(value)) if (1..=scale_max).contains(value) => Some(*value),
        _ => None,
    }
}

/// Compute analytics for `form` from `responses`.
///
/// Responses belonging to other forms are ignored. Answers whose kind does
/// not match the question, and ratings outside `1..=scale`, are skipped.
pub fn compute_form_analytics(
    form: &Form,
    responses: &[Response],
    as_of: DateTime<Utc>,
) -> FormAnalytics {
    let responses: Vec<&Response> = responses.iter().filter(|r| r.form_id == form.id).collect();
    let scale_max = form.scale_max();

    let average_per_question: Vec<QuestionAverage> = form
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let average = (question.kind == QuestionKind::Rating).then(|| {
                let values: Vec<u8> = responses
                    .iter()
                    .filter_map(|r| valid_rating(r, index, scale_max))
                    .collect();
                if values.is_empty() {
                    0.0
                } else {
                    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
                    round2(sum as f64 / values.len() as f64)
                }
            });
            QuestionAverage {
                question: question.text.clone(),
                kind: question.kind,
                average,
            }
        })
        .collect();

    // Empty rating questions contribute their 0 average here.
    let rating_averages: Vec<f64> = average_per_question
        .iter()
        .filter(|q| q.kind == QuestionKind::Rating)
        .filter_map(|q| q.average)
        .collect();
    let overall_rating = if rating_averages.is_empty() {
        0.0
    } else {
        round2(rating_averages.iter().sum::<f64>() / rating_averages.len() as f64)
    };

    let mut buckets = vec![0usize; usize::from(scale_max)];
    for response in &responses {
        for (index, question) in form.questions.iter().enumerate() {
            if question.kind != QuestionKind::Rating {
                continue;
            }
            if let Some(value) = valid_rating(response, index, scale_max) {
                buckets[usize::from(value) - 1] += 1;
            }
        }
    }
    let distribution = buckets
        .into_iter()
        .enumerate()
        .map(|(i, count)| RatingBucket {
            rating: (i + 1) as u8,
            count,
        })
        .collect();

    FormAnalytics {
        form_id: form.id,
        rating_scale_max: scale_max,
        total_submissions: responses.len(),
        average_per_question,
        overall_rating,
        distribution,
        choice_counts: count_choices(form, &responses),
        last_updated: as_of,
    }
}

fn count_choices(form: &Form, responses: &[&Response]) -> Vec<ChoiceCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for response in responses {
        for (index, question) in form.questions.iter().enumerate() {
            let selected: Vec<&str> = match (question.kind, response.answers.get(&index)) {
                (QuestionKind::SingleChoice, Some(Answer::SingleChoice(option))) => {
                    vec![option.as_str()]
                }
                (QuestionKind::MultiChoice, Some(Answer::MultiChoice(options))) => {
                    options.iter().map(String::as_str).collect()
                }
                _ => continue,
            };
            for option in selected.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
                *counts.entry(option.to_string()).or_default() += 1;
            }
        }
    }
    sort_counts(counts)
}

/// Most frequent first, ties broken alphabetically.
pub(crate) fn sort_counts(counts: HashMap<String, usize>) -> Vec<ChoiceCount> {
    let mut out: Vec<ChoiceCount> = counts
        .into_iter()
        .map(|(option, count)| ChoiceCount { option, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.option.cmp(&b.option)));
    out
}

/// Rebuild the analytics of every form.
pub fn compute_all(
    forms: &[Form],
    responses: &[Response],
    as_of: DateTime<Utc>,
) -> AnalyticsByForm {
    let mut by_form: HashMap<FormId, Vec<Response>> = HashMap::new();
    for response in responses {
        by_form
            .entry(response.form_id)
            .or_default()
            .push(response.clone());
    }

    forms
        .iter()
        .map(|form| {
            let form_responses = by_form.get(&form.id).map(Vec::as_slice).unwrap_or(&[]);
            (form.id, compute_form_analytics(form, form_responses, as_of))
        })
        .collect()
}
