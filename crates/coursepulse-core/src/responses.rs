//! Response log operations. Responses are only ever appended, or removed
//! together with their form.

use uuid::Uuid;

use crate::error::{FeedbackError, Result};
use crate::model::{Answers, FormId, Response, RESPONSE_SCHEMA_VERSION};
use crate::service::FeedbackService;
use crate::store::KeyValueStore;
use crate::validation;

impl<S: KeyValueStore> FeedbackService<S> {
    /// Record `email`'s answers to a published form.
    ///
    /// Each submitter may answer a form once.
    pub fn submit(&mut self, form_id: FormId, email: &str, answers: Answers) -> Result<Response> {
        let email = email.trim().to_lowercase();
        let forms = self.repo.forms()?;
        let form = forms
            .iter()
            .find(|f| f.id == form_id)
            .ok_or(FeedbackError::FormNotFound(form_id))?;
        if !form.published {
            return Err(FeedbackError::FormNotPublished(form_id));
        }

        let mut responses = self.repo.responses_for(&forms)?;
        if responses
            .iter()
            .any(|r| r.form_id == form_id && r.submitted_by.eq_ignore_ascii_case(&email))
        {
            return Err(FeedbackError::AlreadySubmitted { form_id, email });
        }
        validation::check_answers(&form.questions, &answers, form.scale_max())?;

        let response = Response {
            schema_version: RESPONSE_SCHEMA_VERSION,
            id: Uuid::new_v4(),
            form_id,
            submitted_by: email,
            answers,
            submitted_at: Some(self.clock.now()),
        };
        responses.push(response.clone());
        self.repo.save_responses(&responses)?;
        tracing::info!(form_id = %form_id, submitted_by = %response.submitted_by, "response recorded");

        self.refresh_analytics()?;
        Ok(response)
    }

    /// Whether `email` already answered the form.
    pub fn has_submitted(&self, form_id: FormId, email: &str) -> Result<bool> {
        let email = email.trim();
        Ok(self
            .repo
            .responses()?
            .iter()
            .any(|r| r.form_id == form_id && r.submitted_by.eq_ignore_ascii_case(email)))
    }

    pub fn list_by_form(&self, form_id: FormId) -> Result<Vec<Response>> {
        Ok(self
            .repo
            .responses()?
            .into_iter()
            .filter(|r| r.form_id == form_id)
            .collect())
    }

    pub fn list_by_submitter(&self, email: &str) -> Result<Vec<Response>> {
        let email = email.trim();
        Ok(self
            .repo
            .responses()?
            .into_iter()
            .filter(|r| r.submitted_by.eq_ignore_ascii_case(email))
            .collect())
    }

    /// Every response, oldest first.
    pub fn list_responses(&self) -> Result<Vec<Response>> {
        Ok(self.repo.responses()?)
    }
}
