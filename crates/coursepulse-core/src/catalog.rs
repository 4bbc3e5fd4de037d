//! Form catalog operations: authoring, publishing, deleting and listing forms.

use crate::error::{FeedbackError, Result};
use crate::model::{Form, FormDraft, FormId, Question};
use crate::service::FeedbackService;
use crate::store::KeyValueStore;
use crate::templates;
use crate::validation;

/// What a form deletion removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Deletion {
    pub form: Form,
    pub removed_responses: usize,
}

impl<S: KeyValueStore> FeedbackService<S> {
    /// Validate `draft` and store it as a new form.
    pub fn create_form(&mut self, draft: FormDraft) -> Result<Form> {
        validation::check_draft(&draft)?;

        let mut forms = self.repo.forms()?;
        let now = self.clock.now();
        let next_free = forms.iter().map(|f| f.id.0 + 1).max().unwrap_or(0);
        let id = FormId(self.now_millis().max(next_free));

        let form = Form {
            id,
            course: draft.course.trim().to_string(),
            instructor: draft.instructor.trim().to_string(),
            created_by: draft
                .created_by
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
            description: draft.description.trim().to_string(),
            published: draft.published,
            rating_scale_max: draft.rating_scale_max,
            assigned_faculty_emails: dedupe_emails(&draft.assigned_faculty_emails),
            questions: draft.questions.into_iter().map(tidy_question).collect(),
            created_at: Some(now),
        };
        forms.push(form.clone());
        self.repo.save_forms(&forms)?;
        tracing::info!(form_id = %form.id, course = %form.course, "form created");

        self.refresh_analytics()?;
        Ok(form)
    }

    /// Build a draft from a built-in template, or `None` for an unknown name.
    pub fn draft_from_template(&self, name: &str) -> Option<FormDraft> {
        templates::find_template(name).map(|template| FormDraft {
            rating_scale_max: self.policy.rating_scale_max,
            ..template.to_draft()
        })
    }

    /// Remove a form together with all of its responses.
    pub fn delete_form(&mut self, form_id: FormId) -> Result<Deletion> {
        let mut forms = self.repo.forms()?;
        let position = forms
            .iter()
            .position(|f| f.id == form_id)
            .ok_or(FeedbackError::FormNotFound(form_id))?;
        let responses = self.repo.responses_for(&forms)?;

        let form = forms.remove(position);
        let (removed, kept): (Vec<_>, Vec<_>) =
            responses.into_iter().partition(|r| r.form_id == form_id);

        self.repo.save_forms(&forms)?;
        self.repo.save_responses(&kept)?;
        tracing::info!(
            form_id = %form_id,
            responses = removed.len(),
            "form deleted"
        );

        self.refresh_analytics()?;
        Ok(Deletion {
            form,
            removed_responses: removed.len(),
        })
    }

    /// Open a form to students, or take it back to draft.
    pub fn set_published(&mut self, form_id: FormId, published: bool) -> Result<Form> {
        let mut forms = self.repo.forms()?;
        let form = forms
            .iter_mut()
            .find(|f| f.id == form_id)
            .ok_or(FeedbackError::FormNotFound(form_id))?;
        form.published = published;
        let updated = form.clone();
        self.repo.save_forms(&forms)?;
        tracing::info!(form_id = %form_id, published, "form publication changed");

        self.refresh_analytics()?;
        Ok(updated)
    }

    pub fn form(&self, form_id: FormId) -> Result<Form> {
        self.repo
            .forms()?
            .into_iter()
            .find(|f| f.id == form_id)
            .ok_or(FeedbackError::FormNotFound(form_id))
    }

    pub fn list_forms(&self) -> Result<Vec<Form>> {
        Ok(self.repo.forms()?)
    }

    /// Forms students can answer.
    pub fn list_published(&self) -> Result<Vec<Form>> {
        Ok(self
            .repo
            .forms()?
            .into_iter()
            .filter(|f| f.published)
            .collect())
    }

    /// Forms whose assigned faculty include `email`.
    pub fn list_assigned_to(&self, email: &str) -> Result<Vec<Form>> {
        let email = email.trim();
        Ok(self
            .repo
            .forms()?
            .into_iter()
            .filter(|f| f.is_assigned_to(email))
            .collect())
    }
}

/// Lower-case, trim, drop blanks and repeats; first occurrence wins.
pub(crate) fn dedupe_emails(emails: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(emails.len());
    for email in emails {
        let email = email.trim().to_lowercase();
        if !email.is_empty() && !out.contains(&email) {
            out.push(email);
        }
    }
    out
}

fn tidy_question(question: Question) -> Question {
    let options = if question.kind.is_choice() {
        question
            .options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect()
    } else {
        Vec::new()
    };
    Question {
        text: question.text.trim().to_string(),
        kind: question.kind,
        options,
    }
}
