//! The `coursepulse submit` command.

use anyhow::{anyhow, bail, Context, Result};

use coursepulse_core::model::{Answer, Answers, Form, FormId};

use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, form_id: u64, email: String, raw: Vec<String>) -> Result<()> {
    let mut service = super::open_service(global)?;
    let form = service.form(FormId(form_id))?;
    let answers = parse_answers(&form, &raw)?;

    let response = service.submit(form.id, &email, answers)?;
    println!(
        "Feedback for {} recorded ({} answer(s)).",
        form.display_label(),
        response.answers.len()
    );
    Ok(())
}

/// Parse `N=value` pairs, numbering questions from 1.
fn parse_answers(form: &Form, raw: &[String]) -> Result<Answers> {
    let mut answers = Answers::new();
    for pair in raw {
        let (number, value) = pair
            .split_once('=')
            .with_context(|| format!("answer '{pair}' should look like QUESTION=VALUE"))?;
        let number: usize = number
            .trim()
            .parse()
            .with_context(|| format!("'{}' is not a question number", number.trim()))?;
        let Some(question) = number.checked_sub(1).and_then(|i| form.questions.get(i)) else {
            bail!(
                "question {number} does not exist (form {} has {} questions)",
                form.id,
                form.questions.len()
            );
        };
        let answer = Answer::parse_for(question.kind, value)
            .map_err(|e| anyhow!("question {number}: {e}"))?;
        if answers.insert(number - 1, answer).is_some() {
            bail!("question {number} answered more than once");
        }
    }
    Ok(answers)
}
