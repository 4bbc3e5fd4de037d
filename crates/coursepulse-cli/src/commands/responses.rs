//! The `coursepulse responses` commands.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use coursepulse_core::model::FormId;

use crate::GlobalArgs;

#[derive(Subcommand)]
pub enum ResponsesCommand {
    /// List responses with their ratings and selections
    List {
        /// Only responses to this form
        #[arg(long)]
        form: Option<u64>,

        /// Only responses by this email
        #[arg(long)]
        by: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Whether an email has answered a form
    Check {
        #[arg(long)]
        form: u64,

        #[arg(long)]
        email: String,
    },
}

pub fn execute(global: &GlobalArgs, command: ResponsesCommand) -> Result<()> {
    let service = super::open_service(global)?;

    match command {
        ResponsesCommand::List { form, by, json } => {
            let mut digests = service.response_digests(form.map(FormId))?;
            if let Some(email) = &by {
                let email = email.trim();
                digests.retain(|d| d.submitted_by.eq_ignore_ascii_case(email));
            }
            if json {
                return super::print_json(&digests);
            }
            if digests.is_empty() {
                println!("No responses found.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["Form", "Submitted By", "Ratings", "Selections", "Comments", "Submitted"]);
            for digest in &digests {
                let ratings: Vec<String> = digest.ratings.iter().map(u8::to_string).collect();
                table.add_row(vec![
                    Cell::new(digest.form_id),
                    Cell::new(&digest.submitted_by),
                    Cell::new(ratings.join(", ")),
                    Cell::new(digest.selections.join(", ")),
                    Cell::new(digest.comments.join(" / ")),
                    Cell::new(
                        digest
                            .submitted_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "-".into()),
                    ),
                ]);
            }
            println!("{table}");
        }
        ResponsesCommand::Check { form, email } => {
            if service.has_submitted(FormId(form), &email)? {
                println!("{email} has submitted feedback for form {form}.");
            } else {
                println!("{email} has not submitted feedback for form {form}.");
            }
        }
    }

    Ok(())
}
