//! The `coursepulse form` commands.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};

use coursepulse_core::model::{Form, FormDraft, FormId};
use coursepulse_core::parser;
use coursepulse_core::templates::builtin_templates;

use crate::GlobalArgs;

#[derive(Subcommand)]
pub enum FormCommand {
    /// List the built-in templates
    Templates,

    /// Create a form from a TOML file or a template
    Create {
        /// Form definition file
        #[arg(long, conflicts_with = "template")]
        file: Option<PathBuf>,

        /// Built-in template name
        #[arg(long)]
        template: Option<String>,

        /// Course name (overrides the file)
        #[arg(long)]
        course: Option<String>,

        #[arg(long)]
        instructor: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Author email
        #[arg(long)]
        created_by: Option<String>,

        /// Assign a faculty email (repeatable)
        #[arg(long = "assign", value_name = "EMAIL")]
        assign: Vec<String>,

        /// Rating scale maximum (2-10)
        #[arg(long)]
        scale: Option<u8>,

        /// Publish immediately
        #[arg(long)]
        publish: bool,
    },

    /// Check a form definition file without creating it
    Validate {
        #[arg(long)]
        file: PathBuf,
    },

    /// List forms
    List {
        /// Only published forms
        #[arg(long)]
        published: bool,

        /// Only forms assigned to this faculty email
        #[arg(long)]
        assigned_to: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a form and its questions
    Show { id: u64 },

    /// Publish a form, or take it back to draft with --unpublish
    Publish {
        id: u64,

        #[arg(long)]
        unpublish: bool,
    },

    /// Delete a form and all of its responses
    Delete { id: u64 },
}

pub fn execute(global: &GlobalArgs, command: FormCommand) -> Result<()> {
    let mut service = super::open_service(global)?;

    match command {
        FormCommand::Templates => {
            let mut table = Table::new();
            table.set_header(vec!["Template", "Questions", "Description"]);
            for template in builtin_templates() {
                table.add_row(vec![
                    Cell::new(template.name),
                    Cell::new(template.questions.len()),
                    Cell::new(template.description),
                ]);
            }
            println!("{table}");
        }
        FormCommand::Create {
            file,
            template,
            course,
            instructor,
            description,
            created_by,
            assign,
            scale,
            publish,
        } => {
            let mut draft = match (file, template) {
                (Some(path), _) => parser::parse_form_file(&path)?,
                (None, Some(name)) => match service.draft_from_template(&name) {
                    Some(draft) => draft,
                    None => bail!("unknown template: {name} (see `coursepulse form templates`)"),
                },
                (None, None) => bail!("either --file or --template is required"),
            };
            apply_overrides(
                &mut draft,
                course,
                instructor,
                description,
                created_by,
                assign,
                scale,
                publish,
            );
            for warning in parser::lint_draft(&draft) {
                print_warning(warning.question, &warning.message);
            }

            let form = service.create_form(draft)?;
            println!(
                "Created form {} ({}){}",
                form.id,
                form.display_label(),
                if form.published { ", published" } else { "" }
            );
        }
        FormCommand::Validate { file } => {
            let draft = parser::parse_form_file(&file)?;
            coursepulse_core::validation::check_draft(&draft)?;
            let warnings = parser::lint_draft(&draft);
            println!("Form: {} ({} questions)", draft.course, draft.questions.len());
            for warning in &warnings {
                print_warning(warning.question, &warning.message);
            }
            if warnings.is_empty() {
                println!("Form definition valid.");
            } else {
                println!("\n{} warning(s) found.", warnings.len());
            }
        }
        FormCommand::List {
            published,
            assigned_to,
            json,
        } => {
            let mut forms = match &assigned_to {
                Some(email) => service.list_assigned_to(email)?,
                None => service.list_forms()?,
            };
            if published {
                forms.retain(|f| f.published);
            }
            if json {
                super::print_json(&forms)?;
            } else {
                print_forms(&forms);
            }
        }
        FormCommand::Show { id } => print_form(&service.form(FormId(id))?),
        FormCommand::Publish { id, unpublish } => {
            let form = service.set_published(FormId(id), !unpublish)?;
            let state = if form.published { "published" } else { "draft" };
            println!("Form {} is now {state}.", form.id);
        }
        FormCommand::Delete { id } => {
            let deletion = service.delete_form(FormId(id))?;
            println!(
                "Deleted form {} ({}) and {} response(s).",
                deletion.form.id,
                deletion.form.display_label(),
                deletion.removed_responses
            );
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn apply_overrides(
    draft: &mut FormDraft,
    course: Option<String>,
    instructor: Option<String>,
    description: Option<String>,
    created_by: Option<String>,
    assign: Vec<String>,
    scale: Option<u8>,
    publish: bool,
) {
    if let Some(course) = course {
        draft.course = course;
    }
    if let Some(instructor) = instructor {
        draft.instructor = instructor;
    }
    if let Some(description) = description {
        draft.description = description;
    }
    if created_by.is_some() {
        draft.created_by = created_by;
    }
    draft.assigned_faculty_emails.extend(assign);
    if let Some(scale) = scale {
        draft.rating_scale_max = scale;
    }
    draft.published |= publish;
}

fn print_warning(question: Option<usize>, message: &str) {
    match question {
        Some(index) => println!("  [Q{}] WARNING: {message}", index + 1),
        None => println!("  WARNING: {message}"),
    }
}

fn print_forms(forms: &[Form]) {
    if forms.is_empty() {
        println!("No forms found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Form", "Status", "Questions", "Scale", "Assigned"]);
    for form in forms {
        table.add_row(vec![
            Cell::new(form.id),
            Cell::new(form.display_label()),
            Cell::new(if form.published { "published" } else { "draft" }),
            Cell::new(form.questions.len()),
            Cell::new(format!("1-{}", form.scale_max())),
            Cell::new(form.assigned_faculty_emails.join(", ")),
        ]);
    }
    println!("{table}");
}

fn print_form(form: &Form) {
    println!("Form {}: {}", form.id, form.display_label());
    if !form.description.is_empty() {
        println!("{}", form.description);
    }
    println!(
        "Status: {}   Rating scale: 1-{}",
        if form.published { "published" } else { "draft" },
        form.scale_max()
    );
    if !form.assigned_faculty_emails.is_empty() {
        println!("Assigned: {}", form.assigned_faculty_emails.join(", "));
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Type", "Options"]);
    for (index, question) in form.questions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&question.text),
            Cell::new(question.kind),
            Cell::new(question.options.join(" | ")),
        ]);
    }
    println!("{table}");
}
