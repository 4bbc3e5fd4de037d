//! The `coursepulse analytics` commands.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use coursepulse_core::analytics::FormAnalytics;
use coursepulse_core::model::FormId;
use coursepulse_core::summary::TOP_ISSUES;

use crate::GlobalArgs;

#[derive(Subcommand)]
pub enum AnalyticsCommand {
    /// Show cached analytics for every form, or one form in detail
    Show {
        #[arg(long)]
        form: Option<u64>,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Rebuild the analytics cache from all forms and responses
    Refresh,

    /// Aggregated results over all responses (or one form's)
    Student {
        #[arg(long)]
        form: Option<u64>,

        #[arg(long)]
        json: bool,
    },

    /// Published forms a student has answered and still has pending
    Progress {
        #[arg(long)]
        email: String,

        #[arg(long)]
        json: bool,
    },

    /// Overview of the forms assigned to a faculty member
    Faculty {
        #[arg(long)]
        email: String,

        #[arg(long)]
        json: bool,
    },
}

pub fn execute(global: &GlobalArgs, command: AnalyticsCommand) -> Result<()> {
    let mut service = super::open_service(global)?;

    match command {
        AnalyticsCommand::Show {
            form: Some(id),
            json,
        } => {
            let analytics = service.analytics_for(FormId(id))?;
            if json {
                return super::print_json(&analytics);
            }
            let label = service
                .form(FormId(id))
                .map(|f| f.display_label())
                .unwrap_or_else(|_| format!("Form {id}"));
            print_detail(&label, &analytics);
        }
        AnalyticsCommand::Show { form: None, json } => {
            let all = service.analytics_by_form()?;
            if json {
                return super::print_json(&all);
            }
            if all.is_empty() {
                println!("No forms yet.");
                return Ok(());
            }
            let forms = service.list_forms()?;
            let mut table = Table::new();
            table.set_header(vec!["ID", "Form", "Submissions", "Overall", "Updated"]);
            for (id, analytics) in &all {
                let label = forms
                    .iter()
                    .find(|f| f.id == *id)
                    .map(|f| f.display_label())
                    .unwrap_or_else(|| format!("Form {id}"));
                table.add_row(vec![
                    Cell::new(id),
                    Cell::new(label),
                    Cell::new(analytics.total_submissions),
                    Cell::new(format!(
                        "{:.2} / {}",
                        analytics.overall_rating, analytics.rating_scale_max
                    )),
                    Cell::new(analytics.last_updated.format("%Y-%m-%d %H:%M")),
                ]);
            }
            println!("{table}");
        }
        AnalyticsCommand::Refresh => {
            let all = service.refresh_analytics()?;
            println!("Analytics rebuilt for {} form(s).", all.len());
        }
        AnalyticsCommand::Student { form, json } => {
            let overview = service.student_overview(form.map(FormId))?;
            if json {
                return super::print_json(&overview);
            }
            println!("Total responses: {}", overview.total_responses);
            match overview.average_rating {
                Some(avg) => println!("Average rating: {avg:.1}"),
                None => println!("Average rating: N/A"),
            }
            if overview.issue_counts.is_empty() {
                println!("No issues reported.");
            } else {
                println!("Top {TOP_ISSUES} issues:");
                for issue in overview.top_issues() {
                    println!("  {} ({})", issue.option, issue.count);
                }
            }
        }
        AnalyticsCommand::Progress { email, json } => {
            let progress = service.student_progress(&email)?;
            if json {
                return super::print_json(&progress);
            }
            println!("Student: {}", progress.email);
            println!("Available forms: {}", progress.total_forms);
            println!("Submitted: {}", progress.submitted);
            println!("Pending: {}", progress.pending);
        }
        AnalyticsCommand::Faculty { email, json } => {
            let overview = service.faculty_overview(&email)?;
            if json {
                return super::print_json(&overview);
            }
            println!("Faculty: {}", overview.email);
            println!("Assigned forms: {}", overview.assigned_forms);
            println!("Responses: {}", overview.total_responses);
            println!("Average rating: {:.2}", overview.average_rating);
        }
    }

    Ok(())
}

fn print_detail(label: &str, analytics: &FormAnalytics) {
    println!("{label}");
    println!(
        "Submissions: {}   Overall rating: {:.2} / {}",
        analytics.total_submissions, analytics.overall_rating, analytics.rating_scale_max
    );

    if !analytics.average_per_question.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["#", "Question", "Type", "Average"]);
        for (index, q) in analytics.average_per_question.iter().enumerate() {
            table.add_row(vec![
                Cell::new(index + 1),
                Cell::new(&q.question),
                Cell::new(q.kind),
                Cell::new(q.average.map_or_else(|| "-".into(), |a| format!("{a:.2}"))),
            ]);
        }
        println!("{table}");
    }

    let mut table = Table::new();
    table.set_header(vec!["Rating", "Count"]);
    for bucket in &analytics.distribution {
        table.add_row(vec![Cell::new(bucket.label()), Cell::new(bucket.count)]);
    }
    println!("{table}");

    if !analytics.choice_counts.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Option", "Selected"]);
        for choice in &analytics.choice_counts {
            table.add_row(vec![Cell::new(&choice.option), Cell::new(choice.count)]);
        }
        println!("{table}");
    }
}
