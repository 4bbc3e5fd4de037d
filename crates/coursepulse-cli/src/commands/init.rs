//! The `coursepulse init` command.

use std::path::Path;

use anyhow::Result;

use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    if global.config.is_none() {
        if Path::new("coursepulse.toml").exists() {
            println!("coursepulse.toml already exists, skipping.");
        } else {
            std::fs::write("coursepulse.toml", SAMPLE_CONFIG)?;
            println!("Created coursepulse.toml");
        }
    }

    let (service, report) = super::open_service_with_report(global)?;
    let data_dir = service.into_store().dir().display().to_string();
    println!("Data directory: {data_dir}");
    if report.seeded_users > 0 || report.repaired_users > 0 {
        println!(
            "Demo accounts: {} added, {} repaired",
            report.seeded_users, report.repaired_users
        );
    }
    if !report.migrated.is_empty() {
        println!(
            "Migrated {} legacy form(s) and {} legacy response(s)",
            report.migrated.forms, report.migrated.responses
        );
    }
    if let Some(forms) = report.analyzed_forms {
        println!("Analytics rebuilt for {forms} form(s)");
    }

    println!("\nNext steps:");
    println!("  1. Log in: coursepulse user login --email admin@college.edu --password Admin@123");
    println!("  2. Create a form: coursepulse form create --template \"Course Feedback\" --course \"CS 220\" --publish");
    println!("  3. Submit feedback: coursepulse submit --form <ID> --email student1@college.edu --answer 1=5");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# coursepulse configuration

# Where the JSON collections live. COURSEPULSE_DATA_DIR overrides this.
data_dir = "./coursepulse-data"

# Rating scale for forms started from a template (2-10).
rating_scale_max = 5

# Domains accepted at self-registration. An empty list accepts any domain.
allowed_email_domains = ["gmail.com", "yahoo.com", "outlook.com", "kluniversity.in", "klu.ac.in"]

# Keep the demo admin, faculty, and student accounts present.
seed_demo_accounts = true
"#;
