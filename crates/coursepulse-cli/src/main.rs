//! coursepulse CLI — course feedback forms, responses, and analytics.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "coursepulse", version, about = "Course feedback forms and analytics")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the config file and COURSEPULSE_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and prepare the data directory
    Init,

    /// Register, log in, and list accounts
    #[command(subcommand)]
    User(commands::users::UserCommand),

    /// Manage faculty accounts (admin)
    #[command(subcommand)]
    Faculty(commands::users::FacultyCommand),

    /// Author, publish, list, and delete forms
    #[command(subcommand)]
    Form(commands::forms::FormCommand),

    /// Submit answers to a published form
    Submit {
        /// Form id
        #[arg(long)]
        form: u64,

        /// Submitter email
        #[arg(long)]
        email: String,

        /// Answer as QUESTION=VALUE, numbering questions from 1
        /// (multi-choice values are separated by '|')
        #[arg(long = "answer", value_name = "QUESTION=VALUE")]
        answers: Vec<String>,
    },

    /// Show and rebuild analytics
    #[command(subcommand)]
    Analytics(commands::analytics::AnalyticsCommand),

    /// Inspect submitted responses
    #[command(subcommand)]
    Responses(commands::responses::ResponsesCommand),
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("coursepulse=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli.global),
        Commands::User(cmd) => commands::users::execute_user(&cli.global, cmd),
        Commands::Faculty(cmd) => commands::users::execute_faculty(&cli.global, cmd),
        Commands::Form(cmd) => commands::forms::execute(&cli.global, cmd),
        Commands::Submit {
            form,
            email,
            answers,
        } => commands::submit::execute(&cli.global, form, email, answers),
        Commands::Analytics(cmd) => commands::analytics::execute(&cli.global, cmd),
        Commands::Responses(cmd) => commands::responses::execute(&cli.global, cmd),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
