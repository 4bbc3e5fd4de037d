//! The `coursepulse user` and `coursepulse faculty` commands.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use coursepulse_core::model::{Role, User};
use coursepulse_core::users::{NewFaculty, Registration};

use crate::GlobalArgs;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a student or faculty account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Register number (unique)
        #[arg(long)]
        register_no: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// student or faculty
        #[arg(long, default_value = "student")]
        role: Role,
        #[arg(long, default_value = "")]
        department: String,
    },

    /// Check credentials and show the account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// List accounts
    List {
        /// Only accounts with this role
        #[arg(long)]
        role: Option<Role>,
    },
}

#[derive(Subcommand)]
pub enum FacultyCommand {
    /// Add a faculty account
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        department: String,
    },

    /// Remove a faculty account and unassign it from every form
    Remove {
        #[arg(long)]
        email: String,
    },

    /// List faculty accounts
    List,
}

pub fn execute_user(global: &GlobalArgs, command: UserCommand) -> Result<()> {
    let mut service = super::open_service(global)?;

    match command {
        UserCommand::Register {
            name,
            email,
            register_no,
            password,
            confirm_password,
            role,
            department,
        } => {
            let user = service.register(Registration {
                name,
                email,
                register_no,
                password,
                confirm_password,
                role: Some(role),
                department,
            })?;
            println!("Registered {} as {}.", user.email, user.role);
        }
        UserCommand::Login { email, password } => {
            let user = service.login(&email, &password)?;
            println!("Welcome, {} ({}).", display_name(&user), user.role);
        }
        UserCommand::List { role } => print_users(&service.list_users(role)?),
    }

    Ok(())
}

pub fn execute_faculty(global: &GlobalArgs, command: FacultyCommand) -> Result<()> {
    let mut service = super::open_service(global)?;

    match command {
        FacultyCommand::Add {
            name,
            email,
            password,
            department,
        } => {
            let user = service.add_faculty(NewFaculty {
                name,
                email,
                password,
                department,
            })?;
            println!("Added faculty {} ({}).", user.email, user.register_no);
        }
        FacultyCommand::Remove { email } => {
            let removal = service.remove_faculty(&email)?;
            if removal.removed_user {
                println!("Removed faculty {}.", email.trim().to_lowercase());
            }
            println!("Unassigned from {} form(s).", removal.unassigned_forms);
        }
        FacultyCommand::List => print_users(&service.list_faculty()?),
    }

    Ok(())
}

fn display_name(user: &User) -> &str {
    if user.name.trim().is_empty() {
        &user.email
    } else {
        &user.name
    }
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Email", "Role", "Register No", "Department"]);
    for user in users {
        table.add_row(vec![
            Cell::new(&user.name),
            Cell::new(&user.email),
            Cell::new(user.role),
            Cell::new(&user.register_no),
            Cell::new(&user.department),
        ]);
    }
    println!("{table}");
}
