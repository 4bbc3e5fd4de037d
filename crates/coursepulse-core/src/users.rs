//! User directory: demo accounts, self-registration, login, and the
//! admin's faculty management.

use crate::error::{FeedbackError, Result, ValidationError};
use crate::model::{Role, User};
use crate::service::FeedbackService;
use crate::store::KeyValueStore;
use crate::validation;

/// A self-registration form as submitted.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub register_no: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Option<Role>,
    pub department: String,
}

/// An admin's request to add a faculty account.
#[derive(Debug, Clone, Default)]
pub struct NewFaculty {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
}

/// What a faculty removal changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacultyRemoval {
    pub removed_user: bool,
    /// Forms the email was unassigned from.
    pub unassigned_forms: usize,
}

/// The demo accounts present in every seeded store.
pub fn seed_users() -> Vec<User> {
    [
        ("System Admin", "admin@college.edu", "Admin@123", Role::Admin, "ADM001", "Administration"),
        ("Faculty One", "faculty1@college.edu", "Faculty@123", Role::Faculty, "FAC001", "Computer Science"),
        ("Faculty Two", "faculty2@college.edu", "Faculty@123", Role::Faculty, "FAC002", "Electronics"),
        ("Student Demo", "student1@college.edu", "Student@123", Role::Student, "STU001", "Computer Science"),
    ]
    .into_iter()
    .map(|(name, email, password, role, register_no, department)| User {
        name: name.into(),
        email: email.into(),
        password: password.into(),
        role,
        register_no: register_no.into(),
        department: department.into(),
    })
    .collect()
}

impl<S: KeyValueStore> FeedbackService<S> {
    /// Add missing demo accounts and reset the role of existing ones.
    ///
    /// Returns `(added, repaired)`.
    pub(crate) fn merge_seed_users(&mut self) -> Result<(usize, usize)> {
        let mut users = self.repo.users()?;
        let (mut added, mut repaired) = (0, 0);
        for seed in seed_users() {
            match users.iter_mut().find(|u| u.email.eq_ignore_ascii_case(&seed.email)) {
                Some(existing) if existing.role != seed.role => {
                    existing.role = seed.role;
                    repaired += 1;
                }
                Some(_) => {}
                None => {
                    users.push(seed);
                    added += 1;
                }
            }
        }
        if added + repaired > 0 {
            self.repo.save_users(&users)?;
            tracing::info!(added, repaired, "demo accounts seeded");
        }
        Ok((added, repaired))
    }

    /// Create an account from a self-registration form.
    pub fn register(&mut self, request: Registration) -> Result<User> {
        let name = request.name.trim();
        let email = request.email.trim().to_lowercase();
        let register_no = request.register_no.trim();
        if name.is_empty()
            || email.is_empty()
            || register_no.is_empty()
            || request.password.is_empty()
            || request.confirm_password.is_empty()
        {
            return Err(ValidationError::MissingFields.into());
        }
        validation::check_email(&email, &self.policy.allowed_email_domains)?;
        if request.password != request.confirm_password {
            return Err(ValidationError::PasswordMismatch.into());
        }
        validation::check_password(&request.password)?;
        let role = request.role.unwrap_or(Role::Student);
        if role == Role::Admin {
            return Err(ValidationError::RoleNotAllowed.into());
        }

        let mut users = self.repo.users()?;
        if users.iter().any(|u| {
            u.email.eq_ignore_ascii_case(&email)
                || (!u.register_no.is_empty() && u.register_no == register_no)
        }) {
            return Err(ValidationError::DuplicateUser.into());
        }

        let user = User {
            name: name.to_string(),
            email,
            password: request.password,
            role,
            register_no: register_no.to_string(),
            department: request.department.trim().to_string(),
        };
        users.push(user.clone());
        self.repo.save_users(&users)?;
        tracing::info!(email = %user.email, role = %user.role, "user registered");
        Ok(user)
    }

    /// The account matching `email` and `password`.
    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        self.repo
            .users()?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.password == password)
            .ok_or(FeedbackError::InvalidCredentials)
    }

    /// Add a faculty account with a generated register number.
    pub fn add_faculty(&mut self, request: NewFaculty) -> Result<User> {
        let email = request.email.trim().to_lowercase();
        if request.name.trim().is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(ValidationError::MissingFields.into());
        }
        if !validation::is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail.into());
        }

        let mut users = self.repo.users()?;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&email)) {
            return Err(ValidationError::DuplicateFaculty.into());
        }

        let user = User {
            name: request.name.trim().to_string(),
            email,
            password: request.password,
            role: Role::Faculty,
            register_no: format!("FAC{:06}", self.now_millis() % 1_000_000),
            department: request.department.trim().to_string(),
        };
        users.push(user.clone());
        self.repo.save_users(&users)?;
        tracing::info!(email = %user.email, register_no = %user.register_no, "faculty added");
        Ok(user)
    }

    /// Delete a faculty account and unassign it from every form.
    pub fn remove_faculty(&mut self, email: &str) -> Result<FacultyRemoval> {
        let email = email.trim().to_lowercase();

        let mut users = self.repo.users()?;
        let before = users.len();
        users.retain(|u| !(u.role == Role::Faculty && u.email.eq_ignore_ascii_case(&email)));
        let removed_user = users.len() < before;

        let mut forms = self.repo.forms()?;
        let mut unassigned_forms = 0;
        for form in &mut forms {
            let assigned = form.assigned_faculty_emails.len();
            form.assigned_faculty_emails
                .retain(|e| !e.eq_ignore_ascii_case(&email));
            if form.assigned_faculty_emails.len() < assigned {
                unassigned_forms += 1;
            }
        }

        if !removed_user && unassigned_forms == 0 {
            return Err(FeedbackError::UserNotFound(email));
        }
        self.repo.save_users(&users)?;
        self.repo.save_forms(&forms)?;
        tracing::info!(%email, unassigned_forms, "faculty removed");

        self.refresh_analytics()?;
        Ok(FacultyRemoval {
            removed_user,
            unassigned_forms,
        })
    }

    /// All users, or only those with `role`.
    pub fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        Ok(self
            .repo
            .users()?
            .into_iter()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .collect())
    }

    pub fn list_faculty(&self) -> Result<Vec<User>> {
        self.list_users(Some(Role::Faculty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormDraft;
    use crate::service::tests::{rating_draft, service};
    use crate::store::{MemoryStore, StoreKey};

    fn registration() -> Registration {
        Registration {
            name: " Asha ".into(),
            email: "Asha@Gmail.com".into(),
            register_no: "2100031001".into(),
            password: "Strong#Pass1".into(),
            confirm_password: "Strong#Pass1".into(),
            role: None,
            department: "CSE".into(),
        }
    }

    fn validation_error(err: FeedbackError) -> ValidationError {
        match err {
            FeedbackError::Validation(v) => v,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn seed_accounts_can_log_in() {
        let service = service();
        let admin = service.login("admin@college.edu", "Admin@123").unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.register_no, "ADM001");
        assert!(matches!(
            service.login("admin@college.edu", "wrong"),
            Err(FeedbackError::InvalidCredentials)
        ));
    }

    #[test]
    fn seeding_repairs_roles_and_keeps_other_users() {
        let mut store = MemoryStore::new();
        store
            .put(
                StoreKey::Users,
                r#"[{"name": "Renamed", "email": "faculty1@college.edu", "password": "x", "role": "student"},
                    {"name": "Other", "email": "other@gmail.com", "password": "y", "role": "student"}]"#,
            )
            .unwrap();
        let mut service = FeedbackService::new(store);
        let report = service.initialize().unwrap();
        assert_eq!(report.seeded_users, 3);
        assert_eq!(report.repaired_users, 1);

        let users = service.list_users(None).unwrap();
        assert_eq!(users.len(), 5);
        let faculty1 = users.iter().find(|u| u.email == "faculty1@college.edu").unwrap();
        assert_eq!(faculty1.role, Role::Faculty);
        assert_eq!(faculty1.name, "Renamed");
    }

    #[test]
    fn register_stores_normalized_user() {
        let mut service = service();
        let user = service.register(registration()).unwrap();
        assert_eq!(user.email, "asha@gmail.com");
        assert_eq!(user.name, "Asha");
        assert_eq!(user.role, Role::Student);
        assert!(service.login("ASHA@gmail.com", "Strong#Pass1").is_ok());
    }

    #[test]
    fn register_checks_in_order() {
        let mut service = service();

        let mut r = registration();
        r.register_no = " ".into();
        assert_eq!(
            validation_error(service.register(r).unwrap_err()),
            ValidationError::MissingFields
        );

        let mut r = registration();
        r.email = "asha@example.org".into();
        assert!(matches!(
            validation_error(service.register(r).unwrap_err()),
            ValidationError::EmailDomainNotAllowed { .. }
        ));

        let mut r = registration();
        r.confirm_password = "Other#Pass1".into();
        assert_eq!(
            validation_error(service.register(r).unwrap_err()),
            ValidationError::PasswordMismatch
        );

        let mut r = registration();
        r.password = "weakpass".into();
        r.confirm_password = "weakpass".into();
        assert_eq!(
            validation_error(service.register(r).unwrap_err()),
            ValidationError::WeakPassword(vec![
                "1 uppercase letter",
                "1 number",
                "1 special character"
            ])
        );

        let mut r = registration();
        r.role = Some(Role::Admin);
        assert_eq!(
            validation_error(service.register(r).unwrap_err()),
            ValidationError::RoleNotAllowed
        );
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut service = service();
        service.register(registration()).unwrap();

        let mut same_email = registration();
        same_email.register_no = "999".into();
        assert_eq!(
            validation_error(service.register(same_email).unwrap_err()),
            ValidationError::DuplicateUser
        );

        let mut same_register_no = registration();
        same_register_no.email = "other@gmail.com".into();
        assert_eq!(
            validation_error(service.register(same_register_no).unwrap_err()),
            ValidationError::DuplicateUser
        );
    }

    #[test]
    fn add_faculty_generates_register_number() {
        let mut service = service();
        let user = service
            .add_faculty(NewFaculty {
                name: "Dr. Rao".into(),
                email: "Rao@College.edu".into(),
                password: "Faculty@123".into(),
                department: " Physics ".into(),
            })
            .unwrap();
        // 1_709_283_600_000 ms
        assert_eq!(user.register_no, "FAC600000");
        assert_eq!(user.email, "rao@college.edu");
        assert_eq!(user.department, "Physics");
        assert_eq!(service.list_faculty().unwrap().len(), 3);

        let err = service
            .add_faculty(NewFaculty {
                name: "Again".into(),
                email: "rao@college.edu".into(),
                password: "x".into(),
                department: String::new(),
            })
            .unwrap_err();
        assert_eq!(validation_error(err), ValidationError::DuplicateFaculty);
    }

    #[test]
    fn remove_faculty_unassigns_forms() {
        let mut service = service();
        let draft = FormDraft {
            assigned_faculty_emails: vec![
                "faculty1@college.edu".into(),
                "faculty2@college.edu".into(),
            ],
            ..rating_draft("CS 220")
        };
        let form = service.create_form(draft).unwrap();

        let removal = service.remove_faculty("Faculty1@college.edu").unwrap();
        assert_eq!(
            removal,
            FacultyRemoval {
                removed_user: true,
                unassigned_forms: 1
            }
        );
        assert_eq!(
            service.form(form.id).unwrap().assigned_faculty_emails,
            ["faculty2@college.edu"]
        );
        assert!(service.login("faculty1@college.edu", "Faculty@123").is_err());
        assert!(matches!(
            service.remove_faculty("faculty1@college.edu"),
            Err(FeedbackError::UserNotFound(_))
        ));
    }

    #[test]
    fn remove_faculty_leaves_other_roles() {
        let mut service = service();
        assert!(matches!(
            service.remove_faculty("student1@college.edu"),
            Err(FeedbackError::UserNotFound(_))
        ));
        assert_eq!(service.list_users(Some(Role::Student)).unwrap().len(), 1);
    }
}
