//! The key-value store seam and the typed collections on top of it.
//!
//! The store holds four JSON documents under fixed keys. [`Repository`]
//! reads and writes them as typed collections, upgrading legacy records
//! on the way in so nothing downstream has to branch on record shape.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::analytics::AnalyticsByForm;
use crate::error::StoreError;
use crate::migrate::{self, MigrationReport};
use crate::model::{Form, Response, User};

/// The fixed keys of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Users,
    Forms,
    Responses,
    Analytics,
}

impl StoreKey {
    pub const ALL: [StoreKey; 4] = [
        StoreKey::Users,
        StoreKey::Forms,
        StoreKey::Responses,
        StoreKey::Analytics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Users => "users",
            StoreKey::Forms => "forms",
            StoreKey::Responses => "responses",
            StoreKey::Analytics => "analyticsByForm",
        }
    }

    /// JSON written when the key is first created.
    pub fn empty_document(self) -> &'static str {
        match self {
            StoreKey::Analytics => "{}",
            _ => "[]",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for backends holding the raw JSON documents.
pub trait KeyValueStore {
    /// Raw document under `key`, or `None` if it was never written.
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError>;

    /// Replace the document under `key`.
    fn put(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError>;
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<StoreKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(&key).cloned())
    }

    fn put(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key, value.to_string());
        Ok(())
    }
}

/// Typed access to the four collections.
pub struct Repository<S> {
    store: S,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Whether `key` has ever been written.
    pub fn contains(&self, key: StoreKey) -> Result<bool, StoreError> {
        Ok(self.store.get(key)?.is_some())
    }

    /// Write the empty document under `key` if it is missing.
    pub fn ensure(&mut self, key: StoreKey) -> Result<(), StoreError> {
        if !self.contains(key)? {
            self.store.put(key, key.empty_document())?;
        }
        Ok(())
    }

    pub fn users(&self) -> Result<Vec<User>, StoreError> {
        self.read_list(StoreKey::Users)
    }

    pub fn save_users(&mut self, users: &[User]) -> Result<(), StoreError> {
        self.write(StoreKey::Users, &users)
    }

    /// All forms, with legacy forms upgraded.
    pub fn forms(&self) -> Result<Vec<Form>, StoreError> {
        let mut forms: Vec<Form> = self.read_list(StoreKey::Forms)?;
        for form in &mut forms {
            migrate::upgrade_form(form);
        }
        Ok(forms)
    }

    pub fn save_forms(&mut self, forms: &[Form]) -> Result<(), StoreError> {
        self.write(StoreKey::Forms, &forms)
    }

    /// All responses, with legacy records upgraded against `forms`.
    pub fn responses_for(&self, forms: &[Form]) -> Result<Vec<Response>, StoreError> {
        let raw = self.read_array(StoreKey::Responses)?;
        Ok(migrate::upgrade_responses(raw, forms))
    }

    /// All responses, loading the forms needed to upgrade legacy records.
    pub fn responses(&self) -> Result<Vec<Response>, StoreError> {
        let forms = self.forms()?;
        self.responses_for(&forms)
    }

    pub fn save_responses(&mut self, responses: &[Response]) -> Result<(), StoreError> {
        self.write(StoreKey::Responses, &responses)
    }

    /// Rewrite legacy forms and responses in the current schema.
    ///
    /// Nothing is written when every record is already current.
    pub fn migrate(&mut self) -> Result<MigrationReport, StoreError> {
        let mut forms: Vec<Form> = self.read_list(StoreKey::Forms)?;
        let mut report = MigrationReport::default();
        for form in &mut forms {
            if migrate::upgrade_form(form) {
                report.forms += 1;
            }
        }

        let raw = self.read_array(StoreKey::Responses)?;
        report.responses = raw.iter().filter(|r| !migrate::is_current(r)).count();

        if !report.is_empty() {
            let responses = migrate::upgrade_responses(raw, &forms);
            self.save_forms(&forms)?;
            self.save_responses(&responses)?;
            tracing::info!(
                forms = report.forms,
                responses = report.responses,
                "migrated legacy records"
            );
        }
        Ok(report)
    }

    pub fn analytics(&self) -> Result<AnalyticsByForm, StoreError> {
        match self.read_value(StoreKey::Analytics)? {
            Some(value) => match serde_json::from_value(value) {
                Ok(map) => Ok(map),
                Err(e) => {
                    tracing::warn!("discarding unreadable analytics cache: {e}");
                    Ok(AnalyticsByForm::new())
                }
            },
            None => Ok(AnalyticsByForm::new()),
        }
    }

    pub fn save_analytics(&mut self, analytics: &AnalyticsByForm) -> Result<(), StoreError> {
        self.write(StoreKey::Analytics, analytics)
    }

    /// Parsed document under `key`. Unparseable JSON reads as absent.
    fn read_value(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("store key '{key}' holds invalid JSON, reading as empty: {e}");
                Ok(None)
            }
        }
    }

    fn read_array(&self, key: StoreKey) -> Result<Vec<Value>, StoreError> {
        match self.read_value(key)? {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => {
                tracing::warn!(
                    "store key '{key}' should hold a list, found {}",
                    json_kind(&other)
                );
                Ok(Vec::new())
            }
        }
    }

    /// Records of a list document; unreadable records are skipped.
    fn read_list<T: DeserializeOwned>(&self, key: StoreKey) -> Result<Vec<T>, StoreError> {
        let items = self.read_array(key)?;
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value(item) {
                Ok(record) => out.push(record),
                Err(e) => tracing::warn!("skipping unreadable {key} record #{index}: {e}"),
            }
        }
        Ok(out)
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: StoreKey, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.store.put(key, &json)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
