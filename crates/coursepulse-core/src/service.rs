//! The feedback service: one entry point over the store for every
//! operation the dashboards and the CLI perform.
//!
//! Operations are split by concern across [`catalog`](crate::catalog),
//! [`responses`](crate::responses), [`users`](crate::users) and
//! [`summary`](crate::summary); each adds an `impl` block to
//! [`FeedbackService`]. Every mutation of forms or responses ends with a
//! full analytics rebuild; opening the store leaves the cache alone unless
//! it is missing or a migration rewrote records.

use std::sync::Arc;

use crate::analytics::{self, AnalyticsByForm, FormAnalytics};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::migrate::MigrationReport;
use crate::model::{FormId, DEFAULT_RATING_SCALE_MAX};
use crate::store::{KeyValueStore, Repository, StoreKey};
use crate::validation::DEFAULT_ALLOWED_DOMAINS;

/// Tunables that the configuration file controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Domains accepted at self-registration. Empty accepts any domain.
    pub allowed_email_domains: Vec<String>,
    /// Rating scale given to drafts built from templates.
    pub rating_scale_max: u8,
    /// Whether `initialize` seeds and repairs the demo accounts.
    pub seed_demo_accounts: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allowed_email_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            rating_scale_max: DEFAULT_RATING_SCALE_MAX,
            seed_demo_accounts: true,
        }
    }
}

/// What `initialize` changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Seed accounts that were added.
    pub seeded_users: usize,
    /// Existing seed accounts whose role was reset.
    pub repaired_users: usize,
    pub migrated: MigrationReport,
    /// Forms with a freshly computed analytics entry, or `None` when the
    /// existing cache was kept.
    pub analyzed_forms: Option<usize>,
}

/// Feedback operations over a key-value store.
pub struct FeedbackService<S> {
    pub(crate) repo: Repository<S>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) policy: Policy,
}

impl<S: KeyValueStore> FeedbackService<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: Repository::new(store),
            clock: Arc::new(SystemClock),
            policy: Policy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repo
    }

    pub fn into_store(self) -> S {
        self.repo.into_inner()
    }

    /// Prepare the store for use.
    ///
    /// Seeds the demo accounts (when enabled), creates missing collections,
    /// upgrades legacy records. Analytics are rebuilt only when the cache
    /// did not exist yet or a migration changed forms or responses, so
    /// `lastUpdated` keeps recording the last mutation. Safe to call on
    /// every start.
    pub fn initialize(&mut self) -> Result<InitReport> {
        let mut report = InitReport::default();
        if self.policy.seed_demo_accounts {
            let (added, repaired) = self.merge_seed_users()?;
            report.seeded_users = added;
            report.repaired_users = repaired;
        }
        let had_analytics = self.repo.contains(StoreKey::Analytics)?;
        for key in StoreKey::ALL {
            self.repo.ensure(key)?;
        }
        report.migrated = self.repo.migrate()?;
        if !had_analytics || !report.migrated.is_empty() {
            report.analyzed_forms = Some(self.refresh_analytics()?.len());
        }
        tracing::debug!(?report, "store initialized");
        Ok(report)
    }

    /// Recompute analytics for every form and replace the cache.
    pub fn refresh_analytics(&mut self) -> Result<AnalyticsByForm> {
        let forms = self.repo.forms()?;
        let responses = self.repo.responses_for(&forms)?;
        let analytics = analytics::compute_all(&forms, &responses, self.clock.now());
        self.repo.save_analytics(&analytics)?;
        tracing::debug!(
            forms = forms.len(),
            responses = responses.len(),
            "analytics rebuilt"
        );
        Ok(analytics)
    }

    /// The analytics cache, rebuilt first when it is empty.
    pub fn analytics_by_form(&mut self) -> Result<AnalyticsByForm> {
        let cached = self.repo.analytics()?;
        if cached.is_empty() {
            return self.refresh_analytics();
        }
        Ok(cached)
    }

    /// Cached analytics of one form, or an empty placeholder when none exist.
    pub fn analytics_for(&self, form_id: FormId) -> Result<FormAnalytics> {
        if let Some(found) = self.repo.analytics()?.remove(&form_id) {
            return Ok(found);
        }
        let scale = self
            .repo
            .forms()?
            .iter()
            .find(|f| f.id == form_id)
            .map_or(DEFAULT_RATING_SCALE_MAX, |f| f.scale_max());
        Ok(FormAnalytics::empty(form_id, scale, self.clock.now()))
    }

    pub(crate) fn now_millis(&self) -> u64 {
        u64::try_from(self.clock.now().timestamp_millis()).unwrap_or_default()
    }
}
