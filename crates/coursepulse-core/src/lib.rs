//! coursepulse-core — Forms, responses, users, and feedback analytics.
//!
//! This crate defines the data model, the key-value store seam, and the
//! [`FeedbackService`](service::FeedbackService) that every front end drives.
//! Analytics are recomputed in full after each mutation.

pub mod analytics;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod migrate;
pub mod model;
pub mod parser;
pub mod responses;
pub mod service;
pub mod store;
pub mod summary;
pub mod templates;
pub mod users;
pub mod validation;
