//! Brusio: a small self-hosted social publishing service.
//!
//! Users author posts, optionally filed under a group and carrying an image
//! reference; other users comment on posts and follow authors to build a
//! personalized feed. The crate is split into a domain layer (entities and
//! invariants), application services (feeds, post lifecycle, comments,
//! follow policy), a response cache for the global feed, and infrastructure
//! adapters (Postgres, an embedded store, and the HTTP surface).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
