//! # Trigram Search
//!
//! Fuzzy search over PostgreSQL with the `pg_trgm` extension, in two forms:
//! directly on one table's text columns, and on a materialized view that
//! joins several tables and is refreshed on demand.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────┐   ┌─────────────────┐
//! │ trigram-search-core  │──▶│  PgSession   │──▶│   PostgreSQL    │
//! │ expressions, indexes │   │ flush, fetch │   │ pg_trgm + views │
//! │ queries, refresh     │   │ set_limit    │   └─────────────────┘
//! └──────────────────────┘   └──────────────┘
//!            ▲
//!            │
//!      ┌───────────┐
//!      │ CLI (tgs) │
//!      └───────────┘
//! ```
//!
//! The core crate only builds descriptions: index definitions, projection
//! DDL, and search queries. This crate provisions the schema from those
//! descriptions, executes queries through a [`pg_session::PgSession`], and
//! exposes everything through the `tgs` binary.
//!
//! ## Quick Start
//!
//! ```bash
//! tgs init                                   # extension, tables, view, indexes
//! tgs add-author vybornyy --first-name Misha
//! tgs add-article <author-id> "Full Text Search" --body "..." --refresh
//! tgs search "full text" --target full --scores
//! tgs refresh
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Connection pool |
//! | [`models`] | Authors, articles, and the search catalog |
//! | [`migrate`] | Schema provisioning |
//! | [`pg_session`] | PostgreSQL search session |
//! | [`ingest`] | Writing authors and articles |
//! | [`search`] | Search and refresh commands |

pub mod config;
pub mod db;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod pg_session;
pub mod search;
