//! Repotoire Cloud client library
//!
//! Typed access to the Repotoire cloud API with a revalidating query cache:
//! reads are served from [`cache::QueryCache`] until a mutation dispatches a
//! [`cache::DomainEvent`] that marks them stale, and every failure is
//! normalized by [`errors::classify`] into a stable, user-facing code.

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod http;
pub mod models;
pub mod views;
