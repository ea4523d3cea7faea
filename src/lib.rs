//! Hokusai: authenticated client tooling for MLflow-compatible registries.
//!
//! The crate wraps a tracking server behind [`store::TrackingStore`], which
//! re-reads credentials from the environment on every call and injects the
//! one authentication header the endpoint expects: Hokusai proxy endpoints
//! take the vendor API-key header, everything else the standard
//! `Authorization` schemes. The request itself is delegated unchanged to a
//! swappable transport.

pub mod auth;
pub mod cli;
pub mod config;
pub mod infra;
pub mod logging;
pub mod store;
