//! Configuration management for the cover rules evaluator.
//!
//! This crate discovers `.cover/` project directories and loads the layered
//! `config.yaml` + environment configuration that selects a rule table,
//! the unknown-fact policy and per-fact default overrides.

pub mod config;
pub mod cover_dir;
