//! # Sentiment Analysis
//!
//! Train a binary toxic / non-toxic text classifier from a tab-separated dataset,
//! persist it, and score sentences with it.
#![forbid(unsafe_code)]

/// Configuration
pub mod config;

/// Datasets
pub mod datasets;

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Utilities
pub mod utils;

/// Error macros
#[macro_use]
extern crate anyhow;
