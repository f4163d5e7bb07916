//! # Habits ETL Library
//!
//! Notion-to-warehouse pipeline for habit tracking data, plus the read-only
//! dashboard service over the resulting star schema.

pub mod config;
pub mod connectors;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loader;
pub mod models;
pub mod normalization;
pub mod pipeline;
pub mod server;
pub mod telemetry;
pub mod transform;
pub use migration;
