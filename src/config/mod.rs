//! Configuration module for scrape jobs
//!
//! This module provides the `ScrapeConfig` struct and its builder for
//! configuring browser sessions and extraction tunables with validation and
//! sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::ScrapeConfigBuilder;
pub use types::ScrapeConfig;
