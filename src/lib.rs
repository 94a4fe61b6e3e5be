pub mod browser_profile;
pub mod browser_setup;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod export;
pub mod extraction;
pub mod jobs;
pub mod server;
pub mod utils;

pub use browser_setup::{
    apply_stealth_measures, download_managed_browser, find_browser_executable, launch_browser,
};
pub use config::{ScrapeConfig, ScrapeConfigBuilder};
pub use credentials::{CredentialArtifact, SameSite, SessionCookie, SessionCookies};
pub use driver::{
    AutomationDriver, ChromiumDriver, ChromiumLauncher, DriverError, Element, ElementHandle,
    SessionLauncher,
};
pub use error::{ScrapeError, ScrapeResult};
pub use export::{ExportError, ExportFormat, format_results};
pub use extraction::{
    ExtractionStrategy, GroupPostRecord, MarketplaceListingRecord, ScrollTunables, strategy_for,
};
pub use jobs::{
    Job, JobExportError, JobId, JobKind, JobOrchestrator, JobRegistry, JobRequest, JobResults,
    JobSpec, JobStatus, JobTargets, Keywords, RegistryError, Transition,
};
