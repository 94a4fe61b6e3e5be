//! Shared configuration constants for socialscrape
//!
//! Default values used by `ScrapeConfig` and the extraction strategies so the
//! tunables live in one place instead of as magic numbers.

/// Surface the strategies run against
pub const DEFAULT_BASE_URL: &str = "https://www.facebook.com";

/// Time allowed for dynamic content to render after a navigation
///
/// A heuristic, not a correctness guarantee. Slow networks need more.
pub const DEFAULT_NAVIGATION_SETTLE_MS: u64 = 5_000;

/// Time allowed for lazily loaded content after each scroll
pub const DEFAULT_SCROLL_SETTLE_MS: u64 = 1_500;

/// Pixels scrolled per page advance
pub const DEFAULT_SCROLL_STEP_PX: i64 = 3_000;

/// Scroll iterations per group target
pub const DEFAULT_GROUP_MAX_SCROLLS: usize = 10;

/// Distinct posts inspected per group target before stopping early
pub const DEFAULT_GROUP_MAX_ITEMS: usize = 100;

/// Scroll iterations per marketplace ZIP × keyword search
pub const DEFAULT_MARKETPLACE_MAX_SCROLLS: usize = 20;

/// Timeout for a single `goto`
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;

/// Extra navigation attempts for transient failures
pub const DEFAULT_NAVIGATION_RETRIES: u32 = 2;

/// Upper bound accepted for `navigation_retries`
pub const MAX_NAVIGATION_RETRIES: u32 = 10;

/// Backoff stops doubling after this many retries (64s plus jitter)
pub const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Terminal jobs are kept this long before the sweep evicts them
pub const DEFAULT_JOB_RETENTION_SECS: u64 = 60 * 60;

/// Interval between retention sweeps
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Character cap on group post previews
pub const GROUP_PREVIEW_MAX_CHARS: usize = 200;

/// Character cap on marketplace listing titles
pub const LISTING_TITLE_MAX_CHARS: usize = 100;

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
/// Next update: 2025-04-29 (quarterly schedule)
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
