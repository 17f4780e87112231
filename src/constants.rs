use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// System-wide ceiling on simultaneously featured projects.
pub const FEATURED_PROJECT_CAP: i64 = 3;

/// Key for the transaction-scoped advisory lock guarding the featured cap.
pub const FEATURED_LOCK_KEY: i64 = 0x6563_6f5f_6665_6174;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

pub const DASHBOARD_RECENT_PROJECTS: i64 = 5;
pub const DASHBOARD_TOP_CATEGORIES: i64 = 5;
