//! ID prefix constants for every Campus entity.
//!
//! IDs are generated by the database as `{prefix}-{8 hex chars}`, e.g. `crs-a3f8b2c1`.

pub const PREFIX_USER: &str = "usr";
pub const PREFIX_COURSE: &str = "crs";
pub const PREFIX_BATCH: &str = "bat";
pub const PREFIX_ENROLLMENT: &str = "enr";
pub const PREFIX_CLASS_SESSION: &str = "cls";
pub const PREFIX_PAYMENT: &str = "pay";
pub const PREFIX_ORDER: &str = "order";
pub const PREFIX_BLOG: &str = "blg";
pub const PREFIX_AD: &str = "adv";
pub const PREFIX_MATERIAL: &str = "mat";
pub const PREFIX_PROGRESS: &str = "prg";
pub const PREFIX_ATTENDANCE: &str = "att";
pub const PREFIX_AUDIT: &str = "aud";

/// Every prefix, for exhaustive ID generation tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_USER,
    PREFIX_COURSE,
    PREFIX_BATCH,
    PREFIX_ENROLLMENT,
    PREFIX_CLASS_SESSION,
    PREFIX_PAYMENT,
    PREFIX_ORDER,
    PREFIX_BLOG,
    PREFIX_AD,
    PREFIX_MATERIAL,
    PREFIX_PROGRESS,
    PREFIX_ATTENDANCE,
    PREFIX_AUDIT,
];
