//! Row-to-entity parsing helpers.
//!
//! Every repo needs to convert `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic and handle the dual datetime
//! format issue (`SQLite`'s `datetime('now')` vs Rust's `to_rfc3339()`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;

use campus_core::enums::EntityType;

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a `YYYY-MM-DD` TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string is not a calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::Query(format!("Failed to parse date '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with every campus-core enum, whatever its serde renaming.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Storage form of an enum: its serde string.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value does not serialize to a string.
pub fn enum_to_str<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(DatabaseError::Query(format!(
            "Expected enum to serialize as a string, got {other}"
        ))),
    }
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
/// You must use `get::<Option<String>>()` for nullable columns.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read a non-negative INTEGER column that fits in `u32`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is negative or too large.
pub fn get_u32(row: &libsql::Row, idx: i32) -> Result<u32, DatabaseError> {
    let raw = row.get::<i64>(idx)?;
    u32::try_from(raw)
        .map_err(|_| DatabaseError::Query(format!("Column {idx} out of range for u32: {raw}")))
}

/// Read a non-negative INTEGER column as `u64`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is negative.
pub fn get_u64(row: &libsql::Row, idx: i32) -> Result<u64, DatabaseError> {
    let raw = row.get::<i64>(idx)?;
    u64::try_from(raw)
        .map_err(|_| DatabaseError::Query(format!("Column {idx} out of range for u64: {raw}")))
}

/// Read a nullable INTEGER column as `Option<u32>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a present value is out of range.
pub fn get_opt_u32(row: &libsql::Row, idx: i32) -> Result<Option<u32>, DatabaseError> {
    row.get::<Option<i64>>(idx)?
        .map(|raw| {
            u32::try_from(raw).map_err(|_| {
                DatabaseError::Query(format!("Column {idx} out of range for u32: {raw}"))
            })
        })
        .transpose()
}

/// Read an INTEGER 0/1 column as `bool`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Read a single `COUNT(*)`-style integer from the first row.
///
/// # Errors
///
/// Returns `DatabaseError::NoResult` if the query produced no rows.
pub async fn first_u64(mut rows: libsql::Rows) -> Result<u64, DatabaseError> {
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    get_u64(&row, 0)
}

/// Convert an unsigned counter to SQLite's signed integer, saturating.
#[must_use]
pub fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Deserialize a required JSON TEXT column into `T`. An empty string falls
/// back to `T::default()`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the text is not valid JSON for `T`.
pub fn parse_json<T: DeserializeOwned + Default>(s: &str) -> Result<T, DatabaseError> {
    if s.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(s)
        .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))
}

/// Extract an optional JSON value from a TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string contains invalid JSON.
pub fn parse_optional_json(s: Option<&str>) -> Result<Option<serde_json::Value>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let val = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))?;
            Ok(Some(val))
        }
        _ => Ok(None),
    }
}

/// Serialize a value for a JSON TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if serialization fails.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    Ok(serde_json::to_string(value)?)
}

/// Whether a libSQL error is a UNIQUE constraint violation.
#[must_use]
pub fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

/// Map `EntityType` to the corresponding SQL table name.
///
/// Uses exhaustive match: adding a new `EntityType` variant forces updating this.
#[must_use]
pub const fn entity_type_to_table(entity: EntityType) -> &'static str {
    match entity {
        EntityType::User => "users",
        EntityType::Course => "courses",
        EntityType::Batch => "batches",
        EntityType::Enrollment => "enrollments",
        EntityType::ClassSession => "class_sessions",
        EntityType::Payment => "payments",
        EntityType::Blog => "blog_posts",
        EntityType::HomepageAd => "homepage_ads",
        EntityType::Material => "materials",
        EntityType::Progress => "progress",
        EntityType::Attendance => "attendance",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::enums::{BlogCategory, EnrollmentStatus, Language};
    use pretty_assertions::assert_eq;

    #[test]
    fn datetime_accepts_both_formats() {
        let a = parse_datetime("2026-02-09T14:30:00+00:00").unwrap();
        let b = parse_datetime("2026-02-09 14:30:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn optional_datetime_treats_empty_as_none() {
        assert_eq!(parse_optional_datetime(None).unwrap(), None);
        assert_eq!(parse_optional_datetime(Some("")).unwrap(), None);
        assert!(parse_optional_datetime(Some("2026-01-01 00:00:00")).unwrap().is_some());
    }

    #[test]
    fn enums_round_trip_through_storage_strings() {
        let stored = enum_to_str(&BlogCategory::LearningTips).unwrap();
        assert_eq!(stored, "Learning Tips");
        let parsed: BlogCategory = parse_enum(&stored).unwrap();
        assert_eq!(parsed, BlogCategory::LearningTips);

        assert_eq!(enum_to_str(&Language::German).unwrap(), "German");
        let status: EnrollmentStatus = parse_enum("transferred").unwrap();
        assert_eq!(status, EnrollmentStatus::Transferred);
        assert!(parse_enum::<EnrollmentStatus>("graduated").is_err());
    }

    #[test]
    fn json_columns_default_when_empty() {
        let tags: Vec<String> = parse_json("").unwrap();
        assert!(tags.is_empty());
        let tags: Vec<String> = parse_json(r#"["a","b"]"#).unwrap();
        assert_eq!(tags, vec!["a", "b"]);
        assert!(parse_json::<Vec<String>>("{").is_err());
    }

    #[test]
    fn counters_saturate() {
        assert_eq!(to_i64(5), 5);
        assert_eq!(to_i64(u64::MAX), i64::MAX);
    }

    #[test]
    fn every_entity_has_a_table() {
        assert_eq!(entity_type_to_table(EntityType::Blog), "blog_posts");
        assert_eq!(entity_type_to_table(EntityType::ClassSession), "class_sessions");
    }
}
