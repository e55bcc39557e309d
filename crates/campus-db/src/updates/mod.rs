//! Input and update types for entity mutations.
//!
//! `New*` structs carry the fields of a create request. `*Update` structs have
//! `Option` fields; only `Some` fields are applied. Nullable columns use
//! `Option<Option<T>>` so a JSON `null` clears the value while an absent key
//! leaves it alone. Update payloads are serialized into the audit `detail`
//! (changed fields only).

pub mod attendance;
pub mod batch;
pub mod blog;
pub mod course;
pub mod enrollment;
pub mod homepage_ad;
pub mod material;
pub mod progress;
pub mod session;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserialize a present key (including `null`) as `Some(..)`.
///
/// Pair with `#[serde(default)]` so a missing key stays `None`.
pub(crate) fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::batch::BatchUpdate;
    use pretty_assertions::assert_eq;

    #[test]
    fn null_clears_and_missing_keeps() {
        let update: BatchUpdate = serde_json::from_str(r#"{"trainerId": null}"#).unwrap();
        assert_eq!(update.trainer_id, Some(None));

        let update: BatchUpdate = serde_json::from_str(r#"{"name": "Evening"}"#).unwrap();
        assert_eq!(update.trainer_id, None);
        assert_eq!(update.name.as_deref(), Some("Evening"));
    }

    #[test]
    fn only_changed_fields_serialize() {
        let update: BatchUpdate = serde_json::from_str(r#"{"maxStudents": 12}"#).unwrap();
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"maxStudents": 12}));
    }
}
