use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{
    client::RawRecord,
    error::IgdbError,
    shape::{Kind, Schema, ValidatedRecord},
};

/// Field carrying the per-region names of a game.
pub const LOCALIZATIONS_FIELD: &str = "game_localizations";

/// Field added to a normalized record holding the picked name.
pub const LOCALIZED_NAME_FIELD: &str = "localized_name";

/// One per-region display name of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localization {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub region: u32,
}

/// Shape of a `game_localizations` entry when `name` and `region` were requested.
pub fn localization_schema() -> Schema {
    Schema::new()
        .required("id", Kind::Integer)
        .required("name", Kind::String)
        .required("region", Kind::Integer)
}

/// A validated record with its localization list replaced by the single name
/// matching the target region.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedGame {
    pub record: ValidatedRecord,
    pub localized_name: String,
}

impl NormalizedGame {
    /// Deserialize into a typed view; the picked name is exposed as `localized_name`.
    pub fn into_view<T: DeserializeOwned>(self) -> super::Result<T> {
        let mut record = self.record;
        record.insert(LOCALIZED_NAME_FIELD, Value::String(self.localized_name));
        record.into_typed()
    }
}

/// Validate `raw` against `schema`, failing with every offending field path.
pub fn validate(raw: &RawRecord, schema: &Schema) -> super::Result<ValidatedRecord> {
    schema.validate(raw)
}

/// Pick the localized name for `target_region` and strip the localization list.
///
/// When several entries match, the first one in upstream order wins. A record
/// without localizations behaves like one with no matching entry.
pub fn extract_localized_name(
    mut record: ValidatedRecord,
    target_region: u32,
) -> super::Result<NormalizedGame> {
    let entries = match record.remove(LOCALIZATIONS_FIELD) {
        Some(Value::Array(entries)) => entries,
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            return Err(IgdbError::Decode(format!(
                "invalid {}: expected an array, found {}",
                LOCALIZATIONS_FIELD, other
            )))
        }
    };

    // Only the matching entry is decoded; other regions may hold any integer.
    let matching = entries
        .into_iter()
        .find(|entry| region_of(entry) == Some(u64::from(target_region)))
        .ok_or(IgdbError::LocalizationNotFound {
            region: target_region,
        })?;
    let localization: Localization = serde_json::from_value(matching)
        .map_err(|e| IgdbError::Decode(format!("invalid {}: {}", LOCALIZATIONS_FIELD, e)))?;
    let localized_name = localization.name;

    Ok(NormalizedGame {
        record,
        localized_name,
    })
}

fn region_of(entry: &Value) -> Option<u64> {
    entry.get("region").and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn validated(value: Value) -> ValidatedRecord {
        let Value::Object(raw) = value else {
            panic!("not an object");
        };
        let schema = Schema::new()
            .required("id", Kind::Integer)
            .optional("name", Kind::String)
            .optional_list(
                LOCALIZATIONS_FIELD,
                Kind::Object(
                    Schema::new()
                        .optional("id", Kind::Integer)
                        .required("name", Kind::String)
                        .required("region", Kind::Integer),
                ),
            );
        validate(&raw, &schema).expect("valid")
    }

    #[test]
    fn picks_name_for_target_region() {
        let record = validated(json!({
            "id": 1,
            "game_localizations": [{"region": 1, "name": "A"}, {"region": 2, "name": "B"}],
        }));

        let normalized = extract_localized_name(record, 2).expect("localized");
        assert_eq!(normalized.localized_name, "B");
        assert!(normalized.record.get(LOCALIZATIONS_FIELD).is_none());
        assert_eq!(normalized.record.id(), Some(1));
    }

    #[test]
    fn missing_region_fails() {
        let record = validated(json!({
            "id": 1,
            "game_localizations": [{"region": 1, "name": "A"}, {"region": 2, "name": "B"}],
        }));

        let err = extract_localized_name(record, 3).unwrap_err();
        assert!(matches!(err, IgdbError::LocalizationNotFound { region: 3 }));
    }

    #[test]
    fn out_of_range_region_in_other_entry_is_ignored() {
        let record = validated(json!({
            "id": 1,
            "game_localizations": [
                {"region": -1, "name": "A"},
                {"region": 4_294_967_296u64, "name": "C"},
                {"region": 5, "name": "B"},
            ],
        }));
        let normalized = extract_localized_name(record, 5).expect("localized");
        assert_eq!(normalized.localized_name, "B");
    }

    #[test]
    fn no_localizations_fails() {
        let record = validated(json!({"id": 1, "name": "Metroid Dread"}));
        let err = extract_localized_name(record, 5).unwrap_err();
        assert!(matches!(err, IgdbError::LocalizationNotFound { region: 5 }));
    }

    #[test]
    fn first_match_wins() {
        let record = validated(json!({
            "id": 1,
            "game_localizations": [
                {"id": 10, "region": 5, "name": "first"},
                {"id": 11, "region": 5, "name": "second"},
            ],
        }));
        let normalized = extract_localized_name(record, 5).expect("localized");
        assert_eq!(normalized.localized_name, "first");
    }

    #[test]
    fn view_exposes_localized_name() {
        #[derive(Debug, Deserialize)]
        struct View {
            id: u64,
            name: String,
            localized_name: String,
        }

        let record = validated(json!({
            "id": 7,
            "name": "Kirby and the Forgotten Land",
            "game_localizations": [{"region": 5, "name": "星のカービィ ディスカバリー"}],
        }));
        let view: View = extract_localized_name(record, 5)
            .expect("localized")
            .into_view()
            .expect("view");
        assert_eq!(view.id, 7);
        assert_eq!(view.name, "Kirby and the Forgotten Land");
        assert_eq!(view.localized_name, "星のカービィ ディスカバリー");
    }
}
