//! Product record model shared by both platforms

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Platform a record originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// ERP-style system of record (platform A)
    Erp,
    /// Storefront system (platform B)
    Storefront,
}

impl Platform {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Erp => "erp",
            Self::Storefront => "storefront",
        }
    }

}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "erp" => Ok(Self::Erp),
            "storefront" => Ok(Self::Storefront),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Identity of a record: platform-local ids are only unique per platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub platform: Platform,
    pub id: String,
}

impl RecordKey {
    pub fn new(platform: Platform, id: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.id)
    }
}

/// A product-like record fetched from one of the platforms.
///
/// The known business fields are typed; any other top-level field is collected
/// into `extensions` and written back at the top level. The untouched upstream
/// document is kept in `raw_payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Platform-local identifier
    pub id: String,
    /// Business key shared across platforms (e.g. SKU)
    #[serde(default)]
    pub natural_key: Option<String>,
    /// Originating platform
    pub platform: Platform,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    /// Platform-specific fields outside the typed core
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
    /// Upstream document, preserved verbatim
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub raw_payload: Value,
}

impl Record {
    /// Create a bare record with only identity and natural key set
    pub fn new(platform: Platform, id: impl Into<String>, natural_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            natural_key: Some(natural_key.into()),
            platform,
            name: None,
            price: None,
            quantity: None,
            status: None,
            extensions: BTreeMap::new(),
            raw_payload: Value::Null,
        }
    }

    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.platform, self.id.clone())
    }

    /// Natural key usable for pairing, `None` when missing or blank
    #[must_use]
    pub fn match_key(&self) -> Option<&str> {
        self.natural_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// A partial edit to a record. Unset fields leave the base value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
}

impl RecordPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.status.is_none()
            && self.extensions.is_empty()
    }

    /// Return `base` with this patch merged over it.
    ///
    /// Extension keys are merged one by one; identity, natural key and raw
    /// payload are never patched.
    #[must_use]
    pub fn apply_to(&self, base: &Record) -> Record {
        let mut merged = base.clone();
        if let Some(name) = &self.name {
            merged.name = Some(name.clone());
        }
        if let Some(price) = self.price {
            merged.price = Some(price);
        }
        if let Some(quantity) = self.quantity {
            merged.quantity = Some(quantity);
        }
        if let Some(status) = &self.status {
            merged.status = Some(status.clone());
        }
        for (field, value) in &self.extensions {
            merged.extensions.insert(field.clone(), value.clone());
        }
        merged
    }

    /// Set a field from a `field=value` style assignment.
    ///
    /// Unknown field names go to `extensions`, parsed as JSON when possible
    /// and kept as a string otherwise.
    pub fn set_field(&mut self, field: &str, raw: &str) -> Result<(), String> {
        let raw = raw.trim();
        match field.trim() {
            "" => return Err("field name must not be empty".to_string()),
            "name" => self.name = Some(raw.to_string()),
            "price" => {
                let price = raw
                    .parse::<f64>()
                    .map_err(|_| format!("price must be a number, got '{raw}'"))?;
                if !price.is_finite() {
                    return Err(format!("price must be finite, got '{raw}'"));
                }
                self.price = Some(price);
            }
            "quantity" => {
                self.quantity = Some(
                    raw.parse::<i64>()
                        .map_err(|_| format!("quantity must be an integer, got '{raw}'"))?,
                );
            }
            "status" => self.status = Some(raw.to_string()),
            other => {
                let value = serde_json::from_str::<Value>(raw)
                    .unwrap_or_else(|_| Value::String(raw.to_string()));
                self.extensions.insert(other.to_string(), value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn match_key_ignores_blank_keys() {
        let mut record = Record::new(Platform::Erp, "1", "  ");
        assert_eq!(record.match_key(), None);

        record.natural_key = None;
        assert_eq!(record.match_key(), None);

        record.natural_key = Some(" SKU-A ".to_string());
        assert_eq!(record.match_key(), Some("SKU-A"));
    }

    #[test]
    fn patch_overrides_only_set_fields() {
        let mut base = Record::new(Platform::Storefront, "9", "SKU-A");
        base.name = Some("Widget".to_string());
        base.price = Some(10.0);
        base.extensions.insert("color".to_string(), json!("red"));
        base.extensions.insert("weight".to_string(), json!(2));

        let mut patch = RecordPatch {
            price: Some(12.5),
            ..RecordPatch::default()
        };
        patch.extensions.insert("color".to_string(), json!("blue"));

        let merged = patch.apply_to(&base);
        assert_eq!(merged.name.as_deref(), Some("Widget"));
        assert_eq!(merged.price, Some(12.5));
        assert_eq!(merged.extensions["color"], json!("blue"));
        assert_eq!(merged.extensions["weight"], json!(2));
        assert_eq!(merged.id, base.id);
    }

    #[test]
    fn set_field_parses_known_and_extension_fields() {
        let mut patch = RecordPatch::default();
        patch.set_field("price", "19.99").unwrap();
        patch.set_field("quantity", "4").unwrap();
        patch.set_field("tags", r#"["sale"]"#).unwrap();
        patch.set_field("vendor", "acme").unwrap();

        assert_eq!(patch.price, Some(19.99));
        assert_eq!(patch.quantity, Some(4));
        assert_eq!(patch.extensions["tags"], json!(["sale"]));
        assert_eq!(patch.extensions["vendor"], json!("acme"));
        assert!(patch.set_field("quantity", "four").is_err());
        assert!(patch.set_field(" ", "x").is_err());
    }

    #[test]
    fn record_deserializes_with_sparse_payload() {
        let record: Record = serde_json::from_value(json!({
            "id": "42",
            "platform": "storefront",
            "natural_key": "SKU-9",
            "raw_payload": {"handle": "sku-9"}
        }))
        .unwrap();

        assert_eq!(record.key(), RecordKey::new(Platform::Storefront, "42"));
        assert_eq!(record.raw_payload["handle"], json!("sku-9"));
        assert!(record.extensions.is_empty());
    }

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("ERP".parse::<Platform>(), Ok(Platform::Erp));
        assert!("pos".parse::<Platform>().is_err());
    }

    #[test]
    fn unknown_top_level_fields_survive_a_round_trip() {
        let payload = json!({
            "id": "7",
            "platform": "erp",
            "price": 3.5,
            "warehouse": "north",
            "dimensions": {"w": 2, "h": 4}
        });
        let record: Record = serde_json::from_value(payload).unwrap();

        assert_eq!(record.price, Some(3.5));
        assert_eq!(record.extensions["warehouse"], json!("north"));
        assert_eq!(record.extensions["dimensions"], json!({"w": 2, "h": 4}));

        let written = serde_json::to_value(&record).unwrap();
        assert_eq!(written["warehouse"], json!("north"));
        assert_eq!(written["dimensions"]["h"], json!(4));
        assert!(written.get("extensions").is_none());
    }
}
