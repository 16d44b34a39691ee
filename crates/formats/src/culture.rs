use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geojson::ProvinceCollection;
use crate::key::province_key;

/// A city or regency listed under a province.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityEntry {
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "deskripsi", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "wisata", default, skip_serializing_if = "Vec::is_empty")]
    pub attractions: Vec<String>,
}

/// Hand-authored cultural information for one province.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulturalRecord {
    #[serde(rename = "nama")]
    pub name: String,
    /// Category -> text or list of texts, in document order.
    #[serde(default)]
    pub info: Map<String, Value>,
    #[serde(rename = "KotaKabupaten", default)]
    pub cities: Vec<CityEntry>,
}

/// One info category value, borrowed from the record.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue<'a> {
    Text(&'a str),
    /// Number or boolean, rendered as JSON text.
    Scalar(&'a Value),
    List(Vec<&'a Value>),
}

fn write_item(f: &mut std::fmt::Formatter<'_>, item: &Value) -> std::fmt::Result {
    match item {
        Value::String(s) => f.write_str(s),
        Value::Null => Ok(()),
        other => write!(f, "{other}"),
    }
}

impl std::fmt::Display for InfoValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfoValue::Text(s) => f.write_str(s),
            InfoValue::Scalar(v) => write_item(f, v),
            InfoValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_item(f, item)?;
                }
                Ok(())
            }
        }
    }
}

impl CulturalRecord {
    /// Info categories in document order. Null and object values are skipped.
    pub fn info_entries(&self) -> impl Iterator<Item = (&str, InfoValue<'_>)> + '_ {
        self.info.iter().filter_map(|(k, v)| {
            let value = match v {
                Value::String(s) => InfoValue::Text(s.as_str()),
                Value::Number(_) | Value::Bool(_) => InfoValue::Scalar(v),
                Value::Array(items) => InfoValue::List(items.iter().collect()),
                Value::Null | Value::Object(_) => return None,
            };
            Some((k.as_str(), value))
        })
    }
}

#[derive(Debug)]
pub enum CultureError {
    Parse(String),
    DuplicateKey { key: String },
}

impl std::fmt::Display for CultureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CultureError::Parse(reason) => write!(f, "cultural dataset parse error: {reason}"),
            CultureError::DuplicateKey { key } => {
                write!(f, "two dataset entries normalize to the same key: {key}")
            }
        }
    }
}

impl std::error::Error for CultureError {}

/// Cultural records indexed by normalized province key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CultureDataset {
    records: BTreeMap<String, CulturalRecord>,
}

impl CultureDataset {
    pub fn from_json_str(payload: &str) -> Result<Self, CultureError> {
        let raw: Map<String, Value> =
            serde_json::from_str(payload).map_err(|e| CultureError::Parse(e.to_string()))?;

        let mut records = BTreeMap::new();
        for (name, value) in raw {
            let record: CulturalRecord = serde_json::from_value(value)
                .map_err(|e| CultureError::Parse(format!("{name}: {e}")))?;
            let key = province_key(&name);
            if records.insert(key.clone(), record).is_some() {
                return Err(CultureError::DuplicateKey { key });
            }
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by province display name.
    pub fn lookup(&self, province_name: &str) -> Option<&CulturalRecord> {
        self.records.get(&province_key(province_name))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Names of provinces that have no cultural record.
    pub fn missing_for(&self, provinces: &ProvinceCollection) -> Vec<String> {
        let mut missing: Vec<String> = provinces
            .features
            .iter()
            .filter(|f| !self.records.contains_key(&f.key()))
            .map(|f| f.name.clone())
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}
