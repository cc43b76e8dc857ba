//! Listing wire types

use serde::{Deserialize, Deserializer, Serialize};

/// One object from a listing page. Only `name` and `size` are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default, deserialize_with = "size_from_wire")]
    pub size: u64,
}

/// One page of `objects.list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectList {
    #[serde(default)]
    pub items: Vec<ObjectEntry>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Query parameters for `objects.list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub prefix: Option<String>,
    pub page_token: Option<String>,
}

impl ListParams {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            page_token: None,
        }
    }
}

// The JSON API encodes uint64 fields as decimal strings.
fn size_from_wire<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireSize {
        Text(String),
        Number(u64),
    }

    match WireSize::deserialize(deserializer)? {
        WireSize::Number(n) => Ok(n),
        WireSize::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
