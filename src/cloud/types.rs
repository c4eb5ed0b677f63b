//! Request and response bodies for the Compute Engine and Cloud Storage REST APIs.
//!
//! Only the fields this crate reads or writes are modelled; everything else
//! in the API payloads is ignored on deserialisation.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A machine type offered in a zone, e.g. `n2-standard-2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineType {
    pub name: String,
}

/// One page of `machineTypes.list`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MachineTypeList {
    #[serde(default)]
    pub items: Vec<MachineType>,
    pub next_page_token: Option<String>,
}

/// The subset of an image resource used for size probing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: String,
    /// The API encodes int64 fields as JSON strings.
    #[serde(default, deserialize_with = "int64_field")]
    pub disk_size_gb: i64,
}

/// The subset of a snapshot resource used for size probing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub name: String,
    #[serde(default, deserialize_with = "int64_field")]
    pub disk_size_gb: i64,
}

/// Customer-managed encryption key reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionKey {
    pub kms_key_name: String,
}

/// Body of `images.insert`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub family: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub source_disk: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub storage_locations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_encryption_key: Option<EncryptionKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ZoneList {
    #[serde(default)]
    pub items: Vec<Zone>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subnetwork {
    pub name: String,
    /// Full URL of the network the subnetwork belongs to.
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub location: String,
}

/// Error body shared by Google REST APIs: `{"error": {"code", "message", "errors": [...]}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

fn int64_field<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(n) => Ok(n),
        IntOrString::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
