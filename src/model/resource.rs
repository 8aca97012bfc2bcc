//! The registered reference to an externally-managed Azure resource.
//!
//! # Registry Framework
//! This struct implements the [`RegistryEntity`](crate::framework::RegistryEntity) trait,
//! allowing it to be stored by a [`RegistryActor`](crate::framework::RegistryActor).
//!
//! See [`impl RegistryEntity for Resource`](Resource#impl-RegistryEntity-for-Resource) for details on
//! creation parameters ([`ResourceCreate`]).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::resource_actor::ResourceError;

/// Key/value tags, ordered by key so that serialized output is stable.
pub type TagSet = BTreeMap<String, String>;

/// Type-safe identifier for Resources.
///
/// Generated identifiers are random UUIDs, but any string received on the
/// wire is accepted as an identifier so that unknown ids resolve to a plain
/// "not found" rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub tags: TagSet,
    /// Fully-qualified Azure resource id, opaque to this service.
    #[serde(rename = "azure_id")]
    pub remote_id: String,
    /// Creation time in whole seconds since the Unix epoch.
    #[serde(rename = "create_unix")]
    pub created_at: i64,
}

/// DTO for Resource creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceCreate {
    pub name: String,
    pub remote_id: String,
    pub tags: TagSet,
}

impl ResourceCreate {
    pub fn new(name: impl Into<String>, remote_id: impl Into<String>, tags: TagSet) -> Self {
        Self {
            name: name.into(),
            remote_id: remote_id.into(),
            tags,
        }
    }

    /// Checks the fields the registry relies on callers to provide.
    ///
    /// The registry itself stores whatever it is given; this is called at the
    /// API boundary before a create request is sent.
    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.name.is_empty() || self.remote_id.is_empty() {
            return Err(ResourceError::ValidationError(
                "name and azureId are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_json_field_names() {
        let mut tags = TagSet::new();
        tags.insert("env".into(), "dev".into());
        let resource = Resource {
            id: ResourceId::from("abc"),
            name: "vm-1".into(),
            tags,
            remote_id: "/subscriptions/x/vm-1".into(),
            created_at: 42,
        };

        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["name"], "vm-1");
        assert_eq!(value["tags"]["env"], "dev");
        assert_eq!(value["azure_id"], "/subscriptions/x/vm-1");
        assert_eq!(value["create_unix"], 42);
    }

    #[test]
    fn test_generated_ids_are_distinct_uuids() {
        let a = ResourceId::generate();
        let b = ResourceId::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_validate_requires_name_and_remote_id() {
        assert!(ResourceCreate::new("vm-1", "/subscriptions/x", TagSet::new())
            .validate()
            .is_ok());
        assert!(matches!(
            ResourceCreate::new("", "/subscriptions/x", TagSet::new()).validate(),
            Err(ResourceError::ValidationError(_))
        ));
        assert!(matches!(
            ResourceCreate::new("vm-1", "", TagSet::new()).validate(),
            Err(ResourceError::ValidationError(_))
        ));
    }
}
