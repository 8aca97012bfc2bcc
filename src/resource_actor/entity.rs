//! [`RegistryEntity`] implementation for the [`Resource`] domain type.
//!
//! This is what lets a [`Resource`] be stored by the generic
//! [`RegistryActor`](crate::framework::RegistryActor).

use crate::framework::RegistryEntity;
use crate::model::{Resource, ResourceCreate, ResourceId};

use super::ResourceError;

impl RegistryEntity for Resource {
    type Id = ResourceId;
    type Create = ResourceCreate;
    type Error = ResourceError;

    /// Builds the stored record, stamping the creation time.
    ///
    /// Field validation is the caller's job (see [`ResourceCreate::validate`]);
    /// the registry accepts any payload.
    fn from_create_params(id: ResourceId, params: ResourceCreate) -> Result<Self, ResourceError> {
        Ok(Self {
            id,
            name: params.name,
            tags: params.tags,
            remote_id: params.remote_id,
            created_at: chrono::Utc::now().timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TagSet;

    #[test]
    fn test_from_create_params_keeps_payload() {
        let mut tags = TagSet::new();
        tags.insert("env".into(), "dev".into());
        let before = chrono::Utc::now().timestamp();

        let resource = Resource::from_create_params(
            ResourceId::from("res_1"),
            ResourceCreate::new("vm-1", "/subscriptions/x/vm-1", tags.clone()),
        )
        .unwrap();

        assert_eq!(resource.id, ResourceId::from("res_1"));
        assert_eq!(resource.name, "vm-1");
        assert_eq!(resource.remote_id, "/subscriptions/x/vm-1");
        assert_eq!(resource.tags, tags);
        assert!(resource.created_at >= before);
    }
}
