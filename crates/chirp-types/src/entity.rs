//! Entity and searchability contracts.
//!
//! Every stored record type implements [`Entity`]. Types that participate in
//! full-text indexing additionally implement [`Searchable`] and surface the
//! capability through [`Entity::as_searchable`], so consumers dispatch on the
//! capability rather than inspecting concrete types.

/// A stored domain record.
///
/// Implementors provide a stable identifier unique within their collection
/// and the collection name used as the storage/index namespace.
pub trait Entity: Send + Sync {
    /// Stable identifier, unique within the collection.
    fn entity_id(&self) -> String;

    /// Collection (table) name this entity belongs to.
    fn collection(&self) -> &'static str;

    /// Expose the searchable capability, if this entity has one.
    ///
    /// The default implementation opts out; searchable types override this
    /// to return `Some(self)`.
    fn as_searchable(&self) -> Option<&dyn Searchable> {
        None
    }
}

/// Capability for entities that can be indexed in the search backend.
///
/// The declared fields are what the index stores and matches against; the
/// identifier and collection come from the [`Entity`] supertrait.
pub trait Searchable: Entity {
    /// Field name / field text pairs to index for this entity.
    fn searchable_fields(&self) -> Vec<(&'static str, String)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opaque;

    impl Entity for Opaque {
        fn entity_id(&self) -> String {
            "opaque-1".to_string()
        }

        fn collection(&self) -> &'static str {
            "opaque"
        }
    }

    struct Indexed {
        body: String,
    }

    impl Entity for Indexed {
        fn entity_id(&self) -> String {
            "indexed-1".to_string()
        }

        fn collection(&self) -> &'static str {
            "indexed"
        }

        fn as_searchable(&self) -> Option<&dyn Searchable> {
            Some(self)
        }
    }

    impl Searchable for Indexed {
        fn searchable_fields(&self) -> Vec<(&'static str, String)> {
            vec![("body", self.body.clone())]
        }
    }

    #[test]
    fn test_default_entity_is_not_searchable() {
        let entity = Opaque;
        assert!(entity.as_searchable().is_none());
    }

    #[test]
    fn test_capability_dispatch() {
        let entity = Indexed {
            body: "hello".to_string(),
        };
        let searchable = entity.as_searchable().unwrap();
        assert_eq!(searchable.searchable_fields(), vec![("body", "hello".to_string())]);
        assert_eq!(searchable.entity_id(), "indexed-1");
    }
}
