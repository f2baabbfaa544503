//! Tantivy schema definition for entity search.
//!
//! One index holds documents from every searchable collection. Documents
//! are addressed by a composite `key` (`{collection}:{id}`) so upserts and
//! removals in one collection never touch another.

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

use crate::error::SearchError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct SearchSchema {
    schema: Schema,
    /// Composite delete key: "{collection}:{id}" (STRING)
    pub key: Field,
    /// Collection name, used as a query filter (STRING | STORED)
    pub collection: Field,
    /// Entity identifier within its collection (STRING | STORED)
    pub doc_id: Field,
    /// Searchable text: declared field values joined (TEXT)
    pub text: Field,
}

impl SearchSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a SearchSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let key = schema
            .get_field("key")
            .map_err(|_| SearchError::SchemaMismatch("missing key field".into()))?;
        let collection = schema
            .get_field("collection")
            .map_err(|_| SearchError::SchemaMismatch("missing collection field".into()))?;
        let doc_id = schema
            .get_field("doc_id")
            .map_err(|_| SearchError::SchemaMismatch("missing doc_id field".into()))?;
        let text = schema
            .get_field("text")
            .map_err(|_| SearchError::SchemaMismatch("missing text field".into()))?;

        Ok(Self {
            schema,
            key,
            collection,
            doc_id,
            text,
        })
    }

    /// Composite key value for a document.
    pub fn key_value(collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }
}

/// Build the entity search schema.
///
/// Schema fields:
/// - key: STRING - composite "{collection}:{id}" used for deletes
/// - collection: STRING | STORED - namespace filter
/// - doc_id: STRING | STORED - entity id returned to callers
/// - text: TEXT - searchable content
pub fn build_search_schema() -> SearchSchema {
    let mut schema_builder = Schema::builder();

    let key = schema_builder.add_text_field("key", STRING);
    let collection = schema_builder.add_text_field("collection", STRING | STORED);
    let doc_id = schema_builder.add_text_field("doc_id", STRING | STORED);
    let text = schema_builder.add_text_field("text", TEXT);

    let schema = schema_builder.build();

    SearchSchema {
        schema,
        key,
        collection,
        doc_id,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_schema() {
        let schema = build_search_schema();
        assert!(schema.schema.get_field("key").is_ok());
        assert!(schema.schema.get_field("collection").is_ok());
        assert!(schema.schema.get_field("doc_id").is_ok());
        assert!(schema.schema.get_field("text").is_ok());
    }

    #[test]
    fn test_from_schema() {
        let original = build_search_schema();
        let rebuilt = SearchSchema::from_schema(original.schema().clone()).unwrap();
        assert_eq!(rebuilt.key, original.key);
        assert_eq!(rebuilt.doc_id, original.doc_id);
        assert_eq!(rebuilt.text, original.text);
    }

    #[test]
    fn test_key_value() {
        assert_eq!(SearchSchema::key_value("post", "abc"), "post:abc");
    }
}
