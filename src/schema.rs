//! Schema collaborator seam.
//!
//! The endpoint never interprets a schema; it only selects one per request
//! and forwards it to the engine. The trait asks for the single thing the
//! endpoint itself consumes: field-name listings for the management surface.

use std::sync::Arc;

use crate::context::RequestHead;

/// An engine schema as the endpoint sees it. Hosts wrap their engine's
/// schema type and expose the root field listings.
pub trait GraphQLSchema: Send + Sync {
    /// Field names under the query root.
    fn query_field_names(&self) -> Vec<String>;
    /// Field names under the mutation root; empty when mutations are not
    /// served (for example on a read-only view).
    fn mutation_field_names(&self) -> Vec<String>;
}

/// Hands out the schema serving a request.
///
/// GET traffic (including the introspection path) executes against the
/// read-only view; POST traffic gets the full schema.
pub trait SchemaProvider: Send + Sync {
    fn schema(&self, request: Option<&RequestHead>) -> Arc<dyn GraphQLSchema>;
    fn read_only_schema(&self, request: Option<&RequestHead>) -> Arc<dyn GraphQLSchema>;
}

/// Schema descriptor for hosts that only need name listings, and for the
/// demo engine and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldListSchema {
    query_fields: Vec<String>,
    mutation_fields: Vec<String>,
}

impl FieldListSchema {
    pub fn new(query_fields: Vec<String>, mutation_fields: Vec<String>) -> Self {
        Self {
            query_fields,
            mutation_fields,
        }
    }

    /// The same schema with the mutation root withheld.
    pub fn read_only(&self) -> Self {
        Self {
            query_fields: self.query_fields.clone(),
            mutation_fields: Vec::new(),
        }
    }
}

impl GraphQLSchema for FieldListSchema {
    fn query_field_names(&self) -> Vec<String> {
        self.query_fields.clone()
    }

    fn mutation_field_names(&self) -> Vec<String> {
        self.mutation_fields.clone()
    }
}

/// Serves one fixed schema, and its read-only view, to every request.
pub struct StaticSchemaProvider {
    schema: Arc<dyn GraphQLSchema>,
    read_only: Arc<dyn GraphQLSchema>,
}

impl StaticSchemaProvider {
    pub fn new(schema: FieldListSchema) -> Self {
        let read_only: Arc<dyn GraphQLSchema> = Arc::new(schema.read_only());
        Self {
            schema: Arc::new(schema),
            read_only,
        }
    }

    /// For hosts bringing their own schema handles.
    pub fn from_parts(
        schema: Arc<dyn GraphQLSchema>,
        read_only: Arc<dyn GraphQLSchema>,
    ) -> Self {
        Self { schema, read_only }
    }
}

impl SchemaProvider for StaticSchemaProvider {
    fn schema(&self, _request: Option<&RequestHead>) -> Arc<dyn GraphQLSchema> {
        Arc::clone(&self.schema)
    }

    fn read_only_schema(&self, _request: Option<&RequestHead>) -> Arc<dyn GraphQLSchema> {
        Arc::clone(&self.read_only)
    }
}
