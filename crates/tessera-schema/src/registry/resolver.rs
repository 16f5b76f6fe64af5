//! Host-supplied retrieval of schema documents
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use crate::schema::JsonSchema;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Supplies documents for resource URIs the registry does not know
///
/// The engine calls this lazily when a `$ref` points outside every registered
/// resource. The URI passed in never carries a fragment. Returning `None`
/// leaves the reference unresolved.
pub trait DocumentResolver: Send + Sync {
    fn resolve(&self, uri: &Url) -> Option<Arc<JsonSchema>>;
}

impl<F> DocumentResolver for F
where
    F: Fn(&Url) -> Option<Arc<JsonSchema>> + Send + Sync,
{
    fn resolve(&self, uri: &Url) -> Option<Arc<JsonSchema>> {
        self(uri)
    }
}

/// A fixed map of documents, handy for tests and embedded schema bundles
#[derive(Default, Clone)]
pub struct StaticResolver {
    documents: HashMap<Url, Arc<JsonSchema>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document under `uri`; a fragment on `uri` is ignored
    pub fn with_document(mut self, mut uri: Url, schema: JsonSchema) -> Self {
        uri.set_fragment(None);
        self.documents.insert(uri, Arc::new(schema));
        self
    }
}

impl DocumentResolver for StaticResolver {
    fn resolve(&self, uri: &Url) -> Option<Arc<JsonSchema>> {
        self.documents.get(uri).cloned()
    }
}

impl fmt::Debug for StaticResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticResolver")
            .field("documents", &self.documents.keys().map(Url::as_str).collect::<Vec<_>>())
            .finish()
    }
}
