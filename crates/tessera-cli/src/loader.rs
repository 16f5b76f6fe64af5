//! Loading schema and instance documents from disk
//!
//! Documents are JSON unless their extension is `.yaml` or `.yml`. Schemas
//! are registered under their `file://` URI so relative references resolve
//! against the directory they live in.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tessera_schema::{DocumentResolver, JsonSchema, SchemaRegistry};
use url::Url;

const SCHEMA_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Read a JSON or YAML document
pub fn load_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Read document");

    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
            reason: e.to_string(),
        })
    } else {
        serde_json::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Read and build a schema document
pub fn load_schema(path: &Path) -> Result<JsonSchema> {
    let value = load_document(path)?;
    JsonSchema::from_value(&value).map_err(|source| Error::Schema {
        path: path.to_path_buf(),
        source,
    })
}

/// The `file://` URI of a path on disk
pub fn file_uri(path: &Path) -> Result<Url> {
    let absolute = fs::canonicalize(path)?;
    Url::from_file_path(&absolute)
        .map_err(|()| Error::invalid_args(format!("Cannot express {} as a file URI", absolute.display())))
}

/// Load `path` and register it under its file URI
pub fn register_schema_file(registry: &mut SchemaRegistry, path: &Path) -> Result<Arc<JsonSchema>> {
    let schema = load_schema(path)?;
    let uri = file_uri(path)?;
    registry
        .register_with_uri(schema, uri.as_str())
        .map_err(|source| Error::Schema {
            path: path.to_path_buf(),
            source,
        })
}

/// Schema files directly inside `dir`, sorted by name
pub fn schema_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let known = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| SCHEMA_EXTENSIONS.contains(&ext));
        if path.is_file() && known {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Register every schema document in `dirs`, skipping `except`
///
/// Returns the number of documents registered.
pub fn preload_directories(registry: &mut SchemaRegistry, dirs: &[PathBuf], except: Option<&Path>) -> Result<usize> {
    let skip = except.map(fs::canonicalize).transpose()?;
    let mut count = 0;
    for dir in dirs {
        for path in schema_files(dir)? {
            if skip.as_deref() == Some(fs::canonicalize(&path)?.as_path()) {
                continue;
            }
            register_schema_file(registry, &path)?;
            count += 1;
        }
    }
    tracing::debug!(count, "Preloaded schema documents");
    Ok(count)
}

/// Serves `$ref` targets from local directories
///
/// `file://` URIs are read directly. Any other URI is matched by its last
/// path segment against the files in the search directories, so
/// `https://example.com/schemas/address.json` finds `address.json`. Nothing
/// is ever fetched over a network.
pub struct DirectoryResolver {
    directories: Vec<PathBuf>,
    cache: Mutex<HashMap<Url, Option<Arc<JsonSchema>>>>,
}

impl DirectoryResolver {
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self {
            directories,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn locate(&self, uri: &Url) -> Option<PathBuf> {
        if uri.scheme() == "file" {
            return uri.to_file_path().ok().filter(|path| path.is_file());
        }
        let name = uri.path_segments()?.next_back().filter(|name| !name.is_empty())?;
        self.directories
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    fn load(&self, uri: &Url) -> Option<Arc<JsonSchema>> {
        let path = self.locate(uri)?;
        match load_schema(&path) {
            Ok(schema) => {
                tracing::debug!(uri = %uri, path = %path.display(), "Resolved reference from disk");
                Some(Arc::new(schema))
            }
            Err(e) => {
                tracing::warn!(uri = %uri, "Could not load referenced schema: {}", e);
                None
            }
        }
    }
}

impl DocumentResolver for DirectoryResolver {
    fn resolve(&self, uri: &Url) -> Option<Arc<JsonSchema>> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(uri) {
                return hit.clone();
            }
        }
        let loaded = self.load(uri);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(uri.clone(), loaded.clone());
        }
        loaded
    }
}

impl fmt::Debug for DirectoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryResolver")
            .field("directories", &self.directories)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = write(&dir, "a.json", r#"{"name": "x", "tags": [1, 2]}"#);
        let yaml_path = write(&dir, "a.yaml", "name: x\ntags:\n  - 1\n  - 2\n");

        let expected = json!({"name": "x", "tags": [1, 2]});
        assert_eq!(load_document(&json_path).unwrap(), expected);
        assert_eq!(load_document(&yaml_path).unwrap(), expected);
    }

    #[test]
    fn test_malformed_documents_report_expected_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "broken.json", "{not json");
        match load_document(&path) {
            Err(Error::InvalidFormat { expected, .. }) => assert_eq!(expected, "JSON"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            load_document(&dir.path().join("absent.json")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_schema_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "schema.json", r#"{"minimum": "five"}"#);
        match load_schema(&path) {
            Err(Error::Schema { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_schema_files_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "b.yaml", "type: string");
        write(&dir, "a.json", "{}");
        write(&dir, "notes.txt", "ignored");

        let names: Vec<String> = schema_files(dir.path())
            .unwrap()
            .iter()
            .filter_map(|path| path.file_name()?.to_str().map(String::from))
            .collect();
        assert_eq!(names, vec!["a.json".to_string(), "b.yaml".to_string()]);
    }

    #[test]
    fn test_resolver_matches_file_names_and_file_uris() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "address.json", r#"{"type": "object"}"#);
        let resolver = DirectoryResolver::new(vec![dir.path().to_path_buf()]);

        let remote = Url::parse("https://example.com/schemas/address.json").unwrap();
        assert!(resolver.resolve(&remote).is_some());
        assert!(resolver.resolve(&file_uri(&path).unwrap()).is_some());

        let missing = Url::parse("https://example.com/schemas/other.json").unwrap();
        assert!(resolver.resolve(&missing).is_none());
        let directory = Url::parse("https://example.com/schemas/").unwrap();
        assert!(resolver.resolve(&directory).is_none());
    }

    #[test]
    fn test_preload_registers_identified_documents() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "positive.json", r#"{"$id": "https://example.com/positive.json", "minimum": 0}"#);
        let root = write(&dir, "root.json", r#"{"$ref": "https://example.com/positive.json"}"#);

        let mut registry = SchemaRegistry::new();
        let count = preload_directories(&mut registry, &[dir.path().to_path_buf()], Some(&root)).unwrap();
        assert_eq!(count, 1);

        let id = Url::parse("https://example.com/positive.json").unwrap();
        assert!(registry.contains_resource(&id));
    }

    #[test]
    fn test_relative_references_resolve_against_the_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "name.json", r#"{"type": "string", "minLength": 1}"#);
        let root = write(&dir, "root.json", r#"{"properties": {"name": {"$ref": "name.json"}}}"#);

        let mut registry = SchemaRegistry::new();
        let schema = register_schema_file(&mut registry, &root).unwrap();
        let options = tessera_schema::ValidationOptions::default()
            .with_resolver(DirectoryResolver::new(vec![dir.path().to_path_buf()]));
        let validator = tessera_schema::Validator::new(registry, options);

        assert!(validator.is_valid(&schema, &json!({"name": "x"})).unwrap());
        assert!(!validator.is_valid(&schema, &json!({"name": ""})).unwrap());
    }
}
