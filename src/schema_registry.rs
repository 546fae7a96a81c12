use jsonschema::JSONSchema;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use crate::{
    dataframe::DataFrame,
    schema_version::{numeric_suffix, SchemaVersion},
    validation::ValidationOutcome,
};

/// Sentinel returned by [`SchemaRegistry::detect_version`] when no known
/// version's column set matches the frame.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Directory of schema definitions relative to the crate root, used by
/// [`SchemaRegistry::load_default`].
pub const DEFAULT_SCHEMA_DIR: &str = "schemas";

/// Structural shape every `v<N>.json` definition file must satisfy before it
/// is deserialized. Checking against this first gives load warnings a precise
/// diagnostic instead of a serde type error.
const DEFINITION_SCHEMA: &str = r#"{
    "type": "object",
    "required": ["version", "description", "schema", "mapping"],
    "additionalProperties": false,
    "properties": {
        "version": { "type": "string", "pattern": "^v[0-9]+$" },
        "description": { "type": "string" },
        "schema": { "type": "object", "additionalProperties": { "type": "string" } },
        "mapping": { "type": "object", "additionalProperties": { "type": "string" } },
        "transformations": {
            "type": "object",
            "additionalProperties": { "enum": ["int", "float", "string"] }
        }
    }
}"#;

/// Centralized, versioned schema management for all data providers.
///
/// The registry eagerly loads its whole directory tree once at construction
/// and is read-only afterwards, so a single instance can be shared freely
/// across the pipeline. Provider keys mirror the directory hierarchy under
/// the schema root (`silver/audience_pulse`, `gold/movies_unified`, ...).
pub struct SchemaRegistry {
    schemas: HashMap<String, HashMap<String, SchemaVersion>>,
    load_errors: Vec<SchemaLoadError>,
}

/// A definition file that failed to load. Per-file failures are non-fatal:
/// they are warned about and recorded while the rest of the tree loads.
#[derive(Debug, Clone)]
pub struct SchemaLoadError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Schema directory not found: {}", .0.display())]
    SchemaRootMissing(PathBuf),

    #[error("Failed to scan schema directory {}: {source}", .path.display())]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema not found: {provider}/{version}. Available providers: {known:?}")]
    SchemaNotFound {
        provider: String,
        version: String,
        known: Vec<String>,
    },
}

/// A leaf directory holding version files, discovered during phase 1 of the
/// load. Parsing happens separately in phase 2 so discovery stays testable
/// on its own.
struct ProviderDir {
    key: String,
    files: Vec<PathBuf>,
}

impl SchemaRegistry {
    /// Load every schema version for every provider under `schema_dir`.
    ///
    /// A missing root directory is fatal. Individual definition files that
    /// fail structural validation or deserialization are skipped with a
    /// warning and recorded in [`load_errors`](Self::load_errors); a provider
    /// is registered as long as at least one of its versions parsed.
    pub fn load(schema_dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let root = schema_dir.as_ref();
        if !root.is_dir() {
            return Err(RegistryError::SchemaRootMissing(root.to_path_buf()));
        }

        let version_file = Regex::new(r"^v\d+\.json$").expect("version-file pattern is valid");
        let mut providers = Vec::new();
        discover_providers(root, "", &version_file, &mut providers)?;

        let meta: Value = serde_json::from_str(DEFINITION_SCHEMA)
            .expect("embedded definition schema is valid JSON");
        let validator = JSONSchema::compile(&meta).expect("embedded definition schema compiles");

        let mut schemas: HashMap<String, HashMap<String, SchemaVersion>> = HashMap::new();
        let mut load_errors = Vec::new();

        for provider in providers {
            let mut versions = HashMap::new();
            for file in &provider.files {
                let version = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match parse_definition_file(file, &validator) {
                    Ok(schema) => {
                        versions.insert(version, schema);
                    }
                    Err(message) => {
                        warn!(
                            path = %file.display(),
                            error = %message,
                            "skipping schema definition that failed to load"
                        );
                        load_errors.push(SchemaLoadError {
                            path: file.clone(),
                            message,
                        });
                    }
                }
            }
            if !versions.is_empty() {
                debug!(provider = %provider.key, versions = versions.len(), "registered provider");
                schemas.insert(provider.key, versions);
            }
        }

        Ok(Self {
            schemas,
            load_errors,
        })
    }

    /// Load from the crate's own `schemas/` tree.
    pub fn load_default() -> Result<Self, RegistryError> {
        Self::load(Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_SCHEMA_DIR))
    }

    /// Definition files skipped during the load.
    pub fn load_errors(&self) -> &[SchemaLoadError] {
        &self.load_errors
    }

    /// All registered provider keys, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.schemas.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Direct lookup of one schema version. Unknown provider or version is a
    /// miss, not an error.
    pub fn get_schema(&self, provider: &str, version: &str) -> Option<&SchemaVersion> {
        self.schemas.get(provider)?.get(version)
    }

    /// The provider's version with the numerically greatest suffix
    /// (`v10` beats `v2`), independent of filesystem enumeration order.
    pub fn get_latest_version(&self, provider: &str) -> Option<String> {
        self.schemas
            .get(provider)?
            .keys()
            .max_by_key(|v| numeric_suffix(v).unwrap_or(0))
            .cloned()
    }

    /// All known versions for a provider, in no particular order. Empty when
    /// the provider is unknown.
    pub fn list_versions(&self, provider: &str) -> Vec<String> {
        self.schemas
            .get(provider)
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Auto-detect which schema version a frame matches.
    ///
    /// Versions are tried newest first; the first whose full declared column
    /// set is a subset of the frame's columns wins, so extra columns are
    /// tolerated and a frame satisfying both an old version and a newer
    /// superset version detects as the newer one. Returns
    /// [`UNKNOWN_VERSION`] when nothing matches.
    pub fn detect_version(&self, provider: &str, frame: &DataFrame) -> String {
        let Some(versions) = self.schemas.get(provider) else {
            return UNKNOWN_VERSION.to_string();
        };

        let mut ordered: Vec<&String> = versions.keys().collect();
        ordered.sort_by_key(|v| std::cmp::Reverse(numeric_suffix(v).unwrap_or(0)));

        for version in ordered {
            let schema = &versions[version];
            if schema.schema.keys().all(|column| frame.has_column(column)) {
                return version.clone();
            }
        }

        UNKNOWN_VERSION.to_string()
    }

    /// Compare a frame's columns against a schema version's declared set.
    ///
    /// Missing declared columns are errors. Extra frame columns are reported
    /// as "ignored" but still land in the error list, so they flip
    /// `is_valid` as well — a long-standing quirk that callers depend on and
    /// that is deliberately preserved.
    pub fn validate_schema(
        &self,
        provider: &str,
        version: &str,
        frame: &DataFrame,
    ) -> ValidationOutcome {
        let Some(schema) = self.get_schema(provider, version) else {
            return ValidationOutcome::invalid(vec![format!(
                "Schema not found: {provider}/{version}"
            )]);
        };

        let expected: BTreeSet<&str> = schema.schema.keys().map(String::as_str).collect();
        let actual: BTreeSet<&str> = frame.column_names().into_iter().collect();

        let mut outcome = ValidationOutcome::valid();

        let missing: Vec<&str> = expected.difference(&actual).copied().collect();
        if !missing.is_empty() {
            outcome.add_error(format!("Missing columns: {}", missing.join(", ")));
        }

        let extra: Vec<&str> = actual.difference(&expected).copied().collect();
        if !extra.is_empty() {
            outcome.add_error(format!("Extra columns (ignored): {}", extra.join(", ")));
        }

        outcome
    }

    /// Run the full pipeline for one frame: coercions first (keyed by source
    /// column names), then the rename mapping. The order is load-bearing and
    /// fixed.
    pub fn transform_dataframe(
        &self,
        provider: &str,
        version: &str,
        frame: &DataFrame,
    ) -> Result<DataFrame, RegistryError> {
        let Some(schema) = self.get_schema(provider, version) else {
            return Err(RegistryError::SchemaNotFound {
                provider: provider.to_string(),
                version: version.to_string(),
                known: self.providers(),
            });
        };

        let transformed = schema.apply_transformations(frame);
        Ok(schema.apply_mapping(&transformed))
    }
}

/// Phase 1: walk the tree under `dir`, classifying each subdirectory. A
/// directory that directly contains version files is a provider and is not
/// recursed further; otherwise recursion continues with the prefix extended
/// by the directory's name.
fn discover_providers(
    dir: &Path,
    prefix: &str,
    version_file: &Regex,
    out: &mut Vec<ProviderDir>,
) -> Result<(), RegistryError> {
    let mut subdirs: Vec<PathBuf> = read_dir_entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();

    for subdir in subdirs {
        let name = subdir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        let mut files: Vec<PathBuf> = read_dir_entries(&subdir)?
            .into_iter()
            .filter(|p| {
                p.is_file()
                    && p.file_name()
                        .map(|n| version_file.is_match(&n.to_string_lossy()))
                        .unwrap_or(false)
            })
            .collect();

        if files.is_empty() {
            discover_providers(&subdir, &key, version_file, out)?;
        } else {
            files.sort();
            out.push(ProviderDir { key, files });
        }
    }

    Ok(())
}

fn read_dir_entries(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let entries = fs::read_dir(dir).map_err(|source| RegistryError::ScanFailed {
        path: dir.to_path_buf(),
        source,
    })?;
    entries
        .map(|entry| {
            entry
                .map(|e| e.path())
                .map_err(|source| RegistryError::ScanFailed {
                    path: dir.to_path_buf(),
                    source,
                })
        })
        .collect()
}

/// Phase 2: load one definition file. Any failure is reported as a message
/// for the load-error record; it never aborts the surrounding tree load.
fn parse_definition_file(path: &Path, validator: &JSONSchema) -> Result<SchemaVersion, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read failed: {e}"))?;
    let raw: Value = serde_json::from_str(&text).map_err(|e| format!("invalid JSON: {e}"))?;

    if let Err(errors) = validator.validate(&raw) {
        let details: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(format!(
            "definition does not match the expected shape: {}",
            details.join("; ")
        ));
    }

    serde_json::from_value(raw).map_err(|e| format!("deserialization failed: {e}"))
}
