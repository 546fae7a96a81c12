// Versioned schema management for the movies bronze/silver/gold pipeline
pub mod dataframe;
pub mod provider;
pub mod schema_registry;
pub mod schema_version;
pub mod transform;
pub mod validation;

// Re-export core types for convenience
pub use dataframe::{CellValue, Column, DataFrame};
pub use provider::{DataProvider, ProviderError, SilverTable};
pub use schema_registry::{
    RegistryError, SchemaLoadError, SchemaRegistry, DEFAULT_SCHEMA_DIR, UNKNOWN_VERSION,
};
pub use schema_version::SchemaVersion;
pub use transform::TransformKind;
pub use validation::ValidationOutcome;
