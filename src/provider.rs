use thiserror::Error;
use crate::{
    dataframe::DataFrame,
    schema_registry::{RegistryError, SchemaRegistry, UNKNOWN_VERSION},
};

/// Capability interface for anything that holds a tabular dataset under a
/// registry schema key. The registry only ever needs this view, never the
/// concrete provider type.
pub trait DataProvider {
    /// Registry key for this provider's schemas, e.g. `silver/box_office`.
    fn schema_key(&self) -> &str;

    /// The provider's current table.
    fn frame(&self) -> &DataFrame;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Could not detect a schema version for {provider}")]
    VersionDetectionFailed { provider: String },

    #[error("Validation failed for {provider}/{version}: {errors:?}")]
    ValidationFailed {
        provider: String,
        version: String,
        errors: Vec<String>,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// A silver-layer table: a raw bronze frame pushed through the registry's
/// transform pipeline for one provider key. The registry instance is passed
/// in explicitly; providers never construct their own.
#[derive(Debug)]
pub struct SilverTable {
    schema_key: String,
    version: String,
    frame: DataFrame,
}

impl SilverTable {
    /// Detect the schema version of `raw` and run the transform pipeline.
    /// An undetectable version is a hard error; nothing sensible can be
    /// standardized without one.
    pub fn parse(
        registry: &SchemaRegistry,
        schema_key: &str,
        raw: &DataFrame,
    ) -> Result<Self, ProviderError> {
        let version = registry.detect_version(schema_key, raw);
        if version == UNKNOWN_VERSION {
            return Err(ProviderError::VersionDetectionFailed {
                provider: schema_key.to_string(),
            });
        }
        let frame = registry.transform_dataframe(schema_key, &version, raw)?;
        Ok(Self {
            schema_key: schema_key.to_string(),
            version,
            frame,
        })
    }

    /// Like [`parse`](Self::parse) with a pinned version, but validates the
    /// raw frame first and escalates an invalid outcome into an error, the
    /// way the bronze layer treats malformed input as fatal. Note that
    /// validation rejects extra columns, so this path requires an exact
    /// column match.
    pub fn parse_strict(
        registry: &SchemaRegistry,
        schema_key: &str,
        version: &str,
        raw: &DataFrame,
    ) -> Result<Self, ProviderError> {
        let outcome = registry.validate_schema(schema_key, version, raw);
        if !outcome.is_valid {
            return Err(ProviderError::ValidationFailed {
                provider: schema_key.to_string(),
                version: version.to_string(),
                errors: outcome.errors,
            });
        }
        let frame = registry.transform_dataframe(schema_key, version, raw)?;
        Ok(Self {
            schema_key: schema_key.to_string(),
            version: version.to_string(),
            frame,
        })
    }

    /// Schema version the table was standardized with.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }
}

impl DataProvider for SilverTable {
    fn schema_key(&self) -> &str {
        &self.schema_key
    }

    fn frame(&self) -> &DataFrame {
        &self.frame
    }
}
