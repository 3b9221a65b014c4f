//! generator configuration
//!
//! build a [`GeneratorConfig`] with defaults and optional overrides, or load
//! one from a json file. pass it to [`crate::generate`].

use crate::codegen::naming::is_swift_identifier;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// how generated declarations are split into artifacts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputMode {
    /// one artifact holding every declaration
    #[default]
    Combined,
    /// one artifact per source document plus a shared types artifact
    PerFile,
}

/// configuration for the swift generator
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// wrapper enum every declaration is nested in
    pub(crate) namespace: Option<String>,

    /// emit custom scalars under their own (prefixed) name instead of `String`
    pub(crate) passthrough_custom_scalars: bool,

    /// prefix for passed-through custom scalar names
    pub(crate) custom_scalars_prefix: String,

    /// merge fields of spread fragments into the spreading type
    pub(crate) merge_in_fields_from_fragment_spreads: bool,

    /// emit a sha-256 operation identifier per operation
    pub(crate) generate_operation_ids: bool,

    /// combined or per-file artifacts
    pub(crate) output_mode: OutputMode,

    /// file name of the combined artifact
    pub(crate) combined_file_name: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            passthrough_custom_scalars: false,
            custom_scalars_prefix: String::new(),
            merge_in_fields_from_fragment_spreads: true,
            generate_operation_ids: false,
            output_mode: OutputMode::Combined,
            combined_file_name: "API.swift".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// create a configuration with default settings
    ///
    /// # example
    ///
    /// ```
    /// use typecase::GeneratorConfig;
    ///
    /// let config = GeneratorConfig::new()
    ///     .with_namespace("StarWarsAPI")
    ///     .with_operation_ids(true);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// load a configuration from a json file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// nest every declaration in `public enum <namespace>`
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// pass custom scalars through under their own names
    ///
    /// default: disabled (custom scalars become `String`)
    pub fn with_passthrough_custom_scalars(mut self, passthrough: bool) -> Self {
        self.passthrough_custom_scalars = passthrough;
        self
    }

    /// set the prefix for passed-through custom scalars
    pub fn with_custom_scalars_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.custom_scalars_prefix = prefix.into();
        self
    }

    /// merge fields from spread fragments into the spreading type
    ///
    /// default: enabled
    pub fn with_merge_in_fields_from_fragment_spreads(mut self, merge: bool) -> Self {
        self.merge_in_fields_from_fragment_spreads = merge;
        self
    }

    /// emit operation identifiers and the operation-id manifest
    ///
    /// default: disabled
    pub fn with_operation_ids(mut self, generate: bool) -> Self {
        self.generate_operation_ids = generate;
        self
    }

    /// choose combined or per-file output
    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// set the combined artifact's file name
    ///
    /// default: `API.swift`
    pub fn with_combined_file_name(mut self, name: impl Into<String>) -> Self {
        self.combined_file_name = name.into();
        self
    }

    /// wrapper namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// configured output mode
    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(namespace) = &self.namespace {
            if !is_swift_identifier(namespace) {
                return Err(Error::Config(format!(
                    "invalid namespace: {namespace}. must be a swift identifier"
                )));
            }
        }

        if !self.custom_scalars_prefix.is_empty()
            && !is_swift_identifier(&self.custom_scalars_prefix)
        {
            return Err(Error::Config(format!(
                "invalid custom scalars prefix: {}",
                self.custom_scalars_prefix
            )));
        }

        if self.output_mode == OutputMode::Combined && self.combined_file_name.trim().is_empty() {
            return Err(Error::Config(
                "combined file name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
