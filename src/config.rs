use crate::error::{Error, Result};
use crate::generator::GeneratorConfig;
use crate::modulepath::is_identifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub source: SourceConfig,
    pub output: OutputConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
}

/// Where entity definitions come from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Schema files or directories
    pub paths: Vec<PathBuf>,
    /// Qualified entity names to start from; empty means every entity
    pub seeds: Vec<String>,
    /// Attributes to keep: `field` or `Entity.field`; cannot be combined with `exclude`
    pub include: Vec<String>,
    /// Attributes to leave out: `field` or `Entity.field`
    pub exclude: Vec<String>,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub directory: PathBuf,
    /// Import prefix of the generated tree, defaults to the directory name
    pub package: Option<String>,
    pub indent: String,
    pub sequence_type: String,
    pub orm_mode: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Python,
    Json,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            directory: PathBuf::from("__generated"),
            package: None,
            indent: "    ".to_string(),
            sequence_type: "List".to_string(),
            orm_mode: false,
        }
    }
}

impl OutputConfig {
    /// Import prefix: the configured package or the output directory's name
    pub fn package_name(&self) -> String {
        match &self.package {
            Some(package) => package.clone(),
            None => self
                .directory
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string(),
        }
    }

    pub fn generator_config(&self, show_progress: bool) -> GeneratorConfig {
        GeneratorConfig {
            output_dir: self.directory.clone(),
            package: self.package_name(),
            indent: self.indent.clone(),
            sequence_type: self.sequence_type.clone(),
            orm_mode: self.orm_mode,
            show_progress,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        paths: Vec<PathBuf>,
        seeds: Vec<String>,
        include: Vec<String>,
        exclude: Vec<String>,
        output: Option<PathBuf>,
        package: Option<String>,
        format: Option<String>,
    ) {
        if !paths.is_empty() {
            self.source.paths = paths;
        }

        if !seeds.is_empty() {
            self.source.seeds = seeds;
        }

        if !include.is_empty() {
            self.source.include.extend(include);
        }

        if !exclude.is_empty() {
            self.source.exclude.extend(exclude);
        }

        if let Some(out) = output {
            self.output.directory = out;
        }

        if let Some(pkg) = package {
            self.output.package = Some(pkg);
        }

        if let Some(fmt) = format {
            self.output.format = match fmt.as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Python,
            };
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.source.include.is_empty() && !self.source.exclude.is_empty() {
            return Err(Error::config_validation(
                "include and exclude cannot both be set",
            ));
        }

        if self.output.indent.is_empty() {
            return Err(Error::config_validation("indent must not be empty"));
        }

        if !self.output.indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(Error::config_validation(
                "indent may only contain spaces and tabs",
            ));
        }

        if !is_identifier(&self.output.sequence_type) {
            return Err(Error::config_validation(format!(
                "sequence_type {:?} is not an identifier",
                self.output.sequence_type
            )));
        }

        let package = self.output.package_name();
        if !package.is_empty() && !package.split('.').all(is_identifier) {
            return Err(Error::config_validation(format!(
                "package {:?} is not a valid import path",
                package
            )));
        }

        Ok(())
    }
}
