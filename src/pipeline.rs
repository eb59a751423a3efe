// Generation pipeline: load -> seed -> collect -> write

use crate::collector::ModelsCollector;
use crate::config::{Config, OutputFormat};
use crate::error::{Error, Result};
use crate::extract::Extractor;
use crate::generator::{CodeGenerator, GenerationReport};
use crate::graph::ImportGraph;
use crate::model::{CollectedModule, EntityHandle};
use crate::modulepath::ModulePath;
use crate::registry::NameRegistry;
use crate::source::{DeclarativeSchema, SourceModel};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Result of collecting from the configured seeds
#[derive(Debug)]
pub struct Collection {
    pub modules: BTreeMap<ModulePath, CollectedModule>,
    /// How many times the extractor ran
    pub extractions: usize,
}

impl Collection {
    pub fn entity_count(&self) -> usize {
        self.modules.values().map(|m| m.entities.len()).sum()
    }

    pub fn cross_import_count(&self) -> usize {
        self.modules.values().map(|m| m.cross_imports.len()).sum()
    }

    pub fn import_graph(&self) -> ImportGraph {
        ImportGraph::build(&self.modules)
    }
}

/// Orchestrates one generation run
pub struct Pipeline {
    config: Config,
    verbose: bool,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            verbose: false,
        }
    }

    /// Show progress while writing
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the configured schema files
    pub fn load_schema(&self) -> Result<DeclarativeSchema> {
        if self.config.source.paths.is_empty() {
            return Err(Error::config_validation("no schema paths given"));
        }
        let schema = DeclarativeSchema::load(&self.config.source.paths)?;
        info!(entities = schema.len(), "loaded schema");
        Ok(schema)
    }

    /// Configured seeds, or every entity when none are configured
    pub fn resolve_seeds<S: SourceModel + ?Sized>(&self, source: &S) -> Result<Vec<EntityHandle>> {
        if self.config.source.seeds.is_empty() {
            return Ok((0..source.len()).map(EntityHandle).collect());
        }
        self.config
            .source
            .seeds
            .iter()
            .map(|name| source.lookup(name).ok_or_else(|| Error::UnknownEntity(name.clone())))
            .collect()
    }

    /// Traverse everything reachable from the seeds
    pub fn collect<S: SourceModel + ?Sized>(&self, source: &S) -> Result<Collection> {
        let seeds = self.resolve_seeds(source)?;
        let extractor = Extractor::with_filters(
            self.config.source.include.clone(),
            self.config.source.exclude.clone(),
        )?;
        let mut collector = ModelsCollector::new(source).with_extractor(extractor);
        collector.collect_all(seeds)?;

        let extractions = collector.extraction_count();
        info!(
            entities = collector.entity_count(),
            modules = collector.modules().len(),
            "collection complete"
        );
        Ok(Collection {
            modules: collector.into_modules(),
            extractions,
        })
    }

    /// Write the collection in the configured format
    pub fn write(&self, collection: &Collection, registry: &mut NameRegistry) -> Result<Output> {
        match self.config.output.format {
            OutputFormat::Python => {
                for cycle in collection.import_graph().cycles() {
                    let names: Vec<String> = cycle.iter().map(ModulePath::dotted).collect();
                    info!(modules = %names.join(", "), "mutually importing modules, imports deferred");
                }
                let generator =
                    CodeGenerator::new(self.config.output.generator_config(self.verbose));
                Ok(Output::Python(generator.generate(&collection.modules, registry)?))
            }
            OutputFormat::Json => Ok(Output::Json(self.write_json(collection)?)),
        }
    }

    /// Dump the collected modules as `collected.json`
    pub fn write_json(&self, collection: &Collection) -> Result<PathBuf> {
        let modules: Vec<&CollectedModule> = collection.modules.values().collect();
        let json = serde_json::to_string_pretty(&modules)?;
        fs::create_dir_all(&self.config.output.directory)?;
        let path = self.config.output.directory.join("collected.json");
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Load, collect and write in one go
    pub fn run(&self, registry: &mut NameRegistry) -> Result<Output> {
        let schema = self.load_schema()?;
        let collection = self.collect(&schema)?;
        self.write(&collection, registry)
    }
}

/// What a run produced
#[derive(Debug)]
pub enum Output {
    Python(GenerationReport),
    Json(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
[[entity]]
name = "A"
module = "m1"

[[entity.attribute]]
kind = "relationship"
name = "b"
target = "B"
direction = "many-to-one"

[[entity]]
name = "B"
module = "m2"

[[entity]]
name = "C"
module = "m2"
"#;

    #[test]
    fn test_no_seeds_means_all_entities() {
        let schema = DeclarativeSchema::from_toml(SCHEMA).unwrap();
        let pipeline = Pipeline::new(Config::default());
        let seeds = pipeline.resolve_seeds(&schema).unwrap();
        assert_eq!(seeds.len(), 3);
    }

    #[test]
    fn test_seeds_limit_collection() {
        let schema = DeclarativeSchema::from_toml(SCHEMA).unwrap();
        let mut config = Config::default();
        config.source.seeds = vec!["m1.A".to_string()];
        let collection = Pipeline::new(config).collect(&schema).unwrap();

        assert_eq!(collection.entity_count(), 2);
        assert_eq!(collection.extractions, 2);
        assert_eq!(collection.cross_import_count(), 1);
    }

    #[test]
    fn test_unknown_seed_fails() {
        let schema = DeclarativeSchema::from_toml(SCHEMA).unwrap();
        let mut config = Config::default();
        config.source.seeds = vec!["Nope".to_string()];
        let err = Pipeline::new(config).collect(&schema).unwrap_err();
        assert!(matches!(err, Error::UnknownEntity(_)));
    }

    #[test]
    fn test_include_limits_fields() {
        let schema = DeclarativeSchema::from_toml(SCHEMA).unwrap();
        let mut config = Config::default();
        config.source.include = vec!["A.missing".to_string()];
        let collection = Pipeline::new(config).collect(&schema).unwrap();

        // A loses its relationship, B is still collected as a seed
        let a = &collection.modules[&ModulePath::parse("m1").unwrap()].entities[0];
        assert!(a.fields.is_empty());
        assert_eq!(collection.cross_import_count(), 0);
        assert_eq!(collection.entity_count(), 3);
    }

    #[test]
    fn test_include_with_exclude_fails() {
        let schema = DeclarativeSchema::from_toml(SCHEMA).unwrap();
        let mut config = Config::default();
        config.source.include = vec!["b".to_string()];
        config.source.exclude = vec!["c".to_string()];
        let err = Pipeline::new(config).collect(&schema).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation(_)));
    }

    #[test]
    fn test_load_requires_paths() {
        let err = Pipeline::new(Config::default()).load_schema().unwrap_err();
        assert!(matches!(err, Error::ConfigValidation(_)));
    }

    #[test]
    fn test_run_json_output() {
        let dir = TempDir::new().unwrap();
        let schema_path = dir.path().join("schema.toml");
        fs::write(&schema_path, SCHEMA).unwrap();

        let mut config = Config::default();
        config.source.paths = vec![schema_path];
        config.output.directory = dir.path().join("out");
        config.output.format = OutputFormat::Json;

        let output = Pipeline::new(config).run(&mut NameRegistry::new()).unwrap();
        let path = match output {
            Output::Json(path) => path,
            other => panic!("Expected JSON output, got {:?}", other),
        };
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["module_path"], "m1");
        assert_eq!(value[0]["entities"][0]["ref"]["name"], "A");
    }
}
