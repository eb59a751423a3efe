//! Modelgen - generate pydantic schema modules from ORM entity definitions
//!
//! Collects every entity reachable from a set of seeds, groups them by
//! declaring module and writes one Python module per group. Cross-module
//! references are imported for type checking only, so modules that
//! reference each other stay importable.

pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod extract;
pub mod generator;
pub mod graph;
pub mod model;
pub mod modulepath;
pub mod pipeline;
pub mod registry;
pub mod source;
pub mod template;

// Re-export main types
pub use collector::ModelsCollector;
pub use config::Config;
pub use error::{Error, Result};
pub use extract::Extractor;
pub use generator::{CodeGenerator, GenerationReport, GeneratorConfig};
pub use model::{CollectedModule, EntityHandle, EntityRef, ExtractedEntity, Field, FieldType};
pub use modulepath::ModulePath;
pub use pipeline::{Collection, Output, Pipeline};
pub use registry::NameRegistry;
pub use source::{DeclarativeSchema, SourceModel};
