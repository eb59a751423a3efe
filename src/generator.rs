// Python schema module generator
//
// Writes one pydantic module per collected module. Imports between
// generated modules are emitted under `if TYPE_CHECKING:` only, so two
// modules that reference each other never import each other at load time.

use crate::error::{Error, Result};
use crate::model::{CollectedModule, ExtractedEntity, Field, FieldDefault, FieldType, Literal};
use crate::modulepath::ModulePath;
use crate::registry::NameRegistry;
use crate::template::Template;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Package marker file written into every generated directory
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Token the schema library reads as "value required"
pub const REQUIRED_TOKEN: &str = "...";

const NULL_LITERAL: &str = "None";

/// Configuration for code generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Root of the generated tree
    pub output_dir: PathBuf,
    /// Import prefix of the generated tree; empty when it is on the import path itself
    pub package: String,
    /// One level of indentation
    pub indent: String,
    /// Sequence constructor wrapped around array fields
    pub sequence_type: String,
    /// Emit `class Config: orm_mode = True` in every schema
    pub orm_mode: bool,
    /// Show a progress bar while writing
    pub show_progress: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("__generated"),
            package: "__generated".to_string(),
            indent: "    ".to_string(),
            sequence_type: "List".to_string(),
            orm_mode: false,
            show_progress: false,
        }
    }
}

/// Writes collected modules as Python source
pub struct CodeGenerator {
    config: GeneratorConfig,
}

impl CodeGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Write every module below the output directory.
    ///
    /// All schema names are registered before anything is written, so a
    /// duplicate name leaves both the output and the registry untouched.
    /// Later failures are not rolled back.
    pub fn generate(
        &self,
        modules: &BTreeMap<ModulePath, CollectedModule>,
        registry: &mut NameRegistry,
    ) -> Result<GenerationReport> {
        registry.register_all(
            modules
                .values()
                .flat_map(|m| m.entities.iter().map(|e| &e.entity)),
        )?;

        let mut report = GenerationReport::default();
        fs::create_dir_all(&self.config.output_dir)?;

        let progress = if self.config.show_progress {
            let pb = ProgressBar::new(modules.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .map_err(|e| Error::other(e.to_string()))?
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        for module in modules.values() {
            if let Some(ref pb) = progress {
                pb.set_message(module.module_path.dotted());
                pb.inc(1);
            }

            let (path, markers) = ensure_module_dir(&module.module_path, &self.config.output_dir)?;
            fs::write(&path, self.render_module(module))?;
            info!(module = %module.module_path, path = %path.display(), "wrote module");

            report.modules_written += 1;
            report.entities_written += module.entities.len();
            report.markers_created += markers;
            report.files.push(path);
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(report)
    }

    /// Render the full source text of one module
    pub fn render_module(&self, module: &CollectedModule) -> String {
        let imports: Vec<String> = module
            .imported_modules()
            .into_iter()
            .map(|path| format!("import {} as {}", self.import_target(path), path.mangled()))
            .collect();

        let uses_field = module
            .entities
            .iter()
            .any(|e| e.fields.iter().any(Field::has_metadata));

        let mut doc = Template::new()
            .text(self.header(uses_field))
            .nested(Template::new().text("...").lines(imports));

        for entity in &module.entities {
            doc = doc
                .lines(["", ""])
                .append(self.entity_template(entity, &module.module_path));
        }

        let mut text = doc.render(0, &self.config.indent);
        text.push('\n');
        text
    }

    fn header(&self, uses_field: bool) -> String {
        let mut typing = vec!["TYPE_CHECKING", "Optional", "List", "Dict", "Literal"];
        if !typing.contains(&self.config.sequence_type.as_str()) {
            typing.push(self.config.sequence_type.as_str());
        }
        let pydantic = if uses_field { "BaseModel, Field" } else { "BaseModel" };
        format!(
            "from __future__ import annotations
            |from datetime import datetime
            |from typing import {}
            |from pydantic import {}
            |if TYPE_CHECKING:",
            typing.join(", "),
            pydantic
        )
    }

    fn import_target(&self, path: &ModulePath) -> String {
        if self.config.package.is_empty() {
            path.dotted()
        } else {
            format!("{}.{}", self.config.package, path)
        }
    }

    fn entity_template(&self, entity: &ExtractedEntity, module: &ModulePath) -> Template {
        let fields: Vec<String> = entity
            .fields
            .iter()
            .map(|field| {
                format!(
                    "{}: {} = {}",
                    field.name,
                    stringify_field_type(field, module, &self.config.sequence_type),
                    stringify_value(field)
                )
            })
            .collect();

        let mut body = Template::new().lines(fields);
        if self.config.orm_mode {
            body = body
                .text("class Config:")
                .nested(Template::from("orm_mode = True"));
        }
        if body.is_empty() {
            body = Template::from("pass");
        }

        Template::new()
            .text(format!("class {}(BaseModel):", entity.entity.name))
            .nested(body)
    }
}

/// Type annotation of a field, as seen from inside `module`
pub fn stringify_field_type(field: &Field, module: &ModulePath, sequence_type: &str) -> String {
    let base = match &field.ty {
        FieldType::Primitive(p) => p.canonical_name().to_string(),
        FieldType::Entity(r) if &r.module_path == module => r.name.clone(),
        FieldType::Entity(r) => format!("{}.{}", r.module_path.mangled(), r.name),
        FieldType::EnumVariants(variants) => {
            let quoted: Vec<String> = variants.iter().map(|v| quote(v)).collect();
            format!("Literal[{}]", quoted.join(", "))
        }
    };

    if field.is_array() {
        format!("{}[{}]", sequence_type, base)
    } else if field.nullable {
        format!("Optional[{}]", base)
    } else {
        base
    }
}

/// Right-hand side of a field declaration
pub fn stringify_default(default: &FieldDefault) -> String {
    match default {
        FieldDefault::Required => REQUIRED_TOKEN.to_string(),
        FieldDefault::Omitted => NULL_LITERAL.to_string(),
        FieldDefault::Literal(Literal::Str(s)) => quote(s),
        FieldDefault::Literal(Literal::Int(i)) => i.to_string(),
        FieldDefault::Literal(Literal::Float(f)) => float_literal(*f),
        FieldDefault::Literal(Literal::Bool(true)) => "True".to_string(),
        FieldDefault::Literal(Literal::Bool(false)) => "False".to_string(),
        FieldDefault::Literal(Literal::EmptyList) => "[]".to_string(),
    }
}

/// Default, wrapped in `Field(...)` when the field carries a description or length
pub fn stringify_value(field: &Field) -> String {
    let default = stringify_default(&field.default);
    if !field.has_metadata() {
        return default;
    }

    let mut args = vec![default];
    if let Some(description) = &field.description {
        args.push(format!("description={}", quote(description)));
    }
    if let Some(max_length) = field.max_length {
        args.push(format!("max_length={}", max_length));
    }
    format!("Field({})", args.join(", "))
}

fn float_literal(f: f64) -> String {
    if !f.is_finite() {
        format!("float('{}')", f)
    } else if f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Single-quoted string literal
fn quote(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n");
    format!("'{}'", escaped)
}

/// Create every directory of `module_path` below `base`, with package
/// markers for the intermediate ones. Returns the module's file path and
/// the number of markers created.
pub fn ensure_module_dir(module_path: &ModulePath, base: &Path) -> Result<(PathBuf, usize)> {
    let mut created = 0;
    let prefixes = module_path.prefixes();

    for prefix in &prefixes {
        let dir = prefix.to_fs_path(base);
        fs::create_dir_all(&dir)?;
        if prefix == module_path {
            continue;
        }
        let marker = dir.join(PACKAGE_MARKER);
        if !marker.exists() {
            fs::write(&marker, "")?;
            created += 1;
        }
    }

    Ok((module_path.to_fs_path(base).join(PACKAGE_MARKER), created))
}

/// Summary of what was written
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub modules_written: usize,
    pub entities_written: usize,
    pub markers_created: usize,
    pub files: Vec<PathBuf>,
}

impl GenerationReport {
    pub fn summary(&self) -> String {
        format!(
            "Generated {} modules, {} schemas, {} package markers",
            self.modules_written, self.entities_written, self.markers_created
        )
    }
}
