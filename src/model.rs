// Intermediate representation shared by extraction, collection and codegen
//
// What gets generated lives here; how it is written out lives in the
// generator. Field order is declaration order everywhere.

use crate::modulepath::ModulePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Index of an entity in the source model's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub usize);

/// Identity of one generated schema definition
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub module_path: ModulePath,
    pub name: String,
}

impl EntityRef {
    pub fn new(module_path: ModulePath, name: impl Into<String>) -> Self {
        Self {
            module_path,
            name: name.into(),
        }
    }

    /// Fully qualified dotted name (`app.user.User`)
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.module_path, self.name)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module_path, self.name)
    }
}

/// Value types a scalar field can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Int,
    Float,
    Str,
    Bool,
    Bytes,
    Dict,
    Datetime,
}

impl Primitive {
    /// Canonical name in the generated language
    pub fn canonical_name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Str => "str",
            Primitive::Bool => "bool",
            Primitive::Bytes => "bytes",
            Primitive::Dict => "Dict",
            Primitive::Datetime => "datetime",
        }
    }
}

/// Resolved type of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Primitive(Primitive),
    Entity(EntityRef),
    /// Closed set of string literals, in declared order
    EnumVariants(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    Single,
    Array,
}

/// A static default value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    EmptyList,
}

/// Default of a generated field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDefault {
    Literal(Literal),
    /// Value must be supplied
    Required,
    /// No static default; emitted as the null literal
    Omitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    pub multiplicity: Multiplicity,
    pub nullable: bool,
    pub default: FieldDefault,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl Field {
    pub fn is_array(&self) -> bool {
        self.multiplicity == Multiplicity::Array
    }

    /// Whether the field carries options beyond its default
    pub fn has_metadata(&self) -> bool {
        self.description.is_some() || self.max_length.is_some()
    }

    /// Entity referenced by this field, if any
    pub fn entity_ref(&self) -> Option<&EntityRef> {
        match &self.ty {
            FieldType::Entity(r) => Some(r),
            _ => None,
        }
    }
}

/// An outbound reference to another entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub entity: EntityRef,
    pub handle: EntityHandle,
}

/// Everything extracted from one source entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub handle: EntityHandle,
    #[serde(rename = "ref")]
    pub entity: EntityRef,
    pub fields: Vec<Field>,
    /// Distinct referenced entities, excluding this one
    pub dependencies: Vec<Dependency>,
}

impl ExtractedEntity {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Entities declared in one module plus what they need from elsewhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedModule {
    pub module_path: ModulePath,
    pub entities: Vec<ExtractedEntity>,
    pub cross_imports: BTreeSet<EntityRef>,
}

impl CollectedModule {
    pub fn new(module_path: ModulePath) -> Self {
        Self {
            module_path,
            entities: Vec::new(),
            cross_imports: BTreeSet::new(),
        }
    }

    /// Distinct modules this module imports from, sorted
    pub fn imported_modules(&self) -> BTreeSet<&ModulePath> {
        self.cross_imports.iter().map(|r| &r.module_path).collect()
    }

    pub fn entity(&self, name: &str) -> Option<&ExtractedEntity> {
        self.entities.iter().find(|e| e.entity.name == name)
    }
}
