// Source model capability interface
//
// The extractor and collector never inspect source definitions directly.
// They only call through `SourceModel`, which each supported source
// ecosystem implements once.

pub mod declarative;

pub use declarative::{DeclarativeSchema, SchemaFile};

use crate::error::Result;
use crate::model::{EntityHandle, EntityRef, Literal};

/// Declared type of a column, as reported by the source
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// Type with a directly known value type
    Native(crate::model::Primitive),
    /// Wrapper around an implementation type
    Decorated(Box<ColumnType>),
    /// Enumeration with ordered literal variants
    Enumeration(Vec<String>),
    Temporal(TemporalKind),
    /// User-defined type with no known value type
    Opaque(String),
}

/// Known temporal column subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    DateTime,
    Time,
    Timestamp,
}

/// Default declared on a scalar column
#[derive(Debug, Clone, PartialEq)]
pub enum SourceDefault {
    /// Nothing declared
    None,
    /// Explicit "no default, value mandatory" marker
    Required,
    Literal(Literal),
    /// Default produced at runtime by a callable
    Callable(String),
}

/// Relationship cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ManyToOne,
    OneToMany,
    ManyToMany,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarAttribute {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: SourceDefault,
    pub comment: Option<String>,
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipAttribute {
    pub name: String,
    pub target: EntityHandle,
    pub cardinality: Cardinality,
    /// Nullability of the linking key column
    pub link_nullable: bool,
}

/// One structural attribute of a source entity
#[derive(Debug, Clone, PartialEq)]
pub enum SourceAttribute {
    Scalar(ScalarAttribute),
    Relationship(RelationshipAttribute),
    /// Multi-column attribute, not supported
    Composite { name: String, columns: Vec<String> },
}

impl SourceAttribute {
    pub fn name(&self) -> &str {
        match self {
            SourceAttribute::Scalar(s) => &s.name,
            SourceAttribute::Relationship(r) => &r.name,
            SourceAttribute::Composite { name, .. } => name,
        }
    }
}

/// Capabilities the pipeline needs from a source object model
pub trait SourceModel {
    /// Number of entities; handles are `0..len()`
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Module and name the entity is declared under
    fn entity_ref(&self, handle: EntityHandle) -> Result<EntityRef>;

    /// Attributes in declaration order
    fn attributes(&self, handle: EntityHandle) -> Result<Vec<SourceAttribute>>;

    /// Find an entity by qualified (`pkg.mod.Name`) or bare name
    fn lookup(&self, name: &str) -> Option<EntityHandle>;
}
