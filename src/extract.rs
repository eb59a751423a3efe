// Field and relationship extraction
//
// Turns one source entity into an `ExtractedEntity`: its fields in
// declaration order plus the distinct entities it depends on.

use crate::error::{Error, Result};
use crate::model::{
    Dependency, EntityHandle, EntityRef, ExtractedEntity, Field, FieldDefault, FieldType, Literal,
    Multiplicity, Primitive,
};
use crate::source::{
    Cardinality, ColumnType, RelationshipAttribute, ScalarAttribute, SourceAttribute,
    SourceDefault, SourceModel,
};
use tracing::{debug, warn};

/// Extracts entities through the source capability interface
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    /// Attribute names to keep: `field` or `Entity.field`
    include: Vec<String>,
    /// Attribute names to leave out: `field` or `Entity.field`
    exclude: Vec<String>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute filters; at most one of the two lists may be non-empty.
    ///
    /// An include list only restricts the entities it applies to: bare
    /// names apply to every entity, `Entity.field` only to `Entity`.
    pub fn with_filters(include: Vec<String>, exclude: Vec<String>) -> Result<Self> {
        if !include.is_empty() && !exclude.is_empty() {
            return Err(Error::config_validation(
                "include and exclude cannot both be set",
            ));
        }
        Ok(Self { include, exclude })
    }

    /// Extract one entity. Fails if a scalar's value type cannot be resolved.
    pub fn extract<S: SourceModel + ?Sized>(
        &self,
        source: &S,
        handle: EntityHandle,
    ) -> Result<ExtractedEntity> {
        let entity = source.entity_ref(handle)?;
        let mut fields = Vec::new();
        let mut dependencies: Vec<Dependency> = Vec::new();

        for attr in source.attributes(handle)? {
            if !self.is_selected(&entity, attr.name()) {
                debug!(entity = %entity, attribute = attr.name(), "filtered attribute");
                continue;
            }

            match attr {
                SourceAttribute::Scalar(scalar) => {
                    fields.push(scalar_field(&entity, scalar)?);
                }
                SourceAttribute::Relationship(rel) => {
                    let target = source.entity_ref(rel.target)?;
                    if rel.target != handle && !dependencies.iter().any(|d| d.handle == rel.target)
                    {
                        dependencies.push(Dependency {
                            entity: target.clone(),
                            handle: rel.target,
                        });
                    }
                    fields.push(relationship_field(rel, target));
                }
                SourceAttribute::Composite { name, columns } => {
                    warn!(
                        entity = %entity,
                        attribute = %name,
                        columns = ?columns,
                        "composite attributes are not supported, skipping"
                    );
                }
            }
        }

        debug!(entity = %entity, fields = fields.len(), deps = dependencies.len(), "extracted");

        Ok(ExtractedEntity {
            handle,
            entity,
            fields,
            dependencies,
        })
    }

    fn is_selected(&self, entity: &EntityRef, attribute: &str) -> bool {
        if self.exclude.iter().any(|p| pattern_matches(p, entity, attribute)) {
            return false;
        }
        let applicable: Vec<&String> = self
            .include
            .iter()
            .filter(|p| pattern_owner(p).map_or(true, |owner| owner == entity.name))
            .collect();
        applicable.is_empty() || applicable.iter().any(|p| pattern_matches(p, entity, attribute))
    }
}

/// Entity a `Entity.field` pattern is scoped to
fn pattern_owner(pattern: &str) -> Option<&str> {
    pattern.split_once('.').map(|(owner, _)| owner)
}

fn pattern_matches(pattern: &str, entity: &EntityRef, attribute: &str) -> bool {
    match pattern.split_once('.') {
        Some((owner, attr)) => attr == attribute && owner == entity.name,
        None => pattern == attribute,
    }
}

fn scalar_field(entity: &EntityRef, scalar: ScalarAttribute) -> Result<Field> {
    let ty = resolve_column_type(&scalar.column_type, true)
        .ok_or_else(|| Error::extraction(entity.qualified(), &scalar.name))?;

    let default = match scalar.default {
        SourceDefault::Required => FieldDefault::Required,
        SourceDefault::Literal(lit) => FieldDefault::Literal(lit),
        SourceDefault::Callable(name) => {
            debug!(
                entity = %entity,
                attribute = %scalar.name,
                callable = %name,
                "runtime default has no static value, omitting"
            );
            FieldDefault::Omitted
        }
        SourceDefault::None if scalar.nullable => FieldDefault::Omitted,
        SourceDefault::None => FieldDefault::Required,
    };

    Ok(Field {
        name: scalar.name,
        ty,
        multiplicity: Multiplicity::Single,
        nullable: scalar.nullable,
        default,
        description: scalar.comment,
        max_length: scalar.max_length,
    })
}

/// Declared type first, then one level of unwrapping, then enum, then temporal
fn resolve_column_type(column_type: &ColumnType, may_unwrap: bool) -> Option<FieldType> {
    match column_type {
        ColumnType::Native(p) => Some(FieldType::Primitive(*p)),
        ColumnType::Decorated(inner) if may_unwrap => resolve_column_type(inner, false),
        ColumnType::Decorated(_) => None,
        ColumnType::Enumeration(variants) => Some(FieldType::EnumVariants(variants.clone())),
        ColumnType::Temporal(_) => Some(FieldType::Primitive(Primitive::Datetime)),
        ColumnType::Opaque(_) => None,
    }
}

fn relationship_field(rel: RelationshipAttribute, target: EntityRef) -> Field {
    let (multiplicity, nullable) = match rel.cardinality {
        Cardinality::OneToMany | Cardinality::ManyToMany => (Multiplicity::Array, true),
        Cardinality::ManyToOne => (Multiplicity::Single, rel.link_nullable),
    };
    let default = match (multiplicity, nullable) {
        (Multiplicity::Array, _) => FieldDefault::Literal(Literal::EmptyList),
        (Multiplicity::Single, true) => FieldDefault::Omitted,
        (Multiplicity::Single, false) => FieldDefault::Required,
    };

    Field {
        name: rel.name,
        ty: FieldType::Entity(target),
        multiplicity,
        nullable,
        default,
        description: None,
        max_length: None,
    }
}
