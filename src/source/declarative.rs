// Declarative ORM schema files
//
// Entities are described in TOML, one `[[entity]]` table per mapped class,
// with attributes listed in declaration order:
//
//   [[entity]]
//   name = "Address"
//   module = "app.address"
//
//   [[entity.attribute]]
//   kind = "column"
//   name = "user_id"
//   type = "Integer"
//   nullable = false
//
//   [[entity.attribute]]
//   kind = "relationship"
//   name = "user"
//   target = "app.user.User"
//   direction = "many-to-one"
//   key = "user_id"
//
// Column type names follow the usual ORM vocabulary. Names that map to
// nothing known become opaque user-defined types.

use super::{
    Cardinality, ColumnType, RelationshipAttribute, ScalarAttribute, SourceAttribute,
    SourceDefault, SourceModel, TemporalKind,
};
use crate::error::{Error, Result};
use crate::model::{EntityHandle, EntityRef, Literal, Primitive};
use crate::modulepath::{is_identifier, ModulePath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Contents of one schema file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    pub module: String,
    #[serde(default, rename = "attribute")]
    pub attributes: Vec<AttributeDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AttributeDef {
    Column(ColumnDef),
    Relationship(RelationshipDef),
    Composite(CompositeDef),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Enum variants, for `type = "Enum"`
    #[serde(default)]
    pub variants: Vec<String>,
    /// Implementation type, for `type = "TypeDecorator"`
    #[serde(default, rename = "impl")]
    pub impl_type: Option<String>,
    /// Defaults to `!primary_key`
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub default: Option<DefaultDef>,
    /// Column comment, emitted as the field description
    #[serde(default)]
    pub comment: Option<String>,
    /// Maximum length of string columns
    #[serde(default)]
    pub length: Option<u32>,
}

impl ColumnDef {
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(!self.primary_key)
    }
}

/// Declared column default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultDef {
    Callable { callable: String },
    Required { required: bool },
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl From<Direction> for Cardinality {
    fn from(d: Direction) -> Self {
        match d {
            Direction::ManyToOne => Cardinality::ManyToOne,
            Direction::OneToMany => Cardinality::OneToMany,
            Direction::ManyToMany => Cardinality::ManyToMany,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipDef {
    pub name: String,
    /// `Name` or `pkg.module.Name`
    pub target: String,
    pub direction: Direction,
    /// Linking key column, looked up on this entity first, then the target
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeDef {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl SchemaFile {
    /// Parse schema TOML; `path` is only used in error messages
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::schema(path, e.to_string()))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }
}

#[derive(Debug, Clone)]
struct LoadedEntity {
    entity: EntityRef,
    source: PathBuf,
    attributes: Vec<SourceAttribute>,
}

/// A fully resolved set of declarative entities, addressed by arena index
#[derive(Debug, Clone, Default)]
pub struct DeclarativeSchema {
    entities: Vec<LoadedEntity>,
}

impl DeclarativeSchema {
    /// Load schema files and directories (walked recursively for `*.toml`)
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut files = Vec::new();
        for path in paths {
            for file in discover_schema_files(path)? {
                let schema = SchemaFile::read(&file)?;
                files.push((file, schema));
            }
        }
        Self::from_files(files)
    }

    /// Parse a single schema document
    pub fn from_toml(text: &str) -> Result<Self> {
        let path = PathBuf::from("<inline>");
        let schema = SchemaFile::parse(text, &path)?;
        Self::from_files(vec![(path, schema)])
    }

    /// Resolve relationship targets and column types across all files
    pub fn from_files(files: Vec<(PathBuf, SchemaFile)>) -> Result<Self> {
        let mut refs = Vec::new();
        let mut defs = Vec::new();
        for (path, file) in files {
            for def in file.entities {
                if !is_identifier(&def.name) {
                    return Err(Error::schema(
                        &path,
                        format!("invalid entity name {:?}", def.name),
                    ));
                }
                let module = ModulePath::parse(&def.module)
                    .map_err(|e| Error::schema(&path, e.to_string()))?;
                refs.push(EntityRef::new(module, def.name.clone()));
                defs.push((path.clone(), def));
            }
        }

        let mut entities = Vec::with_capacity(defs.len());
        for (index, (path, def)) in defs.iter().enumerate() {
            let attributes = def
                .attributes
                .iter()
                .map(|attr| resolve_attribute(attr, index, &defs, &refs))
                .collect::<Result<Vec<_>>>()
                .map_err(|e| match e {
                    Error::Other(message) => Error::schema(
                        path,
                        format!("{}: {}", refs[index], message),
                    ),
                    other => other,
                })?;
            entities.push(LoadedEntity {
                entity: refs[index].clone(),
                source: path.clone(),
                attributes,
            });
        }

        Ok(Self { entities })
    }

    /// File an entity was loaded from
    pub fn source_path(&self, handle: EntityHandle) -> Option<&Path> {
        self.entities.get(handle.0).map(|e| e.source.as_path())
    }

    /// Every handle in load order
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> {
        (0..self.entities.len()).map(EntityHandle)
    }

    fn loaded(&self, handle: EntityHandle) -> Result<&LoadedEntity> {
        self.entities
            .get(handle.0)
            .ok_or_else(|| Error::UnknownEntity(format!("#{}", handle.0)))
    }
}

impl SourceModel for DeclarativeSchema {
    fn len(&self) -> usize {
        self.entities.len()
    }

    fn entity_ref(&self, handle: EntityHandle) -> Result<EntityRef> {
        Ok(self.loaded(handle)?.entity.clone())
    }

    fn attributes(&self, handle: EntityHandle) -> Result<Vec<SourceAttribute>> {
        Ok(self.loaded(handle)?.attributes.clone())
    }

    fn lookup(&self, name: &str) -> Option<EntityHandle> {
        let refs: Vec<EntityRef> = self.entities.iter().map(|e| e.entity.clone()).collect();
        find_entity(name, None, &refs).ok()
    }
}

/// Collect schema files below a path, sorted for stable load order
fn discover_schema_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry?;
        let p = entry.path();
        if p.is_file() && p.extension().map_or(false, |ext| ext == "toml") {
            files.push(p.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn resolve_attribute(
    attr: &AttributeDef,
    owner: usize,
    defs: &[(PathBuf, EntityDef)],
    refs: &[EntityRef],
) -> Result<SourceAttribute> {
    match attr {
        AttributeDef::Column(col) => {
            check_attribute_name(&col.name)?;
            Ok(SourceAttribute::Scalar(ScalarAttribute {
                name: col.name.clone(),
                column_type: column_type(col)?,
                nullable: col.is_nullable(),
                default: source_default(col.default.as_ref()),
                comment: col.comment.clone(),
                max_length: col.length,
            }))
        }
        AttributeDef::Relationship(rel) => {
            check_attribute_name(&rel.name)?;
            let target = find_entity(&rel.target, Some(&refs[owner].module_path), refs)?;
            let link_nullable = rel
                .key
                .as_deref()
                .and_then(|key| {
                    find_column(&defs[owner].1, key).or_else(|| find_column(&defs[target.0].1, key))
                })
                .map_or(true, ColumnDef::is_nullable);
            Ok(SourceAttribute::Relationship(RelationshipAttribute {
                name: rel.name.clone(),
                target,
                cardinality: rel.direction.into(),
                link_nullable,
            }))
        }
        AttributeDef::Composite(comp) => Ok(SourceAttribute::Composite {
            name: comp.name.clone(),
            columns: comp.columns.clone(),
        }),
    }
}

/// Attribute names become field names in the generated class
fn check_attribute_name(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(Error::other(format!("invalid attribute name {:?}", name)))
    }
}

fn find_column<'a>(def: &'a EntityDef, name: &str) -> Option<&'a ColumnDef> {
    def.attributes.iter().find_map(|attr| match attr {
        AttributeDef::Column(col) if col.name == name => Some(col),
        _ => None,
    })
}

/// Resolve `Name` or `pkg.mod.Name`; bare names prefer the current module
fn find_entity(
    name: &str,
    current: Option<&ModulePath>,
    refs: &[EntityRef],
) -> Result<EntityHandle> {
    if let Some(pos) = refs.iter().position(|r| r.qualified() == name) {
        return Ok(EntityHandle(pos));
    }

    let candidates: Vec<usize> = refs
        .iter()
        .enumerate()
        .filter(|(_, r)| r.name == name)
        .map(|(i, _)| i)
        .collect();

    if let Some(current) = current {
        if let Some(&i) = candidates.iter().find(|&&i| &refs[i].module_path == current) {
            return Ok(EntityHandle(i));
        }
    }

    match candidates.as_slice() {
        [i] => Ok(EntityHandle(*i)),
        [] => Err(Error::UnknownEntity(name.to_string())),
        _ => Err(Error::other(format!(
            "ambiguous entity name {:?}, qualify it with its module",
            name
        ))),
    }
}

fn column_type(col: &ColumnDef) -> Result<ColumnType> {
    match col.type_name.as_str() {
        "Enum" => {
            if col.variants.is_empty() {
                return Err(Error::other(format!(
                    "enum column {:?} declares no variants",
                    col.name
                )));
            }
            Ok(ColumnType::Enumeration(col.variants.clone()))
        }
        "TypeDecorator" => {
            let inner = col.impl_type.as_deref().ok_or_else(|| {
                Error::other(format!("column {:?} has no `impl` type", col.name))
            })?;
            Ok(ColumnType::Decorated(Box::new(named_type(inner))))
        }
        other => Ok(named_type(other)),
    }
}

fn named_type(name: &str) -> ColumnType {
    match name {
        "Integer" | "BigInteger" | "SmallInteger" => ColumnType::Native(Primitive::Int),
        "Float" | "Numeric" | "Double" => ColumnType::Native(Primitive::Float),
        "String" | "Text" | "Unicode" | "UnicodeText" => ColumnType::Native(Primitive::Str),
        "Boolean" => ColumnType::Native(Primitive::Bool),
        "LargeBinary" => ColumnType::Native(Primitive::Bytes),
        "JSON" => ColumnType::Native(Primitive::Dict),
        "DateTime" => ColumnType::Native(Primitive::Datetime),
        "UtcDateTime" => ColumnType::Decorated(Box::new(ColumnType::Native(Primitive::Datetime))),
        "Date" => ColumnType::Temporal(TemporalKind::Date),
        "Time" => ColumnType::Temporal(TemporalKind::Time),
        "TIMESTAMP" | "Timestamp" => ColumnType::Temporal(TemporalKind::Timestamp),
        other => ColumnType::Opaque(other.to_string()),
    }
}

fn source_default(def: Option<&DefaultDef>) -> SourceDefault {
    match def {
        None => SourceDefault::None,
        Some(DefaultDef::Callable { callable }) => SourceDefault::Callable(callable.clone()),
        Some(DefaultDef::Required { required: true }) => SourceDefault::Required,
        Some(DefaultDef::Required { required: false }) => SourceDefault::None,
        Some(DefaultDef::Bool(b)) => SourceDefault::Literal(Literal::Bool(*b)),
        Some(DefaultDef::Int(i)) => SourceDefault::Literal(Literal::Int(*i)),
        Some(DefaultDef::Float(f)) => SourceDefault::Literal(Literal::Float(*f)),
        Some(DefaultDef::Str(s)) => SourceDefault::Literal(Literal::Str(s.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const USER_ADDRESS: &str = r#"
[[entity]]
name = "User"
module = "app.user"

[[entity.attribute]]
kind = "column"
name = "id"
type = "Integer"
primary_key = true

[[entity.attribute]]
kind = "relationship"
name = "addresses"
target = "Address"
direction = "one-to-many"

[[entity]]
name = "Address"
module = "app.address"

[[entity.attribute]]
kind = "column"
name = "user_id"
type = "Integer"
nullable = false

[[entity.attribute]]
kind = "relationship"
name = "user"
target = "app.user.User"
direction = "many-to-one"
key = "user_id"
"#;

    #[test]
    fn test_load_inline_schema() {
        let schema = DeclarativeSchema::from_toml(USER_ADDRESS).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(
            schema.entity_ref(EntityHandle(1)).unwrap().qualified(),
            "app.address.Address"
        );
    }

    #[test]
    fn test_relationship_target_and_link_nullability() {
        let schema = DeclarativeSchema::from_toml(USER_ADDRESS).unwrap();
        let attrs = schema.attributes(EntityHandle(1)).unwrap();
        match &attrs[1] {
            SourceAttribute::Relationship(rel) => {
                assert_eq!(rel.target, EntityHandle(0));
                assert_eq!(rel.cardinality, Cardinality::ManyToOne);
                assert!(!rel.link_nullable);
            }
            other => panic!("Expected relationship, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_key_is_nullable() {
        let schema = DeclarativeSchema::from_toml(USER_ADDRESS).unwrap();
        let attrs = schema.attributes(EntityHandle(0)).unwrap();
        match &attrs[1] {
            SourceAttribute::Relationship(rel) => assert!(rel.link_nullable),
            other => panic!("Expected relationship, got {:?}", other),
        }
    }

    #[test]
    fn test_primary_key_not_nullable_by_default() {
        let schema = DeclarativeSchema::from_toml(USER_ADDRESS).unwrap();
        let attrs = schema.attributes(EntityHandle(0)).unwrap();
        match &attrs[0] {
            SourceAttribute::Scalar(col) => {
                assert!(!col.nullable);
                assert_eq!(col.column_type, ColumnType::Native(Primitive::Int));
            }
            other => panic!("Expected column, got {:?}", other),
        }
    }

    #[test]
    fn test_column_types_and_defaults() {
        let schema = DeclarativeSchema::from_toml(
            r#"
[[entity]]
name = "Item"
module = "shop"

[[entity.attribute]]
kind = "column"
name = "status"
type = "Enum"
variants = ["x", "y"]
default = "x"

[[entity.attribute]]
kind = "column"
name = "code"
type = "TypeDecorator"
impl = "String"
default = { required = true }

[[entity.attribute]]
kind = "column"
name = "created"
type = "Date"
default = { callable = "utcnow" }

[[entity.attribute]]
kind = "column"
name = "where"
type = "Point"

[[entity.attribute]]
kind = "composite"
name = "position"
columns = ["x", "y"]
"#,
        )
        .unwrap();
        let attrs = schema.attributes(EntityHandle(0)).unwrap();
        let scalar = |i: usize| match &attrs[i] {
            SourceAttribute::Scalar(s) => s.clone(),
            other => panic!("Expected column, got {:?}", other),
        };
        assert_eq!(
            scalar(0).column_type,
            ColumnType::Enumeration(vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(scalar(0).default, SourceDefault::Literal(Literal::Str("x".to_string())));
        assert_eq!(
            scalar(1).column_type,
            ColumnType::Decorated(Box::new(ColumnType::Native(Primitive::Str)))
        );
        assert_eq!(scalar(1).default, SourceDefault::Required);
        assert_eq!(scalar(2).column_type, ColumnType::Temporal(TemporalKind::Date));
        assert_eq!(scalar(2).default, SourceDefault::Callable("utcnow".to_string()));
        assert_eq!(scalar(3).column_type, ColumnType::Opaque("Point".to_string()));
        assert!(matches!(attrs[4], SourceAttribute::Composite { .. }));
    }

    #[test]
    fn test_numeric_defaults() {
        assert_eq!(
            source_default(Some(&DefaultDef::Int(3))),
            SourceDefault::Literal(Literal::Int(3))
        );
        assert_eq!(
            source_default(Some(&DefaultDef::Required { required: false })),
            SourceDefault::None
        );
    }

    #[test]
    fn test_unknown_target_fails() {
        let err = DeclarativeSchema::from_toml(
            r#"
[[entity]]
name = "A"
module = "m"

[[entity.attribute]]
kind = "relationship"
name = "b"
target = "Missing"
direction = "many-to-one"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownEntity(ref n) if n == "Missing"));
    }

    #[test]
    fn test_ambiguous_bare_target_fails() {
        let err = DeclarativeSchema::from_toml(
            r#"
[[entity]]
name = "A"
module = "m"

[[entity.attribute]]
kind = "relationship"
name = "b"
target = "B"
direction = "many-to-one"

[[entity]]
name = "B"
module = "x"

[[entity]]
name = "B"
module = "y"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_enum_without_variants_fails() {
        let err = DeclarativeSchema::from_toml(
            r#"
[[entity]]
name = "A"
module = "m"

[[entity.attribute]]
kind = "column"
name = "e"
type = "Enum"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaParse { .. }));
    }

    #[test]
    fn test_invalid_module_rejected() {
        let err = DeclarativeSchema::from_toml(
            "[[entity]]\nname = \"A\"\nmodule = \"app..x\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaParse { .. }));
    }

    #[test]
    fn test_invalid_attribute_names_rejected() {
        let column = DeclarativeSchema::from_toml(
            r#"
[[entity]]
name = "A"
module = "m"

[[entity.attribute]]
kind = "column"
name = "user-id"
type = "Integer"
"#,
        )
        .unwrap_err();
        assert!(matches!(column, Error::SchemaParse { .. }));
        assert!(column.to_string().contains("invalid attribute name \"user-id\""));

        let relationship = DeclarativeSchema::from_toml(
            r#"
[[entity]]
name = "A"
module = "m"

[[entity.attribute]]
kind = "relationship"
name = "class"
target = "A"
direction = "many-to-one"
"#,
        )
        .unwrap_err();
        assert!(matches!(relationship, Error::SchemaParse { .. }));
    }

    #[test]
    fn test_keyword_module_segment_rejected() {
        let err = DeclarativeSchema::from_toml(
            "[[entity]]\nname = \"A\"\nmodule = \"app.class\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaParse { .. }));

        let err = DeclarativeSchema::from_toml("[[entity]]\nname = \"None\"\nmodule = \"m\"\n")
            .unwrap_err();
        assert!(matches!(err, Error::SchemaParse { .. }));
    }

    #[test]
    fn test_column_comment_and_length() {
        let schema = DeclarativeSchema::from_toml(
            r#"
[[entity]]
name = "User"
module = "app.user"

[[entity.attribute]]
kind = "column"
name = "email"
type = "String"
length = 255
comment = "Login address"

[[entity.attribute]]
kind = "column"
name = "age"
type = "Integer"
"#,
        )
        .unwrap();
        let attrs = schema.attributes(EntityHandle(0)).unwrap();
        match &attrs[0] {
            SourceAttribute::Scalar(col) => {
                assert_eq!(col.comment.as_deref(), Some("Login address"));
                assert_eq!(col.max_length, Some(255));
            }
            other => panic!("Expected column, got {:?}", other),
        }
        match &attrs[1] {
            SourceAttribute::Scalar(col) => {
                assert_eq!(col.comment, None);
                assert_eq!(col.max_length, None);
            }
            other => panic!("Expected column, got {:?}", other),
        }
    }

    #[test]
    fn test_load_directory_sorted() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join("b.toml"),
            "[[entity]]\nname = \"B\"\nmodule = \"m\"\n",
        )
        .unwrap();
        fs::write(
            nested.join("a.toml"),
            "[[entity]]\nname = \"A\"\nmodule = \"m\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let schema = DeclarativeSchema::load(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.entity_ref(EntityHandle(0)).unwrap().name, "B");
        assert!(schema
            .source_path(EntityHandle(1))
            .unwrap()
            .ends_with("nested/a.toml"));
    }

    #[test]
    fn test_load_missing_path() {
        let err = DeclarativeSchema::load(&[PathBuf::from("/nonexistent/schema")]).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }

    #[test]
    fn test_lookup() {
        let schema = DeclarativeSchema::from_toml(USER_ADDRESS).unwrap();
        assert_eq!(schema.lookup("app.user.User"), Some(EntityHandle(0)));
        assert_eq!(schema.lookup("Address"), Some(EntityHandle(1)));
        assert_eq!(schema.lookup("Nope"), None);
    }
}
