// Generated schema names, owned by the caller of a generation run

use crate::error::{Error, Result};
use crate::model::EntityRef;
use std::collections::HashSet;

/// Names already generated; a second registration of the same name fails
#[derive(Debug, Default)]
pub struct NameRegistry {
    names: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema by its qualified name
    pub fn register(&mut self, entity: &EntityRef) -> Result<()> {
        let name = entity.qualified();
        if !self.names.insert(name.clone()) {
            return Err(Error::DuplicateName(name));
        }
        Ok(())
    }

    /// Register a batch of schemas, or none of them if any name collides
    pub fn register_all<'a, I>(&mut self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a EntityRef>,
    {
        let mut batch = HashSet::new();
        for entity in entities {
            let name = entity.qualified();
            if self.names.contains(&name) || !batch.insert(name.clone()) {
                return Err(Error::DuplicateName(name));
            }
        }
        self.names.extend(batch);
        Ok(())
    }

    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.names.contains(&entity.qualified())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
