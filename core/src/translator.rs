use fxhash::FxHashMap;

use crate::{
    store::StoreError,
    structs::{Entity, EntityId},
};

/// Case-insensitive mapping between entity names and ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translator {
    name_to_id: FxHashMap<String, EntityId>,
    id_to_name: Vec<String>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Translator {
    pub fn generate(entities: &[Entity]) -> Self {
        let mut name_to_id = FxHashMap::default();
        let mut id_to_name = Vec::with_capacity(entities.len());

        for entity in entities {
            name_to_id.insert(normalize(&entity.name), entity.id);
            id_to_name.push(entity.name.clone());
        }

        Self {
            name_to_id,
            id_to_name,
        }
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }

    pub fn to_id(&self, name: &str) -> Result<EntityId, StoreError> {
        self.name_to_id
            .get(&normalize(name))
            .copied()
            .ok_or_else(|| StoreError::UnknownGuess(name.trim().to_string()))
    }

    pub fn to_name(&self, id: EntityId) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }
}
