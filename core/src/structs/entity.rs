use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type EntityId = usize;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    #[error("Invalid entity on line {line}: {reason}")]
    InvalidEntity { line: usize, reason: String },
}

/// A country centroid. Ids are dense in `[0, n)` and follow load order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Entity {
    pub fn new(id: EntityId, name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.latitude, self.longitude)
    }
}
