use fxhash::FxHashSet;
use itertools::Itertools;
use ndarray::{Array2, Zip};
#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use thiserror::Error;

use crate::structs::{Entity, EntityId};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Distance matrix must be square. Found {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("Expected {expected} neighbour sets. Found {found}")]
    NeighborTableSize { expected: usize, found: usize },
    #[error("Entity {entity} lists neighbour {neighbor} outside the universe of {size}")]
    NeighborOutOfRange {
        entity: EntityId,
        neighbor: EntityId,
        size: usize,
    },
}

/// Pairwise distances and the "adjacent" relation, fixed once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryModel {
    // Kilometres. Symmetric with a zero diagonal.
    distance: Array2<f64>,
    // Indexed by entity; never contains the entity itself
    neighbors: Vec<FxHashSet<EntityId>>,
}

impl GeometryModel {
    /// Great-circle distances between every pair of centroids, with each
    /// entity adjacent to its `k` nearest others.
    pub fn build(entities: &[Entity], k: usize) -> Self {
        let distance = distance_matrix(entities);
        let neighbors = nearest_neighbors(&distance, k);
        log::info!(
            "Built geometry for {} entities with {} neighbours each",
            entities.len(),
            k.min(entities.len().saturating_sub(1))
        );

        Self {
            distance,
            neighbors,
        }
    }

    pub fn from_parts(
        distance: Array2<f64>,
        neighbors: Vec<FxHashSet<EntityId>>,
    ) -> Result<Self, GeometryError> {
        let (rows, cols) = distance.dim();
        if rows != cols {
            return Err(GeometryError::NotSquare { rows, cols });
        }
        if neighbors.len() != rows {
            return Err(GeometryError::NeighborTableSize {
                expected: rows,
                found: neighbors.len(),
            });
        }
        for (entity, set) in neighbors.iter().enumerate() {
            if let Some(&neighbor) = set.iter().find(|&&j| j >= rows) {
                return Err(GeometryError::NeighborOutOfRange {
                    entity,
                    neighbor,
                    size: rows,
                });
            }
        }

        let neighbors = neighbors
            .into_iter()
            .enumerate()
            .map(|(i, mut set)| {
                set.remove(&i);
                set
            })
            .collect();

        Ok(Self {
            distance,
            neighbors,
        })
    }

    pub fn size(&self) -> usize {
        self.neighbors.len()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        id < self.size()
    }

    pub fn distance(&self, i: EntityId, j: EntityId) -> f64 {
        self.distance[[i, j]]
    }

    pub fn neighbors(&self, i: EntityId) -> &FxHashSet<EntityId> {
        &self.neighbors[i]
    }

    pub fn is_adjacent(&self, guess: EntityId, target: EntityId) -> bool {
        self.neighbors[guess].contains(&target)
    }
}

/// Haversine distance in kilometres.
pub fn haversine(a: &Entity, b: &Entity) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let sin_d_lat = (d_lat / 2.).sin();
    let sin_d_lon = (d_lon / 2.).sin();
    let h = sin_d_lat * sin_d_lat + lat1.cos() * lat2.cos() * sin_d_lon * sin_d_lon;

    EARTH_RADIUS_KM * 2. * h.sqrt().atan2((1. - h).sqrt())
}

pub fn distance_matrix(entities: &[Entity]) -> Array2<f64> {
    let n = entities.len();
    let mut distance = Array2::<f64>::zeros((n, n));

    let fill = |(i, j): (usize, usize), d: &mut f64| {
        // same argument order for (i, j) and (j, i) keeps the matrix exactly symmetric
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        *d = if i == j {
            0.
        } else {
            haversine(&entities[i], &entities[j])
        };
    };

    #[cfg(feature = "parallel")]
    Zip::indexed(&mut distance).par_for_each(fill);

    #[cfg(not(feature = "parallel"))]
    Zip::indexed(&mut distance).for_each(fill);

    distance
}

/// The `k` closest other entities for every row, ties broken by lower id.
pub fn nearest_neighbors(distance: &Array2<f64>, k: usize) -> Vec<FxHashSet<EntityId>> {
    let n = distance.nrows();

    #[cfg(feature = "parallel")]
    let rows_iter = (0..n).into_par_iter();

    #[cfg(not(feature = "parallel"))]
    let rows_iter = 0..n;

    rows_iter
        .map(|i| {
            (0..n)
                .filter(|&j| j != i)
                .sorted_by(|&a, &b| {
                    distance[[i, a]]
                        .total_cmp(&distance[[i, b]])
                        .then(a.cmp(&b))
                })
                .take(k)
                .collect::<FxHashSet<_>>()
        })
        .collect()
}
