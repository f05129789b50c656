pub mod algo;
pub mod config;
pub mod data;
pub mod entropy;
pub mod geometry;
pub mod solvers;
pub mod store;
pub mod structs;
pub mod translator;
pub use fxhash::{FxHashMap, FxHashSet};
