//! Vector store domain models and traits

mod point;
mod store;

pub use point::{
    Distance, Payload, PointFilter, PointSelector, ScoredPoint, StoredPoint, VectorPoint,
};
pub use store::VectorStore;
