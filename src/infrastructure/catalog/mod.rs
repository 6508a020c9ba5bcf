//! Catalog repository implementations

mod postgres;

pub use postgres::PostgresCatalogRepository;
