//! Listing data: column schema, dataset loading and frame helpers

pub mod frame;
mod loader;
pub mod schema;

pub use loader::DatasetLoader;
