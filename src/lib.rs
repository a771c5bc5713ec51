//! Chart reconciliation library - shared modules for all binaries.

pub mod cached_file;
pub mod distance;
pub mod driver;
pub mod error;
pub mod index;
pub mod listens;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod select;
