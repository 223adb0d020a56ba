//! Data loading and in-memory dataset representation

pub mod dataset;

pub use self::dataset::*;
