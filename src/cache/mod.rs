pub mod shape_cache;

pub use shape_cache::*;
