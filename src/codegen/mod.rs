/// Projector compilation (one conversion routine per column shape)
pub mod projector;

pub use projector::{compile, compile_descriptor, Projector};
