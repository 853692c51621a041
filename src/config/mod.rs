/// Configuration management
pub mod mapper;

pub use mapper::*;
