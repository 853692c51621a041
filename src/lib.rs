//! # rowshape
//!
//! Maps tabular rows (a database reader, an Arrow batch, an in-memory table)
//! onto typed Rust values.
//!
//! ## Quick Start
//!
//! ```rust
//! use rowshape::{projectable, MemoryRowSet, ProjectionEngine, TypeTag, Value};
//!
//! projectable! {
//!     #[derive(Debug, Default)]
//!     pub struct Order {
//!         pub order_id: i32,
//!         pub name: String,
//!     }
//! }
//!
//! let rows = MemoryRowSet::with_columns(&[("ID", TypeTag::INT32), ("Name", TypeTag::STRING)])
//!     .with_row(vec![Value::I32(1), Value::String("hello".into())])
//!     .unwrap();
//!
//! let engine = ProjectionEngine::new();
//! let orders: Vec<Order> = engine.project_all(rows.rows()).unwrap();
//! assert_eq!(orders[0].order_id, 1);
//! assert_eq!(orders[0].name, "hello");
//! ```
//!
//! ## Features
//!
//! - **Shape matching**: columns pair with members by case-insensitive name
//!   candidates (`OrderId`, `Order_ID`, `ORDERID`, `Order` + `ID`, ...)
//! - **Compiled projectors**: matching and type checks run once per column
//!   shape; rows only walk a precomputed step list
//! - **Concurrent cache**: one projector per shape, built once even under races
//! - **Diagnostics**: unmapped members and columns go to a pluggable sink
//!   (tracing by default, or a multicast stream)

// Internal modules
pub mod cache;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod mapping;
pub mod metadata;
pub mod row;
pub mod value;

// Public API - Main types users need
pub use engine::ProjectionEngine;
pub use codegen::Projector;
pub use cache::CacheStats;
pub use config::MapperConfig;
pub use lookup::Lookup;

// Target description (also used by the `projectable!` macros)
pub use metadata::{Column, Member, MemberDef, Projectable, Shape, TargetKind, TypeDescriptor};
pub use metadata::{IntKind, TypeTag, ValueKind};
pub use value::{FromValue, IntoValue, RowVersion, Value};

// Row sources
pub use row::{BatchRow, BatchRows, DynamicRow, MemoryRow, MemoryRowSet, RowAccessor, RowSchema};

// Diagnostics
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLevel, DiagnosticSink, DiagnosticsStream, Notice};

// Re-export commonly used error types
pub use error::{ProjectionError, ProjectionResult};
