/// Row sources: the accessor contract plus in-memory, Arrow and untyped adapters
pub mod accessor;
pub mod batch;
pub mod dynamic;
pub mod memory;

pub use accessor::{read_native, reader_for, Reader, RowAccessor, RowSchema};
pub use batch::{type_tag_of, BatchRow, BatchRows};
pub use dynamic::DynamicRow;
pub use memory::{MemoryRow, MemoryRowSet};
