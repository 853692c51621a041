/// Column ↔ member matching: candidate names, type compatibility and the matcher
pub mod candidates;
pub mod compat;
pub mod matcher;

pub use candidates::{candidates, candidates_with_prefix};
pub use compat::{convert, is_compatible};
pub use matcher::{match_destination, match_source, Flow, MappedPair, MappingPlan, MatchOptions};
