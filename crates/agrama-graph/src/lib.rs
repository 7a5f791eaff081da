//! Graph Index: typed directed multigraph plus bounded multi-source
//! shortest paths (spec §4.D).

pub mod direction;
pub mod index;

pub use direction::Direction;
pub use index::GraphIndex;
