//! Primitive Engine: registers and executes the five primitives STORE,
//! RETRIEVE, SEARCH, LINK, TRANSFORM (spec §4.F).

pub mod context;
pub mod engine;
pub mod request;
pub mod result;
pub mod stats;
pub mod transform;

pub use context::{CallContext, CancellationToken};
pub use engine::{PrimitiveEngine, PrimitiveName};
pub use stats::{PrimitiveStats, StatsSnapshot};
pub use transform::TransformRegistry;
