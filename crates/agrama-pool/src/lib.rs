//! Memory & Pool Substrate: fixed-size object pools, request arenas and the
//! optional result cache (spec §4.H).

pub mod arena;
pub mod cache;
pub mod pool;

pub use arena::Arena;
pub use cache::{hash_query, ResultCache};
pub use pool::{ObjectPool, Resettable};
