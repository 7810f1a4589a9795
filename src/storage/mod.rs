//! Fact store interface and the in-memory reference backend.

pub mod memory;
mod traits;

pub use memory::InMemoryGraph;
pub use traits::{
    AtomSide, Edge, FactCandidate, FactSide, FactStore, RelationalPair, StorageError, TextualPair,
};
