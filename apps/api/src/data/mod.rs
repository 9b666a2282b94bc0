// Input tables: CSV loading, header/id normalization, and the immutable snapshot
// every request reads from.

pub mod loader;
pub mod models;
pub mod normalize;
pub mod snapshot;
