// Similarity views over the loaded snapshot.
// Implements: threshold summary and pair dedup, job lookup, drilldown, matrix rows, CSV export.
// Everything except `handlers` is a pure function of the snapshot tables.

pub mod drilldown;
pub mod export;
pub mod handlers;
pub mod lookup;
pub mod matrix;
pub mod pairs;
