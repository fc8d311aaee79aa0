//! Diagnostic analysis over the raw row set

pub mod column_stats;

pub use column_stats::{BaseOverview, ColumnStats, analyze_column, overview};
