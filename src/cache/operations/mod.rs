pub mod chart;

pub use chart::ChartCache;
