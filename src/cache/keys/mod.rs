// Cache key constants.
pub mod chart_keys;

pub use chart_keys::NEPALESE_CHART_KEY;
