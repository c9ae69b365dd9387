mod handler;

pub use handler::nepalese_chart;
