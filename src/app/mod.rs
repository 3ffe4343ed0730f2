mod app;
pub mod units;

pub use app::{App, ReportConfig};
pub use units::Unit;
