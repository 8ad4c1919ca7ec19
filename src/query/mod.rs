pub mod filter;
pub mod period;

pub use filter::{DateRange, ReportFilter};
pub use period::Period;
