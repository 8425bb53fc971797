mod format;
mod window;

pub use format::{ReportStyle, format_failure, format_summary};
pub use window::{DisplayZone, STORE_TIMESTAMP_FORMAT, WindowError, parse_trigger, resolve};
