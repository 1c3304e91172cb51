pub mod logging;
mod time;

pub use time::format_elapsed;
