//! CLI command handlers, one per file.

mod checksum;
mod discard;
mod get;
mod probe;
mod status;

pub use checksum::run_checksum;
pub use discard::run_discard;
pub use get::{run_get, GetOptions};
pub use probe::run_probe;
pub use status::run_status;
