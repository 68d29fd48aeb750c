//! File discovery: tree scanner and the snapshot it produces

pub mod scanner;
pub mod snapshot;

pub use scanner::{scan, MARKER_NAME};
pub use snapshot::{read_snapshot, write_snapshot, Snapshot};
