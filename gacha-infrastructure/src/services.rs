pub mod live_snapshot;

pub use live_snapshot::*;
