pub mod ledger_locks;

pub use ledger_locks::*;
