// Domain entities
pub mod catalog;
pub mod config;
pub mod ledger;
pub mod migration;
pub mod pool;
pub mod profile;
pub mod record;
pub mod report;

pub use catalog::*;
pub use config::*;
pub use ledger::*;
pub use migration::*;
pub use pool::*;
pub use profile::*;
pub use record::*;
pub use report::*;
