pub mod ledger_files;
pub mod metadata_files;

pub use ledger_files::*;
pub use metadata_files::*;
