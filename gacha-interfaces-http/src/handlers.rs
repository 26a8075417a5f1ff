pub mod history_handlers;
pub mod migration_handlers;
pub mod ops_handlers;
pub mod report_handlers;

pub use history_handlers::*;
pub use migration_handlers::*;
pub use ops_handlers::*;
pub use report_handlers::*;
