pub mod history_commands;
pub mod import_commands;
pub mod migrate_commands;
