pub mod history_queries;
pub mod report_queries;
