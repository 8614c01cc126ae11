pub mod background_reporter;
pub mod http_count_reporter;
