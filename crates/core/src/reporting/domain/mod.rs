pub mod count_reporter;
