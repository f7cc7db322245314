pub mod import;
pub mod sink;
