pub mod engine;
pub mod records;
