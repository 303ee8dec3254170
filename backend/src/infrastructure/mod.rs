// Infrastructure layer module
pub mod file_system;
pub mod parsers;
pub mod persistence;
pub mod storage;
