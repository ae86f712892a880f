pub mod apis;
pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod formatters;
pub mod logger;
pub mod paths;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;
