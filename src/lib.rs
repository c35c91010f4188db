pub mod assignment;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod fanout;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod tally;
pub mod types;
