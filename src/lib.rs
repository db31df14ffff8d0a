pub mod config;
pub mod output;
pub mod parser;
pub mod plot;
pub mod query;
pub mod states;
pub mod store;
