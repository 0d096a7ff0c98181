pub mod analyzers;
pub mod api;
pub mod config;
pub mod fetch;
pub mod infra;
pub mod models;
pub mod normalizer;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod services;
pub mod store;
pub mod vocabulary;
