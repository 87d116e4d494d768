pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod scoring;
pub mod spatial;
pub mod tables;
