pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod position;
pub mod report;
pub mod scoring;
pub mod store;
