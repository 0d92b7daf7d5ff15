pub mod assemble;
pub mod config;
pub mod dataset;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod progress;
