pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod ingest;
pub mod normalize;
