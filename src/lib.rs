pub mod browser;
pub mod config;
pub mod discovery;
pub mod entities;
pub mod extraction;
pub mod extractor;
pub mod fetcher;
pub mod handoff;
pub mod loader;
pub mod pipeline;
pub mod repositories;
pub mod scheduler;
pub mod telemetry;
