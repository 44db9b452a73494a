pub mod aggregator;
pub mod cache;
pub mod fetcher;
pub mod scheduler;
