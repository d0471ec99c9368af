pub mod archiver;
pub mod audit;
pub mod config;
pub mod crawl;
pub mod dedup;
pub mod index;
pub mod paths;
pub mod scheduler;
pub mod snapshot;
pub mod util;
