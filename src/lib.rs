pub mod api;
pub mod bid;
pub mod config;
pub mod credentials;
pub mod listings;
pub mod metrics;
pub mod pagination;
pub mod server;
pub mod session;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use metrics::Metrics;
pub use session::{Session, Settings};
