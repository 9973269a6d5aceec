pub mod catalog;
pub mod config;
pub mod criteria;
pub mod eligibility;
pub mod output;
pub mod pool;
pub mod profile;
pub mod reason;
pub mod server;
pub mod session;
