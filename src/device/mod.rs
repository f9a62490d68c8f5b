pub mod connection;
pub mod constants;
pub mod filter;
pub mod registry;
pub mod session;
pub mod types;
