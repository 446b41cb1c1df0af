//! Outbound service integrations.

pub mod tds;

pub use tds::TdsSessionFactory;
