//! Transit data sources.

pub mod static_provider;

pub use static_provider::StaticDataSource;
