pub mod error;
pub mod mirror;
pub mod pages;
pub mod record;
pub mod server;
pub mod store;
