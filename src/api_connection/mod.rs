pub mod connection;
pub mod endpoints;
pub mod rest_store;

pub use connection::{ApiConnectionError, RestClient};
pub use rest_store::RestStore;
