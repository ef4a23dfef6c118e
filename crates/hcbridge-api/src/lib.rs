// hcbridge-api: Async Rust client for the Home Connect appliance cloud (OAuth, REST, event stream)

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod stream;
pub mod transport;

pub use auth::{OAuthClient, OAuthConfig, Token, TokenStore};
pub use client::ApplianceClient;
pub use error::Error;
pub use stream::{EventStreamClient, StreamConfig, StreamStatus};
pub use transport::TransportConfig;
