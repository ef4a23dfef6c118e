// OAuth2 authorization, token lifecycle, and callback state signing.

mod client;
mod state;
mod token;

pub use client::{OAuthClient, OAuthConfig};
pub use state::{STATE_MAX_AGE_MS, generate_state, verify_state};
pub use token::{DEFAULT_REFRESH_MARGIN, Token, TokenStore, now_ms};
