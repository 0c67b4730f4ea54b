pub mod auth_client;
pub mod http_client;
pub mod http_handler;
pub mod router;

/// Re-export commonly used types from adapters
pub use auth_client::HttpAuthVerifier;
pub use http_client::HttpClientAdapter;
pub use http_handler::HttpHandler;
pub use router::build_router;
