pub mod auth_verifier;
pub mod http_client;
