pub mod credentials;
pub mod handler;
