pub mod admin;
pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod notify;
pub mod pages;
pub mod storage;
pub mod tracking;
pub mod types;
