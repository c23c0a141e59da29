//! Google Drive connection and upload relay for the UpnaFesta photo service.

// Typed failures shared by every layer
pub mod error;

// TOML + env configuration
pub mod config;

// Encrypted grant storage
pub mod credentials;

// Authorization code flow and credential refresh
pub mod oauth;

// Drive client and upload relay
pub mod drive;

// Admin bearer-token checks
pub mod auth;

// HTTP API
pub mod api;
