// File: src/platforms/twitch_helix/mod.rs

pub mod auth;
pub mod client;
pub mod requests;

pub use auth::{AppAccessToken, AppTokenSource, ClientCredentials};
pub use client::TwitchHelixClient;
