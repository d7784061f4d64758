// File: src/platforms/youtube/mod.rs

pub mod client;

pub use client::{ChannelInfo, LiveVideo, YouTubeClient};
