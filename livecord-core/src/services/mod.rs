// File: src/services/mod.rs

pub mod stream_notifier;

pub use stream_notifier::{NotifierService, NotifierSettings, TickReport};
