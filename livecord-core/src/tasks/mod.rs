// File: src/tasks/mod.rs

pub mod cache_maintenance;
pub mod stream_poll;

pub use cache_maintenance::spawn_cache_sweep_task;
pub use stream_poll::spawn_stream_poll_task;
