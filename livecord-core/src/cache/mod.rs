pub mod expiring_cache;

pub use expiring_cache::{ExpiringCache, Sweep};
