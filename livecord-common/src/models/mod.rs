pub mod discord;
pub mod live_state;
pub mod platform;
pub mod probe;
pub mod stream;

pub use discord::*;
pub use live_state::{LiveState, LiveStateKey, LiveStatus};
pub use platform::StreamPlatform;
pub use probe::{ProbeResult, StreamMetadata};
pub use stream::{normalize_role_ids, PresenceRule, StreamEntry, StreamPatch};
