pub mod runtime;

pub use runtime::{to_twilight_embed, DiscordPlatform};
