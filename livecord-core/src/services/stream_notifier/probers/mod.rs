pub mod presence;
pub mod twitch;
pub mod youtube;

pub use presence::PresenceProber;
pub use twitch::TwitchProber;
pub use youtube::YouTubeProber;
