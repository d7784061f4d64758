/// What a prober learned about a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetadata {
    /// Display name of the streamer.
    pub name: String,
    pub title: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub avatar_url: Option<String>,
    /// Game or category, when the platform reports one.
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub live: bool,
    pub metadata: StreamMetadata,
}

impl ProbeResult {
    pub fn live(metadata: StreamMetadata) -> Self {
        Self { live: true, metadata }
    }

    pub fn offline(metadata: StreamMetadata) -> Self {
        Self { live: false, metadata }
    }
}
