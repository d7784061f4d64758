pub mod stream;

pub use stream::{fetch_live_stream, fetch_user, StreamData, UserData};
