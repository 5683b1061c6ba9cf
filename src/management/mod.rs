mod auth;
mod songs;

pub use auth::TokenManager;
pub use songs::SongManager;
pub use songs::SongRecord;
