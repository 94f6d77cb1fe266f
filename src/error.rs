use std::io;

use thiserror::Error;

pub type Res<T = ()> = Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("not connected")]
    NotConnected,

    #[error("malformed fragment: {0}")]
    Xml(String),

    #[error("missing attribute `{attr}` in <{tag}>")]
    MissingAttribute { tag: String, attr: String },

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("tile index out of range: {0}")]
    TileOutOfRange(u32),

    #[error("invalid meld encoding: {0}")]
    InvalidMeld(u16),

    #[error("no unused tile for `{0}`")]
    TileExhausted(String),

    #[error("malformed auth challenge: {0}")]
    AuthChallenge(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    // 接続を維持できないエラー
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::NotConnected)
    }
}
