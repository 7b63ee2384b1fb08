use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("coordinates outside the board")]
    InvalidCoords,
    #[error("bomb count must be below the cell count and dimensions nonzero")]
    InvalidConfig,
    #[error("game already finished, no new moves are accepted")]
    AlreadyFinished,
}

pub type Result<T> = core::result::Result<T, GameError>;
