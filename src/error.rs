use thiserror::Error;

/// Errors raised while loading terrain inputs or building the terrain mesh.
#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// The height sample has no rows or no columns
    #[error("Height map must not be empty (got {width}x{height})")]
    EmptyHeightMap { width: usize, height: usize },

    #[error("Invalid terrain layout: {0}")]
    InvalidLayout(String),
}
