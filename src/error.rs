use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pixel buffer for the requested resolution could not be allocated.
    #[error("could not allocate a {width}x{height} pixel buffer")]
    Allocation { width: u32, height: u32 },

    #[error("render called before the renderer was resized")]
    NotResized,

    #[error("invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    /// Window, surface or GPU device setup failed.
    #[error("display setup failed: {0}")]
    Display(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
