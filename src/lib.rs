pub mod application;
pub mod buffer;
pub mod camera;
pub mod config;
pub mod error;
pub mod logging;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod shader;
pub mod snapshot;
pub mod texture;
pub mod viewport;

pub use error::{Error, Result};
