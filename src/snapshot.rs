use std::{
    path::Path,
    time::{Duration, Instant},
};

use image::RgbaImage;

use crate::{
    error::{Error, Result},
    renderer::FrameRenderer,
    settings::RenderSettings,
};

/// Writes the final image to `path`; the format follows the extension.
pub fn save(image: &RgbaImage, path: &Path) -> Result<()> {
    image.save(path)?;
    tracing::info!(path = %path.display(), width = image.width(), height = image.height(), "snapshot saved");
    Ok(())
}

/// Renders one frame without a window and saves it. Returns the render time.
pub fn render_to_file(
    settings: &RenderSettings,
    width: u32,
    height: u32,
    path: &Path,
) -> Result<Duration> {
    let mut renderer: FrameRenderer = FrameRenderer::new();

    let timer = Instant::now();
    renderer.resize(width, height)?;
    renderer.render(settings)?;
    let elapsed = timer.elapsed();
    tracing::info!(width, height, "last render: {:.3}ms", elapsed.as_secs_f64() * 1000.0);

    let image = renderer.final_image().ok_or(Error::NotResized)?;
    save(image, path)?;
    Ok(elapsed)
}
