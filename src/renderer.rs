use image::RgbaImage;
use rayon::prelude::*;

use crate::{
    error::{Error, Result},
    scene::Scene,
    settings::RenderSettings,
    shader::per_pixel,
};

/// Image resource the renderer publishes finished frames to.
///
/// `new` and `resize` report allocation failure as [`Error::Allocation`]; a
/// failed `resize` leaves the image as it was.
pub trait FinalImage {
    fn new(width: u32, height: u32) -> Result<Self>
    where
        Self: Sized;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
    /// Replace the image contents with packed RGBA pixels, row-major.
    fn set_data(&mut self, data: &[u32]);
}

impl FinalImage for RgbaImage {
    fn new(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or(Error::Allocation { width, height })?;
        let raw = try_zeroed::<u8>(len, width, height)?;
        RgbaImage::from_raw(width, height, raw).ok_or(Error::Allocation { width, height })
    }

    fn width(&self) -> u32 {
        image::ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        image::ImageBuffer::height(self)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        *self = <RgbaImage as FinalImage>::new(width, height)?;
        Ok(())
    }

    fn set_data(&mut self, data: &[u32]) {
        for (dst, src) in self.chunks_exact_mut(4).zip(data) {
            dst.copy_from_slice(&src.to_le_bytes());
        }
    }
}

/// Owns the pixel buffer and drives the pixel shader across a whole frame.
pub struct FrameRenderer<I: FinalImage = RgbaImage> {
    scene: Scene,
    final_image: Option<I>,
    image_data: Vec<u32>,
}

impl<I: FinalImage> Default for FrameRenderer<I> {
    fn default() -> Self {
        Self::with_scene(Scene::default())
    }
}

impl<I: FinalImage> FrameRenderer<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(scene: Scene) -> Self {
        Self {
            scene,
            final_image: None,
            image_data: Vec::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn final_image(&self) -> Option<&I> {
        self.final_image.as_ref()
    }

    /// Packed pixels of the last frame, `x + y * width`.
    pub fn image_data(&self) -> &[u32] {
        &self.image_data
    }

    pub fn width(&self) -> u32 {
        self.final_image.as_ref().map_or(0, |image| image.width())
    }

    pub fn height(&self) -> u32 {
        self.final_image.as_ref().map_or(0, |image| image.height())
    }

    /// Match the final image and pixel buffer to the viewport. Previous pixel
    /// contents are discarded; same-size calls leave everything untouched.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if let Some(image) = &self.final_image {
            if image.width() == width && image.height() == height {
                return Ok(());
            }
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(Error::Allocation { width, height })?;
        let image_data = try_zeroed::<u32>(len, width, height)?;

        match self.final_image.as_mut() {
            Some(image) => image.resize(width, height)?,
            None => self.final_image = Some(I::new(width, height)?),
        }
        self.image_data = image_data;

        tracing::debug!(width, height, "final image resized");
        Ok(())
    }

    pub fn render(&mut self, settings: &RenderSettings) -> Result<()> {
        let image = self.final_image.as_mut().ok_or(Error::NotResized)?;
        let (width, height) = (image.width(), image.height());

        if width > 0 && height > 0 {
            let scene = &self.scene;
            self.image_data
                .par_chunks_mut(width as usize)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, pixel) in row.iter_mut().enumerate() {
                        let coord = glam::Vec2::new(
                            x as f32 / width as f32,
                            y as f32 / height as f32,
                        ) * 2.0
                            - 1.0; // -1 -> 1
                        *pixel = pack_rgba(shade_pixel(scene, coord, settings));
                    }
                });
        }

        image.set_data(&self.image_data);
        Ok(())
    }
}

/// `per_pixel` with every channel clamped to [0, 1], ready for packing.
pub fn shade_pixel(scene: &Scene, coord: glam::Vec2, settings: &RenderSettings) -> glam::Vec4 {
    per_pixel(scene, coord, settings).clamp(glam::Vec4::ZERO, glam::Vec4::ONE)
}

fn try_zeroed<T: Copy + Default>(len: usize, width: u32, height: u32) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|err| {
        tracing::error!(width, height, %err, "pixel buffer allocation failed");
        Error::Allocation { width, height }
    })?;
    data.resize(len, T::default());
    Ok(data)
}

/// Byte layout R, G, B, A from least to most significant.
pub fn pack_rgba(color: glam::Vec4) -> u32 {
    let r = (color.x * 255.0) as u8;
    let g = (color.y * 255.0) as u8;
    let b = (color.z * 255.0) as u8;
    let a = (color.w * 255.0) as u8;
    u32::from_le_bytes([r, g, b, a])
}

pub fn unpack_rgba(packed: u32) -> glam::Vec4 {
    let [r, g, b, a] = packed.to_le_bytes();
    glam::Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct CountingImage {
        width: u32,
        height: u32,
        resizes: usize,
        uploads: usize,
        data: Vec<u32>,
    }

    impl FinalImage for CountingImage {
        fn new(width: u32, height: u32) -> Result<Self> {
            Ok(Self {
                width,
                height,
                resizes: 0,
                uploads: 0,
                data: Vec::new(),
            })
        }

        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<()> {
            self.width = width;
            self.height = height;
            self.resizes += 1;
            Ok(())
        }

        fn set_data(&mut self, data: &[u32]) {
            self.data = data.to_vec();
            self.uploads += 1;
        }
    }

    /// Display image that runs out of memory above a fixed pixel count.
    #[derive(Debug)]
    struct BoundedImage {
        width: u32,
        height: u32,
    }

    impl BoundedImage {
        const MAX_PIXELS: u32 = 64;
    }

    impl FinalImage for BoundedImage {
        fn new(width: u32, height: u32) -> Result<Self> {
            if width * height > Self::MAX_PIXELS {
                return Err(Error::Allocation { width, height });
            }
            Ok(Self { width, height })
        }

        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<()> {
            *self = Self::new(width, height)?;
            Ok(())
        }

        fn set_data(&mut self, _data: &[u32]) {}
    }

    fn lit_from_camera(color: glam::Vec4) -> RenderSettings {
        RenderSettings::new(color, glam::Vec3::NEG_Z)
    }

    #[test]
    fn pack_layout_is_abgr() {
        let packed = pack_rgba(glam::Vec4::new(1.0, 0.0, 0.5, 1.0));
        assert_eq!(packed & 0xff, 255);
        assert_eq!(packed, (255 << 24) | (127 << 16) | 255);

        let unpacked = unpack_rgba(packed);
        let expected = glam::Vec4::new(1.0, 0.0, 0.5, 1.0);
        assert!((unpacked - expected).abs().max_element() <= 1.0 / 255.0);
    }

    #[test]
    fn render_before_resize_is_an_error() {
        let mut renderer = FrameRenderer::<RgbaImage>::new();
        assert!(matches!(
            renderer.render(&RenderSettings::default()),
            Err(Error::NotResized)
        ));
    }

    #[test]
    fn same_size_resize_does_not_reallocate() {
        let mut renderer = FrameRenderer::<CountingImage>::new();
        renderer.resize(4, 3).unwrap();
        let ptr = renderer.image_data().as_ptr();

        renderer.resize(4, 3).unwrap();
        assert_eq!(renderer.image_data().as_ptr(), ptr);
        assert_eq!(renderer.final_image().unwrap().resizes, 0);

        renderer.resize(8, 3).unwrap();
        assert_eq!(renderer.final_image().unwrap().resizes, 1);
        assert_eq!(renderer.image_data().len(), 24);
    }

    #[test]
    fn resize_discards_previous_pixels() {
        let mut renderer = FrameRenderer::<RgbaImage>::new();
        renderer.resize(2, 2).unwrap();
        renderer.render(&lit_from_camera(glam::Vec4::ONE)).unwrap();
        assert!(renderer.image_data().iter().any(|&p| p != 0));

        renderer.resize(3, 2).unwrap();
        assert!(renderer.image_data().iter().all(|&p| p == 0));
    }

    #[test]
    fn zero_sized_viewport_renders_nothing() {
        let mut renderer = FrameRenderer::<CountingImage>::new();
        renderer.resize(0, 5).unwrap();
        renderer.render(&RenderSettings::default()).unwrap();
        assert!(renderer.image_data().is_empty());
        assert_eq!(renderer.final_image().unwrap().uploads, 1);
    }

    #[test]
    fn overflowing_dimensions_report_allocation_failure() {
        let mut renderer = FrameRenderer::<CountingImage>::new();
        let err = renderer.resize(u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            Error::Allocation {
                width: u32::MAX,
                height: u32::MAX
            }
        ));
        assert!(renderer.final_image().is_none());
    }

    #[test]
    fn image_allocation_failure_is_returned() {
        let mut renderer = FrameRenderer::<BoundedImage>::new();
        assert!(matches!(
            renderer.resize(100, 100),
            Err(Error::Allocation {
                width: 100,
                height: 100
            })
        ));
        assert!(renderer.final_image().is_none());
    }

    #[test]
    fn failed_image_resize_keeps_previous_frame() {
        let mut renderer = FrameRenderer::<BoundedImage>::new();
        renderer.resize(8, 8).unwrap();
        renderer.render(&RenderSettings::default()).unwrap();
        let frame = renderer.image_data().to_vec();

        assert!(renderer.resize(9, 8).is_err());
        assert_eq!((renderer.width(), renderer.height()), (8, 8));
        assert_eq!(renderer.image_data(), frame.as_slice());
        renderer.render(&RenderSettings::default()).unwrap();
    }

    #[test]
    fn rgba_image_reports_oversized_allocation() {
        let err = <RgbaImage as FinalImage>::new(u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, Error::Allocation { .. }));

        let mut image = <RgbaImage as FinalImage>::new(2, 1).unwrap();
        assert!(FinalImage::resize(&mut image, u32::MAX, u32::MAX).is_err());
        assert_eq!(image.dimensions(), (2, 1));
    }

    #[test]
    fn shade_pixel_clamps_both_ends() {
        let settings = RenderSettings::new(glam::Vec4::new(-0.5, 2.0, 0.5, 3.0), glam::Vec3::NEG_Z);
        let shaded = per_pixel(&Scene::default(), glam::Vec2::ZERO, &settings);
        assert!(shaded.x < 0.0 && shaded.y > 1.0);

        let color = shade_pixel(&Scene::default(), glam::Vec2::ZERO, &settings);
        assert_eq!(color, glam::Vec4::new(0.0, 1.0, 0.5, 1.0));
    }

    #[test]
    fn overbright_color_is_clamped() {
        let mut renderer = FrameRenderer::<RgbaImage>::new();
        renderer.resize(2, 2).unwrap();
        renderer
            .render(&lit_from_camera(glam::Vec4::new(2.0, 2.0, 2.0, 2.0)))
            .unwrap();

        // (1, 1) maps to the center of the screen, straight at the sphere
        let center = renderer.image_data()[1 + 2];
        assert_eq!(center, u32::MAX);
    }

    #[test]
    fn corner_pixel_misses_sphere() {
        let mut renderer = FrameRenderer::<RgbaImage>::new();
        renderer.resize(4, 4).unwrap();
        renderer.render(&RenderSettings::default()).unwrap();
        assert_eq!(renderer.image_data()[0], 0xff00_0000);
    }

    #[test]
    fn final_image_receives_rgba_bytes() {
        let mut renderer = FrameRenderer::<RgbaImage>::new();
        renderer.resize(2, 2).unwrap();
        renderer
            .render(&lit_from_camera(glam::Vec4::new(1.0, 0.0, 0.5, 1.0)))
            .unwrap();

        let image = renderer.final_image().unwrap();
        assert_eq!(image.get_pixel(1, 1).0, [255, 0, 127, 255]);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn parallel_sweep_matches_sequential_shading() {
        let settings = RenderSettings::default();
        let (width, height) = (7u32, 5u32);
        let mut renderer = FrameRenderer::<CountingImage>::new();
        renderer.resize(width, height).unwrap();
        renderer.render(&settings).unwrap();

        let scene = Scene::default();
        for y in 0..height {
            for x in 0..width {
                let coord = glam::Vec2::new(x as f32 / width as f32, y as f32 / height as f32)
                    * 2.0
                    - 1.0;
                let expected = pack_rgba(shade_pixel(&scene, coord, &settings));
                assert_eq!(renderer.image_data()[(x + y * width) as usize], expected);
            }
        }
        assert_eq!(renderer.final_image().unwrap().data, renderer.image_data());
    }
}
