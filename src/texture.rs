use image::RgbaImage;

/// GPU copy of the renderer's final image.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    size: wgpu::Extent3d,
}

impl Texture {
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: Option<&str>,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: img.width(),
            height: img.height(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // One texel per pixel, nothing to filter.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture = Self {
            texture,
            view,
            sampler,
            size,
        };
        texture.update_data(queue, img);
        texture
    }

    /// Whether an image of this size can back a 2D texture on a device whose
    /// `max_texture_dimension_2d` is `max_dimension`.
    pub fn fits(width: u32, height: u32, max_dimension: u32) -> bool {
        width <= max_dimension && height <= max_dimension
    }

    pub fn matches(&self, img: &RgbaImage) -> bool {
        self.size.width == img.width() && self.size.height == img.height()
    }

    /// Upload `img`, which must have the texture's dimensions.
    pub fn update_data(&self, queue: &wgpu::Queue, img: &RgbaImage) {
        debug_assert!(self.matches(img), "image size differs from texture size");
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            img,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.size.width),
                rows_per_image: Some(self.size.height),
            },
            self.size,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_checks_each_dimension_against_the_limit() {
        let max = wgpu::Limits::default().max_texture_dimension_2d;
        assert!(Texture::fits(1280, 720, max));
        assert!(Texture::fits(max, max, max));
        assert!(!Texture::fits(max + 1, 1, max));
        assert!(!Texture::fits(1, max + 1, max));
    }
}
