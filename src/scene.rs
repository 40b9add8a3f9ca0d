use crate::camera::Camera;

/// Everything the pixel shader needs to know about the world.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scene {
    pub camera: Camera,
    pub sphere: Sphere,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub position: glam::Vec3,
    pub radius: f32,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            position: glam::Vec3::ZERO,
            radius: 0.5,
        }
    }
}
