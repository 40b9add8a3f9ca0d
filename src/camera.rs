/// Fixed pinhole camera looking down the -z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: glam::Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: glam::Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

impl Camera {
    /// Ray through a point of the image plane, `coord` in [-1, 1] on both axes.
    ///
    /// The direction is left unnormalized; the intersection math accounts for
    /// its length.
    pub fn ray(&self, coord: glam::Vec2) -> Ray {
        Ray {
            origin: self.position,
            direction: glam::Vec3::new(coord.x, coord.y, -1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: glam::Vec3,
    pub direction: glam::Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> glam::Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_down_negative_z() {
        let ray = Camera::default().ray(glam::Vec2::ZERO);
        assert_eq!(ray.origin, glam::Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(ray.direction, glam::Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn corner_ray_is_not_normalized() {
        let ray = Camera::default().ray(glam::Vec2::new(1.0, -1.0));
        assert_eq!(ray.direction, glam::Vec3::new(1.0, -1.0, -1.0));
        assert!((ray.direction.length() - 3.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn at_walks_along_direction() {
        let ray = Camera::default().ray(glam::Vec2::new(0.5, 0.0));
        assert_eq!(ray.at(2.0), glam::Vec3::new(1.0, 0.0, -1.0));
    }
}
