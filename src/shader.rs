use crate::{camera::Ray, scene::Scene, scene::Sphere, settings::RenderSettings};

pub const CLEAR_COLOR: glam::Vec4 = glam::Vec4::new(0.0, 0.0, 0.0, 1.0);

/// Shades one pixel of the image plane, `coord` in [-1, 1] on both axes.
///
/// Returns [`CLEAR_COLOR`] when the ray misses the sphere. The result is not
/// clamped.
pub fn per_pixel(scene: &Scene, coord: glam::Vec2, settings: &RenderSettings) -> glam::Vec4 {
    let ray = scene.camera.ray(coord);

    let Some(closest_t) = intersect(&ray, &scene.sphere) else {
        return CLEAR_COLOR;
    };

    let hit_point = ray.at(closest_t);
    let normal = (hit_point - scene.sphere.position).normalize();

    let intensity = normal.dot(-settings.light_direction).max(0.0); // == cos(angle)

    let color = settings.color.truncate() * intensity;
    color.extend(settings.color.w)
}

/// Distance along `ray` to the near intersection with `sphere`.
pub fn intersect(ray: &Ray, sphere: &Sphere) -> Option<f32> {
    // (bx^2 + by^2 + bz^2)t^2 + (2(axbx + ayby + azbz))t + (ax^2 + ay^2 + az^2 - r^2) = 0
    // where
    // a = ray origin relative to the sphere
    // b = ray direction
    // r = radius
    // t = hit distance
    let origin = ray.origin - sphere.position;

    let a = ray.direction.dot(ray.direction);
    let b = 2.0 * origin.dot(ray.direction);
    let c = origin.dot(origin) - sphere.radius * sphere.radius;

    // Quadratic formula discriminant
    // b^2  - 4ac
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return None;
    }

    // (-b - sqrt(discriminant)) / 2a, the entry point
    Some((-b - discriminant.sqrt()) / (2.0 * a))
}
