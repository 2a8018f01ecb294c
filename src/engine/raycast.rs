use crate::engine::camera::PerspectiveCamera;
use nalgebra::{Point3, Unit, Vector2, Vector3};

/// Pixel coordinates to normalized device coordinates, y pointing up.
pub fn to_ndc(x: f32, y: f32, width: f32, height: f32) -> Vector2<f32> {
    Vector2::new(
        (x / width.max(1.0)) * 2.0 - 1.0,
        -(y / height.max(1.0)) * 2.0 + 1.0,
    )
}

pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Unit<Vector3<f32>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit<T> {
    pub target: T,
    pub distance: f32,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Ray { origin, direction: Unit::new_normalize(direction) }
    }

    /// Ray from the camera eye through a point on the screen.
    pub fn from_camera(ndc: &Vector2<f32>, camera: &PerspectiveCamera) -> Option<Self> {
        let through = camera.unproject(&Vector3::new(ndc.x, ndc.y, 0.5))?;
        let direction = through - camera.eye;
        if direction.norm() <= f32::EPSILON {
            return None;
        }
        Some(Ray::new(camera.eye, direction))
    }

    pub fn at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction.into_inner() * distance
    }

    /// Distance to the first point where the ray enters (or, from inside,
    /// leaves) the sphere.
    pub fn intersect_sphere(&self, center: &Point3<f32>, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(&self.direction.into_inner());
        let c = oc.norm_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        if near > 0.0 {
            Some(near)
        } else if far > 0.0 {
            Some(far)
        } else {
            None
        }
    }

    pub fn nearest_sphere<T, I>(&self, spheres: I) -> Option<Hit<T>>
    where
        I: IntoIterator<Item = (T, Point3<f32>, f32)>,
    {
        spheres
            .into_iter()
            .filter_map(|(target, center, radius)| {
                self.intersect_sphere(&center, radius).map(|distance| Hit { target, distance })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ndc_corners() {
        assert_eq!(to_ndc(0.0, 0.0, 800.0, 600.0), Vector2::new(-1.0, 1.0));
        assert_eq!(to_ndc(800.0, 600.0, 800.0, 600.0), Vector2::new(1.0, -1.0));
        assert_eq!(to_ndc(400.0, 300.0, 800.0, 600.0), Vector2::new(0.0, 0.0));
    }

    #[test]
    fn nearest_of_two_spheres_wins() {
        let ray = Ray::new(Point3::new(15.0, 0.0, 0.0), -Vector3::x());
        let hit = ray
            .nearest_sphere([
                ("Earth", Point3::new(5.0, 0.0, 0.0), 0.5),
                ("Moon", Point3::new(6.0, 0.0, 0.0), 0.14),
            ])
            .unwrap();
        assert_eq!(hit.target, "Moon");
        assert_relative_eq!(hit.distance, 8.86, epsilon = 1e-4);
    }

    #[test]
    fn miss_and_behind_are_none() {
        let ray = Ray::new(Point3::origin(), Vector3::z());
        assert_eq!(ray.intersect_sphere(&Point3::new(0.0, 3.0, 5.0), 1.0), None);
        assert_eq!(ray.intersect_sphere(&Point3::new(0.0, 0.0, -5.0), 1.0), None);
    }

    #[test]
    fn origin_inside_sphere_reports_exit() {
        let ray = Ray::new(Point3::origin(), Vector3::x());
        let distance = ray.intersect_sphere(&Point3::origin(), 2.0).unwrap();
        assert_relative_eq!(ray.at(distance), Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn camera_ray_through_center_looks_at_target() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.eye = Point3::new(0.0, 0.0, 10.0);
        let ray = Ray::from_camera(&Vector2::zeros(), &camera).unwrap();
        assert_relative_eq!(ray.direction.into_inner(), -Vector3::z(), epsilon = 1e-4);
    }
}
