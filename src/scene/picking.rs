//! Ray picking against the model's bounding box.

use glam::{Quat, Vec3};

/// Box rotated about Y around its centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation_y: f32,
}

impl OrientedBox {
    /// Distance along the ray to the first hit, if any. `dir` must be
    /// normalized; hits behind the origin are ignored.
    pub fn ray_hit(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let to_local = Quat::from_rotation_y(-self.rotation_y);
        let o = to_local * (origin - self.center);
        let d = to_local * dir;

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let (o, d, h) = (o[axis], d[axis], self.half_extents[axis]);
            if d.abs() < 1e-8 {
                if o.abs() > h {
                    return None;
                }
                continue;
            }
            let t1 = (-h - o) / d;
            let t2 = (h - o) / d;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            None
        } else {
            Some(t_min.max(0.0))
        }
    }
}
