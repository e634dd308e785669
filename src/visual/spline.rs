//! Closed centripetal Catmull-Rom interpolation.

use glam::Vec3;

/// Sample a closed centripetal Catmull-Rom curve through `points` at
/// `divisions + 1` evenly spaced parameter values. The first and last
/// samples coincide.
pub fn closed_catmull_rom(points: &[Vec3], divisions: usize, out: &mut Vec<Vec3>) {
    out.clear();
    if points.is_empty() {
        return;
    }
    for d in 0..=divisions {
        let t = if divisions == 0 {
            0.0
        } else {
            d as f32 / divisions as f32
        };
        out.push(point_at(points, t));
    }
}

/// Point at parameter `t` in [0, 1] along the closed curve
pub fn point_at(points: &[Vec3], t: f32) -> Vec3 {
    let len = points.len();
    if len == 1 {
        return points[0];
    }

    let p = len as f32 * t;
    let segment = p.floor();
    let weight = p - segment;
    let i = segment as usize;

    let p0 = points[(i + len - 1) % len];
    let p1 = points[i % len];
    let p2 = points[(i + 1) % len];
    let p3 = points[(i + 2) % len];

    // Centripetal parameterization: knot spacing = sqrt(chord length)
    let mut dt0 = p0.distance_squared(p1).powf(0.25);
    let mut dt1 = p1.distance_squared(p2).powf(0.25);
    let mut dt2 = p2.distance_squared(p3).powf(0.25);

    // Guard against repeated points
    if dt1 < 1e-4 {
        dt1 = 1.0;
    }
    if dt0 < 1e-4 {
        dt0 = dt1;
    }
    if dt2 < 1e-4 {
        dt2 = dt1;
    }

    Vec3::new(
        nonuniform(p0.x, p1.x, p2.x, p3.x, dt0, dt1, dt2, weight),
        nonuniform(p0.y, p1.y, p2.y, p3.y, dt0, dt1, dt2, weight),
        nonuniform(p0.z, p1.z, p2.z, p3.z, dt0, dt1, dt2, weight),
    )
}

/// One axis of a non-uniform Catmull-Rom segment between x1 and x2,
/// evaluated as a cubic Hermite polynomial
#[allow(clippy::too_many_arguments)]
fn nonuniform(x0: f32, x1: f32, x2: f32, x3: f32, dt0: f32, dt1: f32, dt2: f32, w: f32) -> f32 {
    let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
    let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;

    let c0 = x1;
    let c1 = t1;
    let c2 = -3.0 * x1 + 3.0 * x2 - 2.0 * t1 - t2;
    let c3 = 2.0 * x1 - 2.0 * x2 + t1 + t2;

    c0 + w * (c1 + w * (c2 + w * c3))
}
