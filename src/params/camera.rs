//! Camera rig, tween, and orbit parameters.

use serde::Deserialize;
use std::f32::consts::PI;

/// A camera move: target position and duration
#[derive(Debug, Clone, Deserialize)]
pub struct CameraMove {
    /// Destination position (world units)
    pub to: [f32; 3],

    /// Duration (seconds)
    pub duration_s: f32,
}

/// Orbit control limits around the look-at target
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrbitLimits {
    /// Minimum azimuth (radians, measured from +Z toward +X)
    pub min_azimuth: f32,

    /// Maximum azimuth (radians)
    pub max_azimuth: f32,

    /// Minimum polar angle from +Y (radians)
    pub min_polar: f32,

    /// Maximum polar angle from +Y (radians)
    pub max_polar: f32,

    /// Closest allowed distance to the target (world units)
    pub min_distance: f32,

    /// Farthest allowed distance to the target (world units)
    pub max_distance: f32,

    /// Full-height drag = this many full turns
    pub rotate_speed: f32,

    /// Dolly factor per wheel line
    pub zoom_step: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_azimuth: -PI / 6.0,
            max_azimuth: PI / 1.5,
            min_polar: 0.0,
            max_polar: PI / 2.5,
            min_distance: 5.0,
            max_distance: 10.0,
            rotate_speed: 1.0,
            zoom_step: 0.95,
        }
    }
}

/// Camera rig configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraRig {
    /// Base vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Position before the intro move
    pub start_position: [f32; 3],

    /// Orbit / look-at target
    pub target: [f32; 3],

    /// Move played once on startup
    pub intro: CameraMove,

    /// Move played when the model is clicked
    pub click: CameraMove,

    /// Zoom: fov shrinks by average / this
    pub zoom_divisor: f32,

    pub orbit: OrbitLimits,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 200.0,
            start_position: [1.0, 2.0, 6.0],
            target: [0.0, 0.0, 0.0],
            intro: CameraMove {
                to: [10.0, 5.0, 10.0],
                duration_s: 1.5,
            },
            click: CameraMove {
                to: [5.0, 4.0, 4.0],
                duration_s: 1.2,
            },
            zoom_divisor: 35.0,
            orbit: OrbitLimits::default(),
        }
    }
}
