//! The clickable centre model: a cube on a ground plane, in two skins.

use glam::{Mat4, Vec3, Vec4};
use std::fmt;
use std::str::FromStr;

use super::picking::OrientedBox;
use crate::params::TrackLayout;
use crate::rendering::{DrawList, InstanceRaw, MeshBatch, MeshData, MeshId};

/// Cube edge length (world units); the cube rests on the plane
pub const CUBE_SIZE: f32 = 1.0;
/// Ground plane side length (world units)
pub const PLANE_SIZE: f32 = 4.0;
/// Model yaw (radians)
pub const MODEL_ROTATION_Y: f32 = -0.449;
/// Lift that keeps the model from z-fighting the line shadows
pub const MODEL_OFFSET_Y: f32 = -0.0001;
/// Hover shell scale and opacity
pub const HOVER_SCALE: f32 = 1.005;
pub const HOVER_OPACITY: f32 = 0.1;
/// Hover outline: how far its edges sit outside the cube, and opacity
pub const OUTLINE_THICKNESS: f32 = 0.08;
pub const OUTLINE_OPACITY: f32 = 0.6;
const HOVER_COLOR: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// Model variant; exactly one is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Skin {
    /// Unlit, sampling the baked lighting texture
    #[default]
    Baked,
    /// Flat colors under the scene lights
    Neon,
}

impl Skin {
    pub fn cycle(self) -> Self {
        match self {
            Skin::Baked => Skin::Neon,
            Skin::Neon => Skin::Baked,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Skin::Baked => "baked",
            Skin::Neon => "neon",
        }
    }
}

impl fmt::Display for Skin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Skin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baked" => Ok(Skin::Baked),
            "neon" => Ok(Skin::Neon),
            other => Err(format!("unknown skin '{}'", other)),
        }
    }
}

/// Cube transform in world space
pub fn cube_matrix() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, MODEL_OFFSET_Y, 0.0))
        * Mat4::from_rotation_y(MODEL_ROTATION_Y)
}

/// World-space box the pointer is tested against (the hover shell)
pub fn pick_box() -> OrientedBox {
    let half = CUBE_SIZE * 0.5 * HOVER_SCALE;
    OrientedBox {
        center: Vec3::new(0.0, half + MODEL_OFFSET_Y, 0.0),
        half_extents: Vec3::splat(half),
        rotation_y: MODEL_ROTATION_Y,
    }
}

/// Every mesh the renderer uploads at startup
pub fn mesh_library(layout: &TrackLayout) -> Vec<(MeshId, MeshData)> {
    let bar = Vec3::from_array(layout.bar_size);
    vec![
        (
            MeshId::Cube,
            MeshData::cuboid(
                Vec3::splat(CUBE_SIZE),
                Vec3::new(0.0, CUBE_SIZE * 0.5, 0.0),
            ),
        ),
        (MeshId::Plane, MeshData::plane(PLANE_SIZE, 0.0)),
        // Bars grow upward from the ring
        (MeshId::Bar, MeshData::cuboid(bar, Vec3::new(0.0, bar.y * 0.5, 0.0))),
        (MeshId::Sparkle, MeshData::cuboid(Vec3::splat(1.0), Vec3::ZERO)),
    ]
}

/// Edge strips of the cube grown by the outline thickness, in cube space:
/// top and bottom loops plus four verticals
fn outline_strips() -> Vec<Vec<Vec3>> {
    let half = (CUBE_SIZE + OUTLINE_THICKNESS) * 0.5;
    let center = Vec3::new(0.0, CUBE_SIZE * 0.5, 0.0);
    let corner = |x: f32, y: f32, z: f32| center + Vec3::new(x, y, z) * half;
    let around = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0)];

    let mut strips: Vec<Vec<Vec3>> = [-1.0, 1.0]
        .iter()
        .map(|&y| around.iter().map(|&(x, z)| corner(x, y, z)).collect())
        .collect();
    strips.extend(
        around[..4]
            .iter()
            .map(|&(x, z)| vec![corner(x, -1.0, z), corner(x, 1.0, z)]),
    );
    strips
}

/// Queue the model for `skin`, plus the hover shell and outline when hovered
pub fn draw_model(skin: Skin, hovered: bool, list: &mut DrawList) {
    let cube = cube_matrix();
    let plane = Mat4::from_translation(Vec3::new(0.0, MODEL_OFFSET_Y, 0.0));

    let (cube_instance, plane_instance) = match skin {
        Skin::Baked => (
            InstanceRaw::new(cube, Vec4::ONE, 1.0, false),
            InstanceRaw::new(plane, Vec4::ONE, 1.0, false),
        ),
        Skin::Neon => (
            InstanceRaw::new(cube, Vec4::new(0.1, 0.75, 1.0, 1.0), 0.0, true),
            InstanceRaw::new(plane, Vec4::new(0.04, 0.04, 0.07, 1.0), 0.0, true),
        ),
    };

    list.batches.push(MeshBatch {
        mesh: MeshId::Cube,
        instances: vec![cube_instance],
    });
    list.batches.push(MeshBatch {
        mesh: MeshId::Plane,
        instances: vec![plane_instance],
    });

    if hovered {
        list.overlays.push(MeshBatch {
            mesh: MeshId::Cube,
            instances: vec![InstanceRaw::flat(
                cube * Mat4::from_scale(Vec3::splat(HOVER_SCALE)),
                HOVER_COLOR,
                HOVER_OPACITY,
            )],
        });
        let outline = HOVER_COLOR.extend(OUTLINE_OPACITY);
        for strip in outline_strips() {
            list.push_line(&strip, cube, outline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skin_cycle_and_parse() {
        assert_eq!(Skin::Baked.cycle(), Skin::Neon);
        assert_eq!(Skin::Neon.cycle(), Skin::Baked);
        assert_eq!("Neon".parse::<Skin>(), Ok(Skin::Neon));
        assert!("chrome".parse::<Skin>().is_err());
    }

    #[test]
    fn test_pick_box_matches_cube() {
        let b = pick_box();
        // Ray from the start camera position towards the cube centre hits
        let origin = Vec3::new(1.0, 2.0, 6.0);
        let dir = (b.center - origin).normalize();
        assert!(b.ray_hit(origin, dir).is_some());
        // A ray well above the cube misses
        assert!(b.ray_hit(Vec3::new(0.0, 3.0, 6.0), Vec3::NEG_Z).is_none());
    }

    #[test]
    fn test_hover_adds_overlay() {
        let mut list = DrawList::default();
        draw_model(Skin::Baked, false, &mut list);
        assert_eq!(list.batches.len(), 2);
        assert!(list.overlays.is_empty());
        assert!(list.lines.is_empty());

        list.clear();
        draw_model(Skin::Neon, true, &mut list);
        assert_eq!(list.overlays.len(), 1);
        assert_eq!(list.overlays[0].instances[0].color[3], HOVER_OPACITY);
        // Neon is lit, baked is not
        assert_eq!(list.batches[0].instances[0].params[1], 1.0);

        // Outline: two edge loops and four verticals in translucent blue
        assert_eq!(list.lines.len(), 6);
        assert_eq!(list.line_vertex_count(), 2 * 5 + 4 * 2);
        assert!(list.lines.iter().flatten().all(|v| v.color == [0.0, 0.0, 1.0, 0.6]));
    }

    #[test]
    fn test_outline_sits_outside_the_cube() {
        let half = CUBE_SIZE * 0.5;
        for point in outline_strips().into_iter().flatten() {
            let local = point - Vec3::new(0.0, half, 0.0);
            assert!((local.abs().max_element() - (half + OUTLINE_THICKNESS * 0.5)).abs() < 1e-6);
        }
    }
}
