//! Floating sparkle motes around the model.

use glam::{Mat4, Vec3};

use crate::rendering::{DrawList, InstanceRaw, MeshBatch, MeshId};

const COUNT: usize = 40;
/// Volume the motes are scattered in (world units)
const EXTENT: Vec3 = Vec3::new(6.0, 4.0, 6.0);
const CENTER_Y: f32 = 1.0;
const SPEED: f32 = 0.4;
/// Mote edge length (world units)
const SIZE: f32 = 0.02;

#[derive(Debug, Clone)]
struct Mote {
    home: Vec3,
    phase: f32,
}

#[derive(Debug, Clone)]
pub struct Sparkles {
    motes: Vec<Mote>,
}

impl Default for Sparkles {
    fn default() -> Self {
        Self::new()
    }
}

impl Sparkles {
    pub fn new() -> Self {
        let motes = (0..COUNT as u32)
            .map(|i| Mote {
                home: Vec3::new(
                    (unit_hash(i, 1) - 0.5) * EXTENT.x,
                    (unit_hash(i, 2) - 0.5) * EXTENT.y + CENTER_Y,
                    (unit_hash(i, 3) - 0.5) * EXTENT.z,
                ),
                phase: unit_hash(i, 4) * std::f32::consts::TAU,
            })
            .collect();
        Self { motes }
    }

    pub fn len(&self) -> usize {
        self.motes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motes.is_empty()
    }

    /// Mote position at `time_s`: a slow vertical bob around its home
    pub fn position(&self, index: usize, time_s: f32) -> Option<Vec3> {
        let mote = self.motes.get(index)?;
        let t = time_s * SPEED + mote.phase;
        Some(mote.home + Vec3::new(0.05 * t.cos(), 0.15 * t.sin(), 0.05 * (0.7 * t).sin()))
    }

    pub fn draw(&self, time_s: f32, list: &mut DrawList) {
        let instances = (0..self.motes.len())
            .filter_map(|i| {
                let position = self.position(i, time_s)?;
                let twinkle = 0.5 + 0.5 * (time_s * SPEED * 5.0 + self.motes[i].phase).sin();
                Some(InstanceRaw::flat(
                    Mat4::from_scale_rotation_translation(
                        Vec3::splat(SIZE),
                        glam::Quat::IDENTITY,
                        position,
                    ),
                    Vec3::splat(1.5),
                    twinkle,
                ))
            })
            .collect();
        list.overlays.push(MeshBatch {
            mesh: MeshId::Sparkle,
            instances,
        });
    }
}

/// Deterministic hash of (index, salt) into [0, 1)
fn unit_hash(index: u32, salt: u32) -> f32 {
    let mut x = index.wrapping_mul(0x9E37_79B9) ^ salt.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846C_A68B);
    x ^= x >> 16;
    (x >> 8) as f32 / (1u32 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motes_stay_near_their_volume() {
        let sparkles = Sparkles::new();
        assert_eq!(sparkles.len(), COUNT);

        for t in [0.0, 1.7, 42.0] {
            for i in 0..sparkles.len() {
                let p = sparkles.position(i, t).unwrap();
                assert!(p.x.abs() <= EXTENT.x / 2.0 + 0.1);
                assert!((p.y - CENTER_Y).abs() <= EXTENT.y / 2.0 + 0.2);
                assert!(p.z.abs() <= EXTENT.z / 2.0 + 0.1);
            }
        }
    }

    #[test]
    fn test_hash_range() {
        for i in 0..1000 {
            let v = unit_hash(i, 7);
            assert!((0.0..1.0).contains(&v));
        }
    }
}
