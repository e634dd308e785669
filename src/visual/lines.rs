//! Smoothed line ribbon through the frequency bins, with a flat shadow.

use glam::{Mat4, Vec3};
use std::f32::consts::TAU;

use super::color::hsl_to_rgb;
use super::spline::closed_catmull_rom;
use super::FrequencySource;
use crate::params::TrackLayout;

#[derive(Debug, Clone)]
pub struct LineTrack {
    index: usize,
    layout: TrackLayout,
    bins: Vec<u8>,
    average: f32,
    raw: Vec<Vec3>,
    points: Vec<Vec3>,
    shadow: Vec<Vec3>,
    color: Vec3,
}

impl LineTrack {
    /// Empty until the first playing frame
    pub fn new(index: usize, bin_count: usize, layout: &TrackLayout) -> Self {
        Self {
            index,
            layout: layout.clone(),
            bins: vec![0; bin_count],
            average: 0.0,
            raw: Vec::with_capacity(bin_count),
            points: Vec::new(),
            shadow: Vec::new(),
            color: Vec3::ONE,
        }
    }

    /// Poll the source and resample the curve; see `BarTrack::update`
    pub fn update(&mut self, source: &dyn FrequencySource, playing: bool) -> bool {
        if !playing {
            return false;
        }
        self.average = source.poll_frequencies(&mut self.bins);
        self.apply();
        true
    }

    fn apply(&mut self) {
        let count = self.bins.len();
        let radius = self.layout.radius * self.layout.scale_for(self.index);

        self.raw.clear();
        self.raw.extend(self.bins.iter().enumerate().map(|(i, &bin)| {
            let angle = TAU * i as f32 / count as f32;
            Vec3::new(
                radius * angle.cos(),
                self.layout.bin_height(bin),
                radius * angle.sin(),
            )
        }));

        closed_catmull_rom(
            &self.raw,
            count * self.layout.line_samples_per_segment,
            &mut self.points,
        );

        self.shadow.clear();
        if self.layout.shadow {
            let y = self.layout.shadow_y;
            self.shadow
                .extend(self.points.iter().map(|p| Vec3::new(p.x, y, p.z)));
        }

        self.color = hsl_to_rgb(
            self.layout.hue_for(self.average),
            self.layout.saturation,
            self.layout.lightness,
        );
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Smoothed ribbon, closed (first == last)
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Ribbon flattened onto the shadow plane; empty when disabled
    pub fn shadow(&self) -> &[Vec3] {
        &self.shadow
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, self.layout.line_offset_y, 0.0))
            * Mat4::from_rotation_y(self.layout.rotation_for(self.index))
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn average(&self) -> f32 {
        self.average
    }
}
