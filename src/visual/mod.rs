//! Per-track frequency visuals: bar rings and line ribbons.

mod bars;
mod color;
mod lines;
mod spline;

use std::fmt;
use std::str::FromStr;

pub use bars::BarTrack;
pub use color::hsl_to_rgb;
pub use lines::LineTrack;
pub use spline::{closed_catmull_rom, point_at};

use crate::audio::AudioGraph;
use crate::params::TrackLayout;

/// Anything a visual can pull frequency bins from
pub trait FrequencySource {
    fn bin_count(&self) -> usize;

    /// Fill `bins` with the latest analysis; returns their mean
    fn poll_frequencies(&self, bins: &mut [u8]) -> f32;
}

impl FrequencySource for AudioGraph {
    fn bin_count(&self) -> usize {
        AudioGraph::bin_count(self)
    }

    fn poll_frequencies(&self, bins: &mut [u8]) -> f32 {
        AudioGraph::poll_frequencies(self, bins)
    }
}

/// Which visual a given track gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    Bars,
    Lines,
}

/// User-selected visualization style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualStyle {
    Bars,
    Lines,
    /// Even track indices get bars, odd ones lines
    #[default]
    Alternate,
}

impl VisualStyle {
    pub fn kind_for(self, index: usize) -> VisualKind {
        match self {
            VisualStyle::Bars => VisualKind::Bars,
            VisualStyle::Lines => VisualKind::Lines,
            VisualStyle::Alternate if index % 2 == 0 => VisualKind::Bars,
            VisualStyle::Alternate => VisualKind::Lines,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            VisualStyle::Bars => VisualStyle::Lines,
            VisualStyle::Lines => VisualStyle::Alternate,
            VisualStyle::Alternate => VisualStyle::Bars,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VisualStyle::Bars => "bars",
            VisualStyle::Lines => "lines",
            VisualStyle::Alternate => "alternate",
        }
    }
}

impl fmt::Display for VisualStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VisualStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bars" => Ok(VisualStyle::Bars),
            "lines" => Ok(VisualStyle::Lines),
            "alternate" => Ok(VisualStyle::Alternate),
            other => Err(format!("unknown visual style '{}'", other)),
        }
    }
}

/// A mounted track visual of either kind
#[derive(Debug, Clone)]
pub enum TrackVisual {
    Bars(BarTrack),
    Lines(LineTrack),
}

impl TrackVisual {
    pub fn new(kind: VisualKind, index: usize, bin_count: usize, layout: &TrackLayout) -> Self {
        match kind {
            VisualKind::Bars => TrackVisual::Bars(BarTrack::new(index, bin_count, layout)),
            VisualKind::Lines => TrackVisual::Lines(LineTrack::new(index, bin_count, layout)),
        }
    }

    pub fn kind(&self) -> VisualKind {
        match self {
            TrackVisual::Bars(_) => VisualKind::Bars,
            TrackVisual::Lines(_) => VisualKind::Lines,
        }
    }

    pub fn update(&mut self, source: &dyn FrequencySource, playing: bool) -> bool {
        match self {
            TrackVisual::Bars(bars) => bars.update(source, playing),
            TrackVisual::Lines(lines) => lines.update(source, playing),
        }
    }

    pub fn bins(&self) -> &[u8] {
        match self {
            TrackVisual::Bars(bars) => bars.bins(),
            TrackVisual::Lines(lines) => lines.bins(),
        }
    }

    pub fn average(&self) -> f32 {
        match self {
            TrackVisual::Bars(bars) => bars.average(),
            TrackVisual::Lines(lines) => lines.average(),
        }
    }
}
