//! Scene composition: model, track visuals, camera moves and post settings.
//!
//! `Scene::frame` runs the per-frame order: track visuals (cache writes),
//! zoom reactor (cache read), camera tween, orbit clamp, autofocus.

mod cache;
mod model;
mod picking;
mod sparkles;
mod tracks;
mod tween;
mod zoom;

use std::sync::mpsc::Sender;

use glam::{Vec2, Vec3};

pub use cache::{FrequencyCache, FrequencySample};
pub use model::{cube_matrix, draw_model, mesh_library, pick_box, Skin};
pub use picking::OrientedBox;
pub use sparkles::Sparkles;
pub use tracks::{GraphLease, TrackViews};
pub use tween::{power2_in_out, Timeline, Tween};
pub use zoom::ZoomReactor;

use crate::audio::GraphRegistry;
use crate::camera::{CameraSystem, OrbitControls};
use crate::params::{CameraRig, PostFx, TrackLayout};
use crate::playback::PlayerState;
use crate::rendering::{DrawList, PostUniforms, SceneUniforms};

/// Key light position; the light points from here at the origin
const KEY_LIGHT: Vec3 = Vec3::new(5.0, 10.0, 5.0);
const AMBIENT_INTENSITY: f32 = 0.35;
const KEY_INTENSITY: f32 = 0.9;

pub struct Scene {
    rig: CameraRig,
    camera: CameraSystem,
    orbit: OrbitControls,
    timeline: Timeline,
    zoom: ZoomReactor,
    cache: FrequencyCache,
    tracks: TrackViews,
    sparkles: Sparkles,
    pick: OrientedBox,
    hovered: bool,
    clicked: bool,
    post: PostFx,
    focus_distance: f32,
    time_s: f32,
}

impl Scene {
    /// Build the scene and start the intro camera move
    pub fn new(
        rig: &CameraRig,
        layout: &TrackLayout,
        post: &PostFx,
        bin_count: usize,
        ended_tx: Sender<String>,
    ) -> Self {
        let camera = CameraSystem::new(rig);
        let mut timeline = Timeline::default();
        timeline.play(camera.position, &rig.intro);

        let focus_distance = camera
            .position
            .distance(Vec3::from_array(post.focus_target));

        Self {
            rig: rig.clone(),
            orbit: OrbitControls::new(rig),
            zoom: ZoomReactor::new(rig),
            camera,
            timeline,
            cache: FrequencyCache::new(),
            tracks: TrackViews::new(layout, bin_count, ended_tx),
            sparkles: Sparkles::new(),
            pick: pick_box(),
            hovered: false,
            clicked: false,
            post: post.clone(),
            focus_distance,
            time_s: 0.0,
        }
    }

    pub fn camera(&self) -> &CameraSystem {
        &self.camera
    }

    pub fn cache(&self) -> &FrequencyCache {
        &self.cache
    }

    pub fn tracks(&self) -> &TrackViews {
        &self.tracks
    }

    pub fn post(&self) -> &PostFx {
        &self.post
    }

    pub fn post_mut(&mut self) -> &mut PostFx {
        &mut self.post
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Whether a camera move is running
    pub fn is_animating(&self) -> bool {
        self.timeline.is_active()
    }

    /// Smoothed distance from the camera to the focus target
    pub fn focus_distance(&self) -> f32 {
        self.focus_distance
    }

    fn hit_model(&self, ndc: Vec2, aspect: f32) -> bool {
        let (origin, dir) = self.camera.ray_through(ndc, aspect);
        self.pick.ray_hit(origin, dir).is_some()
    }

    /// Update hover from a cursor position in NDC. Returns the hover state.
    pub fn pointer_moved(&mut self, ndc: Vec2, aspect: f32) -> bool {
        self.hovered = self.hit_model(ndc, aspect);
        self.hovered
    }

    pub fn pointer_left(&mut self) {
        self.hovered = false;
        self.clicked = false;
    }

    /// Click at `ndc`. On the model: toggle playback, reveal the panel and
    /// run the click camera move. Returns whether the model was hit.
    pub fn click(&mut self, ndc: Vec2, aspect: f32, state: &mut PlayerState) -> bool {
        if !self.hit_model(ndc, aspect) {
            return false;
        }
        state.model_click();
        if !self.clicked {
            self.timeline.play(self.camera.position, &self.rig.click);
            self.clicked = true;
        }
        true
    }

    pub fn drag(&mut self, delta_px: Vec2, viewport_height: f32) {
        self.orbit.rotate(&mut self.camera, delta_px, viewport_height);
    }

    pub fn wheel(&mut self, lines: f32) {
        self.orbit.zoom(&mut self.camera, lines);
    }

    /// Mount or unmount track visuals after the track list, panel or style
    /// changed
    pub fn reconcile(&mut self, state: &PlayerState) {
        self.tracks.reconcile(state, &mut self.cache);
        self.cache.truncate(state.tracks().len());
    }

    /// Advance one frame of `dt` seconds
    pub fn frame(&mut self, dt: f32, registry: &mut GraphRegistry, state: &PlayerState) {
        let dt = dt.max(0.0);
        self.time_s += dt;

        self.tracks.frame(registry, state, &mut self.cache);
        self.zoom
            .apply(state.selected_zoom(), &self.cache, &mut self.camera.fov_degrees);

        self.timeline.update(dt, &mut self.camera.position);
        self.orbit.update(&mut self.camera);

        let target = self
            .camera
            .position
            .distance(Vec3::from_array(self.post.focus_target));
        if self.post.smooth_time_s > 0.0 {
            let blend = 1.0 - (-dt / self.post.smooth_time_s).exp();
            self.focus_distance += (target - self.focus_distance) * blend;
        } else {
            self.focus_distance = target;
        }
    }

    /// Rebuild `list` for the current frame
    pub fn draw(&self, state: &PlayerState, list: &mut DrawList) {
        list.clear();
        draw_model(state.skin, self.hovered, list);
        self.tracks.draw(list);
        self.sparkles.draw(self.time_s, list);
    }

    pub fn scene_uniforms(&self, aspect: f32) -> SceneUniforms {
        let (view_proj, eye) = self.camera.create_view_proj_matrix(aspect);
        SceneUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: eye.extend(1.0).to_array(),
            light_dir: KEY_LIGHT.normalize().extend(0.0).to_array(),
            lighting: [AMBIENT_INTENSITY, KEY_INTENSITY, 0.0, 0.0],
        }
    }

    pub fn post_uniforms(&self, width: u32, height: u32) -> PostUniforms {
        PostUniforms {
            texel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            near: self.camera.near(),
            far: self.camera.far(),
            focus_distance: self.focus_distance,
            focus_range: self.post.focus_range,
            bokeh_scale: self.post.bokeh_scale,
            bloom_threshold: self.post.bloom_threshold,
            bloom_intensity: self.post.bloom_intensity,
            bloom_radius: self.post.bloom_radius,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, DecodedAudio, Mixer, SourceLoader};
    use crate::params::{AnalyserConfig, PlaybackParams};
    use crate::playback::Track;
    use crate::rendering::MeshId;
    use std::sync::mpsc;
    use std::sync::Arc;

    struct NoAudio;

    impl SourceLoader for NoAudio {
        fn load(&self, locator: &str) -> Result<DecodedAudio, AudioError> {
            Err(AudioError::NoTrack(locator.to_string()))
        }
    }

    const ASPECT: f32 = 1.5;

    fn scene() -> (Scene, GraphRegistry, PlayerState) {
        let (tx, _rx) = mpsc::channel();
        let scene = Scene::new(
            &CameraRig::default(),
            &TrackLayout::default(),
            &PostFx::default(),
            32,
            tx,
        );
        let registry = GraphRegistry::new(
            Arc::new(NoAudio),
            Mixer::new(44100, 2).into_handle(),
            AnalyserConfig::default(),
        );
        let state = PlayerState::new(
            vec![Track::bundled("a.mp3"), Track::bundled("b.mp3")],
            &PlaybackParams::default(),
        );
        (scene, registry, state)
    }

    #[test]
    fn test_intro_move_ends_clamped_to_max_distance() {
        let (mut scene, mut registry, state) = scene();
        assert!(scene.is_animating());

        scene.frame(2.0, &mut registry, &state);

        assert!(!scene.is_animating());
        assert!((scene.camera().position.length() - 10.0).abs() < 1e-3);
        assert_eq!(scene.camera().target, Vec3::ZERO);
    }

    #[test]
    fn test_click_on_model_toggles_and_reveals() {
        let (mut scene, mut registry, mut state) = scene();
        scene.frame(2.0, &mut registry, &state);

        assert!(scene.click(Vec2::ZERO, ASPECT, &mut state));
        assert!(state.panel_visible());
        assert_eq!(state.all_playing(), Some(true));
        assert!(scene.is_animating());
    }

    #[test]
    fn test_click_outside_model_does_nothing() {
        let (mut scene, mut registry, mut state) = scene();
        scene.frame(2.0, &mut registry, &state);

        assert!(!scene.click(Vec2::new(0.95, 0.95), ASPECT, &mut state));
        assert!(!state.panel_visible());
        assert_eq!(state.all_playing(), None);
    }

    #[test]
    fn test_click_move_replays_only_after_pointer_leaves() {
        let (mut scene, mut registry, mut state) = scene();
        scene.frame(2.0, &mut registry, &state);

        scene.click(Vec2::ZERO, ASPECT, &mut state);
        scene.frame(2.0, &mut registry, &state);
        scene.click(Vec2::ZERO, ASPECT, &mut state);
        assert!(!scene.is_animating());
        assert_eq!(state.all_playing(), Some(false));

        scene.pointer_left();
        scene.click(Vec2::ZERO, ASPECT, &mut state);
        assert!(scene.is_animating());
    }

    #[test]
    fn test_hover_adds_shell_overlay() {
        let (mut scene, _registry, state) = scene();
        let mut list = DrawList::default();

        scene.draw(&state, &mut list);
        let sparkle_only = list.overlays.len();
        assert!(list.overlays.iter().all(|b| b.mesh == MeshId::Sparkle));

        assert!(scene.pointer_moved(Vec2::ZERO, ASPECT));
        scene.draw(&state, &mut list);
        assert_eq!(list.overlays.len(), sparkle_only + 1);

        scene.pointer_left();
        assert!(!scene.is_hovered());
    }

    #[test]
    fn test_no_zoom_selection_keeps_base_fov() {
        let (mut scene, mut registry, state) = scene();
        scene.frame(0.1, &mut registry, &state);
        assert_eq!(scene.camera().fov_degrees, 45.0);
    }

    #[test]
    fn test_autofocus_converges_on_target_distance() {
        let (mut scene, mut registry, state) = scene();
        for _ in 0..200 {
            scene.frame(0.05, &mut registry, &state);
        }
        let expected = scene
            .camera()
            .position
            .distance(Vec3::from_array(scene.post().focus_target));
        assert!((scene.focus_distance() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_post_uniforms_carry_settings() {
        let (scene, _registry, _state) = scene();
        let post = scene.post_uniforms(800, 400);
        assert_eq!(post.texel_size, [1.0 / 800.0, 1.0 / 400.0]);
        assert_eq!(post.near, 0.1);
        assert_eq!(post.far, 200.0);
        assert_eq!(post.bokeh_scale, 4.0);
    }
}
