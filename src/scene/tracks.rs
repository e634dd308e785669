//! Mounted track visuals and their audio graph leases.
//!
//! A view exists for every listed track while the panel is visible. Each
//! frame it re-acquires its graph from the registry, pushes changed props
//! (play state, volume, playlist end callback) into the graph, and pulls
//! fresh bins into its visual.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use glam::Vec4;

use super::cache::FrequencyCache;
use crate::audio::{Acquire, AudioGraph, GraphRegistry};
use crate::params::TrackLayout;
use crate::playback::PlayerState;
use crate::rendering::{DrawList, InstanceRaw, MeshBatch, MeshId};
use crate::visual::{TrackVisual, VisualKind};

/// Connected use of a graph. Dropping it disconnects the output and
/// suspends playback.
pub struct GraphLease {
    graph: Arc<AudioGraph>,
}

impl GraphLease {
    pub fn new(graph: Arc<AudioGraph>) -> Self {
        graph.connect();
        Self { graph }
    }

    pub fn graph(&self) -> &Arc<AudioGraph> {
        &self.graph
    }
}

impl Drop for GraphLease {
    fn drop(&mut self) {
        self.graph.disconnect();
        self.graph.suspend();
    }
}

/// Props last pushed into a graph
#[derive(Debug, Clone, Copy, PartialEq)]
struct TrackProps {
    playing: bool,
    volume: f32,
    playlist: bool,
}

/// Identity of a mounted view; a change of any part remounts it
#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewKey {
    locator: String,
    index: usize,
    kind: VisualKind,
}

struct TrackView {
    key: ViewKey,
    visual: TrackVisual,
    lease: Option<GraphLease>,
    applied: Option<TrackProps>,
}

impl TrackView {
    fn sync(&mut self, graph: &Arc<AudioGraph>, props: TrackProps, ended_tx: &Sender<String>) {
        let fresh = match &self.lease {
            Some(lease) => !Arc::ptr_eq(lease.graph(), graph),
            None => true,
        };
        if fresh {
            self.lease = Some(GraphLease::new(Arc::clone(graph)));
            self.applied = None;
        }

        let previous = self.applied;
        if previous.map(|p| p.playing) != Some(props.playing) {
            if props.playing {
                graph.resume();
            } else {
                graph.suspend();
            }
        }
        if previous.map(|p| p.volume) != Some(props.volume) {
            graph.set_volume(props.volume);
        }
        if previous.map(|p| p.playlist) != Some(props.playlist) {
            if props.playlist {
                let tx = ended_tx.clone();
                let locator = self.key.locator.clone();
                graph.on_ended(Some(Box::new(move || {
                    let _ = tx.send(locator);
                })));
            } else {
                graph.on_ended(None);
            }
        }
        if previous.is_none() {
            graph.connect();
        }
        self.applied = Some(props);
    }
}

/// All mounted track views, in track order
pub struct TrackViews {
    views: Vec<TrackView>,
    layout: TrackLayout,
    bin_count: usize,
    ended_tx: Sender<String>,
    /// Views whose decode was still in flight last frame
    pending: usize,
}

impl TrackViews {
    /// `ended_tx` receives the locator of every track that finishes in
    /// playlist mode
    pub fn new(layout: &TrackLayout, bin_count: usize, ended_tx: Sender<String>) -> Self {
        Self {
            views: Vec::new(),
            layout: layout.clone(),
            bin_count,
            ended_tx,
            pending: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Kinds of the mounted views, in order
    pub fn kinds(&self) -> Vec<VisualKind> {
        self.views.iter().map(|v| v.visual.kind()).collect()
    }

    /// Whether the view at `index` holds a connected graph
    pub fn is_live(&self, index: usize) -> bool {
        self.views
            .get(index)
            .and_then(|v| v.lease.as_ref())
            .is_some()
    }

    /// Number of views still waiting for their decode
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// "loading k/n" while any decode is in flight
    pub fn loading_label(&self) -> Option<String> {
        (self.pending > 0).then(|| {
            format!(
                "loading {}/{}",
                self.views.len().saturating_sub(self.pending),
                self.views.len()
            )
        })
    }

    /// Mount, keep or unmount views to match the track list. A freshly
    /// mounted view starts with an empty cache slot, so data left behind
    /// by a previous owner of that index is never read.
    pub fn reconcile(&mut self, state: &PlayerState, cache: &mut FrequencyCache) {
        let wanted: Vec<ViewKey> = if state.panel_visible() {
            state
                .tracks()
                .iter()
                .enumerate()
                .map(|(index, track)| ViewKey {
                    locator: track.locator.clone(),
                    index,
                    kind: state.style.kind_for(index),
                })
                .collect()
        } else {
            Vec::new()
        };

        if self.views.len() == wanted.len()
            && self.views.iter().zip(&wanted).all(|(v, k)| v.key == *k)
        {
            return;
        }

        let mut old: Vec<Option<TrackView>> = self.views.drain(..).map(Some).collect();
        let mut next = Vec::with_capacity(wanted.len());
        for key in wanted {
            let kept = old
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|v| v.key == key))
                .and_then(Option::take);
            let view = match kept {
                Some(view) => view,
                None => {
                    cache.reset(key.index);
                    TrackView {
                        visual: TrackVisual::new(key.kind, key.index, self.bin_count, &self.layout),
                        key,
                        lease: None,
                        applied: None,
                    }
                }
            };
            next.push(view);
        }

        // Unmount the rest before re-applying props to survivors, which may
        // share a graph with an unmounted view
        drop(old);
        for view in &mut next {
            view.applied = None;
        }
        self.views = next;
    }

    /// Acquire graphs, push props, and update visuals. Playing tracks
    /// write their cache slot.
    pub fn frame(
        &mut self,
        registry: &mut GraphRegistry,
        state: &PlayerState,
        cache: &mut FrequencyCache,
    ) {
        let mut pending = 0;
        for view in &mut self.views {
            let graph = match registry.acquire(&view.key.locator) {
                Acquire::Ready(graph) => graph,
                Acquire::Pending => {
                    pending += 1;
                    continue;
                }
                Acquire::Failed(_) => {
                    view.lease = None;
                    continue;
                }
            };

            let props = TrackProps {
                playing: state.is_playing(view.key.index),
                volume: state.volume(),
                playlist: state.playlist(),
            };
            view.sync(&graph, props, &self.ended_tx);

            if view.visual.update(graph.as_ref(), props.playing) {
                cache.write(view.key.index, view.visual.average(), view.visual.bins());
            }
        }

        if self.pending > 0 && pending == 0 {
            log::info!("All {} tracks loaded", self.views.len());
        }
        self.pending = pending;
    }

    /// Queue every mounted visual that has a graph
    pub fn draw(&self, list: &mut DrawList) {
        for view in self.views.iter().filter(|v| v.lease.is_some()) {
            match &view.visual {
                TrackVisual::Bars(bars) => {
                    let model = bars.model_matrix();
                    list.batches.push(MeshBatch {
                        mesh: MeshId::Bar,
                        instances: bars
                            .instances()
                            .iter()
                            .map(|m| InstanceRaw::flat(model * *m, bars.color(), 1.0))
                            .collect(),
                    });
                }
                TrackVisual::Lines(lines) => {
                    let model = lines.model_matrix();
                    let color: Vec4 = lines.color().extend(1.0);
                    list.push_line(lines.points(), model, color);
                    list.push_line(lines.shadow(), model, color * Vec4::new(1.0, 1.0, 1.0, 0.35));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, DecodedAudio, Mixer, MixerHandle, SourceLoader};
    use crate::params::{AnalyserConfig, CameraRig, PlaybackParams};
    use crate::playback::Track;
    use crate::scene::ZoomReactor;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Mutex;

    struct Tone;

    impl SourceLoader for Tone {
        fn load(&self, locator: &str) -> Result<DecodedAudio, AudioError> {
            if locator.starts_with("bad") {
                return Err(AudioError::NoTrack(locator.to_string()));
            }
            Ok(DecodedAudio {
                samples: (0..256)
                    .map(|i| (i as f32 * std::f32::consts::TAU * 4.0 / 64.0).sin() * 0.8)
                    .collect(),
                channels: 1,
                sample_rate: 6400,
            })
        }
    }

    /// Tone loader whose `slow*` locators wait until the test opens the gate
    struct Gated {
        gate: Mutex<Receiver<()>>,
    }

    impl SourceLoader for Gated {
        fn load(&self, locator: &str) -> Result<DecodedAudio, AudioError> {
            if locator.starts_with("slow") {
                let _ = self.gate.lock().unwrap().recv();
            }
            Tone.load(locator)
        }
    }

    struct Fixture {
        registry: GraphRegistry,
        mixer: MixerHandle,
        views: TrackViews,
        cache: FrequencyCache,
        ended_rx: Receiver<String>,
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(Tone))
    }

    fn fixture_with(loader: Arc<dyn SourceLoader>) -> Fixture {
        let mixer = Mixer::new(6400, 1).into_handle();
        let config = AnalyserConfig::default();
        let registry = GraphRegistry::new(loader, Arc::clone(&mixer), config.clone());
        let (tx, ended_rx) = mpsc::channel();
        Fixture {
            registry,
            mixer,
            views: TrackViews::new(&TrackLayout::default(), config.bin_count(), tx),
            cache: FrequencyCache::new(),
            ended_rx,
        }
    }

    fn state(names: &[&str]) -> PlayerState {
        let mut state = PlayerState::new(
            names.iter().map(|n| Track::bundled(n)).collect(),
            &PlaybackParams::default(),
        );
        state.reveal_panel();
        state
    }

    impl Fixture {
        /// Frame after the decodes have settled
        fn settled_frame(&mut self, state: &PlayerState) {
            for track in state.tracks() {
                let _ = self.registry.acquire_blocking(&track.locator);
            }
            self.views.reconcile(state, &mut self.cache);
            self.views.frame(&mut self.registry, state, &mut self.cache);
        }

        fn render(&self, frames: usize) {
            let mut out = vec![0.0f32; frames];
            self.mixer.lock().unwrap().render(&mut out);
        }
    }

    #[test]
    fn test_hidden_panel_mounts_nothing() {
        let mut f = fixture();
        let state = PlayerState::new(vec![Track::bundled("a.mp3")], &PlaybackParams::default());

        f.views.reconcile(&state, &mut f.cache);
        f.views.frame(&mut f.registry, &state, &mut f.cache);
        assert!(f.views.is_empty());
        assert!(f.registry.is_empty());
    }

    #[test]
    fn test_views_follow_style_parity() {
        let mut f = fixture();
        let state = state(&["a.mp3", "b.mp3", "c.mp3"]);
        f.views.reconcile(&state, &mut f.cache);
        assert_eq!(
            f.views.kinds(),
            [VisualKind::Bars, VisualKind::Lines, VisualKind::Bars]
        );
    }

    #[test]
    fn test_playing_track_connects_and_writes_cache() {
        let mut f = fixture();
        let mut state = state(&["a.mp3"]);
        state.toggle_all();

        f.settled_frame(&state);
        let graph = f.registry.acquire_blocking("a.mp3").unwrap();
        assert!(graph.is_connected());
        assert!(!graph.is_suspended());
        assert_eq!(graph.volume(), state.volume());

        f.render(128);
        f.views.frame(&mut f.registry, &state, &mut f.cache);
        let sample = f.cache.get(0).unwrap();
        assert!(sample.average > 0.0);
        assert_eq!(sample.bins.len(), 32);
    }

    #[test]
    fn test_undecided_track_is_suspended_and_frozen() {
        let mut f = fixture();
        let state = state(&["a.mp3"]);

        f.settled_frame(&state);
        let graph = f.registry.acquire_blocking("a.mp3").unwrap();
        assert!(graph.is_suspended());
        assert!(f.cache.get(0).is_none());
    }

    #[test]
    fn test_removed_view_disconnects_and_suspends() {
        let mut f = fixture();
        let uploads = crate::audio::UploadStore::new();
        let mut state = state(&["a.mp3", "b.mp3"]);
        state.toggle_all();
        f.settled_frame(&state);

        let a = f.registry.acquire_blocking("a.mp3").unwrap();
        state.remove_track(0, &uploads);
        f.views.reconcile(&state, &mut f.cache);

        assert!(!a.is_connected());
        assert!(a.is_suspended());
        assert_eq!(f.views.len(), 1);
    }

    #[test]
    fn test_playlist_end_reports_locator() {
        let mut f = fixture();
        let mut state = state(&["a.mp3", "b.mp3"]);
        state.set_playlist(true);
        state.toggle_all();
        f.settled_frame(&state);

        let a = f.registry.acquire_blocking("a.mp3").unwrap();
        assert!(a.has_ended_callback());

        f.render(512);
        assert_eq!(f.registry.pump(), 2);
        let ended: Vec<String> = f.ended_rx.try_iter().collect();
        assert!(ended.contains(&"a.mp3".to_string()));
        assert!(ended.contains(&"b.mp3".to_string()));
    }

    #[test]
    fn test_failed_decode_draws_nothing() {
        let mut f = fixture();
        let mut state = state(&["bad.mp3"]);
        state.toggle_all();
        f.settled_frame(&state);

        let mut list = DrawList::default();
        f.views.draw(&mut list);
        assert!(list.batches.is_empty());
        assert!(list.lines.is_empty());
        assert!(!f.views.is_live(0));
    }

    #[test]
    fn test_draw_emits_bars_and_lines() {
        let mut f = fixture();
        let mut state = state(&["a.mp3", "b.mp3"]);
        state.toggle_all();
        f.settled_frame(&state);
        f.render(128);
        f.views.frame(&mut f.registry, &state, &mut f.cache);

        let mut list = DrawList::default();
        f.views.draw(&mut list);
        assert_eq!(list.batches.len(), 1);
        assert_eq!(list.batches[0].instances.len(), 32);
        assert_eq!(list.lines.len(), 2); // Ribbon + shadow
    }

    #[test]
    fn test_shifted_track_does_not_inherit_removed_slot() {
        let mut f = fixture();
        let uploads = crate::audio::UploadStore::new();
        let mut state = state(&["a.mp3", "b.mp3"]);
        state.toggle_all();
        f.settled_frame(&state);
        f.render(128);
        f.views.frame(&mut f.registry, &state, &mut f.cache);
        assert!(f.cache.get(0).unwrap().average > 0.0);

        // Zoom on b, pause it, then remove a: b moves to index 0
        state.select_zoom(Some(1));
        state.toggle_track(1);
        state.remove_track(0, &uploads);
        assert_eq!(state.selected_zoom(), Some(0));

        f.views.reconcile(&state, &mut f.cache);
        f.views.frame(&mut f.registry, &state, &mut f.cache);
        assert!(f.cache.get(0).is_none());

        let rig = CameraRig::default();
        let mut fov = rig.fov_degrees;
        assert!(!ZoomReactor::new(&rig).apply(state.selected_zoom(), &f.cache, &mut fov));
        assert_eq!(fov, rig.fov_degrees);
    }

    #[test]
    fn test_kept_view_keeps_its_slot() {
        let mut f = fixture();
        let uploads = crate::audio::UploadStore::new();
        let mut state = state(&["a.mp3", "b.mp3"]);
        state.toggle_all();
        f.settled_frame(&state);
        f.render(128);
        f.views.frame(&mut f.registry, &state, &mut f.cache);

        // Removing the last track leaves index 0 mounted as it was
        state.remove_track(1, &uploads);
        f.views.reconcile(&state, &mut f.cache);
        assert!(f.cache.get(0).is_some());
    }

    #[test]
    fn test_loading_label_counts_pending_decodes() {
        let (gate_tx, gate_rx) = mpsc::channel();
        let mut f = fixture_with(Arc::new(Gated {
            gate: Mutex::new(gate_rx),
        }));
        let mut state = state(&["a.mp3", "slow.mp3"]);
        state.toggle_all();

        f.registry.acquire_blocking("a.mp3").unwrap();
        f.views.reconcile(&state, &mut f.cache);
        assert_eq!(f.views.loading_label(), None); // Nothing polled yet

        f.views.frame(&mut f.registry, &state, &mut f.cache);
        assert_eq!(f.views.pending(), 1);
        assert_eq!(f.views.loading_label().as_deref(), Some("loading 1/2"));
        assert!(f.views.is_live(0));

        gate_tx.send(()).unwrap();
        f.registry.acquire_blocking("slow.mp3").unwrap();
        f.views.frame(&mut f.registry, &state, &mut f.cache);
        assert_eq!(f.views.pending(), 0);
        assert_eq!(f.views.loading_label(), None);
        assert!(f.views.is_live(1));
    }
}
