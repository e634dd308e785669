//! Control panel state: track list, per-track play flags, volume and pickers.

use crate::audio::UploadStore;
use crate::controls::PanelCommand;
use crate::params::PlaybackParams;
use crate::scene::Skin;
use crate::visual::VisualStyle;

use super::track::{FileCandidate, Track};

/// Everything the panel shows and the scene consumes as props
#[derive(Debug, Clone)]
pub struct PlayerState {
    tracks: Vec<Track>,
    /// Per-track flag; `None` until the user (or play-all) decides
    playing: Vec<Option<bool>>,
    all_playing: Option<bool>,
    selected_zoom: Option<usize>,
    current: usize,
    playlist: bool,
    volume: f32,
    restore_volume: Option<f32>,
    default_volume: f32,
    volume_step: f32,
    pub style: VisualStyle,
    pub skin: Skin,
    panel_visible: bool,
}

impl PlayerState {
    pub fn new(tracks: Vec<Track>, params: &PlaybackParams) -> Self {
        let default_volume = params.default_volume.clamp(0.0, 1.0);
        Self {
            playing: vec![None; tracks.len()],
            tracks,
            all_playing: None,
            selected_zoom: None,
            current: 0,
            playlist: params.playlist,
            volume: default_volume,
            restore_volume: None,
            default_volume,
            volume_step: params.volume_step,
            style: VisualStyle::default(),
            skin: Skin::default(),
            panel_visible: false,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Effective play flag; undecided counts as paused
    pub fn is_playing(&self, index: usize) -> bool {
        self.playing.get(index).copied().flatten().unwrap_or(false)
    }

    pub fn playing_flag(&self, index: usize) -> Option<bool> {
        self.playing.get(index).copied().flatten()
    }

    pub fn all_playing(&self) -> Option<bool> {
        self.all_playing
    }

    pub fn selected_zoom(&self) -> Option<usize> {
        self.selected_zoom
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn playlist(&self) -> bool {
        self.playlist
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    /// Label of the play-all button for the current aggregate state
    pub fn play_all_label(&self) -> &'static str {
        if self.all_playing == Some(true) {
            "Pause All"
        } else {
            "Play All"
        }
    }

    /// Label of one track's play button
    pub fn track_label(&self, index: usize) -> &'static str {
        if self.is_playing(index) {
            "Pause"
        } else {
            "Play"
        }
    }

    /// Append accepted files in order, skipping the rest. Returns how many
    /// tracks were added.
    pub fn add_files<I>(&mut self, candidates: I, uploads: &UploadStore) -> usize
    where
        I: IntoIterator<Item = FileCandidate>,
    {
        let before = self.tracks.len();
        for candidate in candidates.into_iter().filter(FileCandidate::is_accepted) {
            log::info!("Added track {}", candidate.name);
            self.tracks.push(Track::upload(&candidate, uploads));
            self.playing.push(None);
        }
        self.tracks.len() - before
    }

    /// Remove the track at `index`, revoking its upload locator.
    pub fn remove_track(&mut self, index: usize, uploads: &UploadStore) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }
        let track = self.tracks.remove(index);
        self.playing.remove(index);

        if track.is_upload {
            uploads.revoke(&track.locator);
        }

        self.selected_zoom = match self.selected_zoom {
            Some(z) if z == index => None,
            Some(z) if z > index => Some(z - 1),
            other => other,
        };
        if self.current > index {
            self.current -= 1;
        }
        self.current = self.current.min(self.tracks.len().saturating_sub(1));

        log::info!("Removed track {}", track.name);
        Some(track)
    }

    /// Flip the aggregate state and set every track to it in one step
    pub fn toggle_all(&mut self) {
        let next = !self.all_playing.unwrap_or(false);
        self.all_playing = Some(next);
        self.playing.iter_mut().for_each(|flag| *flag = Some(next));
    }

    pub fn toggle_track(&mut self, index: usize) {
        if let Some(flag) = self.playing.get_mut(index) {
            *flag = Some(!flag.unwrap_or(false));
        }
    }

    /// Set the master volume. Dropping to 0 remembers the previous level
    /// for the next unmute.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        if volume <= 0.0 {
            self.restore_volume = (self.volume > 0.0).then_some(self.volume);
        }
        self.volume = volume;
    }

    /// Mute, or restore the level held before muting (the default if that
    /// level was itself 0)
    pub fn toggle_mute(&mut self) {
        if self.volume > 0.0 {
            self.set_volume(0.0);
        } else {
            self.volume = self
                .restore_volume
                .take()
                .filter(|v| *v > 0.0)
                .unwrap_or(self.default_volume);
        }
    }

    pub fn volume_up(&mut self) {
        self.set_volume(round_step(self.volume + self.volume_step));
    }

    pub fn volume_down(&mut self) {
        self.set_volume(round_step(self.volume - self.volume_step));
    }

    pub fn next(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.make_current((self.current + 1) % self.tracks.len());
    }

    pub fn previous(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        let len = self.tracks.len();
        self.make_current((self.current + len - 1) % len);
    }

    fn make_current(&mut self, index: usize) {
        self.current = index;
        if self.playlist {
            self.play_only(index);
        }
    }

    /// Make `index` the sole playing track
    fn play_only(&mut self, index: usize) {
        for (i, flag) in self.playing.iter_mut().enumerate() {
            *flag = Some(i == index);
        }
    }

    /// Track `index` reached its end. In playlist mode the next index
    /// (wrapping) becomes current and the only playing track.
    pub fn on_track_ended(&mut self, index: usize) -> bool {
        if !self.playlist || self.tracks.is_empty() {
            return false;
        }
        let next = (index + 1) % self.tracks.len();
        self.current = next;
        self.play_only(next);
        log::info!("Playlist: now playing {}", self.tracks[next].name);
        true
    }

    /// Resolve the end events collected in one frame. At most one advance
    /// happens: from the current track when it is among them, otherwise
    /// from the lowest ended index. Returns the new current index.
    pub fn on_tracks_ended(&mut self, locators: &[String]) -> Option<usize> {
        let ended: Vec<usize> = locators
            .iter()
            .filter_map(|locator| self.index_for_ended(locator))
            .collect();
        let from = if ended.contains(&self.current) {
            self.current
        } else {
            ended.iter().copied().min()?
        };
        self.on_track_ended(from).then_some(self.current)
    }

    /// Index an end event for `locator` refers to (the current track when
    /// the same file is listed more than once)
    pub fn index_for_ended(&self, locator: &str) -> Option<usize> {
        match self.tracks.get(self.current) {
            Some(track) if track.locator == locator => Some(self.current),
            _ => self.tracks.iter().position(|t| t.locator == locator),
        }
    }

    pub fn set_playlist(&mut self, playlist: bool) {
        self.playlist = playlist;
        if playlist && self.is_playing(self.current) {
            self.play_only(self.current);
        }
    }

    pub fn select_zoom(&mut self, index: Option<usize>) {
        self.selected_zoom = index.filter(|i| *i < self.tracks.len());
    }

    /// None -> first track -> ... -> last track -> None
    pub fn cycle_zoom(&mut self) {
        let next = match self.selected_zoom {
            None => 0,
            Some(i) => i + 1,
        };
        self.select_zoom(Some(next));
    }

    pub fn cycle_style(&mut self) {
        self.style = self.style.cycle();
    }

    pub fn cycle_skin(&mut self) {
        self.skin = self.skin.cycle();
    }

    /// Model click: toggle global playback and reveal the panel
    pub fn model_click(&mut self) {
        self.toggle_all();
        if !self.panel_visible {
            log::info!("Panel revealed");
        }
        self.panel_visible = true;
    }

    pub fn reveal_panel(&mut self) {
        self.panel_visible = true;
    }

    /// Apply a panel command; returns the removed track if one was removed
    pub fn apply(&mut self, command: PanelCommand, uploads: &UploadStore) -> Option<Track> {
        match command {
            PanelCommand::TogglePlayAll => self.toggle_all(),
            PanelCommand::ToggleTrack(i) => self.toggle_track(i),
            PanelCommand::RemoveTrack(i) => return self.remove_track(i, uploads),
            PanelCommand::RemoveCurrent => return self.remove_track(self.current, uploads),
            PanelCommand::SelectZoom(i) => self.select_zoom(i),
            PanelCommand::CycleZoom => self.cycle_zoom(),
            PanelCommand::SetVolume(v) => self.set_volume(v),
            PanelCommand::VolumeUp => self.volume_up(),
            PanelCommand::VolumeDown => self.volume_down(),
            PanelCommand::ToggleMute => self.toggle_mute(),
            PanelCommand::Next => self.next(),
            PanelCommand::Previous => self.previous(),
            PanelCommand::TogglePlaylist => self.set_playlist(!self.playlist),
            PanelCommand::CycleStyle => self.cycle_style(),
            PanelCommand::CycleSkin => self.cycle_skin(),
        }
        None
    }

    /// Compact panel summary for the window title
    pub fn status_line(&self) -> String {
        let playing = (0..self.tracks.len()).filter(|&i| self.is_playing(i)).count();
        let zoom = self
            .selected_zoom
            .and_then(|i| self.tracks.get(i))
            .map(|t| t.name.as_str())
            .unwrap_or("off");
        let current = self
            .tracks
            .get(self.current)
            .map(|t| t.name.as_str())
            .unwrap_or("-");
        format!(
            "{} | {}/{} playing | current {} | vol {:.0}% | zoom {} | {} | {}{}",
            self.play_all_label(),
            playing,
            self.tracks.len(),
            current,
            self.volume * 100.0,
            zoom,
            self.style.name(),
            self.skin.name(),
            if self.playlist { " | playlist" } else { "" }
        )
    }
}

fn round_step(volume: f32) -> f32 {
    (volume * 100.0).round() / 100.0
}
