//! Keyboard bindings for the control panel and debug post-fx tweaks.

use winit::keyboard::{KeyCode, ModifiersState};

use crate::params::PostFx;

/// Panel actions, from keys, window events or model clicks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelCommand {
    TogglePlayAll,
    ToggleTrack(usize),
    RemoveTrack(usize),
    RemoveCurrent,
    SelectZoom(Option<usize>),
    CycleZoom,
    SetVolume(f32),
    VolumeUp,
    VolumeDown,
    ToggleMute,
    Next,
    Previous,
    TogglePlaylist,
    CycleStyle,
    CycleSkin,
}

/// Post-processing tweaks, only bound with `--debug`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugCommand {
    FocusRange(f32),
    BokehScale(f32),
    BloomIntensity(f32),
    BloomThreshold(f32),
    Dump,
}

impl DebugCommand {
    /// Apply the tweak and log the resulting values
    pub fn apply(self, fx: &mut PostFx) {
        match self {
            DebugCommand::FocusRange(delta) => fx.focus_range += delta,
            DebugCommand::BokehScale(delta) => fx.bokeh_scale += delta,
            DebugCommand::BloomIntensity(delta) => fx.bloom_intensity += delta,
            DebugCommand::BloomThreshold(delta) => fx.bloom_threshold += delta,
            DebugCommand::Dump => {}
        }
        fx.clamp();
        log::info!(
            "post-fx: focus_range={:.2} bokeh_scale={:.1} bloom_intensity={:.2} bloom_threshold={:.2}",
            fx.focus_range,
            fx.bokeh_scale,
            fx.bloom_intensity,
            fx.bloom_threshold
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Panel(PanelCommand),
    Debug(DebugCommand),
    Quit,
}

/// Map a pressed key to its action. Digits act on a track: plain toggles
/// it, Shift removes it, Ctrl zooms on it.
pub fn action_for_key(code: KeyCode, modifiers: ModifiersState, debug: bool) -> Option<Action> {
    let panel = |cmd| Some(Action::Panel(cmd));
    match code {
        KeyCode::Escape => Some(Action::Quit),
        KeyCode::Space => panel(PanelCommand::TogglePlayAll),
        KeyCode::Tab => panel(PanelCommand::CycleZoom),
        KeyCode::Delete | KeyCode::Backspace => panel(PanelCommand::RemoveCurrent),
        KeyCode::ArrowUp => panel(PanelCommand::VolumeUp),
        KeyCode::ArrowDown => panel(PanelCommand::VolumeDown),
        KeyCode::KeyM => panel(PanelCommand::ToggleMute),
        KeyCode::KeyN | KeyCode::ArrowRight => panel(PanelCommand::Next),
        KeyCode::KeyP | KeyCode::ArrowLeft => panel(PanelCommand::Previous),
        KeyCode::KeyL => panel(PanelCommand::TogglePlaylist),
        KeyCode::KeyV => panel(PanelCommand::CycleStyle),
        KeyCode::KeyS => panel(PanelCommand::CycleSkin),
        KeyCode::Digit0 => panel(PanelCommand::SelectZoom(None)),
        KeyCode::Home => panel(PanelCommand::SetVolume(1.0)),
        KeyCode::End => panel(PanelCommand::SetVolume(0.0)),
        _ => digit(code)
            .map(|n| Action::Panel(track_command(n - 1, modifiers)))
            .or_else(|| if debug { debug_action(code) } else { None }),
    }
}

fn track_command(index: usize, modifiers: ModifiersState) -> PanelCommand {
    if modifiers.shift_key() {
        PanelCommand::RemoveTrack(index)
    } else if modifiers.control_key() {
        PanelCommand::SelectZoom(Some(index))
    } else {
        PanelCommand::ToggleTrack(index)
    }
}

fn digit(code: KeyCode) -> Option<usize> {
    let n = match code {
        KeyCode::Digit1 => 1,
        KeyCode::Digit2 => 2,
        KeyCode::Digit3 => 3,
        KeyCode::Digit4 => 4,
        KeyCode::Digit5 => 5,
        KeyCode::Digit6 => 6,
        KeyCode::Digit7 => 7,
        KeyCode::Digit8 => 8,
        KeyCode::Digit9 => 9,
        _ => return None,
    };
    Some(n)
}

fn debug_action(code: KeyCode) -> Option<Action> {
    let cmd = match code {
        KeyCode::BracketLeft => DebugCommand::FocusRange(-0.05),
        KeyCode::BracketRight => DebugCommand::FocusRange(0.05),
        KeyCode::Minus => DebugCommand::BokehScale(-1.0),
        KeyCode::Equal => DebugCommand::BokehScale(1.0),
        KeyCode::Comma => DebugCommand::BloomIntensity(-0.1),
        KeyCode::Period => DebugCommand::BloomIntensity(0.1),
        KeyCode::Semicolon => DebugCommand::BloomThreshold(-0.05),
        KeyCode::Quote => DebugCommand::BloomThreshold(0.05),
        KeyCode::F1 => DebugCommand::Dump,
        _ => return None,
    };
    Some(Action::Debug(cmd))
}

/// One-line help printed at startup
pub fn help_text(debug: bool) -> String {
    let mut text = String::from(
        "Space play/pause all | 1-9 toggle track | Shift+1-9 remove | Ctrl+1-9 zoom | 0 zoom off | \
         Tab next zoom | Up/Down volume | Home/End full/silent | M mute | N/P next/previous | \
         L playlist | V style | S skin | Del remove current | Esc quit",
    );
    if debug {
        text.push_str(" | [ ] focus | - = bokeh | , . bloom | ; ' threshold | F1 dump");
    }
    text
}
