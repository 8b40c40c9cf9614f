//! External collaborators: audio, animation, input and UI sinks.
//!
//! The core never owns an engine. Everything it wants to happen on screen or
//! through the speakers goes through one of these traits, injected into a
//! [`Services`] value. Every slot is optional and a missing collaborator is
//! skipped silently: the worst observable effect is a missing sound or prompt.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity::EntityId;

/// Identifier of an audio clip known to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// World-space position used for positional audio.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

pub trait AudioSink {
    /// Play a clip at a world position (3D).
    fn play_positional(&mut self, clip: &ClipId, position: Position, volume: f32);
    /// Play a clip without spatialization (2D).
    fn play_ambient(&mut self, clip: &ClipId, volume: f32);
}

pub trait AnimationSink {
    fn set_bool_parameter(&mut self, entity: EntityId, name: &str, value: bool);
}

pub trait InputGate {
    fn disable_inputs(&mut self);
    fn enable_inputs(&mut self);
}

/// On-screen text. Purely a projection of core state.
pub trait UiSink {
    fn set_prompt_text(&mut self, text: &str);
    fn set_clock_text(&mut self, text: &str);
    fn set_objective_text(&mut self, text: &str);
    fn set_outcome_text(&mut self, text: &str);
}

/// Master and SFX levels, each 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMix {
    pub master: u8,
    pub sfx: u8,
}

impl VolumeMix {
    pub const MAX_LEVEL: u8 = 10;

    pub fn scale(&self, volume: f32) -> f32 {
        let max = f32::from(Self::MAX_LEVEL);
        (volume * (f32::from(self.master) / max) * (f32::from(self.sfx) / max)).clamp(0.0, 1.0)
    }
}

impl Default for VolumeMix {
    fn default() -> Self {
        Self {
            master: Self::MAX_LEVEL,
            sfx: Self::MAX_LEVEL,
        }
    }
}

/// Injected collaborators. Construct with [`Services::headless`] and attach
/// the sinks the host actually has.
#[derive(Default)]
pub struct Services {
    audio: Option<Box<dyn AudioSink>>,
    animation: Option<Box<dyn AnimationSink>>,
    input: Option<Box<dyn InputGate>>,
    ui: Option<Box<dyn UiSink>>,
    mix: VolumeMix,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("audio", &self.audio.is_some())
            .field("animation", &self.animation.is_some())
            .field("input", &self.input.is_some())
            .field("ui", &self.ui.is_some())
            .field("mix", &self.mix)
            .finish()
    }
}

impl Services {
    /// No collaborators at all. Every effect becomes a no-op.
    pub fn headless() -> Self {
        Self::default()
    }

    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    pub fn with_animation(mut self, animation: impl AnimationSink + 'static) -> Self {
        self.animation = Some(Box::new(animation));
        self
    }

    pub fn with_input(mut self, input: impl InputGate + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    pub fn with_ui(mut self, ui: impl UiSink + 'static) -> Self {
        self.ui = Some(Box::new(ui));
        self
    }

    pub fn set_mix(&mut self, mix: VolumeMix) {
        self.mix = mix;
    }

    // ── Effects ──────────────────────────────────────────────────────

    pub fn play_positional(&mut self, clip: Option<&ClipId>, position: Position) {
        let volume = self.mix.scale(1.0);
        match (self.audio.as_mut(), clip) {
            (Some(audio), Some(clip)) => audio.play_positional(clip, position, volume),
            _ => trace!(?clip, "positional audio skipped"),
        }
    }

    pub fn play_ambient(&mut self, clip: Option<&ClipId>) {
        let volume = self.mix.scale(1.0);
        match (self.audio.as_mut(), clip) {
            (Some(audio), Some(clip)) => audio.play_ambient(clip, volume),
            _ => trace!(?clip, "ambient audio skipped"),
        }
    }

    pub fn set_bool_parameter(&mut self, entity: EntityId, name: &str, value: bool) {
        if let Some(animation) = self.animation.as_mut() {
            animation.set_bool_parameter(entity, name, value);
        }
    }

    pub fn disable_inputs(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.disable_inputs();
        }
    }

    pub fn enable_inputs(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.enable_inputs();
        }
    }

    pub fn set_prompt_text(&mut self, text: &str) {
        if let Some(ui) = self.ui.as_mut() {
            ui.set_prompt_text(text);
        }
    }

    pub fn set_clock_text(&mut self, text: &str) {
        if let Some(ui) = self.ui.as_mut() {
            ui.set_clock_text(text);
        }
    }

    pub fn set_objective_text(&mut self, text: &str) {
        if let Some(ui) = self.ui.as_mut() {
            ui.set_objective_text(text);
        }
    }

    pub fn set_outcome_text(&mut self, text: &str) {
        if let Some(ui) = self.ui.as_mut() {
            ui.set_outcome_text(text);
        }
    }
}

/// A sink that records every call it receives. Shared by clones, so one
/// recorder can fill all four slots and be inspected afterwards.
pub mod recording {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde::Serialize;

    use super::{AnimationSink, AudioSink, ClipId, InputGate, Position, Services, UiSink};
    use crate::entity::EntityId;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(tag = "call", rename_all = "snake_case")]
    pub enum SinkCall {
        PlayPositional {
            clip: ClipId,
            position: Position,
            volume: f32,
        },
        PlayAmbient {
            clip: ClipId,
            volume: f32,
        },
        SetBool {
            entity: EntityId,
            name: String,
            value: bool,
        },
        DisableInputs,
        EnableInputs,
        Prompt(String),
        Clock(String),
        Objective(String),
        Outcome(String),
    }

    #[derive(Debug, Clone, Default)]
    pub struct Recorder {
        calls: Rc<RefCell<Vec<SinkCall>>>,
    }

    impl Recorder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Services with every slot wired to this recorder.
        pub fn services(&self) -> Services {
            Services::headless()
                .with_audio(self.clone())
                .with_animation(self.clone())
                .with_input(self.clone())
                .with_ui(self.clone())
        }

        pub fn calls(&self) -> Vec<SinkCall> {
            self.calls.borrow().clone()
        }

        pub fn count(&self, pred: impl Fn(&SinkCall) -> bool) -> usize {
            self.calls.borrow().iter().filter(|c| pred(c)).count()
        }

        fn push(&self, call: SinkCall) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl AudioSink for Recorder {
        fn play_positional(&mut self, clip: &ClipId, position: Position, volume: f32) {
            self.push(SinkCall::PlayPositional {
                clip: clip.clone(),
                position,
                volume,
            });
        }

        fn play_ambient(&mut self, clip: &ClipId, volume: f32) {
            self.push(SinkCall::PlayAmbient {
                clip: clip.clone(),
                volume,
            });
        }
    }

    impl AnimationSink for Recorder {
        fn set_bool_parameter(&mut self, entity: EntityId, name: &str, value: bool) {
            self.push(SinkCall::SetBool {
                entity,
                name: name.to_string(),
                value,
            });
        }
    }

    impl InputGate for Recorder {
        fn disable_inputs(&mut self) {
            self.push(SinkCall::DisableInputs);
        }

        fn enable_inputs(&mut self) {
            self.push(SinkCall::EnableInputs);
        }
    }

    impl UiSink for Recorder {
        fn set_prompt_text(&mut self, text: &str) {
            self.push(SinkCall::Prompt(text.to_string()));
        }

        fn set_clock_text(&mut self, text: &str) {
            self.push(SinkCall::Clock(text.to_string()));
        }

        fn set_objective_text(&mut self, text: &str) {
            self.push(SinkCall::Objective(text.to_string()));
        }

        fn set_outcome_text(&mut self, text: &str) {
            self.push(SinkCall::Outcome(text.to_string()));
        }
    }
}
