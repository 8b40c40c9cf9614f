//! # Nightwatch Core Library
//!
//! This library provides the gameplay sequencing for Nightwatch, a short
//! first-person horror night: doors that knock and slam, a jump-scare behind
//! the front door, a clock that runs from midnight to six, and a handful of
//! objective items to find before dawn. The engine side (rendering, physics,
//! audio playback) stays outside; the core talks to it through small sink
//! traits and is driven by one `step()` per frame.
//!
//! ## Architecture
//!
//! - **Entities**: two-state doors and cabinets with optional key locks
//! - **Timers**: cancellable delays and a fixed-interval sequencer, polled per tick
//! - **Scheduler**: randomized knocks and slams plus the jump-scare director
//! - **Session**: owns everything, dispatches events and settles win/lose
//! - **Storage**: TOML configuration and scene layouts
//!
//! ## Key Components
//!
//! - [`GameSession`]: The single-threaded game loop
//! - [`DoorEventDirector`]: Knocks, slams and the jump-scare sequence
//! - [`NightClock`]: In-game hours
//! - [`Config`]: Tuning values and persistence

pub mod entity;
pub mod error;
pub mod events;
pub mod inventory;
pub mod objective;
pub mod scheduler;
pub mod services;
pub mod session;
pub mod storage;
pub mod timer;
pub mod ui;

pub use entity::{EntityId, EntityKind, EntityRegistry, ToggleEntity, ToggleState};
pub use error::{ConfigError, CoreError, SceneError, ValidationError};
pub use events::Event;
pub use inventory::{Inventory, ItemId, KeyRing};
pub use objective::ObjectiveSet;
pub use scheduler::{DoorEventDirector, IntervalRange, RandomScheduler};
pub use services::{ClipId, Position, Services};
pub use session::{GameSession, GameState, Outcome, SessionReport, WinPolicy};
pub use storage::{Config, SceneLayout};
pub use timer::{CancellableTimer, NightClock};
