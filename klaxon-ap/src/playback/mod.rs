//! Alarm playback: controller, volume ramp, source resolution and media session

pub mod controller;
pub mod events;
pub mod resolver;
pub mod session;
pub mod source;
pub mod state;
pub mod volume;

pub use controller::{spawn, Collaborators, ControllerHandle, ControllerOptions, PlaybackController};
pub use events::{ControllerEvent, EngineEvent, EngineEventSink, FadeTick, SessionId};
pub use resolver::{AudioSourceResolver, SourceOrigin, SourceRequest};
pub use session::{MediaEngine, MediaEngineFactory, MediaSession};
pub use source::{AudioSource, ToneSpec};
pub use state::{PlaybackState, PlayerStatus};
pub use volume::{VolumeRamp, VolumeState};
