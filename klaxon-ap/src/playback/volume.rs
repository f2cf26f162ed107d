//! Volume ramp
//!
//! Owns everything that decides the session gain: the level table lookup for
//! the current mode, the quadratic fade-in curve, the in-call override and
//! mute. The fade timer is a spawned task that only posts [`FadeTick`]s into
//! the controller queue; the ramp applies them when they come back through
//! [`VolumeRamp::on_tick`].
//!
//! **Fade curve:** 100 steps across the fade duration, gain at step `i` is
//! `target * i^2 / 100^2`. Ticks are emitted for `i = 0..=100`, so the final
//! tick lands exactly on the target.

use crate::playback::events::{ControllerEvent, EventSender, FadeTick};
use crate::playback::session::MediaSession;
use klaxon_common::{AlarmSettings, AlertKind};
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Steps per fade-in
pub const FADE_IN_STEPS: u32 = 100;

/// Fade-in used on demute
pub const FAST_FADE_IN: Duration = Duration::from_millis(5000);

/// Fixed gain while a call is active
pub const IN_CALL_GAIN: f32 = 0.125;

/// Quadratic ramp from 0 to `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeCurve {
    target: f32,
    total_steps: u32,
    multiplier: f64,
}

impl FadeCurve {
    pub fn new(target: f32, total_steps: u32) -> Self {
        let total_steps = total_steps.max(1);
        Self {
            target,
            total_steps,
            multiplier: Self::multiplier_for(target, total_steps),
        }
    }

    fn multiplier_for(target: f32, total_steps: u32) -> f64 {
        target as f64 / (total_steps as f64 * total_steps as f64)
    }

    /// Gain at `step`; exactly `target` from the final step on
    pub fn gain_at(&self, step: u32) -> f32 {
        if step >= self.total_steps {
            return self.target;
        }
        let s = step as f64;
        (self.multiplier * s * s) as f32
    }

    /// Keep the step count, aim for a new target
    pub fn retarget(&mut self, target: f32) {
        self.target = target;
        self.multiplier = Self::multiplier_for(target, self.total_steps);
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }
}

/// A running fade and its timer task
#[derive(Debug)]
struct ActiveFade {
    id: u64,
    curve: FadeCurve,
    step: u32,
    timer: JoinHandle<()>,
}

/// Snapshot of the ramp for status reporting
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VolumeState {
    pub mode: AlertKind,
    pub level_index: u8,
    pub call_override_active: bool,
    pub muted: bool,
    /// Ticks left in the running fade, `None` when no fade is pending
    pub fade_deadline_ticks: Option<u32>,
    pub target_gain: f32,
}

pub struct VolumeRamp {
    settings: AlarmSettings,
    mode: AlertKind,
    call_override_active: bool,
    muted: bool,
    fade: Option<ActiveFade>,
    next_fade_id: u64,
    events: EventSender,
}

impl VolumeRamp {
    pub fn new(settings: AlarmSettings, events: EventSender) -> Self {
        Self {
            settings,
            mode: AlertKind::Normal,
            call_override_active: false,
            muted: false,
            fade: None,
            next_fade_id: 0,
            events,
        }
    }

    pub fn mode(&self) -> AlertKind {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AlertKind) {
        self.mode = mode;
    }

    pub fn settings(&self) -> &AlarmSettings {
        &self.settings
    }

    /// Gain of the configured level for the current mode
    fn level_gain(&self) -> f32 {
        self.settings.level_for(self.mode).gain()
    }

    /// Instantaneous target: in-call gain, or the configured level
    pub fn target_gain(&self) -> f32 {
        if self.call_override_active {
            IN_CALL_GAIN
        } else {
            self.level_gain()
        }
    }

    /// Gain the session should currently have
    ///
    /// While a fade runs the in-call override caps the curve instead of
    /// replacing it, so leaving the call resumes the curve where it is.
    pub fn effective_gain(&self) -> f32 {
        if self.muted {
            return 0.0;
        }
        match &self.fade {
            Some(fade) => {
                let gain = fade.curve.gain_at(fade.step);
                if self.call_override_active {
                    gain.min(IN_CALL_GAIN)
                } else {
                    gain
                }
            }
            None => self.target_gain(),
        }
    }

    /// Set the session to the instantaneous target gain
    pub fn apply(&mut self, session: &mut MediaSession) {
        self.muted = false;
        let gain = self.target_gain();
        debug!("Applying gain {:.3} ({} mode)", gain, self.mode);
        session.set_volume(gain);
    }

    /// Set the session to the current effective gain (fade position, mute, call)
    pub fn refresh(&self, session: &mut MediaSession) {
        session.set_volume(self.effective_gain());
    }

    pub fn fade_in_as_set_in_settings(&mut self, session: &mut MediaSession) {
        let duration = self.settings.fade_in_duration();
        self.fade_in(duration, session);
    }

    pub fn fade_in_fast(&mut self, session: &mut MediaSession) {
        self.fade_in(FAST_FADE_IN, session);
    }

    /// Restart the fade from gain 0 toward the level target
    pub fn fade_in(&mut self, duration: Duration, session: &mut MediaSession) {
        self.cancel_fade_in();
        self.muted = false;

        let step = duration / FADE_IN_STEPS;
        if step.is_zero() {
            debug!("Zero-length fade, applying target directly");
            self.apply(session);
            return;
        }

        session.set_volume(0.0);

        self.next_fade_id += 1;
        let id = self.next_fade_id;
        let curve = FadeCurve::new(self.level_gain(), FADE_IN_STEPS);
        let timer = spawn_fade_timer(id, step, curve.total_steps(), self.events.clone());

        info!(
            "Fade-in {} started: {:.1}s toward {:.3}",
            id,
            duration.as_secs_f32(),
            curve.target()
        );

        self.fade = Some(ActiveFade {
            id,
            curve,
            step: 0,
            timer,
        });
    }

    /// Stop the running fade, if any; safe to call repeatedly
    pub fn cancel_fade_in(&mut self) {
        if let Some(fade) = self.fade.take() {
            fade.timer.abort();
            debug!("Fade-in {} cancelled at step {}", fade.id, fade.step);
        }
    }

    /// Cancel any fade and silence the session
    pub fn mute(&mut self, session: &mut MediaSession) {
        self.cancel_fade_in();
        self.muted = true;
        session.set_volume(0.0);
    }

    /// Clear mute without touching the session (nothing is playing)
    pub fn clear_mute(&mut self) {
        self.muted = false;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Apply a fade tick; returns false for ticks of a cancelled fade
    pub fn on_tick(&mut self, tick: FadeTick, session: &mut MediaSession) -> bool {
        let finished = match &mut self.fade {
            Some(fade) if fade.id == tick.fade_id => {
                fade.step = tick.step;
                tick.step >= fade.curve.total_steps()
            }
            _ => return false,
        };

        // Last tick hands over to the instantaneous target (in-call gain during a call)
        if finished {
            if let Some(fade) = self.fade.take() {
                debug!("Fade-in {} complete at {:.3}", fade.id, fade.curve.target());
            }
        }

        session.set_volume(self.effective_gain());
        true
    }

    /// Telephony changed; re-evaluate immediately when a session is live
    pub fn set_call_override(&mut self, active: bool, session: &mut MediaSession) {
        if self.call_override_active == active {
            return;
        }
        self.call_override_active = active;
        info!("In-call override {}", if active { "engaged" } else { "released" });

        if session.is_live() {
            session.set_volume(self.effective_gain());
        }
    }

    /// New settings: retarget a running fade, otherwise apply the new target
    pub fn update_settings(&mut self, settings: AlarmSettings, session: &mut MediaSession) {
        self.settings = settings;
        let level_gain = self.level_gain();

        if let Some(fade) = &mut self.fade {
            fade.curve.retarget(level_gain);
            debug!("Fade-in {} retargeted to {:.3}", fade.id, level_gain);
        } else if !self.muted && session.is_live() {
            session.set_volume(self.target_gain());
        }
    }

    /// Reset per-session fields before a session starts
    pub fn reset_transients(&mut self, call_active: bool) {
        self.cancel_fade_in();
        self.muted = false;
        self.call_override_active = call_active;
    }

    pub fn has_pending_fade(&self) -> bool {
        self.fade.is_some()
    }

    pub fn state(&self) -> VolumeState {
        VolumeState {
            mode: self.mode,
            level_index: self.settings.level_for(self.mode).index(),
            call_override_active: self.call_override_active,
            muted: self.muted,
            fade_deadline_ticks: self
                .fade
                .as_ref()
                .map(|f| f.curve.total_steps().saturating_sub(f.step)),
            target_gain: self.target_gain(),
        }
    }
}

impl Drop for VolumeRamp {
    fn drop(&mut self) {
        self.cancel_fade_in();
    }
}

/// Post ticks `0..=total_steps`, one per `period`
fn spawn_fade_timer(
    fade_id: u64,
    period: Duration,
    total_steps: u32,
    events: EventSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        for step in 0..=total_steps {
            interval.tick().await;
            if events
                .send(ControllerEvent::FadeTick(FadeTick { fade_id, step }))
                .is_err()
            {
                break;
            }
        }
    })
}
