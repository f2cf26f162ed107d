//! Audio source resolution
//!
//! Turns "what the alert asked for" into a concrete [`AudioSource`]. First
//! matching rule wins:
//!
//! 1. call active: reserved in-call asset
//! 2. themed mode: the reserved intro asset when the intro is requested
//!    (alternating track), otherwise a uniformly random themed variant
//! 3. the alert's own source, or the default alert when it has none
//!
//! When the chosen source fails to initialize the controller asks for
//! [`AudioSourceResolver::fallback`], the built-in last resort.

use crate::assets::{AssetCatalog, ReservedAsset};
use crate::playback::source::AudioSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a session wants to play
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRequest {
    /// Alert's configured sound (`None` = default alert)
    pub alert_uri: Option<String>,

    /// Play the intro variant instead of the alert
    pub play_intro: bool,
}

impl SourceRequest {
    pub fn for_alert(alert_uri: Option<String>) -> Self {
        Self {
            alert_uri,
            play_intro: false,
        }
    }

    /// Same request with the intro flag flipped
    pub fn toggled(&self) -> Self {
        Self {
            alert_uri: self.alert_uri.clone(),
            play_intro: !self.play_intro,
        }
    }
}

/// Which rule produced a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    InCall,
    Intro,
    Themed(usize),
    Alert,
    DefaultAlert,
    Fallback,
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOrigin::InCall => write!(f, "in-call"),
            SourceOrigin::Intro => write!(f, "intro"),
            SourceOrigin::Themed(index) => write!(f, "themed #{}", index),
            SourceOrigin::Alert => write!(f, "alert"),
            SourceOrigin::DefaultAlert => write!(f, "default alert"),
            SourceOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// A resolved source and the rule that chose it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub source: AudioSource,
    pub origin: SourceOrigin,
}

pub struct AudioSourceResolver {
    assets: Arc<dyn AssetCatalog>,
    themed_mode: bool,
    rng: StdRng,
}

impl AudioSourceResolver {
    pub fn new(assets: Arc<dyn AssetCatalog>, themed_mode: bool) -> Self {
        Self {
            assets,
            themed_mode,
            rng: StdRng::from_entropy(),
        }
    }

    /// Resolver with a deterministic themed pick
    pub fn with_seed(assets: Arc<dyn AssetCatalog>, themed_mode: bool, seed: u64) -> Self {
        Self {
            assets,
            themed_mode,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn themed_mode(&self) -> bool {
        self.themed_mode
    }

    pub fn resolve(&mut self, request: &SourceRequest, in_call: bool) -> ResolvedSource {
        let resolved = self.pick(request, in_call);
        debug!("Resolved {} source: {}", resolved.origin, resolved.source);
        resolved
    }

    fn pick(&mut self, request: &SourceRequest, in_call: bool) -> ResolvedSource {
        if in_call {
            return self.reserved(ReservedAsset::InCall, SourceOrigin::InCall);
        }

        if self.themed_mode {
            if request.play_intro {
                return self.reserved(ReservedAsset::Intro, SourceOrigin::Intro);
            }

            let variants = self.assets.themed_variants();
            if variants.is_empty() {
                warn!("Themed mode enabled but no themed variants registered");
            } else {
                let index = self.rng.gen_range(0..variants.len());
                return ResolvedSource {
                    source: variants[index].source.clone(),
                    origin: SourceOrigin::Themed(index),
                };
            }
        }

        match &request.alert_uri {
            Some(uri) => ResolvedSource {
                source: AudioSource::from_uri(uri),
                origin: SourceOrigin::Alert,
            },
            None => self.reserved(ReservedAsset::DefaultAlert, SourceOrigin::DefaultAlert),
        }
    }

    /// Built-in last resort
    pub fn fallback(&self) -> ResolvedSource {
        self.reserved(ReservedAsset::Fallback, SourceOrigin::Fallback)
    }

    fn reserved(&self, asset: ReservedAsset, origin: SourceOrigin) -> ResolvedSource {
        ResolvedSource {
            source: self.assets.reserved(asset),
            origin,
        }
    }
}
