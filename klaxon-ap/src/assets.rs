//! Alarm sound assets
//!
//! The catalog is an explicit, ordered registry built once at startup: a list
//! of themed variants (selected by index) plus the reserved assets the player
//! falls back to. Reserved assets missing on disk are served as built-in tones.

use crate::error::{Error, Result};
use crate::playback::source::{AudioSource, ToneSpec};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Subdirectory holding themed variants
pub const THEMED_DIR: &str = "themed";

/// File extensions recognized as audio assets
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "aac"];

/// Assets the player addresses by logical name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedAsset {
    /// Last resort when every other source failed to initialize
    Fallback,
    /// Played instead of the alert while a call is active
    InCall,
    /// Fixed intro variant used by alternating-track alerts
    Intro,
    /// Platform default alert when an alert has no source configured
    DefaultAlert,
}

impl ReservedAsset {
    pub const ALL: [ReservedAsset; 4] = [
        ReservedAsset::Fallback,
        ReservedAsset::InCall,
        ReservedAsset::Intro,
        ReservedAsset::DefaultAlert,
    ];

    /// File stem looked up in the asset directory
    pub fn file_stem(self) -> &'static str {
        match self {
            ReservedAsset::Fallback => "fallback",
            ReservedAsset::InCall => "in_call",
            ReservedAsset::Intro => "intro",
            ReservedAsset::DefaultAlert => "default_alert",
        }
    }

    /// Tone served when no file exists
    pub fn builtin_tone(self) -> ToneSpec {
        match self {
            ReservedAsset::Fallback => ToneSpec::FALLBACK,
            ReservedAsset::InCall => ToneSpec::IN_CALL,
            ReservedAsset::Intro => ToneSpec::INTRO,
            ReservedAsset::DefaultAlert => ToneSpec::DEFAULT_ALERT,
        }
    }
}

/// A named themed variant
#[derive(Debug, Clone, PartialEq)]
pub struct AssetHandle {
    pub name: String,
    pub source: AudioSource,
}

/// Read-only view of available alarm sounds
pub trait AssetCatalog: Send + Sync {
    /// Themed variants in registry order
    fn themed_variants(&self) -> &[AssetHandle];

    fn reserved(&self, asset: ReservedAsset) -> AudioSource;
}

/// Catalog built from an asset directory
///
/// Layout:
/// ```text
/// <assets>/fallback.wav
/// <assets>/in_call.wav
/// <assets>/intro.wav
/// <assets>/default_alert.wav
/// <assets>/themed/*.{wav,mp3,...}   (sorted by file name)
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryAssetCatalog {
    themed: Vec<AssetHandle>,
    fallback: AudioSource,
    in_call: AudioSource,
    intro: AudioSource,
    default_alert: AudioSource,
}

impl DirectoryAssetCatalog {
    /// Catalog with no themed variants and built-in tones for every reserved asset
    pub fn builtin() -> Self {
        Self {
            themed: Vec::new(),
            fallback: AudioSource::Tone(ReservedAsset::Fallback.builtin_tone()),
            in_call: AudioSource::Tone(ReservedAsset::InCall.builtin_tone()),
            intro: AudioSource::Tone(ReservedAsset::Intro.builtin_tone()),
            default_alert: AudioSource::Tone(ReservedAsset::DefaultAlert.builtin_tone()),
        }
    }

    /// Scan an asset directory
    ///
    /// A missing directory yields the built-in catalog with a warning; an
    /// unreadable one is an error.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut catalog = Self::builtin();

        if !dir.is_dir() {
            warn!("Asset directory {} not found, using built-in tones", dir.display());
            return Ok(catalog);
        }

        for asset in ReservedAsset::ALL {
            if let Some(path) = find_by_stem(dir, asset.file_stem())? {
                debug!("Reserved asset {:?}: {}", asset, path.display());
                catalog = catalog.with_reserved(asset, AudioSource::File(path));
            }
        }

        let themed_dir = dir.join(THEMED_DIR);
        if themed_dir.is_dir() {
            let mut files = audio_files(&themed_dir)?;
            files.sort();
            for path in files {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                catalog.themed.push(AssetHandle {
                    name,
                    source: AudioSource::File(path),
                });
            }
        }

        info!(
            "Loaded asset catalog from {} ({} themed variants)",
            dir.display(),
            catalog.themed.len()
        );
        Ok(catalog)
    }

    /// Append a themed variant
    pub fn with_themed(mut self, name: impl Into<String>, source: AudioSource) -> Self {
        self.themed.push(AssetHandle {
            name: name.into(),
            source,
        });
        self
    }

    /// Override a reserved asset
    pub fn with_reserved(mut self, asset: ReservedAsset, source: AudioSource) -> Self {
        match asset {
            ReservedAsset::Fallback => self.fallback = source,
            ReservedAsset::InCall => self.in_call = source,
            ReservedAsset::Intro => self.intro = source,
            ReservedAsset::DefaultAlert => self.default_alert = source,
        }
        self
    }
}

impl AssetCatalog for DirectoryAssetCatalog {
    fn themed_variants(&self) -> &[AssetHandle] {
        &self.themed
    }

    fn reserved(&self, asset: ReservedAsset) -> AudioSource {
        match asset {
            ReservedAsset::Fallback => self.fallback.clone(),
            ReservedAsset::InCall => self.in_call.clone(),
            ReservedAsset::Intro => self.intro.clone(),
            ReservedAsset::DefaultAlert => self.default_alert.clone(),
        }
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::Config(format!("Cannot read asset directory {}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_audio_file(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

fn find_by_stem(dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
    let mut matches: Vec<PathBuf> = audio_files(dir)?
        .into_iter()
        .filter(|p| p.file_stem().and_then(|s| s.to_str()) == Some(stem))
        .collect();
    matches.sort();
    Ok(matches.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_catalog_uses_tones() {
        let catalog = DirectoryAssetCatalog::builtin();
        assert!(catalog.themed_variants().is_empty());
        assert_eq!(
            catalog.reserved(ReservedAsset::Fallback),
            AudioSource::Tone(ToneSpec::FALLBACK)
        );
        assert_eq!(
            catalog.reserved(ReservedAsset::InCall),
            AudioSource::Tone(ToneSpec::IN_CALL)
        );
    }

    #[test]
    fn test_scan_missing_dir_is_builtin() {
        let catalog = DirectoryAssetCatalog::scan(Path::new("/nonexistent/klaxon/assets")).unwrap();
        assert!(catalog.themed_variants().is_empty());
        assert_eq!(
            catalog.reserved(ReservedAsset::DefaultAlert),
            AudioSource::Tone(ToneSpec::DEFAULT_ALERT)
        );
    }

    #[test]
    fn test_scan_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("in_call.wav"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join(THEMED_DIR)).unwrap();
        fs::write(dir.path().join(THEMED_DIR).join("b_sunrise.mp3"), b"").unwrap();
        fs::write(dir.path().join(THEMED_DIR).join("a_birds.wav"), b"").unwrap();
        fs::write(dir.path().join(THEMED_DIR).join("cover.jpg"), b"").unwrap();

        let catalog = DirectoryAssetCatalog::scan(dir.path()).unwrap();

        assert_eq!(
            catalog.reserved(ReservedAsset::InCall),
            AudioSource::File(dir.path().join("in_call.wav"))
        );
        // Not on disk, still served
        assert_eq!(
            catalog.reserved(ReservedAsset::Fallback),
            AudioSource::Tone(ToneSpec::FALLBACK)
        );

        let names: Vec<&str> = catalog.themed_variants().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a_birds", "b_sunrise"]);
    }

    #[test]
    fn test_builder_overrides() {
        let catalog = DirectoryAssetCatalog::builtin()
            .with_themed("one", AudioSource::File(PathBuf::from("/a/one.wav")))
            .with_reserved(ReservedAsset::Intro, AudioSource::File(PathBuf::from("/a/intro.wav")));

        assert_eq!(catalog.themed_variants().len(), 1);
        assert_eq!(
            catalog.reserved(ReservedAsset::Intro),
            AudioSource::File(PathBuf::from("/a/intro.wav"))
        );
    }
}
