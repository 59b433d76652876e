//! Alarm sound selection and asset lookup

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// File extensions tried in order for every sound
pub const EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Which sound the alarm plays
///
/// Written as `silent` or `custom<suffix>`, e.g. `custom2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SoundType {
    /// Vibration only
    Silent,
    /// A sound file named `alarm<suffix>` in the sounds directory
    Custom(String),
}

impl SoundType {
    /// Base file name without extension, `None` for silent
    pub fn base_name(&self) -> Option<String> {
        match self {
            SoundType::Silent => None,
            SoundType::Custom(suffix) => Some(format!("alarm{}", suffix)),
        }
    }
}

impl Default for SoundType {
    fn default() -> Self {
        SoundType::Silent
    }
}

impl FromStr for SoundType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "silent" {
            return Ok(SoundType::Silent);
        }
        match s.strip_prefix("custom") {
            Some(suffix) if suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') => {
                Ok(SoundType::Custom(suffix.to_string()))
            }
            _ => Err(format!("Unknown sound type: {}", s)),
        }
    }
}

impl TryFrom<String> for SoundType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SoundType> for String {
    fn from(sound: SoundType) -> Self {
        sound.to_string()
    }
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundType::Silent => write!(f, "silent"),
            SoundType::Custom(suffix) => write!(f, "custom{}", suffix),
        }
    }
}

/// Directory holding the alarm sound files
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
}

/// A candidate sound file, displayed as its path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundSource(pub PathBuf);

impl SoundSource {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl SoundLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Candidate files for a sound, in the order they should be tried
    pub fn candidates(&self, sound: &SoundType) -> Vec<SoundSource> {
        match sound.base_name() {
            None => Vec::new(),
            Some(base) => EXTENSIONS
                .iter()
                .map(|ext| SoundSource(self.dir.join(format!("{}.{}", base, ext))))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_silent_and_custom() {
        assert_eq!("silent".parse::<SoundType>().unwrap(), SoundType::Silent);
        assert_eq!("custom2".parse::<SoundType>().unwrap(), SoundType::Custom("2".to_string()));
        assert_eq!("custom".parse::<SoundType>().unwrap(), SoundType::Custom(String::new()));
        assert!("beep".parse::<SoundType>().is_err());
        assert!("custom/../x".parse::<SoundType>().is_err());
    }

    #[test]
    fn display_round_trips_through_json() {
        let json = serde_json::to_string(&SoundType::Custom("3".to_string())).unwrap();
        assert_eq!(json, "\"custom3\"");
        let back: SoundType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SoundType::Custom("3".to_string()));
    }

    #[test]
    fn candidates_try_mp3_before_wav() {
        let library = SoundLibrary::new("sounds");
        let candidates = library.candidates(&SoundType::Custom("1".to_string()));
        assert_eq!(
            candidates,
            vec![
                SoundSource(PathBuf::from("sounds/alarm1.mp3")),
                SoundSource(PathBuf::from("sounds/alarm1.wav")),
            ]
        );
        assert!(library.candidates(&SoundType::Silent).is_empty());
    }
}
