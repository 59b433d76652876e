//! Audio and haptic capabilities used by the alarm
//!
//! Every capability is optional. The defaults do nothing, so a device that
//! cannot vibrate or speak simply leaves those methods alone.

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tokio::{
    process::{Child, Command},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info};

/// How long a freshly started player must keep running (or exit cleanly)
/// before its source counts as playable
pub const STARTUP_GRACE: Duration = Duration::from_millis(250);

/// Whether a playback repeats until stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    Once,
    Loop,
}

/// A sound that is currently playing
pub trait AudioHandle: Send + std::fmt::Debug {
    /// Pause, rewind and release the sound
    fn stop(&mut self);
}

/// Hardware the alarm talks to
pub trait AlarmDevice: Send + Sync + std::fmt::Debug {
    /// Start playing a sound file; an error means this source is unusable
    fn play(&self, source: &Path, mode: PlayMode) -> Result<Box<dyn AudioHandle>, String>;

    /// Open a synthesized audio context, if the device has one
    fn open_synth(&self) -> Option<Box<dyn AudioHandle>> {
        None
    }

    /// Run a vibration pattern (alternating on/off milliseconds)
    fn vibrate(&self, _pattern: &[u64]) {}

    /// Populate the speech voice list ahead of time
    fn warm_up_speech(&self) {}

    /// Drop any pending speech utterance
    fn cancel_speech(&self) {}
}

/// Plays sound files through an external player command
#[derive(Debug, Clone)]
pub struct SystemDevice {
    player: String,
    /// Emit a terminal bell for each vibration pulse
    bell: bool,
}

impl SystemDevice {
    pub fn new(player: impl Into<String>, bell: bool) -> Self {
        Self { player: player.into(), bell }
    }
}

/// Player process kept alive by a background task
#[derive(Debug)]
struct ProcessPlayback {
    source: PathBuf,
    task: Option<JoinHandle<()>>,
}

impl AudioHandle for ProcessPlayback {
    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            // Dropping the child inside the task kills the player
            task.abort();
            debug!("Stopped playback of {}", self.source.display());
        }
    }
}

impl Drop for ProcessPlayback {
    fn drop(&mut self) {
        self.stop();
    }
}

impl SystemDevice {
    fn spawn_player(&self, source: &Path) -> Result<Child, String> {
        Command::new(&self.player)
            .arg(source)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to execute {}: {}", self.player, e))
    }
}

/// Watch a new player through the startup grace period
///
/// Returns the child while it is still playing, `None` when it already
/// finished cleanly, and an error when it exited with a failure status.
fn check_startup(mut child: Child, player: &str, source: &Path) -> Result<Option<Child>, String> {
    let deadline = Instant::now() + STARTUP_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(None),
            Ok(Some(status)) => {
                return Err(format!("{} could not play {}: {}", player, source.display(), status));
            }
            Ok(None) if Instant::now() >= deadline => return Ok(Some(child)),
            Ok(None) => std::thread::sleep(Duration::from_millis(10)),
            Err(e) => return Err(format!("Failed to check {}: {}", player, e)),
        }
    }
}

impl AlarmDevice for SystemDevice {
    fn play(&self, source: &Path, mode: PlayMode) -> Result<Box<dyn AudioHandle>, String> {
        if !source.is_file() {
            return Err(format!("{} does not exist", source.display()));
        }

        let mut current = check_startup(self.spawn_player(source)?, &self.player, source)?;
        info!("Playing {} with {}", source.display(), self.player);

        let device = self.clone();
        let path = source.to_path_buf();
        let task = tokio::spawn(async move {
            loop {
                if let Some(mut child) = current.take() {
                    match child.wait().await {
                        Ok(status) if status.success() => {}
                        Ok(status) => {
                            debug!("{} exited with {}", device.player, status);
                            break;
                        }
                        Err(e) => {
                            debug!("Failed to wait for {}: {}", device.player, e);
                            break;
                        }
                    }
                }
                if mode == PlayMode::Once {
                    break;
                }
                sleep(Duration::from_millis(50)).await;
                current = match device.spawn_player(&path) {
                    Ok(child) => Some(child),
                    Err(e) => {
                        debug!("Failed to restart {}: {}", device.player, e);
                        break;
                    }
                };
            }
        });

        Ok(Box::new(ProcessPlayback { source: source.to_path_buf(), task: Some(task) }))
    }

    fn vibrate(&self, pattern: &[u64]) {
        if !self.bell {
            return;
        }

        let pattern = pattern.to_vec();
        tokio::spawn(async move {
            for (i, ms) in pattern.into_iter().enumerate() {
                if i % 2 == 0 {
                    let mut out = std::io::stdout();
                    let _ = out.write_all(b"\x07");
                    let _ = out.flush();
                }
                sleep(Duration::from_millis(ms)).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let device = SystemDevice::new("true", false);
        let result = device.play(Path::new("/definitely/not/here.mp3"), PlayMode::Once);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_player_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("alarm.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let device = SystemDevice::new("no-such-player-binary-xyz", false);
        assert!(device.play(&file, PlayMode::Loop).is_err());
    }

    #[tokio::test]
    async fn failing_player_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("alarm.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let device = SystemDevice::new("false", false);
        assert!(device.play(&file, PlayMode::Loop).is_err());
        assert!(device.play(&file, PlayMode::Once).is_err());
    }

    #[tokio::test]
    async fn short_clean_playback_is_accepted() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("alarm.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let device = SystemDevice::new("true", false);
        let mut handle = device.play(&file, PlayMode::Once).unwrap();
        handle.stop();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn undecodable_mp3_falls_back_to_wav() {
        use std::os::unix::fs::PermissionsExt;

        use crate::alarm::{fallback::first_success, SoundLibrary, SoundType};

        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("alarm1.mp3"), b"ID3").unwrap();
        std::fs::write(dir.path().join("alarm1.wav"), b"RIFF").unwrap();

        // Player that cannot decode mp3 and keeps playing anything else
        let player = dir.path().join("player.sh");
        std::fs::write(&player, "#!/bin/sh\ncase \"$1\" in *.mp3) exit 1;; esac\nexec sleep 5\n").unwrap();
        std::fs::set_permissions(&player, std::fs::Permissions::from_mode(0o755)).unwrap();

        let device = SystemDevice::new(player.to_string_lossy(), false);
        let library = SoundLibrary::new(dir.path());
        let candidates = library.candidates(&SoundType::Custom("1".to_string()));

        let (source, mut handle) =
            first_success(&candidates, |source| device.play(source.path(), PlayMode::Loop)).unwrap();
        assert_eq!(source.path(), dir.path().join("alarm1.wav"));
        handle.stop();
    }

    #[tokio::test]
    async fn silent_device_has_no_optional_capabilities() {
        let device = SystemDevice::new("true", false);
        assert!(device.open_synth().is_none());
        device.vibrate(&[200, 100, 200]);
        device.warm_up_speech();
        device.cancel_speech();
    }
}
