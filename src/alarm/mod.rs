//! Alarm controller
//!
//! ```text
//!          sound()                dismiss()
//!  Idle ─────────────► Sounding ─────────────► Idle
//!                        │  ▲
//!                        └──┘ run() every second
//! ```
//!
//! While sounding, [`AlarmController::run`] is re-invoked once a second by
//! the alarm repeat task. Each run re-triggers the vibration pattern and, for
//! custom sounds, makes sure a looping audio handle exists. The handle is
//! resolved once per episode: if none of the candidate files play, the alarm
//! stays silent until dismissed.

pub mod device;
pub mod fallback;
pub mod sound;

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use device::{AlarmDevice, AudioHandle, PlayMode, SystemDevice};
pub use fallback::first_success;
pub use sound::{SoundLibrary, SoundSource, SoundType};

/// Vibration pattern: on, off, on (milliseconds)
pub const VIBRATION_PATTERN: [u64; 3] = [200, 100, 200];

/// Period between alarm re-triggers
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(1000);

/// Length of a sound preview
pub const PREVIEW_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmPhase {
    Idle,
    Sounding(SoundType),
}

#[derive(Debug)]
enum CustomAudio {
    /// Not looked up yet this episode
    Unresolved,
    /// Every candidate failed
    Exhausted,
    Playing(Box<dyn AudioHandle>),
}

#[derive(Debug)]
pub struct AlarmController {
    device: Arc<dyn AlarmDevice>,
    library: SoundLibrary,
    phase: AlarmPhase,
    custom: CustomAudio,
    synth: Option<Box<dyn AudioHandle>>,
    repeat: Option<JoinHandle<()>>,
}

impl AlarmController {
    pub fn new(device: Arc<dyn AlarmDevice>, library: SoundLibrary) -> Self {
        Self {
            device,
            library,
            phase: AlarmPhase::Idle,
            custom: CustomAudio::Unresolved,
            synth: None,
            repeat: None,
        }
    }

    pub fn phase(&self) -> &AlarmPhase {
        &self.phase
    }

    pub fn is_sounding(&self) -> bool {
        matches!(self.phase, AlarmPhase::Sounding(_))
    }

    /// Start sounding and run the alarm once
    ///
    /// Returns `false` if the alarm was already sounding.
    pub fn sound(&mut self, sound: SoundType) -> bool {
        if self.is_sounding() {
            return false;
        }

        info!("Alarm sounding ({})", sound);
        self.synth = self.device.open_synth();
        self.custom = CustomAudio::Unresolved;
        self.phase = AlarmPhase::Sounding(sound);
        self.run();
        true
    }

    /// Keep the task that re-runs the alarm, aborted on dismissal
    pub fn attach_repeat(&mut self, task: JoinHandle<()>) {
        if let Some(old) = self.repeat.replace(task) {
            old.abort();
        }
    }

    /// One alarm action: ensure the sound is playing and vibrate
    ///
    /// Returns `false` once the alarm is idle.
    pub fn run(&mut self) -> bool {
        let sound = match &self.phase {
            AlarmPhase::Idle => return false,
            AlarmPhase::Sounding(sound) => sound.clone(),
        };

        if matches!(sound, SoundType::Custom(_)) && matches!(self.custom, CustomAudio::Unresolved) {
            self.custom = match self.resolve(&sound, PlayMode::Loop) {
                Some(handle) => CustomAudio::Playing(handle),
                None => {
                    warn!("No playable source for {}, alarm stays silent", sound);
                    CustomAudio::Exhausted
                }
            };
        }

        self.device.vibrate(&VIBRATION_PATTERN);
        true
    }

    /// Play the first candidate of `sound` that the device accepts
    pub fn resolve(&self, sound: &SoundType, mode: PlayMode) -> Option<Box<dyn AudioHandle>> {
        first_success(self.library.candidates(sound), |source| self.device.play(source.path(), mode))
            .map(|(source, handle)| {
                info!("Playing alarm source {}", source);
                handle
            })
    }

    /// Silence everything and return to idle
    ///
    /// Returns `true` if the alarm was sounding.
    pub fn dismiss(&mut self) -> bool {
        if let Some(task) = self.repeat.take() {
            task.abort();
        }
        if let Some(mut synth) = self.synth.take() {
            synth.stop();
        }
        if let CustomAudio::Playing(mut handle) = std::mem::replace(&mut self.custom, CustomAudio::Unresolved) {
            handle.stop();
        }
        self.device.cancel_speech();

        let was_sounding = self.is_sounding();
        self.phase = AlarmPhase::Idle;
        if was_sounding {
            info!("Alarm dismissed");
        }
        was_sounding
    }
}

impl Drop for AlarmController {
    fn drop(&mut self) {
        self.dismiss();
    }
}


#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::atomic::Ordering};

    use super::{testing::FakeDevice, *};

    fn controller(device: FakeDevice) -> (AlarmController, Arc<FakeDevice>) {
        let device = Arc::new(device);
        let alarm = AlarmController::new(device.clone(), SoundLibrary::new("sounds"));
        (alarm, device)
    }

    fn custom(n: &str) -> SoundType {
        SoundType::Custom(n.to_string())
    }

    #[test]
    fn silent_alarm_only_vibrates() {
        let (mut alarm, device) = controller(FakeDevice::default());
        assert!(alarm.sound(SoundType::Silent));
        assert!(alarm.is_sounding());
        assert!(device.attempted().is_empty());
        assert_eq!(device.log.vibrations.load(Ordering::SeqCst), 1);

        assert!(alarm.run());
        assert_eq!(device.log.vibrations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn falls_back_to_wav_when_mp3_fails() {
        let (mut alarm, device) = controller(FakeDevice::playing(&["sounds/alarm1.wav"]));
        alarm.sound(custom("1"));

        assert_eq!(
            device.attempted(),
            vec![PathBuf::from("sounds/alarm1.mp3"), PathBuf::from("sounds/alarm1.wav")]
        );
        assert_eq!(device.log.attempts.lock().unwrap()[1].1, PlayMode::Loop);
    }

    #[test]
    fn audio_is_resolved_once_per_episode() {
        let (mut alarm, device) = controller(FakeDevice::playing(&["sounds/alarm1.mp3"]));
        alarm.sound(custom("1"));
        alarm.run();
        alarm.run();
        assert_eq!(device.attempted().len(), 1);
        assert_eq!(device.log.vibrations.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn exhausted_sources_leave_a_vibrating_silent_alarm() {
        let (mut alarm, device) = controller(FakeDevice::default());
        alarm.sound(custom("9"));
        alarm.run();

        // Two candidates tried on the first run only
        assert_eq!(device.attempted().len(), 2);
        assert!(alarm.is_sounding());
        assert_eq!(device.log.vibrations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sounding_twice_is_ignored() {
        let (mut alarm, _device) = controller(FakeDevice::default());
        assert!(alarm.sound(SoundType::Silent));
        assert!(!alarm.sound(custom("1")));
        assert_eq!(*alarm.phase(), AlarmPhase::Sounding(SoundType::Silent));
    }

    #[test]
    fn dismiss_releases_everything() {
        let device = FakeDevice { with_synth: true, ..FakeDevice::playing(&["sounds/alarm2.mp3"]) };
        let (mut alarm, device) = controller(device);
        alarm.sound(custom("2"));

        assert!(alarm.dismiss());
        assert!(!alarm.is_sounding());
        assert_eq!(device.log.stopped.load(Ordering::SeqCst), 1);
        assert_eq!(device.log.synth_closed.load(Ordering::SeqCst), 1);
        assert_eq!(device.log.speech_cancelled.load(Ordering::SeqCst), 1);
        assert!(!alarm.run());

        // Idle dismissal reports nothing to do
        assert!(!alarm.dismiss());
    }

    #[test]
    fn new_episode_resolves_audio_again() {
        let (mut alarm, device) = controller(FakeDevice::playing(&["sounds/alarm1.mp3"]));
        alarm.sound(custom("1"));
        alarm.dismiss();
        alarm.sound(custom("1"));
        assert_eq!(device.attempted().len(), 2);
    }

    #[tokio::test]
    async fn dismiss_aborts_the_repeat_task() {
        let (mut alarm, _device) = controller(FakeDevice::default());
        alarm.sound(SoundType::Silent);
        let (alive_tx, alive_rx) = tokio::sync::oneshot::channel::<()>();
        alarm.attach_repeat(tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
        }));

        alarm.dismiss();
        let dropped = tokio::time::timeout(Duration::from_secs(1), alive_rx).await;
        assert!(matches!(dropped, Ok(Err(_))), "repeat task should be dropped");
    }
}
