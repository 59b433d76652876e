//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

use super::{PollOutcome, TimerSession, TimerState, Toggle};
use crate::{
    alarm::{AlarmController, PlayMode, SoundType, PREVIEW_DURATION},
    render::{render, View},
    store::KeyValueStore,
    tasks::{alarm_repeat_task, countdown_task, preview_timeout_task},
};

/// Owner of the timer session and the alarm
///
/// Every user action reloads the session from the store, applies the change,
/// persists it and re-renders.
#[derive(Debug)]
pub struct AppState {
    pub session: Mutex<TimerSession>,
    pub alarm: Mutex<AlarmController>,
    /// Sound used the next time the alarm goes off
    pub sound: Mutex<SoundType>,
    pub presets: Vec<u64>,
    store: Arc<dyn KeyValueStore>,
    /// 100ms poll, alive only while the countdown runs
    countdown: Mutex<Option<JoinHandle<()>>>,
    /// Pending preview auto-stop
    preview: Mutex<Option<JoinHandle<()>>>,
    /// Latest rendered view
    pub view_tx: watch::Sender<View>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(
        session: TimerSession,
        alarm: AlarmController,
        sound: SoundType,
        presets: Vec<u64>,
        port: u16,
        host: String,
    ) -> Self {
        let store = Arc::clone(session.store());
        let view = render(session.state(), alarm.is_sounding(), &presets);
        let (view_tx, _) = watch::channel(view);

        Self {
            session: Mutex::new(session),
            alarm: Mutex::new(alarm),
            sound: Mutex::new(sound),
            presets,
            store,
            countdown: Mutex::new(None),
            preview: Mutex::new(None),
            view_tx,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, TimerSession>, String> {
        self.session.lock()
            .map_err(|e| format!("Failed to lock timer session: {}", e))
    }

    fn lock_alarm(&self) -> Result<MutexGuard<'_, AlarmController>, String> {
        self.alarm.lock()
            .map_err(|e| format!("Failed to lock alarm: {}", e))
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Toggle the countdown, silencing a sounding alarm first
    ///
    /// The toggle itself reloads the session, so the store is read once.
    pub fn start_stop(self: &Arc<Self>) -> Result<Toggle, String> {
        self.record_action("start-stop");
        let toggle = {
            let mut session = self.lock_session()?;
            self.lock_alarm()?.dismiss();
            session.toggle()?
        };
        info!("Start/stop pressed: {:?}", toggle);
        self.sync()?;
        Ok(toggle)
    }

    /// Start the countdown if it is not running
    pub fn start(self: &Arc<Self>) -> Result<bool, String> {
        self.record_action("start");
        let started = {
            let mut session = self.lock_session()?;
            session.load_state();
            self.lock_alarm()?.dismiss();
            session.start()?
        };
        self.sync()?;
        Ok(started)
    }

    /// Stop the countdown if it is running
    pub fn stop(self: &Arc<Self>) -> Result<bool, String> {
        self.record_action("stop");
        let stopped = {
            let mut session = self.lock_session()?;
            session.load_state();
            self.lock_alarm()?.dismiss();
            session.stop()?
        };
        self.sync()?;
        Ok(stopped)
    }

    pub fn reset(self: &Arc<Self>) -> Result<View, String> {
        self.record_action("reset");
        {
            let mut session = self.lock_session()?;
            session.load_state();
            self.lock_alarm()?.dismiss();
            session.reset()?;
        }
        self.sync()
    }

    pub fn set_preset(self: &Arc<Self>, seconds: u64) -> Result<View, String> {
        self.record_action("preset");
        {
            let mut session = self.lock_session()?;
            session.load_state();
            self.lock_alarm()?.dismiss();
            session.set_preset(seconds)?;
        }
        self.sync()
    }

    /// Silence the alarm without touching the countdown
    pub fn dismiss_alarm(self: &Arc<Self>) -> Result<bool, String> {
        self.record_action("dismiss");
        let was_sounding = self.lock_alarm()?.dismiss();
        self.sync()?;
        Ok(was_sounding)
    }

    /// Choose the alarm sound and preview it
    ///
    /// Returns whether a preview started playing.
    pub fn select_sound(self: &Arc<Self>, sound: SoundType) -> Result<bool, String> {
        self.record_action("sound");
        let preview = {
            let mut alarm = self.lock_alarm()?;
            alarm.dismiss();
            alarm.resolve(&sound, PlayMode::Once)
        };

        info!("Alarm sound set to {}", sound);
        *self.sound.lock().map_err(|e| format!("Failed to lock sound: {}", e))? = sound;

        let started = preview.is_some();
        if let Some(handle) = preview {
            let task = tokio::spawn(preview_timeout_task(handle, PREVIEW_DURATION));
            let mut pending = self.preview.lock()
                .map_err(|e| format!("Failed to lock preview: {}", e))?;
            if let Some(old) = pending.replace(task) {
                old.abort();
            }
        }

        self.sync()?;
        Ok(started)
    }

    /// Pick up a change written by another instance
    pub fn reload(self: &Arc<Self>) -> Result<View, String> {
        debug!("Reloading timer state after external change");
        self.lock_session()?.load_state();
        self.sync()
    }

    /// One countdown poll; returns whether the countdown should keep ticking
    pub fn tick(self: &Arc<Self>) -> Result<bool, String> {
        let outcome = self.lock_session()?.poll();
        match outcome {
            PollOutcome::Idle => Ok(false),
            PollOutcome::Ticking(_) => {
                self.publish()?;
                Ok(true)
            }
            PollOutcome::Expired => {
                self.sound_alarm()?;
                self.sync()?;
                Ok(false)
            }
        }
    }

    fn sound_alarm(self: &Arc<Self>) -> Result<(), String> {
        let sound = self.sound.lock()
            .map_err(|e| format!("Failed to lock sound: {}", e))?
            .clone();

        let mut alarm = self.lock_alarm()?;
        if alarm.sound(sound) {
            alarm.attach_repeat(tokio::spawn(alarm_repeat_task(Arc::clone(self))));
        }
        Ok(())
    }

    /// Re-run the alarm action; returns `false` once the alarm is idle
    pub fn retrigger_alarm(&self) -> Result<bool, String> {
        Ok(self.lock_alarm()?.run())
    }

    /// Render the current state and publish it to view watchers
    fn publish(&self) -> Result<View, String> {
        let state = *self.lock_session()?.state();
        let sounding = self.lock_alarm()?.is_sounding();
        let view = render(&state, sounding, &self.presets);
        self.view_tx.send_replace(view.clone());
        Ok(view)
    }

    /// Re-render and make sure the countdown poll runs iff the timer runs
    pub fn sync(self: &Arc<Self>) -> Result<View, String> {
        let view = self.publish()?;
        let running = self.lock_session()?.state().is_running;

        let mut countdown = self.countdown.lock()
            .map_err(|e| format!("Failed to lock countdown: {}", e))?;
        if running {
            let alive = countdown.as_ref().is_some_and(|task| !task.is_finished());
            if !alive {
                debug!("Starting countdown poll");
                *countdown = Some(tokio::spawn(countdown_task(Arc::clone(self))));
            }
        } else if let Some(task) = countdown.take() {
            debug!("Stopping countdown poll");
            task.abort();
        }

        Ok(view)
    }

    pub fn view(&self) -> View {
        self.view_tx.borrow().clone()
    }

    pub fn get_timer_state(&self) -> Result<TimerState, String> {
        Ok(*self.lock_session()?.state())
    }

    pub fn is_alarm_sounding(&self) -> Result<bool, String> {
        Ok(self.lock_alarm()?.is_sounding())
    }

    pub fn is_countdown_active(&self) -> bool {
        self.countdown.lock()
            .map(|task| task.as_ref().is_some_and(|t| !t.is_finished()))
            .unwrap_or(false)
    }

    pub fn get_sound(&self) -> Result<SoundType, String> {
        self.sound.lock()
            .map(|sound| sound.clone())
            .map_err(|e| format!("Failed to lock sound: {}", e))
    }

    /// Calculate uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
