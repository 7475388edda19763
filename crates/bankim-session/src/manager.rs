//! Idle-session state machine.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bankim_types::config_defaults as defaults;
use bankim_types::{ActivityEvent, ActivityKind, HasSessionTimeoutConfig};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::activity::ActivityHub;
use crate::error::{Result, SessionError};
use crate::handler::SessionHandler;

/// Lifecycle state of an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Active,
    /// Idle past the warning threshold; activity returns to `Active`.
    Warned,
    /// Idle past the timeout. Terminal.
    Expired,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Warned => "warned",
            SessionState::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and monitored events for a [`SessionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTimeoutConfig {
    /// Idle time before the warning.
    pub warning_time: Duration,
    /// Idle time before expiry, measured from the same idle start.
    pub timeout_time: Duration,
    /// Event kinds that count as activity.
    pub activity_events: Vec<ActivityKind>,
}

impl Default for SessionTimeoutConfig {
    fn default() -> Self {
        Self {
            warning_time: defaults::session_warning(),
            timeout_time: defaults::session_timeout(),
            activity_events: ActivityKind::DEFAULT_SET.to_vec(),
        }
    }
}

impl SessionTimeoutConfig {
    pub fn new(warning_time: Duration, timeout_time: Duration) -> Self {
        Self {
            warning_time,
            timeout_time,
            ..Self::default()
        }
    }

    pub fn from_provider(provider: &impl HasSessionTimeoutConfig) -> Self {
        Self::new(provider.warning_time(), provider.timeout_time())
            .with_activity_events(provider.activity_events())
    }

    pub fn with_activity_events(mut self, events: impl IntoIterator<Item = ActivityKind>) -> Self {
        self.activity_events = events.into_iter().collect();
        self
    }

    /// Check that the warning fires strictly before the timeout.
    pub fn validate(&self) -> Result<()> {
        if self.warning_time.is_zero() || self.warning_time >= self.timeout_time {
            return Err(SessionError::InvalidTimeouts {
                warning: self.warning_time,
                timeout: self.timeout_time,
            });
        }
        Ok(())
    }

    fn tracks(&self, kind: ActivityKind) -> bool {
        self.activity_events.contains(&kind)
    }
}

enum Command {
    Extend,
}

/// Activity-driven session lifecycle.
///
/// Starting the manager arms two deadlines from the same idle start: the
/// warning and the timeout. Any monitored activity (or
/// [`extend_session`](Self::extend_session)) moves the idle start to now and
/// dismisses an outstanding warning. Reaching the timeout expires the session,
/// runs the handler's timeout callback and detaches from the activity hub.
///
/// All timers live on a single task; dropping the manager or calling
/// [`destroy`](Self::destroy) cancels them.
pub struct SessionManager {
    config: SessionTimeoutConfig,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
    task: JoinHandle<()>,
}

impl SessionManager {
    /// Start monitoring `hub`. Must be called within a tokio runtime.
    pub fn start(
        config: SessionTimeoutConfig,
        hub: &ActivityHub,
        handler: Arc<dyn SessionHandler>,
    ) -> Result<Self> {
        config.validate()?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Active);

        let monitor = Monitor {
            config: config.clone(),
            handler,
            state: state_tx,
            idle_start: Instant::now(),
            warned: false,
        };
        let task = tokio::spawn(monitor.run(hub.subscribe(), commands_rx));

        debug!(
            warning_ms = config.warning_time.as_millis() as u64,
            timeout_ms = config.timeout_time.as_millis() as u64,
            "Session monitoring started"
        );

        Ok(Self {
            config,
            commands: commands_tx,
            state: state_rx,
            task,
        })
    }

    pub fn config(&self) -> &SessionTimeoutConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_expired(&self) -> bool {
        self.state() == SessionState::Expired
    }

    /// Observe state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Treat the session as active right now.
    ///
    /// Has no effect once the session has expired or been destroyed.
    pub fn extend_session(&self) {
        let _ = self.commands.send(Command::Extend);
    }

    /// Stop monitoring: detach from the activity hub and cancel both timers.
    /// Idempotent.
    pub fn destroy(&self) {
        if !self.task.is_finished() {
            self.task.abort();
            debug!(state = %self.state(), "Session monitoring stopped");
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// State owned by the monitoring task.
struct Monitor {
    config: SessionTimeoutConfig,
    handler: Arc<dyn SessionHandler>,
    state: watch::Sender<SessionState>,
    idle_start: Instant,
    warned: bool,
}

impl Monitor {
    async fn run(
        mut self,
        mut activity: broadcast::Receiver<ActivityEvent>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        let mut hub_open = true;

        loop {
            let warning_at = self.idle_start + self.config.warning_time;
            let timeout_at = self.idle_start + self.config.timeout_time;

            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Extend) => self.on_activity(),
                    None => break,
                },
                event = activity.recv(), if hub_open => match event {
                    Ok(event) if self.config.tracks(event.kind) => self.on_activity(),
                    Ok(_) => {}
                    // Missed events were still activity
                    Err(broadcast::error::RecvError::Lagged(_)) => self.on_activity(),
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Activity hub closed, only explicit extensions remain");
                        hub_open = false;
                    }
                },
                _ = sleep_until(warning_at), if !self.warned => self.on_warning(),
                _ = sleep_until(timeout_at) => {
                    self.on_timeout();
                    break;
                }
            }
        }
        // Dropping the receiver detaches from the hub
    }

    fn on_activity(&mut self) {
        self.idle_start = Instant::now();
        if self.warned {
            self.warned = false;
            self.state.send_replace(SessionState::Active);
            debug!("Activity dismissed session warning");
            self.handler.on_warning_dismissed();
        }
    }

    fn on_warning(&mut self) {
        self.warned = true;
        self.state.send_replace(SessionState::Warned);
        let remaining = self
            .config
            .timeout_time
            .saturating_sub(self.config.warning_time);
        info!(
            remaining_ms = remaining.as_millis() as u64,
            "Session idle, warning before timeout"
        );
        self.handler.on_warning(remaining);
    }

    fn on_timeout(&mut self) {
        self.state.send_replace(SessionState::Expired);
        info!("Session expired after inactivity");
        if let Err(e) = self.handler.on_timeout() {
            warn!(error = %e, "Session timeout handler failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tokio::time::sleep;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        fail_timeout: bool,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl SessionHandler for Recorder {
        fn on_warning(&self, remaining: Duration) {
            self.events
                .lock()
                .push(format!("warning:{}", remaining.as_millis()));
        }

        fn on_warning_dismissed(&self) {
            self.events.lock().push("dismissed".into());
        }

        fn on_timeout(&self) -> Result<()> {
            self.events.lock().push("timeout".into());
            if self.fail_timeout {
                return Err(SessionError::Handler("redirect failed".into()));
            }
            Ok(())
        }
    }

    fn short() -> SessionTimeoutConfig {
        SessionTimeoutConfig::new(Duration::from_millis(100), Duration::from_millis(300))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_config_validation() {
        assert!(short().validate().is_ok());
        assert!(SessionTimeoutConfig::new(ms(300), ms(300)).validate().is_err());
        assert!(SessionTimeoutConfig::new(ms(0), ms(300)).validate().is_err());
        assert_eq!(
            SessionTimeoutConfig::default().activity_events,
            ActivityKind::DEFAULT_SET.to_vec()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_is_rejected() {
        let hub = ActivityHub::new();
        let result = SessionManager::start(
            SessionTimeoutConfig::new(ms(500), ms(100)),
            &hub,
            Arc::new(Recorder::default()),
        );
        assert!(matches!(result, Err(SessionError::InvalidTimeouts { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_warns_then_expires() {
        let hub = ActivityHub::new();
        let recorder = Arc::new(Recorder::default());
        let manager = SessionManager::start(short(), &hub, recorder.clone()).unwrap();

        sleep(ms(99)).await;
        assert_eq!(manager.state(), SessionState::Active);

        sleep(ms(2)).await;
        assert_eq!(manager.state(), SessionState::Warned);

        sleep(ms(198)).await;
        assert_eq!(manager.state(), SessionState::Warned);

        sleep(ms(2)).await;
        assert_eq!(manager.state(), SessionState::Expired);
        assert_eq!(recorder.events(), vec!["warning:200", "timeout"]);
        // Listener detached after expiry
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_postpones_both_deadlines() {
        let hub = ActivityHub::new();
        let recorder = Arc::new(Recorder::default());
        let manager = SessionManager::start(short(), &hub, recorder.clone()).unwrap();

        sleep(ms(50)).await;
        hub.emit(ActivityKind::PointerMove);

        sleep(ms(99)).await; // t = 149
        assert_eq!(manager.state(), SessionState::Active);

        sleep(ms(2)).await; // t = 151
        assert_eq!(manager.state(), SessionState::Warned);

        sleep(ms(197)).await; // t = 348
        assert_eq!(manager.state(), SessionState::Warned);

        sleep(ms(4)).await; // t = 352
        assert_eq!(manager.state(), SessionState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_dismisses_warning() {
        let hub = ActivityHub::new();
        let recorder = Arc::new(Recorder::default());
        let manager = SessionManager::start(short(), &hub, recorder.clone()).unwrap();

        sleep(ms(150)).await;
        assert_eq!(manager.state(), SessionState::Warned);

        hub.emit(ActivityKind::KeyPress);
        sleep(ms(1)).await;
        assert_eq!(manager.state(), SessionState::Active);
        assert_eq!(recorder.events(), vec!["warning:200", "dismissed"]);

        // Old timeout at 300 no longer applies
        sleep(ms(200)).await; // t = 351
        assert_ne!(manager.state(), SessionState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmonitored_events_are_ignored() {
        let hub = ActivityHub::new();
        let config = short().with_activity_events([ActivityKind::KeyPress]);
        let manager =
            SessionManager::start(config, &hub, Arc::new(Recorder::default())).unwrap();

        sleep(ms(50)).await;
        hub.emit(ActivityKind::Scroll);

        sleep(ms(51)).await; // t = 101
        assert_eq!(manager.state(), SessionState::Warned);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_session_counts_as_activity() {
        let hub = ActivityHub::new();
        let manager =
            SessionManager::start(short(), &hub, Arc::new(Recorder::default())).unwrap();

        sleep(ms(250)).await;
        manager.extend_session();

        sleep(ms(99)).await; // t = 349
        assert_eq!(manager.state(), SessionState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_timeout_handler_still_expires() {
        let hub = ActivityHub::new();
        let recorder = Arc::new(Recorder {
            fail_timeout: true,
            ..Recorder::default()
        });
        let manager = SessionManager::start(short(), &hub, recorder.clone()).unwrap();

        sleep(ms(301)).await;
        assert_eq!(manager.state(), SessionState::Expired);
        assert!(recorder.events().contains(&"timeout".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_cancels_timers() {
        let hub = ActivityHub::new();
        let recorder = Arc::new(Recorder::default());
        let manager = SessionManager::start(short(), &hub, recorder.clone()).unwrap();

        sleep(ms(10)).await;
        assert_eq!(hub.listener_count(), 1);

        manager.destroy();
        manager.destroy();
        sleep(ms(500)).await;

        assert_eq!(manager.state(), SessionState::Active);
        assert!(recorder.events().is_empty());
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_subscription() {
        let hub = ActivityHub::new();
        let manager =
            SessionManager::start(short(), &hub, Arc::new(Recorder::default())).unwrap();
        let mut states = manager.subscribe_state();

        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), SessionState::Warned);
        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), SessionState::Expired);
    }
}
