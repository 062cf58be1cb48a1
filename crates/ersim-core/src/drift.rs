//! Drift timer bound to a live session.
//!
//! A [`DriftTimer`] owns one background thread that ticks the shared
//! [`Session`] on a fixed interval. The thread is joined when the timer is
//! stopped or dropped, so no tick can land after disposal.
//!
//! [`LiveSession`] couples a session with its timer: the timer starts when
//! the scenario reaches the drift threshold and is torn down before a reset.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::SimConfig;
use crate::scenario::ScenarioStep;
use crate::session::{Session, SessionSnapshot};

/// Session handle shared between the owner and the drift thread.
pub type SharedSession = Arc<Mutex<Session>>;

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background ticker. Dropping it stops and joins the thread.
pub struct DriftTimer {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DriftTimer {
    /// Tick `session` every `interval` until stopped.
    pub fn spawn(session: SharedSession, interval: Duration) -> Self {
        let (stop, rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            let mut rng = rand::rng();
            loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        lock(&session).tick(&mut rng);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            log::debug!("drift timer stopped");
        });
        log::debug!("drift timer started ({}ms)", interval.as_millis());
        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("drift timer thread panicked");
        }
    }
}

impl Drop for DriftTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A session plus the timer that drifts it while telemetry is live.
pub struct LiveSession {
    session: SharedSession,
    timer: Option<DriftTimer>,
    interval: Duration,
}

impl LiveSession {
    pub fn new(session: Session, config: &SimConfig) -> Self {
        let mut live = Self {
            session: Arc::new(Mutex::new(session)),
            timer: None,
            interval: config.tick_interval,
        };
        live.sync_timer();
        live
    }

    /// Lock the session for reading or direct mutation.
    ///
    /// Changing the step through the guard bypasses timer management; use
    /// [`LiveSession::advance`] and [`LiveSession::reset`] for that.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        lock(&self.session)
    }

    pub fn shared(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    pub fn is_drifting(&self) -> bool {
        self.timer.is_some()
    }

    pub fn advance(&mut self) -> ScenarioStep {
        let step = self.lock().advance();
        self.sync_timer();
        step
    }

    /// Detach the running timer without stopping it.
    ///
    /// The caller owns the join; a following [`LiveSession::reset`] then has
    /// nothing to wait for. Until the step changes again no new timer starts.
    pub fn take_timer(&mut self) -> Option<DriftTimer> {
        self.timer.take()
    }

    /// Stop the timer, then reset the session.
    pub fn reset(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
        self.lock().reset(&mut rand::rng());
        self.sync_timer();
    }

    pub fn transfer(&mut self) -> bool {
        let accepted = self.lock().transfer();
        self.sync_timer();
        accepted
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Start or stop the timer to match the current step.
    fn sync_timer(&mut self) {
        let live = self.lock().gates().telemetry_live;
        match (live, self.timer.is_some()) {
            (true, false) => {
                self.timer = Some(DriftTimer::spawn(self.shared(), self.interval));
            }
            (false, true) => {
                if let Some(timer) = self.timer.take() {
                    timer.stop();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Group;
    use crate::vitals::Vitals;

    fn fast() -> SimConfig {
        SimConfig {
            tick_interval: Duration::from_millis(5),
            ..Default::default()
        }
    }

    #[test]
    fn timer_starts_at_threshold() {
        let mut live = LiveSession::new(Session::with_group(Group::A), &fast());
        live.advance();
        live.advance();
        assert!(!live.is_drifting());
        thread::sleep(Duration::from_millis(30));
        assert_eq!(*live.lock().vitals(), Vitals::initial());

        assert_eq!(live.advance(), ScenarioStep::Connected);
        assert!(live.is_drifting());
    }

    #[test]
    fn timer_ticks_session() {
        let mut live = LiveSession::new(Session::with_group(Group::A), &fast());
        for _ in 0..3 {
            live.advance();
        }
        thread::sleep(Duration::from_millis(100));
        assert!(live.lock().ticks() > 0);
    }

    #[test]
    fn reset_stops_timer_and_mutation() {
        let mut live = LiveSession::new(Session::with_group(Group::B), &fast());
        for _ in 0..3 {
            live.advance();
        }
        thread::sleep(Duration::from_millis(30));
        live.reset();
        assert!(!live.is_drifting());
        thread::sleep(Duration::from_millis(30));
        let s = live.lock();
        assert_eq!(s.ticks(), 0);
        assert_eq!(*s.vitals(), Vitals::initial());
    }

    #[test]
    fn taken_timer_stops_independently() {
        let mut live = LiveSession::new(Session::with_group(Group::A), &fast());
        for _ in 0..3 {
            live.advance();
        }
        let timer = live.take_timer().unwrap();
        assert!(!live.is_drifting());
        assert!(live.take_timer().is_none());

        timer.stop();
        let frozen = live.lock().ticks();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(live.lock().ticks(), frozen);

        live.reset();
        assert_eq!(live.snapshot().step, 0);
        assert!(!live.is_drifting());
    }

    #[test]
    fn dropped_timer_is_joined() {
        let session: SharedSession = Arc::new(Mutex::new(Session::with_group(Group::A)));
        for _ in 0..3 {
            lock(&session).advance();
        }
        let timer = DriftTimer::spawn(Arc::clone(&session), Duration::from_millis(5));
        thread::sleep(Duration::from_millis(40));
        drop(timer);
        let after_drop = lock(&session).ticks();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(lock(&session).ticks(), after_drop);
        assert_eq!(Arc::strong_count(&session), 1);
    }

    #[test]
    fn already_connected_session_drifts_on_creation() {
        let mut s = Session::with_group(Group::A);
        for _ in 0..3 {
            s.advance();
        }
        let live = LiveSession::new(s, &fast());
        assert!(live.is_drifting());
    }
}
