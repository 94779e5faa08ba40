use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use uuid::Uuid;

use super::error::PlaybackError;
use super::progress::tick_interval;
use super::session::{PlaybackFrame, PlaybackSession, TrailOnSeek};
use super::state::PlaybackStatus;
use crate::camera::CameraController;
use crate::model::LocationSample;
use crate::scheduler::{CancelHandle, Scheduler};

pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
pub struct PlaybackSettings {
    /// Tick period at speed 1.
    pub base_interval: Duration,
    pub trail_on_seek: TrailOnSeek,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            base_interval: DEFAULT_BASE_INTERVAL,
            trail_on_seek: TrailOnSeek::default(),
        }
    }
}

/// Drives a [`PlaybackSession`] with a repeating timer and keeps the camera
/// on the current sample.
///
/// At most one ticker exists. Each ticker carries the session's run number
/// at the time it was armed; a ticker whose number no longer matches stops
/// itself without touching the session, so a tick already in flight when
/// the user pauses cannot advance the replay.
pub struct PlaybackEngine {
    settings: PlaybackSettings,
    scheduler: Arc<dyn Scheduler>,
    camera: CameraController,
    session: Arc<Mutex<PlaybackSession>>,
    ticker: Option<CancelHandle>,
}

impl PlaybackEngine {
    pub fn new(
        settings: PlaybackSettings,
        scheduler: Arc<dyn Scheduler>,
        camera: CameraController,
    ) -> Self {
        Self {
            settings,
            scheduler,
            camera,
            session: Arc::new(Mutex::new(PlaybackSession::new(Vec::new()))),
            ticker: None,
        }
    }

    pub fn settings(&self) -> PlaybackSettings {
        self.settings
    }

    /// Replaces the whole session with a fresh one over `samples`.
    pub fn load(&mut self, samples: Vec<LocationSample>) -> PlaybackFrame {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        let fresh = PlaybackSession::new(samples);
        if let Some(first) = fresh.first_position() {
            self.camera.recenter(first);
        }
        log::info!(
            "replay session {} loaded with {} samples",
            fresh.id(),
            fresh.samples().len()
        );

        let frame = fresh.frame(self.settings.base_interval);
        self.session = Arc::new(Mutex::new(fresh));
        frame
    }

    pub fn play(&mut self) -> Result<PlaybackFrame, PlaybackError> {
        let mut session = lock(&self.session);
        if let Some(target) = session.play()? {
            self.camera.recenter(target);
        }
        arm(
            &mut self.ticker,
            &self.session,
            &mut session,
            self.scheduler.as_ref(),
            &self.camera,
            self.settings.base_interval,
        );
        Ok(session.frame(self.settings.base_interval))
    }

    pub fn pause(&mut self) -> Result<PlaybackFrame, PlaybackError> {
        let mut session = lock(&self.session);
        session.pause()?;
        disarm(&mut self.ticker, &mut session);
        Ok(session.frame(self.settings.base_interval))
    }

    pub fn seek(&mut self, index: usize) -> Result<PlaybackFrame, PlaybackError> {
        let mut session = lock(&self.session);
        let target = session.seek(index, self.settings.trail_on_seek)?;
        disarm(&mut self.ticker, &mut session);
        self.camera.recenter(target);
        Ok(session.frame(self.settings.base_interval))
    }

    pub fn reset(&mut self) -> Result<PlaybackFrame, PlaybackError> {
        let mut session = lock(&self.session);
        let target = session.reset()?;
        disarm(&mut self.ticker, &mut session);
        self.camera.recenter(target);
        Ok(session.frame(self.settings.base_interval))
    }

    /// Changes the tick cadence. A running replay is re-armed at the new
    /// period; each tick still advances exactly one sample.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<PlaybackFrame, PlaybackError> {
        let mut session = lock(&self.session);
        session.set_speed(multiplier, self.settings.base_interval)?;
        if session.status() == PlaybackStatus::Playing {
            arm(
                &mut self.ticker,
                &self.session,
                &mut session,
                self.scheduler.as_ref(),
                &self.camera,
                self.settings.base_interval,
            );
        }
        Ok(session.frame(self.settings.base_interval))
    }

    pub fn frame(&self) -> PlaybackFrame {
        lock(&self.session).frame(self.settings.base_interval)
    }

    pub fn status(&self) -> PlaybackStatus {
        lock(&self.session).status()
    }

    pub fn session_id(&self) -> Uuid {
        lock(&self.session).id()
    }

    pub fn is_loaded(&self) -> bool {
        !lock(&self.session).samples().is_empty()
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        let mut session = lock(&self.session);
        disarm(&mut self.ticker, &mut session);
    }
}

fn lock(session: &Mutex<PlaybackSession>) -> MutexGuard<'_, PlaybackSession> {
    session.lock().unwrap_or_else(|e| e.into_inner())
}

fn arm(
    ticker: &mut Option<CancelHandle>,
    shared: &Arc<Mutex<PlaybackSession>>,
    session: &mut PlaybackSession,
    scheduler: &dyn Scheduler,
    camera: &CameraController,
    base_interval: Duration,
) {
    session.run += 1;
    let run = session.run;
    let period = tick_interval(base_interval, session.speed());
    log::debug!("replay {} ticking every {:?}", session.id(), period);

    let shared = Arc::clone(shared);
    let camera = camera.clone();
    let handle = scheduler.schedule_repeating(
        period,
        Box::new(move || {
            let tick = {
                let mut session = lock(&shared);
                if session.run != run {
                    return ControlFlow::Break(());
                }
                session.tick()
            };
            if let Some(target) = tick.moved_to {
                camera.recenter(target);
            }
            if tick.finished {
                log::debug!("replay completed");
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }),
    );

    if let Some(previous) = ticker.replace(handle) {
        previous.cancel();
    }
}

fn disarm(ticker: &mut Option<CancelHandle>, session: &mut PlaybackSession) {
    session.run += 1;
    if let Some(handle) = ticker.take() {
        handle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraState;
    use crate::model::{parse_captured_at, LatLng};
    use crate::playback::PlaybackState;
    use crate::scheduler::VirtualScheduler;

    fn samples(n: usize) -> Vec<LocationSample> {
        (0..n)
            .map(|i| LocationSample {
                entity_id: "e".into(),
                latitude: i as f64,
                longitude: -(i as f64),
                captured_at: parse_captured_at("06:00:00 2024-09-10").unwrap(),
                battery_percent: None,
                connectivity_type: None,
                connectivity_status: None,
                accuracy: None,
                distance_from_previous_km: None,
            })
            .collect()
    }

    fn pos(i: usize) -> LatLng {
        LatLng::new(i as f64, -(i as f64))
    }

    fn engine(trail_on_seek: TrailOnSeek) -> (PlaybackEngine, VirtualScheduler, CameraController) {
        let clock = VirtualScheduler::new();
        let camera = CameraController::new(CameraState {
            center: LatLng::new(50.0, 50.0),
            zoom: 9.0,
        });
        let settings = PlaybackSettings {
            base_interval: DEFAULT_BASE_INTERVAL,
            trail_on_seek,
        };
        let engine = PlaybackEngine::new(settings, Arc::new(clock.clone()), camera.clone());
        (engine, clock, camera)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn load_recenters_and_idles() {
        let (mut engine, _, camera) = engine(TrailOnSeek::Rebuild);
        let frame = engine.load(samples(3));
        assert_eq!(frame.status, PlaybackStatus::Idle);
        assert!(frame.current_index.is_none());
        assert!(frame.trail.is_empty());
        assert_eq!(camera.state().center, pos(0));
        assert_eq!(camera.state().zoom, 9.0);
    }

    #[test]
    fn three_samples_at_double_speed() {
        let (mut engine, clock, camera) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(3));
        engine.set_speed(2.0).unwrap();
        engine.play().unwrap();

        clock.advance(ms(124));
        assert_eq!(engine.frame().current_index, Some(0));

        clock.advance(ms(1));
        let frame = engine.frame();
        assert_eq!(frame.current_index, Some(1));
        assert_eq!(frame.trail, vec![pos(0), pos(1)]);
        assert_eq!(camera.state().center, pos(1));

        clock.advance(ms(125));
        let frame = engine.frame();
        assert_eq!(frame.current_index, Some(2));
        assert_eq!(frame.trail, vec![pos(0), pos(1), pos(2)]);
        assert_eq!(frame.status, PlaybackStatus::Completed);
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn runs_to_completion_with_growing_trail() {
        let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(12));
        engine.play().unwrap();

        for i in 1..12 {
            clock.advance(DEFAULT_BASE_INTERVAL);
            let frame = engine.frame();
            assert_eq!(frame.current_index, Some(i));
            assert_eq!(frame.trail.len(), i + 1);
        }
        assert_eq!(engine.status(), PlaybackStatus::Completed);

        clock.advance(Duration::from_secs(10));
        assert_eq!(engine.frame().current_index, Some(11));
    }

    #[test]
    fn unrepresentable_speed_leaves_session_usable() {
        let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(3));
        engine.play().unwrap();

        assert_eq!(
            engine.set_speed(1e-300).unwrap_err(),
            PlaybackError::InvalidSpeed(1e-300)
        );
        let frame = engine.frame();
        assert_eq!(frame.speed, 1.0);
        assert_eq!(frame.status, PlaybackStatus::Playing);

        clock.advance(ms(250));
        assert_eq!(engine.frame().current_index, Some(1));
        assert!(engine.pause().is_ok());
    }

    #[test]
    fn index_advance_scales_with_speed() {
        for speed in [1.0, 2.0, 4.0] {
            let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
            engine.load(samples(100));
            engine.set_speed(speed).unwrap();
            engine.play().unwrap();
            clock.advance(ms(1000));
            assert_eq!(engine.frame().current_index, Some(4 * speed as usize));
            assert_eq!(engine.frame().trail, (0..=4 * speed as usize).map(pos).collect::<Vec<_>>());
        }
    }

    #[test]
    fn speed_change_while_playing_rearms_ticker() {
        let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(100));
        engine.play().unwrap();
        clock.advance(ms(500));
        assert_eq!(engine.frame().current_index, Some(2));

        engine.set_speed(4.0).unwrap();
        assert_eq!(clock.active_timers(), 1);
        clock.advance(ms(250));
        assert_eq!(engine.frame().current_index, Some(6));
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(10));
        engine.play().unwrap();
        clock.advance(ms(750));

        let paused = engine.pause().unwrap();
        assert_eq!(paused.status, PlaybackStatus::Paused);
        assert_eq!(paused.current_index, Some(3));
        assert_eq!(paused.markers.iter().map(|m| m.index).collect::<Vec<_>>(), vec![0, 9]);

        clock.advance(Duration::from_secs(5));
        assert_eq!(engine.frame().current_index, Some(3));
        assert_eq!(clock.active_timers(), 0);

        engine.play().unwrap();
        clock.advance(ms(250));
        let frame = engine.frame();
        assert_eq!(frame.current_index, Some(4));
        assert_eq!(frame.trail.len(), 5);
    }

    #[test]
    fn seek_moves_marker_regardless_of_trail() {
        for policy in [TrailOnSeek::Rebuild, TrailOnSeek::Preserve] {
            let (mut engine, clock, camera) = engine(policy);
            engine.load(samples(20));
            engine.play().unwrap();
            clock.advance(ms(1000));

            for k in [0, 7, 19, 3] {
                let frame = engine.seek(k).unwrap();
                assert_eq!(frame.status, PlaybackStatus::Paused);
                assert_eq!(frame.current.unwrap().position(), pos(k));
                assert_eq!(camera.state().center, pos(k));
            }
            clock.advance(Duration::from_secs(3));
            assert_eq!(engine.frame().current_index, Some(3));
        }
    }

    #[test]
    fn seek_then_play_resumes_from_target() {
        let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(10));
        engine.seek(6).unwrap();
        engine.play().unwrap();
        clock.advance(ms(250));
        let frame = engine.frame();
        assert_eq!(frame.current_index, Some(7));
        assert_eq!(frame.trail, (0..=7).map(pos).collect::<Vec<_>>());
    }

    #[test]
    fn reset_stops_ticker_and_clears() {
        let (mut engine, clock, camera) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(10));
        engine.play().unwrap();
        clock.advance(ms(500));

        let frame = engine.reset().unwrap();
        assert_eq!(frame.status, PlaybackStatus::Idle);
        assert!(frame.trail.is_empty());
        assert!(frame.current_index.is_none());
        assert_eq!(camera.state().center, pos(0));
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn load_replaces_running_session() {
        let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(10));
        let first = engine.session_id();
        engine.play().unwrap();
        clock.advance(ms(500));

        engine.load(samples(4));
        assert_ne!(engine.session_id(), first);
        assert_eq!(clock.active_timers(), 0);
        clock.advance(ms(1000));
        assert_eq!(engine.status(), PlaybackStatus::Idle);
        assert_eq!(engine.frame().total_samples, 4);
    }

    #[test]
    fn invalid_calls_do_not_start_timers() {
        let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
        assert_eq!(engine.play().unwrap_err(), PlaybackError::NoSamples);
        assert_eq!(engine.reset().unwrap_err(), PlaybackError::NoSamples);
        assert!(!engine.is_loaded());

        engine.load(samples(2));
        assert!(engine.pause().is_err());
        assert!(engine.seek(2).is_err());
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn dropping_engine_cancels_ticker() {
        let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(10));
        engine.play().unwrap();
        drop(engine);
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn stale_ticker_cannot_advance_session() {
        let (mut engine, clock, _) = engine(TrailOnSeek::Rebuild);
        engine.load(samples(5));
        engine.play().unwrap();
        lock(&engine.session).run += 1;

        clock.advance(ms(1000));
        assert_eq!(lock(&engine.session).state(), PlaybackState::Playing { index: 0 });
        assert_eq!(clock.active_timers(), 0);
    }
}
