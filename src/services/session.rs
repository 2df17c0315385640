//! Interaction state machine driven by the display loop
//!
//! ```text
//!        set code               5s without taps (save)
//!   RUN ───────────▶ SET_VISIT ───────────────────────▶ RUN
//!    │
//!    └── quit code ──▶ QUIT
//! ```
//!
//! In SET_VISIT the top-right corner moves the visit one day earlier and the
//! bottom-right corner one day later. Every tap in that mode restarts the
//! inactivity timer.

use crate::domain::countdown::Screen;
use crate::domain::types::{AppState, CornerZone, Decision, Point};
use crate::domain::visit_date::VisitDateError;
use crate::infra::config::Config;
use crate::io::display::{PointerInput, Surface};
use crate::io::render::Layout;
use crate::services::gesture::GestureRecognizer;
use crate::services::visit_store::VisitDateStore;
use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub struct CountdownSession<Tz: TimeZone = Local> {
    state: AppState,
    recognizer: GestureRecognizer,
    store: VisitDateStore<Tz>,
    set_inactivity: Duration,
    /// Set-mode exit time; only meaningful in SET_VISIT
    set_deadline: Option<Instant>,
    /// In-memory visit differs from the last successful save
    unsaved: bool,
}

impl<Tz: TimeZone> CountdownSession<Tz> {
    pub fn new(config: &Config, store: VisitDateStore<Tz>, now: Instant) -> Self {
        Self {
            state: AppState::Run,
            recognizer: GestureRecognizer::new(config, now),
            store,
            set_inactivity: config.set_inactivity(),
            set_deadline: None,
            unsaved: false,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn store(&self) -> &VisitDateStore<Tz> {
        &self.store
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Route a batch of pointer-downs according to the current mode
    pub fn handle_taps(&mut self, points: &[Point], now: Instant) {
        for point in points {
            let zone = self.recognizer.classify(*point);
            match self.state {
                AppState::Run => self.recognizer.record_tap(zone, now),
                AppState::SetVisit => self.adjust_visit(zone, now),
                AppState::Quit => {}
            }
        }
    }

    /// Apply gesture decisions and timeouts; call once per frame after `handle_taps`.
    ///
    /// A failed save on leaving set mode is returned, but the session is
    /// already back in RUN and keeps the adjusted date for the next save.
    pub fn tick(&mut self, now: Instant) -> Result<AppState, VisitDateError> {
        match self.state {
            AppState::Run => match self.recognizer.evaluate(now) {
                Decision::MatchQuit => {
                    info!("quit_requested");
                    self.state = AppState::Quit;
                }
                Decision::MatchSet => self.enter_set_mode(now),
                Decision::IdleReset | Decision::Continue => {}
            },
            AppState::SetVisit => {
                if self.set_deadline.is_some_and(|deadline| now > deadline) {
                    self.leave_set_mode()?;
                }
            }
            AppState::Quit => {}
        }
        Ok(self.state)
    }

    /// What to draw for the current state
    pub fn screen(&self, local_now: NaiveDateTime) -> Screen {
        match self.state {
            AppState::SetVisit => Screen::visit_date(&self.store.visit()),
            AppState::Run | AppState::Quit => {
                Screen::countdown(self.store.days_until(local_now), local_now)
            }
        }
    }

    /// Drive the display until the quit code: draw, wait for taps, apply.
    ///
    /// Save failures are logged and retried on the next set-mode exit; display
    /// errors end the loop.
    pub fn run<D>(&mut self, display: &mut D, layout: &Layout, frame_interval: Duration) -> anyhow::Result<()>
    where
        D: Surface + PointerInput,
    {
        let started = Instant::now();
        info!(visit = %self.store.visit(), "display_loop_started");

        while self.state != AppState::Quit {
            let local_now = Utc::now().with_timezone(self.store.timezone()).naive_local();
            layout.render(display, &self.screen(local_now), started.elapsed())?;

            let taps = display.poll(frame_interval)?;
            let now = Instant::now();
            self.handle_taps(&taps, now);
            if let Err(e) = self.tick(now) {
                error!(error = %e, "visit_save_failed");
            }
        }

        if let Err(e) = self.flush() {
            error!(error = %e, "visit_save_failed");
        }
        info!(state = self.state.as_str(), "display_loop_finished");
        Ok(())
    }

    /// Save if an earlier save failed
    pub fn flush(&mut self) -> Result<(), VisitDateError> {
        if self.unsaved {
            self.store.save()?;
            self.unsaved = false;
        }
        Ok(())
    }

    fn enter_set_mode(&mut self, now: Instant) {
        self.state = AppState::SetVisit;
        self.set_deadline = Some(now + self.set_inactivity);
        info!(
            visit = %self.store.visit(),
            inactivity_secs = %self.set_inactivity.as_secs(),
            "set_mode_entered"
        );
    }

    fn adjust_visit(&mut self, zone: CornerZone, now: Instant) {
        self.set_deadline = Some(now + self.set_inactivity);

        let delta = match zone {
            CornerZone::TopRight => -1,
            CornerZone::BottomRight => 1,
            _ => {
                debug!(zone = %zone, "set_mode_tap_ignored");
                return;
            }
        };

        let visit = self.store.shift_days(delta);
        self.unsaved = true;
        info!(visit = %visit, delta = %delta, "visit_adjusted");
    }

    fn leave_set_mode(&mut self) -> Result<(), VisitDateError> {
        self.state = AppState::Run;
        self.set_deadline = None;
        self.recognizer.reset();
        info!(visit = %self.store.visit(), "set_mode_left");

        // Saved on every exit, changed or not
        self.store.save()?;
        self.unsaved = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::countdown::CountdownText;
    use crate::domain::visit_date::VisitDate;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const TOP_LEFT: Point = Point { x: 20.0, y: 20.0 };
    const TOP_RIGHT: Point = Point { x: 780.0, y: 20.0 };
    const BOTTOM_LEFT: Point = Point { x: 20.0, y: 460.0 };
    const BOTTOM_RIGHT: Point = Point { x: 780.0, y: 460.0 };
    const CENTER: Point = Point { x: 400.0, y: 240.0 };

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn at(day: u32, month: u32, year: i32, hour: u32, minute: u32) -> VisitDate {
        VisitDate::from_fields(day, month, year, hour, minute).unwrap()
    }

    fn create_session(visit: VisitDate, start: Instant) -> (CountdownSession<Utc>, TempDir) {
        let dir = tempdir().unwrap();
        let store = VisitDateStore::new(dir.path().join("visit.cfg"), Utc, visit);
        (CountdownSession::new(&Config::default(), store, start), dir)
    }

    /// Tap each point in its own frame, 100ms apart; returns the time of the last frame
    fn tap_frames(session: &mut CountdownSession<Utc>, points: &[Point], start: Instant) -> Instant {
        let mut now = start;
        for (i, point) in points.iter().enumerate() {
            now = start + millis(100 * i as u64);
            session.handle_taps(&[*point], now);
            session.tick(now).unwrap();
        }
        now
    }

    fn enter_set_mode(session: &mut CountdownSession<Utc>, start: Instant) -> Instant {
        tap_frames(session, &[TOP_LEFT, TOP_LEFT, TOP_LEFT, BOTTOM_RIGHT], start)
    }

    #[test]
    fn test_starts_in_run() {
        let start = Instant::now();
        let (session, _dir) = create_session(at(1, 1, 2025, 12, 0), start);
        assert_eq!(session.state(), AppState::Run);
    }

    #[test]
    fn test_set_code_enters_set_mode() {
        let start = Instant::now();
        let (mut session, _dir) = create_session(at(1, 1, 2025, 12, 0), start);

        enter_set_mode(&mut session, start);
        assert_eq!(session.state(), AppState::SetVisit);
        assert!(session.recognizer().sequence().is_empty());
    }

    #[test]
    fn test_quit_code_quits() {
        let start = Instant::now();
        let (mut session, _dir) = create_session(at(1, 1, 2025, 12, 0), start);

        tap_frames(&mut session, &[TOP_RIGHT, TOP_RIGHT, BOTTOM_RIGHT, BOTTOM_LEFT], start);
        assert_eq!(session.state(), AppState::Quit);
    }

    #[test]
    fn test_code_in_one_batch() {
        let start = Instant::now();
        let (mut session, _dir) = create_session(at(1, 1, 2025, 12, 0), start);

        session.handle_taps(&[TOP_LEFT, TOP_LEFT, TOP_LEFT, BOTTOM_RIGHT], start);
        assert_eq!(session.tick(start).unwrap(), AppState::SetVisit);
    }

    #[test]
    fn test_set_mode_adjusts_and_saves_after_inactivity() {
        let start = Instant::now();
        let (mut session, dir) = create_session(at(10, 6, 2024, 12, 0), start);

        let entered = enter_set_mode(&mut session, start);
        let last = tap_frames(
            &mut session,
            &[BOTTOM_RIGHT, BOTTOM_RIGHT, BOTTOM_RIGHT, TOP_RIGHT, CENTER],
            entered + millis(100),
        );
        assert_eq!(session.store().visit(), at(12, 6, 2024, 12, 0));
        assert!(session.has_unsaved_changes());

        // Still inside the 5s window from the last tap
        assert_eq!(session.tick(last + millis(5000)).unwrap(), AppState::SetVisit);
        assert_eq!(session.tick(last + millis(5001)).unwrap(), AppState::Run);
        assert!(!session.has_unsaved_changes());

        let saved = fs::read_to_string(dir.path().join("visit.cfg")).unwrap();
        assert_eq!(saved, "12,06,2024,12,00");
    }

    #[test]
    fn test_set_mode_times_out_without_taps() {
        let start = Instant::now();
        let (mut session, dir) = create_session(at(10, 6, 2024, 12, 0), start);

        let entered = enter_set_mode(&mut session, start);
        assert_eq!(session.tick(entered + millis(5001)).unwrap(), AppState::Run);
        assert_eq!(fs::read_to_string(dir.path().join("visit.cfg")).unwrap(), "10,06,2024,12,00");
    }

    #[test]
    fn test_set_mode_ignores_codes() {
        let start = Instant::now();
        let (mut session, _dir) = create_session(at(10, 6, 2024, 12, 0), start);

        let entered = enter_set_mode(&mut session, start);
        tap_frames(&mut session, &[TOP_RIGHT, TOP_RIGHT, BOTTOM_RIGHT, BOTTOM_LEFT], entered + millis(100));
        assert_eq!(session.state(), AppState::SetVisit);
        // -1, -1, +1
        assert_eq!(session.store().visit(), at(9, 6, 2024, 12, 0));
    }

    #[test]
    fn test_failed_save_returns_to_run_and_keeps_date() {
        let start = Instant::now();
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = VisitDateStore::new(blocker.join("visit.cfg"), Utc, at(10, 6, 2024, 12, 0));
        let mut session = CountdownSession::new(&Config::default(), store, start);

        let entered = enter_set_mode(&mut session, start);
        tap_frames(&mut session, &[BOTTOM_RIGHT], entered + millis(100));

        let result = session.tick(entered + millis(6000));
        assert!(matches!(result, Err(VisitDateError::Io { .. })));
        assert_eq!(session.state(), AppState::Run);
        assert_eq!(session.store().visit(), at(11, 6, 2024, 12, 0));
        assert!(session.has_unsaved_changes());
        assert!(session.flush().is_err());
    }

    #[test]
    fn test_screens_follow_state() {
        let start = Instant::now();
        let (mut session, _dir) = create_session(at(20, 6, 2024, 12, 0), start);
        let local_now = at(10, 6, 2024, 9, 30).as_naive();

        match session.screen(local_now) {
            Screen::Countdown { headline, clock } => {
                assert_eq!(headline, CountdownText::Days(10));
                assert_eq!(clock, "Mon 10 Jun 09:30");
            }
            other => panic!("unexpected screen {:?}", other),
        }

        enter_set_mode(&mut session, start);
        assert_eq!(session.screen(local_now), Screen::VisitDate { label: "Thu 20 Jun".to_string() });
    }

    #[test]
    fn test_run_mode_taps_do_not_shift() {
        let start = Instant::now();
        let (mut session, _dir) = create_session(at(20, 6, 2024, 12, 0), start);

        tap_frames(&mut session, &[TOP_RIGHT, BOTTOM_RIGHT, CENTER], start);
        assert_eq!(session.store().visit(), at(20, 6, 2024, 12, 0));
        assert!(!session.has_unsaved_changes());
    }
}
