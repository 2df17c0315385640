//! End-to-end tests: scripted taps through the display loop

use chrono::{NaiveDate, TimeDelta, Utc};
use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::time::{Duration, Instant};
use tempfile::{tempdir, NamedTempFile};
use visit_countdown::domain::{AppState, CountdownText, Point, SurfaceSize, VisitDate};
use visit_countdown::infra::config::Rgb;
use visit_countdown::infra::Config;
use visit_countdown::io::{Layout, PointerInput, Surface};
use visit_countdown::services::{CountdownSession, VisitDateStore};

const TOP_LEFT: Point = Point { x: 20.0, y: 20.0 };
const TOP_RIGHT: Point = Point { x: 780.0, y: 20.0 };
const BOTTOM_LEFT: Point = Point { x: 20.0, y: 460.0 };
const BOTTOM_RIGHT: Point = Point { x: 780.0, y: 460.0 };

const QUIT: [Point; 4] = [TOP_RIGHT, TOP_RIGHT, BOTTOM_RIGHT, BOTTOM_LEFT];
const SET: [Point; 4] = [TOP_LEFT, TOP_LEFT, TOP_LEFT, BOTTOM_RIGHT];

/// Display that hands out one batch of taps per frame and records what was drawn
struct ScriptedDisplay {
    batches: VecDeque<Vec<Point>>,
    frames: Vec<Vec<String>>,
    current: Vec<String>,
}

impl ScriptedDisplay {
    fn new(batches: Vec<Vec<Point>>) -> Self {
        Self { batches: batches.into(), frames: Vec::new(), current: Vec::new() }
    }

    fn drew(&self, text: &str) -> bool {
        self.frames.iter().flatten().any(|t| t == text)
    }
}

impl Surface for ScriptedDisplay {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(800, 480)
    }

    fn fill(&mut self, _color: Rgb) {
        self.current.clear();
    }

    fn text_width(&self, text: &str, font_px: u32) -> u32 {
        text.chars().count() as u32 * font_px / 2
    }

    fn draw_text(&mut self, text: &str, _at: Point, _font_px: u32, _color: Rgb) {
        self.current.push(text.to_string());
    }

    fn present(&mut self) -> anyhow::Result<()> {
        self.frames.push(std::mem::take(&mut self.current));
        Ok(())
    }
}

impl PointerInput for ScriptedDisplay {
    fn poll(&mut self, _timeout: Duration) -> anyhow::Result<Vec<Point>> {
        // Keep frames on distinct instants
        std::thread::sleep(Duration::from_millis(2));
        match self.batches.pop_front() {
            Some(batch) => Ok(batch),
            None => anyhow::bail!("tap script exhausted"),
        }
    }
}

fn days_after(today: NaiveDate, days: i64) -> VisitDate {
    VisitDate::start_of_day(today + TimeDelta::days(days))
}

fn config_with_instant_set_exit() -> (Config, NamedTempFile) {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[set_mode]\ninactivity_secs = 0\n").unwrap();
    temp_file.flush().unwrap();
    (Config::from_file(temp_file.path()).unwrap(), temp_file)
}

#[test]
fn test_quit_code_ends_loop_after_countdown_frame() {
    let dir = tempdir().unwrap();
    let config = Config::default();
    let today = Utc::now().date_naive();
    let store = VisitDateStore::new(dir.path().join("visit.cfg"), Utc, days_after(today, 10));
    let mut session = CountdownSession::new(&config, store, Instant::now());
    let mut display = ScriptedDisplay::new(vec![vec![], QUIT.to_vec()]);

    session.run(&mut display, &Layout::new(&config), config.frame_interval()).unwrap();

    assert_eq!(session.state(), AppState::Quit);
    assert_eq!(display.frames.len(), 2);
    // The loop reads its own clock; one day less if UTC midnight passed since `today`
    let expected = (10 - (Utc::now().date_naive() - today).num_days()).to_string();
    assert_eq!(display.frames[0][..2], [expected, " days".to_string()]);
    // Quitting without changes writes nothing
    assert!(!dir.path().join("visit.cfg").exists());
}

#[test]
fn test_set_mode_round_trip_through_loop() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("visit.cfg");
    let (config, _config_file) = config_with_instant_set_exit();
    let today = Utc::now().date_naive();
    let visit = days_after(today, 3);
    let store = VisitDateStore::new(&path, Utc, visit);
    let mut session = CountdownSession::new(&config, store, Instant::now());

    let mut display = ScriptedDisplay::new(vec![
        SET.to_vec(),
        vec![BOTTOM_RIGHT, BOTTOM_RIGHT],
        vec![],
        QUIT.to_vec(),
    ]);
    session.run(&mut display, &Layout::new(&config), config.frame_interval()).unwrap();

    let moved = days_after(today, 5);
    let label = moved.as_naive().format("%a %d %b").to_string();
    assert!(display.drew(&label), "set screen never showed {}", label);
    assert_eq!(fs::read_to_string(&path).unwrap(), moved.to_string());

    // Reloading sees the saved date
    let reloaded = VisitDateStore::load(&path, Utc).unwrap();
    assert_eq!(reloaded.visit(), moved);
}

#[test]
fn test_headline_for_near_visits() {
    let now = Utc::now().naive_utc();
    let today = now.date();
    let dir = tempdir().unwrap();

    // Earlier today is still "today"
    let store = VisitDateStore::new(dir.path().join("a.cfg"), Utc, days_after(today, 0));
    assert_eq!(CountdownText::from_days(store.days_until(now)), CountdownText::Today);

    let store = VisitDateStore::new(dir.path().join("b.cfg"), Utc, days_after(today, 1));
    assert_eq!(CountdownText::from_days(store.days_until(now)), CountdownText::OneDay);

    let store = VisitDateStore::new(dir.path().join("c.cfg"), Utc, days_after(today, -4));
    assert_eq!(CountdownText::from_days(store.days_until(now)), CountdownText::Today);
}

#[test]
fn test_startup_with_missing_file_then_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("visit.cfg");
    let fallback = days_after(Utc::now().date_naive(), 0);

    let store = VisitDateStore::load_or_default(&path, Utc, fallback).unwrap();
    assert_eq!(store.visit(), fallback);
    assert!(!path.exists());

    fs::write(&path, "not a date\n").unwrap();
    assert!(VisitDateStore::load_or_default(&path, Utc, fallback).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), "not a date\n");
}

#[test]
fn test_display_error_ends_loop() {
    let dir = tempdir().unwrap();
    let config = Config::default();
    let store = VisitDateStore::new(dir.path().join("visit.cfg"), Utc, days_after(Utc::now().date_naive(), 2));
    let mut session = CountdownSession::new(&config, store, Instant::now());
    let mut display = ScriptedDisplay::new(vec![vec![TOP_LEFT]]);

    let result = session.run(&mut display, &Layout::new(&config), config.frame_interval());
    assert!(result.is_err());
    assert_eq!(session.state(), AppState::Run);
}
