/*
 *  tests/dashboard_integration.rs
 *
 *  Integration tests: feed -> normaliser -> compositor -> sink
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 */

use chrono::{Duration, Locale, NaiveDate, TimeZone};
use chrono_tz::America::Toronto;
use chrono_tz::Tz;
use embedded_graphics::pixelcolor::BinaryColor;

use dayboard::assets::MemoryIconStore;
use dayboard::constants::{CANVAS_HEIGHT, CANVAS_WIDTH, PANEL_HEIGHT, PANEL_WIDTH};
use dayboard::display::{compose, sink, Bitmap, DashboardInputs, HeadlessDriver, LayoutConfig, Region};
use dayboard::fonts::MonoTypography;
use dayboard::icons::{select_icons, CAKE, CAKE_LIT};
use dayboard::sources::birthdays::{classify, BirthdayEntry};
use dayboard::sources::calendar::{events_in_window, normalize, EventWindow};
use dayboard::sources::{BirthdayResult, CalendarEvent, WeatherCondition, WeatherSnapshot};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn layout() -> LayoutConfig {
    LayoutConfig::for_canvas(CANVAS_WIDTH, CANVAS_HEIGHT)
}

fn timed(tz: Tz, day: NaiveDate, hour: u32, summary: &str) -> CalendarEvent {
    let start = tz
        .from_local_datetime(&day.and_hms_opt(hour, 0, 0).unwrap())
        .unwrap();
    CalendarEvent {
        start,
        end: start + Duration::hours(1),
        all_day: false,
        summary: summary.to_string(),
    }
}

fn icons() -> MemoryIconStore {
    let cake = Bitmap::new(48, 48, BinaryColor::On);
    MemoryIconStore::new()
        .with(CAKE, cake.clone())
        .with(CAKE_LIT, cake.clone())
        .with("Christmas_tree_icon", cake.clone())
        .with("Halloween_icon", cake.clone())
        .with("Canada_day_icon", cake)
}

fn weather() -> WeatherSnapshot {
    WeatherSnapshot {
        temp: 21,
        feels_like: 23,
        temp_min: 15,
        temp_max: 26,
        condition: WeatherCondition::Rain,
        description: "light rain".into(),
        icon_code: "10".into(),
        icon: Some(Bitmap::new(100, 100, BinaryColor::On)),
        rain: 2,
        snow: 0,
        cloud_pct: 40,
    }
}

const FEED: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
BEGIN:VEVENT\r
UID:a\r
DTSTART;TZID=America/Toronto:20250701T140000\r
DTEND;TZID=America/Toronto:20250701T150000\r
SUMMARY:Fireworks planning\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:b\r
DTSTART:20250701T120000Z\r
DTEND:20250701T130000Z\r
SUMMARY:Early call\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:c\r
DTSTART;VALUE=DATE:20250627\r
DTEND;VALUE=DATE:20250701\r
SUMMARY:Cottage weekend\r
END:VEVENT\r
BEGIN:VEVENT\r
UID:d\r
DTSTART;VALUE=DATE:20250703\r
DTEND;VALUE=DATE:20250704\r
SUMMARY:Day off\r
END:VEVENT\r
END:VCALENDAR\r
";

#[test]
fn test_finished_multi_day_event_is_excluded() {
    let today = date(2025, 7, 1);
    let window = EventWindow::from_today(today, Toronto, 14);
    let events = events_in_window(FEED, Toronto, &window).unwrap();
    assert_eq!(events.len(), 4);

    let normalized = normalize(events, window.start, 3);
    let names: Vec<&str> = normalized.iter().map(|e| e.summary.as_str()).collect();
    // the weekend ended at midnight and does not use one of the three slots
    assert_eq!(names, vec!["Early call", "Fireworks planning", "Day off"]);
}

#[test]
fn test_agenda_order_and_footer_bound() {
    let today = date(2025, 7, 1);
    let events: Vec<CalendarEvent> = (0..40)
        .map(|i| timed(Toronto, today + Duration::days(i / 4), 8 + (i % 4) as u32, &format!("Event {i}")))
        .collect();
    let inputs = DashboardInputs {
        events,
        ..DashboardInputs::empty(today, Locale::en_US)
    };

    let c = compose(&inputs, &layout(), &MonoTypography, None);
    let agenda = c.report.span(Region::Agenda).unwrap();
    let footer = c.report.span(Region::Footer).unwrap();

    assert!(agenda.bottom <= footer.top);
    assert!(c.report.agenda_dropped > 0);
    assert_eq!(c.report.agenda_rows + c.report.agenda_dropped, 40);
}

#[test]
fn test_empty_birthdays_leave_exact_footer() {
    let today = date(2025, 3, 4);
    let store = icons();
    let inputs = DashboardInputs {
        icons: select_icons(today, None, false, &store),
        ..DashboardInputs::empty(today, Locale::en_US)
    };
    let c = compose(&inputs, &layout(), &MonoTypography, None);
    let footer = c.report.span(Region::Footer).unwrap();
    let l = layout();

    assert_eq!(footer.height() as u32, l.pad_top + 48 + l.pad_top);
    assert_eq!(c.canvas.ink_in_rows(footer.bottom as u32, CANVAS_HEIGHT), 0);
}

#[test]
fn test_leap_day_birthday_on_feb_28() {
    let entries = vec![BirthdayEntry::new("Leap", 2, 29), BirthdayEntry::new("Other", 3, 1)];
    let result = classify(&entries, date(2027, 2, 28));
    assert_eq!(result.today, vec!["Leap"]);
    assert_eq!(result.upcoming, vec![("Other".to_string(), 1)]);
    assert_eq!(result.upcoming_labels(), vec!["Other (1st)"]);
}

#[test]
fn test_selector_christmas_and_halloween() {
    let store = icons();
    let xmas: Vec<String> = select_icons(date(2025, 12, 25), Some("Christmas Day"), false, &store)
        .into_iter()
        .map(|i| i.key)
        .collect();
    assert_eq!(xmas, vec![CAKE, "Christmas_tree_icon"]);

    let halloween: Vec<String> = select_icons(date(2025, 10, 31), None, true, &store)
        .into_iter()
        .map(|i| i.key)
        .collect();
    assert_eq!(halloween, vec![CAKE_LIT, "Halloween_icon"]);
}

#[test]
fn test_weather_absence_shifts_agenda_up() {
    let today = date(2025, 7, 1);
    let base = DashboardInputs {
        events: vec![timed(Toronto, today, 9, "Standup")],
        ..DashboardInputs::empty(today, Locale::en_US)
    };
    let with_weather = DashboardInputs {
        weather: Some(weather()),
        ..base.clone()
    };

    let a = compose(&with_weather, &layout(), &MonoTypography, None);
    let b = compose(&base, &layout(), &MonoTypography, None);
    let shift = a.report.span(Region::Weather).unwrap().height();
    assert!(shift > 100);
    assert_eq!(
        b.report.span(Region::Agenda).unwrap().top,
        a.report.span(Region::Agenda).unwrap().top - shift
    );
}

#[test]
fn test_full_pass_to_headless_panel() {
    let today = date(2025, 7, 1);
    let store = icons();
    let birthdays = BirthdayResult {
        today: vec!["Ann".into()],
        upcoming: vec![("Bob".into(), 5)],
    };
    let inputs = DashboardInputs {
        events: vec![timed(Toronto, today, 9, "Standup"), timed(Toronto, today + Duration::days(1), 10, "Dentist")],
        icons: select_icons(today, Some("Canada Day"), birthdays.has_today(), &store),
        birthdays,
        weather: Some(weather()),
        ..DashboardInputs::empty(today, Locale::en_US)
    };

    let first = compose(&inputs, &layout(), &MonoTypography, None);
    let second = compose(&inputs, &layout(), &MonoTypography, None);
    assert_eq!(first.canvas, second.canvas);

    let path = std::env::temp_dir().join(format!("dayboard-it-{}.bmp", std::process::id()));
    sink::save(&first.canvas, &path).unwrap();
    assert!(path.exists());

    let mut canvas = first.canvas.clone();
    sink::maybe_rotate_180(&mut canvas, true);
    sink::maybe_rotate_180(&mut canvas, true);
    assert_eq!(canvas, first.canvas);

    let mut driver = HeadlessDriver::new(PANEL_WIDTH, PANEL_HEIGHT);
    let state = driver.state();
    sink::send_to_display(&canvas, &mut driver).unwrap();
    let s = state.lock().unwrap();
    assert_eq!(s.frame_count, 1);
    assert_eq!(s.last_frame.as_ref().map(Vec::len), Some(800 / 8 * 480));
    let _ = std::fs::remove_file(&path);
}
