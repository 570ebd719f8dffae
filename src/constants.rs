//! Global constants shared by the layout, the data sources and the sink.

/// Portrait canvas the dashboard is composed on.
pub const CANVAS_WIDTH: u32 = 480;
pub const CANVAS_HEIGHT: u32 = 800;

/// Native (landscape) resolution of the Waveshare 7.5" V2 panel.
pub const PANEL_WIDTH: u32 = 800;
pub const PANEL_HEIGHT: u32 = 480;

/// Upper bound on agenda entries requested from the calendars.
pub const MAX_EVENTS: usize = 12;
/// Birthdays strictly inside (today, today + N days) are "upcoming".
pub const UPCOMING_BIRTHDAY_DAYS: i64 = 10;
/// Calendar window handed to the normalizer.
pub const LOOKAHEAD_DAYS: u32 = 14;

/// Stroke width of rules and tally ticks.
pub const LINE_WIDTH: u32 = 3;
/// Footer rule sits at this fraction of the canvas height.
pub const FOOTER_FRACTION: f32 = 0.85;
/// Horizontal distance from the time column to the summary column.
pub const SUMMARY_OFFSET: i32 = 60;
/// Time column text for events without a time of day.
pub const ALL_DAY_PLACEHOLDER: &str = " - : -";
/// Appended to agenda summaries cut at the right margin.
pub const ELLIPSIS: &str = "...";
pub const NO_TITLE: &str = "(No title)";

/// Footer icons and weather icons are scaled to fit this box.
pub const ICON_SIZE: u32 = 100;

pub const DEFAULT_EXPORT_PATH: &str = "EXPORT.bmp";
pub const DEFAULT_LOCALE: &str = "en_US";
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_PICTURES_DIR: &str = "pictures";
pub const DEFAULT_WEATHER_ICONS_DIR: &str = "pictures/weather";
pub const DEFAULT_FONTS_DIR: &str = "fonts";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_HOLIDAYS_API: &str = "https://canada-holidays.ca/api/v1";
pub const DEFAULT_PROVINCE: &str = "ON";
pub const DEFAULT_WEATHER_API: &str = "https://api.openweathermap.org";
pub const DEFAULT_WEATHER_UNITS: &str = "metric";
pub const GOOGLE_PEOPLE_API: &str = "https://people.googleapis.com/v1";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
