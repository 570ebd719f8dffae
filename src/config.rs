use serde::{Deserialize, Serialize};
use chrono::Locale;
use chrono_tz::Tz;
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::constants::*;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
///
/// Every field is optional so a YAML file only needs to name what it
/// changes; the accessors below supply the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// General options
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub timezone: Option<String>,      // IANA, e.g. "America/Toronto"
    pub locale: Option<String>,        // e.g. "en_US", "de_DE"
    pub max_events: Option<usize>,
    pub lookahead_days: Option<u32>,
    pub export_path: Option<PathBuf>,
    pub rotate_image: Option<bool>,
    pub http_timeout_secs: Option<u64>,

    /// ICS feed URLs
    pub calendars: Option<Vec<String>>,
    pub contacts: Option<ContactsConfig>,
    pub holidays: Option<HolidaysConfig>,
    pub weather: Option<WeatherConfig>,
    pub assets: Option<AssetsConfig>,
    pub fonts: Option<FontsConfig>,
    pub display: Option<DisplayConfig>,
}

/// At most one backend is used; google wins when both are present.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContactsConfig {
    pub google: Option<GoogleContactsConfig>,
    pub carddav: Option<CardDavConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleContactsConfig {
    /// contact group id, e.g. "5a1b2c3d" (without the `contactGroups/` prefix)
    pub group: String,
    pub token_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDavConfig {
    /// address book collection URL
    pub url: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HolidaysConfig {
    pub api_url: Option<String>,
    pub province: Option<String>,  // e.g. "ON"
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub city: Option<String>,      // "Toronto,CA"
    pub units: Option<String>,     // metric | imperial | standard
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssetsConfig {
    pub pictures: Option<PathBuf>,
    pub weather_icons: Option<PathBuf>,
    /// pre-printed background, must match the canvas size
    pub base_image: Option<PathBuf>,
    pub icon_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FontsConfig {
    pub kind: Option<FontKind>,
    pub dir: Option<PathBuf>,
    pub heading: Option<String>,   // Roboto-Black.ttf
    pub body: Option<String>,      // Poppins-Regular.ttf
    pub body_bold: Option<String>, // Poppins-Bold.ttf
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontKind {
    #[default]
    Builtin,
    Truetype,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub driver: Option<DriverKind>, // <- strongly-typed driver selection
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bus: Option<BusConfig>,     // <- spi wiring
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    pub spi: String,        // e.g. "/dev/spidev0.0"
    pub speed_hz: Option<u32>,
    pub dc_pin: u64,        // BCM numbering
    pub rst_pin: u64,
    pub busy_pin: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[default]
    Headless,
    Epd7in5,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "dayboard", about = "dayboard - the day at a glance", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub timezone: Option<String>,
    #[arg(long)]
    pub locale: Option<String>,
    /// where the rendered BMP is written
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub export: Option<PathBuf>,
    /// rotate the image 180 degrees before it goes to the panel
    #[arg(long, action = ArgAction::Set)]
    pub rotate: Option<bool>,
    /// render and export only, never touch the panel
    #[arg(long, action = ArgAction::SetTrue)]
    pub headless: bool,
    /// blank the panel and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub clear: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read YAML, merge, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    let cfg = load_from(cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Layering without side effects: defaults, file, CLI, validation.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/dayboard/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/dayboard/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/dayboard.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["dayboard.yaml", "config.yaml", "config/dayboard.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()         { dst.log_level = src.log_level; }
    if src.timezone.is_some()          { dst.timezone = src.timezone; }
    if src.locale.is_some()            { dst.locale = src.locale; }
    if src.max_events.is_some()        { dst.max_events = src.max_events; }
    if src.lookahead_days.is_some()    { dst.lookahead_days = src.lookahead_days; }
    if src.export_path.is_some()       { dst.export_path = src.export_path; }
    if src.rotate_image.is_some()      { dst.rotate_image = src.rotate_image; }
    if src.http_timeout_secs.is_some() { dst.http_timeout_secs = src.http_timeout_secs; }
    if src.calendars.is_some()         { dst.calendars = src.calendars; }
    // credentials travel as a unit
    if src.contacts.is_some()          { dst.contacts = src.contacts; }

    match (&mut dst.holidays, src.holidays) {
        (None, Some(c)) => dst.holidays = Some(c),
        (Some(d), Some(s)) => {
            if s.api_url.is_some()  { d.api_url = s.api_url; }
            if s.province.is_some() { d.province = s.province; }
        }
        _ => {}
    }
    match (&mut dst.weather, src.weather) {
        (None, Some(c)) => dst.weather = Some(c),
        (Some(d), Some(s)) => {
            if s.api_key.is_some()  { d.api_key = s.api_key; }
            if s.city.is_some()     { d.city = s.city; }
            if s.units.is_some()    { d.units = s.units; }
            if s.base_url.is_some() { d.base_url = s.base_url; }
        }
        _ => {}
    }
    match (&mut dst.assets, src.assets) {
        (None, Some(c)) => dst.assets = Some(c),
        (Some(d), Some(s)) => {
            if s.pictures.is_some()      { d.pictures = s.pictures; }
            if s.weather_icons.is_some() { d.weather_icons = s.weather_icons; }
            if s.base_image.is_some()    { d.base_image = s.base_image; }
            if s.icon_size.is_some()     { d.icon_size = s.icon_size; }
        }
        _ => {}
    }
    match (&mut dst.fonts, src.fonts) {
        (None, Some(c)) => dst.fonts = Some(c),
        (Some(d), Some(s)) => {
            if s.kind.is_some()      { d.kind = s.kind; }
            if s.dir.is_some()       { d.dir = s.dir; }
            if s.heading.is_some()   { d.heading = s.heading; }
            if s.body.is_some()      { d.body = s.body; }
            if s.body_bold.is_some() { d.body_bold = s.body_bold; }
        }
        _ => {}
    }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.driver.is_some() { dst.driver = src.driver; }
    if src.width.is_some()  { dst.width = src.width; }
    if src.height.is_some() { dst.height = src.height; }
    if src.bus.is_some()    { dst.bus = src.bus; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.debug               { cfg.log_level = Some("debug".into()); }
    if cli.timezone.is_some()  { cfg.timezone = cli.timezone.clone(); }
    if cli.locale.is_some()    { cfg.locale = cli.locale.clone(); }
    if cli.export.is_some()    { cfg.export_path = cli.export.clone(); }
    if cli.rotate.is_some()    { cfg.rotate_image = cli.rotate; }

    if cli.headless {
        cfg.display
            .get_or_insert_with(DisplayConfig::default)
            .driver = Some(DriverKind::Headless);
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(tz) = cfg.timezone.as_deref() {
        tz.parse::<Tz>().map_err(|_| {
            ConfigError::Validation(format!("unknown timezone '{}'", tz))
        })?;
    }
    if let Some(locale) = cfg.locale.as_deref() {
        Locale::try_from(locale).map_err(|_| {
            ConfigError::Validation(format!("unknown locale '{}'", locale))
        })?;
    }
    if cfg.max_events == Some(0) {
        return Err(ConfigError::Validation("max_events must be > 0".into()));
    }
    if cfg.lookahead_days == Some(0) {
        return Err(ConfigError::Validation("lookahead_days must be > 0".into()));
    }
    if cfg.http_timeout_secs == Some(0) {
        return Err(ConfigError::Validation("http_timeout_secs must be > 0".into()));
    }
    if let Some(units) = cfg.weather.as_ref().and_then(|w| w.units.as_deref()) {
        match units {
            "metric" | "imperial" | "standard" => {},
            _ => return Err(ConfigError::Validation("weather units must be metric|imperial|standard".into()))
        }
    }
    if cfg.assets.as_ref().and_then(|a| a.icon_size) == Some(0) {
        return Err(ConfigError::Validation("assets icon_size must be > 0".into()));
    }
    if let Some(display) = cfg.display.as_ref() {
        if display.width == Some(0) || display.height == Some(0) {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }
        if display.driver == Some(DriverKind::Epd7in5) && display.bus.is_none() {
            return Err(ConfigError::Validation("epd7in5 driver requires a display bus".into()));
        }
    }
    if let Some(fonts) = cfg.fonts.as_ref() {
        if fonts.kind == Some(FontKind::Truetype)
            && (fonts.heading.is_none() || fonts.body.is_none() || fonts.body_bold.is_none())
        {
            return Err(ConfigError::Validation(
                "truetype fonts need heading, body and body_bold files".into(),
            ));
        }
    }
    Ok(())
}

impl Config {
    /// Configured zone, else `$TZ`, else UTC
    pub fn timezone(&self) -> Tz {
        self.timezone
            .clone()
            .or_else(|| std::env::var("TZ").ok())
            .and_then(|s| s.parse::<Tz>().ok())
            .unwrap_or(Tz::UTC)
    }

    pub fn locale(&self) -> Locale {
        self.locale
            .as_deref()
            .and_then(|s| Locale::try_from(s).ok())
            .unwrap_or(Locale::en_US)
    }

    pub fn max_events(&self) -> usize {
        self.max_events.unwrap_or(MAX_EVENTS)
    }

    pub fn lookahead_days(&self) -> u32 {
        self.lookahead_days.unwrap_or(LOOKAHEAD_DAYS)
    }

    pub fn export_path(&self) -> PathBuf {
        self.export_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH))
    }

    pub fn rotate_image(&self) -> bool {
        self.rotate_image.unwrap_or(false)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    pub fn calendars(&self) -> &[String] {
        self.calendars.as_deref().unwrap_or(&[])
    }

    pub fn pictures_dir(&self) -> PathBuf {
        self.assets
            .as_ref()
            .and_then(|a| a.pictures.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PICTURES_DIR))
    }

    pub fn weather_icons_dir(&self) -> PathBuf {
        self.assets
            .as_ref()
            .and_then(|a| a.weather_icons.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WEATHER_ICONS_DIR))
    }

    pub fn base_image(&self) -> Option<&Path> {
        self.assets.as_ref().and_then(|a| a.base_image.as_deref())
    }

    pub fn icon_size(&self) -> u32 {
        self.assets.as_ref().and_then(|a| a.icon_size).unwrap_or(ICON_SIZE)
    }

    pub fn driver_kind(&self) -> DriverKind {
        self.display.as_ref().and_then(|d| d.driver).unwrap_or_default()
    }

    /// Native panel size as (width, height)
    pub fn panel_size(&self) -> (u32, u32) {
        let d = self.display.as_ref();
        (
            d.and_then(|d| d.width).unwrap_or(PANEL_WIDTH),
            d.and_then(|d| d.height).unwrap_or(PANEL_HEIGHT),
        )
    }
}
