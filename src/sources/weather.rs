/*
 *  sources/weather.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Today's weather from OpenWeatherMap (geocoding + One Call 3.0)
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::{debug, error, info, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::assets::{DirIconStore, Fit, IconStore};
use crate::config::Config;
use crate::constants::{DEFAULT_WEATHER_API, DEFAULT_WEATHER_UNITS, ICON_SIZE};
use crate::display::canvas::Bitmap;
use crate::sources::{check_status, SourceError};

/// Geocoding candidates requested; the first one is used
const CITY_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherCondition {
    Rain,
    Snow,
    Clouds,
    Other(String),
}

impl From<&str> for WeatherCondition {
    fn from(main: &str) -> Self {
        match main {
            "Rain" => WeatherCondition::Rain,
            "Snow" => WeatherCondition::Snow,
            "Clouds" => WeatherCondition::Clouds,
            other => WeatherCondition::Other(other.to_string()),
        }
    }
}

/// What the weather block shows; every number already rounded
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub temp: i32,
    pub feels_like: i32,
    pub temp_min: i32,
    pub temp_max: i32,
    pub condition: WeatherCondition,
    pub description: String,
    /// two character icon code, day/night suffix removed ("10")
    pub icon_code: String,
    pub icon: Option<Bitmap>,
    pub rain: i32,
    pub snow: i32,
    pub cloud_pct: i32,
}

impl WeatherSnapshot {
    /// "light rain (3mm)", "snow (12)", "broken clouds (75%)", "clear sky"
    pub fn condition_line(&self) -> String {
        match self.condition {
            WeatherCondition::Rain => format!("{} ({}mm)", self.description, self.rain),
            WeatherCondition::Snow => format!("{} ({})", self.description, self.snow),
            WeatherCondition::Clouds => format!("{} ({}%)", self.description, self.cloud_pct),
            WeatherCondition::Other(_) => self.description.clone(),
        }
    }

    pub fn temperature_line(&self) -> String {
        format!("{}° feels like {}°", self.temp, self.feels_like)
    }

    pub fn range_line(&self) -> String {
        format!("H {}° L {}°", self.temp_max, self.temp_min)
    }
}

#[derive(Debug, Deserialize)]
struct GeoHit {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OneCall {
    current: Current,
    daily: Vec<Daily>,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp: f64,
    feels_like: f64,
}

#[derive(Debug, Deserialize)]
struct Daily {
    temp: DailyTemp,
    #[serde(default)]
    weather: Vec<Conditions>,
    #[serde(default)]
    rain: f64,
    #[serde(default)]
    snow: f64,
    #[serde(default)]
    clouds: f64,
}

#[derive(Debug, Deserialize)]
struct DailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct Conditions {
    main: String,
    description: String,
    icon: String,
}

/// Decode a One Call response into a snapshot without an icon bitmap
fn parse_onecall(body: &str) -> Result<WeatherSnapshot, SourceError> {
    let data: OneCall = serde_json::from_str(body)?;
    let today = data
        .daily
        .first()
        .ok_or_else(|| SourceError::MissingData("no daily forecast".into()))?;
    let conditions = today
        .weather
        .first()
        .ok_or_else(|| SourceError::MissingData("no weather conditions".into()))?;

    Ok(WeatherSnapshot {
        temp: data.current.temp.round() as i32,
        feels_like: data.current.feels_like.round() as i32,
        temp_min: today.temp.min.round() as i32,
        temp_max: today.temp.max.round() as i32,
        condition: WeatherCondition::from(conditions.main.as_str()),
        description: conditions.description.clone(),
        icon_code: conditions.icon.chars().take(2).collect(),
        icon: None,
        rain: today.rain.round() as i32,
        snow: today.snow.round() as i32,
        cloud_pct: today.clouds.round() as i32,
    })
}

pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    city: String,
    units: String,
    icons: DirIconStore,
}

impl WeatherClient {
    /// `None` when no api key or city is configured
    pub fn from_config(config: &Config, client: &Client) -> Option<Self> {
        let w = config.weather.as_ref()?;
        let (Some(api_key), Some(city)) = (w.api_key.clone(), w.city.clone()) else {
            debug!("Weather not configured");
            return None;
        };
        Some(Self {
            client: client.clone(),
            base_url: w
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_WEATHER_API.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            city,
            units: w.units.clone().unwrap_or_else(|| DEFAULT_WEATHER_UNITS.to_string()),
            icons: DirIconStore::new(config.weather_icons_dir(), Fit::Exact(ICON_SIZE, ICON_SIZE)),
        })
    }

    /// Absent on any failure; a missing icon file only drops the icon
    pub async fn get_weather(&self) -> Option<WeatherSnapshot> {
        info!("Retrieving weather for {}", self.city);
        match self.fetch().await {
            Ok(mut snapshot) => {
                snapshot.icon = self.icons.icon(&snapshot.icon_code);
                if snapshot.icon.is_none() {
                    warn!("No weather icon for code {}", snapshot.icon_code);
                }
                info!("Weather: {}, {}", snapshot.temperature_line(), snapshot.condition_line());
                Some(snapshot)
            }
            Err(e) => {
                error!("Weather lookup failed: {}", e);
                None
            }
        }
    }

    async fn fetch(&self) -> Result<WeatherSnapshot, SourceError> {
        let limit = CITY_LIMIT.to_string();
        let resp = self
            .client
            .get(format!("{}/geo/1.0/direct", self.base_url))
            .query(&[("q", self.city.as_str()), ("limit", limit.as_str()), ("appid", self.api_key.as_str())])
            .send()
            .await?;
        let hits: Vec<GeoHit> = check_status(resp)?.json().await?;
        let hit = hits
            .first()
            .ok_or_else(|| SourceError::MissingData(format!("city {} not found", self.city)))?;
        debug!("{} is at {:.4},{:.4}", self.city, hit.lat, hit.lon);

        let (lat, lon) = (hit.lat.to_string(), hit.lon.to_string());
        let resp = self
            .client
            .get(format!("{}/data/3.0/onecall", self.base_url))
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("exclude", "minutely,hourly,alerts"),
                ("units", self.units.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let body = check_status(resp)?.text().await?;
        parse_onecall(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(main: &str, desc: &str, extra: &str) -> String {
        format!(
            r#"{{"lat":43.7,"lon":-79.4,"timezone":"America/Toronto",
            "current":{{"dt":1,"temp":3.6,"feels_like":-0.5,"clouds":40}},
            "daily":[{{"dt":1,"temp":{{"day":4.0,"min":-2.4,"max":5.5}},
                "weather":[{{"id":500,"main":"{main}","description":"{desc}","icon":"10d"}}],
                "clouds":75{extra}}}]}}"#
        )
    }

    #[test]
    fn test_parse_rounds_everything() {
        let snap = parse_onecall(&body("Rain", "light rain", r#","rain":2.6"#)).unwrap();
        assert_eq!((snap.temp, snap.feels_like), (4, -1));
        assert_eq!((snap.temp_min, snap.temp_max), (-2, 6));
        assert_eq!(snap.rain, 3);
        assert_eq!(snap.snow, 0);
        assert_eq!(snap.cloud_pct, 75);
        assert_eq!(snap.icon_code, "10");
        assert_eq!(snap.condition, WeatherCondition::Rain);
    }

    #[test]
    fn test_condition_lines() {
        let rain = parse_onecall(&body("Rain", "light rain", r#","rain":2.6"#)).unwrap();
        assert_eq!(rain.condition_line(), "light rain (3mm)");

        let snow = parse_onecall(&body("Snow", "snow", r#","snow":12.2"#)).unwrap();
        assert_eq!(snow.condition_line(), "snow (12)");

        let clouds = parse_onecall(&body("Clouds", "broken clouds", "")).unwrap();
        assert_eq!(clouds.condition_line(), "broken clouds (75%)");

        let clear = parse_onecall(&body("Clear", "clear sky", "")).unwrap();
        assert_eq!(clear.condition_line(), "clear sky");
        assert_eq!(clear.temperature_line(), "4° feels like -1°");
        assert_eq!(clear.range_line(), "H 6° L -2°");
    }

    #[test]
    fn test_only_rain_carries_millimetres() {
        let drizzle = parse_onecall(&body("Drizzle", "light intensity drizzle", r#","rain":0.4"#)).unwrap();
        assert_eq!(drizzle.condition, WeatherCondition::Other("Drizzle".into()));
        assert_eq!(drizzle.condition_line(), "light intensity drizzle");
    }

    #[test]
    fn test_missing_daily_is_an_error() {
        let empty = r#"{"current":{"temp":1.0,"feels_like":1.0},"daily":[]}"#;
        assert!(matches!(parse_onecall(empty), Err(SourceError::MissingData(_))));
        assert!(matches!(parse_onecall("{}"), Err(SourceError::Json(_))));
    }
}
