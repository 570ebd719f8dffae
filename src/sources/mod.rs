/*
 *  sources/mod.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Data sources: calendars, contacts, holidays and weather
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

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use thiserror::Error;

pub mod birthdays;
pub mod calendar;
pub mod holidays;
pub mod weather;

pub use birthdays::{BirthdayBackend, BirthdayResult};
pub use calendar::{CalendarClient, CalendarEvent};
pub use holidays::HolidayClient;
pub use weather::{WeatherClient, WeatherCondition, WeatherSnapshot};

const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

/// Anything that can go wrong fetching or decoding remote data.
///
/// Never crosses into the compositor: every client turns it into an empty
/// or absent result after logging it.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("calendar parse error: {0}")]
    Ics(String),
    #[error("recurrence error: {0}")]
    Recurrence(String),
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("vCard error: {0}")]
    VCard(String),
    #[error("missing data: {0}")]
    MissingData(String),
}

/// Shared HTTP client: bounded timeout, identifies itself, no retries
pub fn http_client(timeout: Duration) -> Result<Client, SourceError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header::HeaderValue::from_static(VERSION));

    let client = Client::builder()
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .default_headers(headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Turn a non-2xx response into `SourceError::Status`
pub(crate) fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(SourceError::Status {
            url: resp.url().to_string(),
            status,
        })
    }
}
