/*
 *  sources/holidays.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Public holiday lookup (canada-holidays.ca style API)
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

use chrono::NaiveDate;
use log::{error, info};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::constants::{DEFAULT_HOLIDAYS_API, DEFAULT_PROVINCE};
use crate::sources::{check_status, SourceError};

#[derive(Debug, Deserialize)]
struct ProvinceResponse {
    province: Province,
}

#[derive(Debug, Deserialize)]
struct Province {
    #[serde(default)]
    holidays: Vec<Holiday>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub observed_date: NaiveDate,
    pub name_en: Option<String>,
}

/// Name of the first holiday observed on `date`
pub fn todays_holiday(holidays: &[Holiday], date: NaiveDate) -> Option<String> {
    holidays
        .iter()
        .filter(|h| h.observed_date == date)
        .find_map(|h| h.name_en.clone())
}

pub struct HolidayClient {
    client: Client,
    api_url: String,
    province: String,
}

impl HolidayClient {
    pub fn new(client: Client, api_url: impl Into<String>, province: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            province: province.into(),
        }
    }

    pub fn from_config(config: &Config, client: &Client) -> Self {
        let h = config.holidays.as_ref();
        Self::new(
            client.clone(),
            h.and_then(|h| h.api_url.clone()).unwrap_or_else(|| DEFAULT_HOLIDAYS_API.to_string()),
            h.and_then(|h| h.province.clone()).unwrap_or_else(|| DEFAULT_PROVINCE.to_string()),
        )
    }

    /// `None` on a normal day and on any failure
    pub async fn get_todays_holiday_name(&self, today: NaiveDate) -> Option<String> {
        info!("Retrieving holidays for {}", self.province);
        match self.fetch().await {
            Ok(holidays) => {
                let name = todays_holiday(&holidays, today);
                if let Some(n) = &name {
                    info!("Today is {}", n);
                }
                name
            }
            Err(e) => {
                error!("Holiday lookup failed: {}", e);
                None
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<Holiday>, SourceError> {
        let url = format!("{}/provinces/{}", self.api_url, self.province);
        let resp = self
            .client
            .get(&url)
            .query(&[("optional", "true")])
            .send()
            .await?;
        let body = check_status(resp)?.text().await?;
        parse_holidays(&body)
    }
}

fn parse_holidays(body: &str) -> Result<Vec<Holiday>, SourceError> {
    let parsed: ProvinceResponse = serde_json::from_str(body)?;
    Ok(parsed.province.holidays)
}
