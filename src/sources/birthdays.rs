/*
 *  sources/birthdays.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Birthdays today and coming up, from Google contacts or CardDAV
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

use std::fs;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use icalendar::parser::{read_calendar, unfold};
use log::{debug, error, info, warn};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;

use crate::config::{CardDavConfig, Config, GoogleContactsConfig};
use crate::constants::{GOOGLE_PEOPLE_API, GOOGLE_TOKEN_URI, UPCOMING_BIRTHDAY_DAYS};
use crate::sources::{check_status, SourceError};

/// People API caps group membership listings
const GOOGLE_MAX_MEMBERS: u32 = 100;

const DAV_NS: &str = "DAV:";

/// Names to print in the footer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BirthdayResult {
    /// birthday is today; no duplicates
    pub today: Vec<String>,
    /// birthday within the next few days, soonest first, with the day of month
    pub upcoming: Vec<(String, u32)>,
}

impl BirthdayResult {
    pub fn has_today(&self) -> bool {
        !self.today.is_empty()
    }

    /// "Ann (5th)"
    pub fn upcoming_labels(&self) -> Vec<String> {
        self.upcoming
            .iter()
            .map(|(name, day)| format!("{} ({})", name, ordinal(*day)))
            .collect()
    }
}

/// One contact with a known birthday (year is irrelevant)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthdayEntry {
    pub name: String,
    pub month: u32,
    pub day: u32,
}

impl BirthdayEntry {
    pub fn new(name: impl Into<String>, month: u32, day: u32) -> Self {
        Self { name: name.into(), month, day }
    }

    /// The birthday as observed in `year`; Feb 29 moves to Feb 28 off leap years
    fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).or_else(|| {
            if (self.month, self.day) == (2, 29) {
                NaiveDate::from_ymd_opt(year, 2, 28)
            } else {
                None
            }
        })
    }

    /// First observed birthday on or after `today`
    fn next_after(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self.in_year(today.year()) {
            Some(d) if d >= today => Some(d),
            _ => self.in_year(today.year() + 1),
        }
    }
}

/// Split contacts into today's and upcoming birthdays.
///
/// Upcoming means strictly after today and strictly before today plus
/// `UPCOMING_BIRTHDAY_DAYS`, counted across the year end.
pub fn classify(entries: &[BirthdayEntry], today: NaiveDate) -> BirthdayResult {
    let mut result = BirthdayResult::default();
    let mut upcoming: Vec<(NaiveDate, String)> = Vec::new();

    for entry in entries {
        let Some(next) = entry.next_after(today) else {
            debug!("Ignoring impossible birthday {}-{} for {}", entry.month, entry.day, entry.name);
            continue;
        };
        let days_away = (next - today).num_days();
        if days_away == 0 {
            if !result.today.contains(&entry.name) {
                result.today.push(entry.name.clone());
            }
        } else if days_away < UPCOMING_BIRTHDAY_DAYS {
            upcoming.push((next, entry.name.clone()));
        }
    }

    // stable: same-day birthdays keep backend order
    upcoming.sort_by_key(|(date, _)| *date);
    result.upcoming = upcoming.into_iter().map(|(d, name)| (name, d.day())).collect();
    result
}

/// English ordinal: 1st 2nd 3rd 4th ... 11th 12th 13th ... 21st
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// The configured contacts provider.
pub enum BirthdayBackend {
    Google(GoogleContacts),
    CardDav(CardDavContacts),
    Disabled,
}

impl BirthdayBackend {
    /// Google wins when both are configured
    pub fn from_config(config: &Config, client: &Client) -> Self {
        let contacts = config.contacts.as_ref();
        if let Some(google) = contacts.and_then(|c| c.google.as_ref()) {
            BirthdayBackend::Google(GoogleContacts::new(client.clone(), google))
        } else if let Some(dav) = contacts.and_then(|c| c.carddav.as_ref()) {
            BirthdayBackend::CardDav(CardDavContacts::new(client.clone(), dav))
        } else {
            BirthdayBackend::Disabled
        }
    }

    /// Never fails; a backend error is logged and yields an empty result
    pub async fn get_birthdays(&self, today: NaiveDate) -> BirthdayResult {
        let entries = match self {
            BirthdayBackend::Google(g) => {
                info!("Retrieving contact (birthday) infos from Google");
                g.entries().await
            }
            BirthdayBackend::CardDav(c) => {
                info!("Retrieving contact (birthday) infos from CardDAV");
                c.entries().await
            }
            BirthdayBackend::Disabled => {
                debug!("No contacts backend configured");
                return BirthdayResult::default();
            }
        };

        match entries {
            Ok(entries) => {
                let result = classify(&entries, today);
                info!(
                    "{} birthdays today, {} upcoming ({} contacts)",
                    result.today.len(),
                    result.upcoming.len(),
                    entries.len()
                );
                result
            }
            Err(e) => {
                error!("Birthday lookup failed: {}", e);
                BirthdayResult::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Google People API

/// Stored OAuth token as written by the usual installed-app flow
#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(alias = "access_token")]
    token: Option<String>,
    refresh_token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactGroup {
    #[serde(default)]
    member_resource_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BatchGet {
    #[serde(default)]
    responses: Vec<PersonResponse>,
}

#[derive(Debug, Deserialize)]
struct PersonResponse {
    person: Option<Person>,
}

#[derive(Debug, Deserialize)]
struct Person {
    #[serde(default)]
    names: Vec<PersonName>,
    #[serde(default)]
    birthdays: Vec<PersonBirthday>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonName {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersonBirthday {
    date: Option<PartialDate>,
}

#[derive(Debug, Deserialize)]
struct PartialDate {
    month: Option<u32>,
    day: Option<u32>,
}

impl Person {
    fn entry(&self) -> Option<BirthdayEntry> {
        let name = self.names.first()?.display_name.as_ref()?.trim();
        let date = self.birthdays.first()?.date.as_ref()?;
        if name.is_empty() {
            return None;
        }
        Some(BirthdayEntry::new(name, date.month?, date.day?))
    }
}

pub struct GoogleContacts {
    client: Client,
    group: String,
    token_file: PathBuf,
    api: String,
}

impl GoogleContacts {
    pub fn new(client: Client, config: &GoogleContactsConfig) -> Self {
        Self {
            client,
            group: config.group.clone(),
            token_file: config.token_file.clone(),
            api: GOOGLE_PEOPLE_API.to_string(),
        }
    }

    async fn access_token(&self) -> Result<String, SourceError> {
        let raw = fs::read_to_string(&self.token_file)?;
        let stored: TokenFile = serde_json::from_str(&raw)?;

        let (Some(refresh), Some(id), Some(secret)) =
            (&stored.refresh_token, &stored.client_id, &stored.client_secret)
        else {
            return stored
                .token
                .ok_or_else(|| SourceError::MissingData("token file has no access token".into()));
        };

        debug!("Refreshing Google access token");
        let uri = stored.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URI);
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh.as_str()),
            ("client_id", id.as_str()),
            ("client_secret", secret.as_str()),
        ];
        let resp = check_status(self.client.post(uri).form(&params).send().await?)?;
        let fresh: RefreshResponse = resp.json().await?;
        Ok(fresh.access_token)
    }

    async fn entries(&self) -> Result<Vec<BirthdayEntry>, SourceError> {
        let token = self.access_token().await?;

        let group_url = format!("{}/contactGroups/{}", self.api, self.group);
        let max_members = GOOGLE_MAX_MEMBERS.to_string();
        let resp = self
            .client
            .get(&group_url)
            .bearer_auth(&token)
            .query(&[("maxMembers", max_members.as_str())])
            .send()
            .await?;
        let group: ContactGroup = check_status(resp)?.json().await?;
        if group.member_resource_names.is_empty() {
            warn!("Contact group {} has no members", self.group);
            return Ok(Vec::new());
        }

        let mut query: Vec<(&str, &str)> = group
            .member_resource_names
            .iter()
            .map(|r| ("resourceNames", r.as_str()))
            .collect();
        query.push(("personFields", "names,birthdays"));

        let resp = self
            .client
            .get(format!("{}/people:batchGet", self.api))
            .bearer_auth(&token)
            .query(&query)
            .send()
            .await?;
        let batch: BatchGet = check_status(resp)?.json().await?;
        Ok(entries_from_batch(batch))
    }
}

fn entries_from_batch(batch: BatchGet) -> Vec<BirthdayEntry> {
    batch
        .responses
        .into_iter()
        .filter_map(|r| r.person)
        .filter_map(|p| p.entry())
        .collect()
}

// ---------------------------------------------------------------------------
// CardDAV

pub struct CardDavContacts {
    client: Client,
    url: String,
    user: String,
    password: String,
}

impl CardDavContacts {
    pub fn new(client: Client, config: &CardDavConfig) -> Self {
        Self {
            client,
            url: config.url.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        }
    }

    async fn entries(&self) -> Result<Vec<BirthdayEntry>, SourceError> {
        let propfind = Method::from_bytes(b"PROPFIND")
            .map_err(|e| SourceError::MissingData(format!("PROPFIND method: {e}")))?;
        let resp = self
            .client
            .request(propfind, &self.url)
            .basic_auth(&self.user, Some(&self.password))
            .header("Depth", "1")
            .send()
            .await?;
        if resp.status() != StatusCode::MULTI_STATUS {
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: resp.status(),
            });
        }
        let body = resp.text().await?;

        let base = base_url(&self.url)?;
        let mut entries = Vec::new();
        for href in vcard_hrefs(&body)? {
            let url = format!("{base}{href}");
            match self.fetch_card(&url).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => debug!("No birthday in {}", url),
                Err(e) => warn!("Skipping vCard {}: {}", url, e),
            }
        }
        Ok(entries)
    }

    async fn fetch_card(&self, url: &str) -> Result<Option<BirthdayEntry>, SourceError> {
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;
        let text = check_status(resp)?.text().await?;
        parse_vcard(&text)
    }
}

/// "https://host:port/path" -> "https://host:port"
fn base_url(url: &str) -> Result<String, SourceError> {
    let reqwest_url = reqwest::Url::parse(url)
        .map_err(|e| SourceError::MissingData(format!("bad CardDAV url {url}: {e}")))?;
    let host = reqwest_url
        .host_str()
        .ok_or_else(|| SourceError::MissingData(format!("CardDAV url {url} has no host")))?;
    Ok(match reqwest_url.port() {
        Some(port) => format!("{}://{}:{}", reqwest_url.scheme(), host, port),
        None => format!("{}://{}", reqwest_url.scheme(), host),
    })
}

/// hrefs of the multistatus responses whose content type is a vCard
fn vcard_hrefs(xml: &str) -> Result<Vec<String>, SourceError> {
    let doc = roxmltree::Document::parse(xml)?;
    let dav = |n: &roxmltree::Node, name: &str| n.has_tag_name((DAV_NS, name));

    let hrefs = doc
        .descendants()
        .filter(|n| dav(n, "response"))
        .filter(|response| {
            response
                .descendants()
                .filter(|n| dav(n, "getcontenttype"))
                .any(|n| n.text().is_some_and(|t| t.trim().starts_with("text/vcard")))
        })
        .filter_map(|response| {
            response
                .children()
                .find(|n| dav(n, "href"))
                .and_then(|n| n.text())
                .map(|t| t.trim().to_string())
        })
        .collect();
    Ok(hrefs)
}

/// FN and BDAY of a single vCard; `None` when either is missing
fn parse_vcard(text: &str) -> Result<Option<BirthdayEntry>, SourceError> {
    let unfolded = unfold(text);
    let parsed = read_calendar(&unfolded).map_err(SourceError::VCard)?;
    let card = parsed
        .components
        .iter()
        .find(|c| c.name == "VCARD")
        .ok_or_else(|| SourceError::VCard("not a vCard".into()))?;

    let name = card
        .find_prop("FN")
        .map(|p| p.val.as_ref().trim().to_string())
        .filter(|n| !n.is_empty());
    // Apple writes grouped properties ("item1.BDAY")
    let bday = card
        .properties
        .iter()
        .find(|p| {
            let key: &str = p.name.as_ref();
            key.rsplit('.').next().unwrap_or(key).eq_ignore_ascii_case("BDAY")
        })
        .map(|p| p.val.as_ref().trim().to_string());

    let (Some(name), Some(bday)) = (name, bday) else {
        return Ok(None);
    };
    let (month, day) = parse_bday(&bday)
        .ok_or_else(|| SourceError::VCard(format!("unrecognised BDAY '{bday}' for {name}")))?;
    Ok(Some(BirthdayEntry::new(name, month, day)))
}

/// Month and day from YYYY-MM-DD, YYYYMMDD, --MMDD or --MM-DD (time part ignored)
fn parse_bday(value: &str) -> Option<(u32, u32)> {
    let date = value.split('T').next()?;
    let digits: String = date.chars().filter(|c| c.is_ascii_digit()).collect();
    let (month, day) = if date.starts_with("--") {
        if digits.len() != 4 {
            return None;
        }
        (digits[0..2].parse().ok()?, digits[2..4].parse().ok()?)
    } else {
        if digits.len() != 8 {
            return None;
        }
        (digits[4..6].parse().ok()?, digits[6..8].parse().ok()?)
    };
    // validate against a leap year so Feb 29 survives
    NaiveDate::from_ymd_opt(2000, month, day).map(|_| (month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ordinals() {
        let got: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 30, 31]
            .iter()
            .map(|n| ordinal(*n))
            .collect();
        assert_eq!(
            got,
            vec!["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd", "30th", "31st"]
        );
    }

    #[test]
    fn test_today_is_deduplicated() {
        let entries = vec![
            BirthdayEntry::new("Ann", 3, 10),
            BirthdayEntry::new("Bob", 3, 10),
            BirthdayEntry::new("Ann", 3, 10),
        ];
        let result = classify(&entries, date(2025, 3, 10));
        assert_eq!(result.today, vec!["Ann", "Bob"]);
        assert!(result.upcoming.is_empty());
    }

    #[test]
    fn test_upcoming_window_is_exclusive() {
        let entries = vec![
            BirthdayEntry::new("Nine", 3, 19),
            BirthdayEntry::new("Ten", 3, 20),
            BirthdayEntry::new("One", 3, 11),
            BirthdayEntry::new("Past", 3, 9),
            BirthdayEntry::new("One", 3, 11),
        ];
        let result = classify(&entries, date(2025, 3, 10));
        assert!(result.today.is_empty());
        // sorted by date, duplicates kept
        assert_eq!(
            result.upcoming,
            vec![("One".to_string(), 11), ("One".to_string(), 11), ("Nine".to_string(), 19)]
        );
        assert_eq!(result.upcoming_labels(), vec!["One (11th)", "One (11th)", "Nine (19th)"]);
    }

    #[test]
    fn test_leap_day_birthday() {
        let entries = vec![BirthdayEntry::new("Leapling", 2, 29)];
        // 2025 is not a leap year: celebrated on the 28th
        assert_eq!(classify(&entries, date(2025, 2, 28)).today, vec!["Leapling"]);
        assert!(classify(&entries, date(2025, 3, 1)).today.is_empty());
        // 2024 is: the 28th is not the day, the 29th is upcoming
        let result = classify(&entries, date(2024, 2, 28));
        assert!(result.today.is_empty());
        assert_eq!(result.upcoming, vec![("Leapling".to_string(), 29)]);
        assert_eq!(classify(&entries, date(2024, 2, 29)).today, vec!["Leapling"]);
    }

    #[test]
    fn test_upcoming_across_year_end() {
        let entries = vec![BirthdayEntry::new("January", 1, 3)];
        let result = classify(&entries, date(2025, 12, 28));
        assert_eq!(result.upcoming, vec![("January".to_string(), 3)]);
    }

    #[test]
    fn test_parse_bday_formats() {
        assert_eq!(parse_bday("1980-04-05"), Some((4, 5)));
        assert_eq!(parse_bday("19800405"), Some((4, 5)));
        assert_eq!(parse_bday("--0405"), Some((4, 5)));
        assert_eq!(parse_bday("--04-05"), Some((4, 5)));
        assert_eq!(parse_bday("1980-04-05T00:00:00Z"), Some((4, 5)));
        assert_eq!(parse_bday("1980-02-29"), Some((2, 29)));
        assert_eq!(parse_bday("1980-13-01"), None);
        assert_eq!(parse_bday("yesterday"), None);
    }

    #[test]
    fn test_parse_vcard() {
        let card = "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Jane\r\n  Doe\r\nitem1.BDAY;VALUE=date:1990-07-01\r\nEND:VCARD\r\n";
        let entry = parse_vcard(card).unwrap().unwrap();
        assert_eq!(entry, BirthdayEntry::new("Jane Doe", 7, 1));

        let no_bday = "BEGIN:VCARD\r\nFN:Nobody\r\nEND:VCARD\r\n";
        assert_eq!(parse_vcard(no_bday).unwrap(), None);
        assert!(parse_vcard("<html>").is_err());
    }

    #[test]
    fn test_parse_vcard_grouped_bday_and_folded_name() {
        let card = "BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Ann\r\n  Lee\r\nitem1.BDAY;VALUE=date:1980-02-29\r\n\
                    item1.X-ABLabel:birthday\r\nEND:VCARD";
        assert_eq!(parse_vcard(card).unwrap(), Some(BirthdayEntry::new("Ann Lee", 2, 29)));

        let bad = "BEGIN:VCARD\r\nFN:Ann\r\nBDAY:someday\r\nEND:VCARD\r\n";
        assert!(matches!(parse_vcard(bad), Err(SourceError::VCard(_))));
    }

    #[test]
    fn test_vcard_hrefs_from_multistatus() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/dav/addressbooks/me/</d:href>
    <d:propstat><d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/addressbooks/me/jane.vcf</d:href>
    <d:propstat><d:prop><d:getcontenttype>text/vcard; charset=utf-8</d:getcontenttype></d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/addressbooks/me/notes.txt</d:href>
    <d:propstat><d:prop><d:getcontenttype>text/plain</d:getcontenttype></d:prop></d:propstat>
  </d:response>
</d:multistatus>"#;
        assert_eq!(vcard_hrefs(xml).unwrap(), vec!["/dav/addressbooks/me/jane.vcf"]);
        assert!(vcard_hrefs("<unclosed>").is_err());
    }

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("https://dav.example.com/remote.php/dav/").unwrap(), "https://dav.example.com");
        assert_eq!(base_url("http://nas:5232/user/contacts/").unwrap(), "http://nas:5232");
        assert!(base_url("not a url").is_err());
    }

    #[test]
    fn test_google_batch_parsing() {
        let json = r#"{"responses":[
            {"person":{"names":[{"displayName":"Ann"}],"birthdays":[{"date":{"month":3,"day":10}}]}},
            {"person":{"names":[{"displayName":"No Birthday"}]}},
            {"person":{"birthdays":[{"date":{"year":1970,"month":1,"day":1}}]}},
            {"person":{"names":[{"displayName":"Bob"}],"birthdays":[{"date":{"year":1980,"month":2,"day":29}}]}}
        ]}"#;
        let batch: BatchGet = serde_json::from_str(json).unwrap();
        assert_eq!(
            entries_from_batch(batch),
            vec![BirthdayEntry::new("Ann", 3, 10), BirthdayEntry::new("Bob", 2, 29)]
        );
    }

    #[test]
    fn test_token_file_aliases() {
        let t: TokenFile = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(t.token.as_deref(), Some("abc"));
        assert!(t.refresh_token.is_none());
    }
}
