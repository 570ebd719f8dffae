/*
 *  sources/calendar.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  ICS calendar feeds: fetch, parse, expand recurrences, normalise
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

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    parser::{read_calendar, unfold, Component, Property},
    CalendarDateTime, DatePerhapsTime,
};
use log::{debug, error, info, warn};
use reqwest::Client;
use rrule::RRuleSet;

use crate::constants::NO_TITLE;
use crate::sources::{check_status, SourceError};

/// Upper bound on generated occurrences per recurring event
const MAX_OCCURRENCES: u16 = 500;

/// One agenda entry, already resolved to the local zone.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub all_day: bool,
    pub summary: String,
}

/// Half-open range of local time the agenda looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl EventWindow {
    /// From local midnight of `today` for `days` days
    pub fn from_today(today: NaiveDate, tz: Tz, days: u32) -> Self {
        Self {
            start: local_midnight(today, tz),
            end: local_midnight(today + Duration::days(days as i64), tz),
        }
    }

    /// Overlap test; an event ending exactly at the window start still
    /// counts so the normaliser can see it
    fn overlaps(&self, start: &DateTime<Tz>, end: &DateTime<Tz>) -> bool {
        *start < self.end && *end >= self.start
    }
}

/// Midnight of `date` in `tz` (the first one if DST repeats it, the
/// UTC-equivalent instant if DST skips it)
pub fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    localize(date.and_time(chrono::NaiveTime::MIN), tz)
}

fn localize(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Sort, drop finished multi-day events and cap.
///
/// An event whose end is exactly local midnight today is over; it is removed
/// before the cap is applied, so it never costs a visible slot.
pub fn normalize(
    mut events: Vec<CalendarEvent>,
    today_midnight: DateTime<Tz>,
    max_number: usize,
) -> Vec<CalendarEvent> {
    events.sort_by_key(|e| e.start);
    let before = events.len();
    events.retain(|e| e.end != today_midnight);
    let finished = before - events.len();
    events.truncate(max_number);
    info!(
        "Got {} calendar-entries (capped to {}, {} finished)",
        before - finished,
        max_number,
        finished
    );
    events
}

/// A VEVENT before recurrence expansion
#[derive(Debug, Clone)]
struct RawEvent {
    uid: Option<String>,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    all_day: bool,
    summary: String,
    rrule: Option<String>,
    exdates: Vec<ExDate>,
    recurrence_id: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExDate {
    Date(NaiveDate),
    Instant(DateTime<Utc>),
}

impl ExDate {
    fn matches(&self, occurrence: &DateTime<Tz>) -> bool {
        match self {
            ExDate::Date(d) => occurrence.date_naive() == *d,
            ExDate::Instant(i) => occurrence.with_timezone(&Utc) == *i,
        }
    }
}

/// Parse an ICS document and return the events inside `window`
pub fn events_in_window(
    content: &str,
    tz: Tz,
    window: &EventWindow,
) -> Result<Vec<CalendarEvent>, SourceError> {
    let raw = parse_ics(content, tz)?;

    // instances moved or edited individually replace their generated twin
    let overridden: Vec<(String, DateTime<Utc>)> = raw
        .iter()
        .filter_map(|e| Some((e.uid.clone()?, e.recurrence_id?)))
        .collect();

    let mut events = Vec::new();
    for event in &raw {
        match event.rrule.as_deref() {
            Some(rule) if event.recurrence_id.is_none() => {
                events.extend(expand(event, rule, tz, window, &overridden));
            }
            _ => {
                if window.overlaps(&event.start, &event.end) {
                    events.push(event.to_calendar_event());
                }
            }
        }
    }
    Ok(events)
}

impl RawEvent {
    fn to_calendar_event(&self) -> CalendarEvent {
        CalendarEvent {
            start: self.start,
            end: self.end,
            all_day: self.all_day,
            summary: self.summary.clone(),
        }
    }
}

fn parse_ics(content: &str, tz: Tz) -> Result<Vec<RawEvent>, SourceError> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(SourceError::Ics)?;

    let events = calendar
        .components
        .iter()
        .flat_map(|c| {
            // tolerate feeds that keep the VCALENDAR wrapper as a component
            if c.name == "VCALENDAR" { c.components.iter().collect::<Vec<_>>() } else { vec![c] }
        })
        .filter(|c| c.name == "VEVENT")
        .filter_map(|c| parse_vevent(c, tz))
        .collect();
    Ok(events)
}

fn parse_vevent(vevent: &Component, tz: Tz) -> Option<RawEvent> {
    if vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref().eq_ignore_ascii_case("CANCELLED"))
    {
        debug!("Skipping cancelled event");
        return None;
    }

    let dtstart = match vevent.find_prop("DTSTART").map(DatePerhapsTime::try_from) {
        Some(Ok(dt)) => dt,
        _ => {
            warn!("Skipping event without a usable DTSTART");
            return None;
        }
    };
    let all_day = matches!(dtstart, DatePerhapsTime::Date(_));
    let start = resolve(&dtstart, tz);

    let end = match vevent.find_prop("DTEND").map(DatePerhapsTime::try_from) {
        Some(Ok(dt)) => resolve(&dt, tz),
        _ if all_day => local_midnight(start.date_naive() + Duration::days(1), tz),
        _ => start,
    };

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape(p.val.as_ref()))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let exdates = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(|p| parse_exdates(p, tz))
        .collect();

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(|dt| resolve(&dt, tz).with_timezone(&Utc));

    Some(RawEvent {
        uid: vevent.find_prop("UID").map(|p| p.val.to_string()),
        start,
        end,
        all_day,
        summary,
        rrule: vevent.find_prop("RRULE").map(|p| p.val.to_string()),
        exdates,
        recurrence_id,
    })
}

/// UTC converts, TZID is honoured (unknown ids fall back to the local
/// zone), floating times and dates are local
fn resolve(dt: &DatePerhapsTime, tz: Tz) -> DateTime<Tz> {
    match dt {
        DatePerhapsTime::Date(d) => local_midnight(*d, tz),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(utc) => utc.with_timezone(&tz),
            CalendarDateTime::Floating(naive) => localize(*naive, tz),
            CalendarDateTime::WithTimezone { date_time, tzid } => match tzid.parse::<Tz>() {
                Ok(zone) => localize(*date_time, zone).with_timezone(&tz),
                Err(_) => {
                    debug!("Unknown TZID {}, using {}", tzid, tz.name());
                    localize(*date_time, tz)
                }
            },
        },
    }
}

/// EXDATE may carry several comma separated values
fn parse_exdates(prop: &Property, tz: Tz) -> Vec<ExDate> {
    let zone = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref())
        .and_then(|v| v.as_ref().parse::<Tz>().ok())
        .unwrap_or(tz);

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter_map(|s| {
            if let Some(utc) = s.strip_suffix('Z') {
                NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|n| ExDate::Instant(n.and_utc()))
            } else if s.len() == 8 {
                NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(ExDate::Date)
            } else {
                NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|n| ExDate::Instant(localize(n, zone).with_timezone(&Utc)))
            }
        })
        .collect()
}

/// rrule wants UNTIL in UTC once DTSTART carries a TZID.
///
/// A date-only UNTIL (all-day series) covers the whole local day, a floating
/// one is read in `tz`.
fn until_as_utc(rule: &str, tz: Tz) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") && !value.ends_with('Z') => {
                let local = if value.len() == 8 {
                    NaiveDate::parse_from_str(value, "%Y%m%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(23, 59, 59))
                } else {
                    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()
                };
                match local {
                    Some(naive) => format!(
                        "{}={}",
                        key,
                        localize(naive, tz).with_timezone(&Utc).format("%Y%m%dT%H%M%SZ")
                    ),
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Occurrences of a recurring event that fall in the window
fn expand(
    master: &RawEvent,
    rule: &str,
    tz: Tz,
    window: &EventWindow,
    overridden: &[(String, DateTime<Utc>)],
) -> Vec<CalendarEvent> {
    let duration = master.end - master.start;
    let span_days = (master.end.date_naive() - master.start.date_naive()).num_days();

    let rule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        tz.name(),
        master.start.naive_local().format("%Y%m%dT%H%M%S"),
        until_as_utc(rule, tz)
    );
    let set: RRuleSet = match rule_text.parse() {
        Ok(set) => set,
        Err(e) => {
            warn!("Cannot expand RRULE '{}' ({}), using first instance only", rule, e);
            return if window.overlaps(&master.start, &master.end) {
                vec![master.to_calendar_event()]
            } else {
                Vec::new()
            };
        }
    };

    let rtz = rrule::Tz::Tz(tz);
    // occurrences that began before the window may still be running
    let after = (window.start - duration - Duration::seconds(1)).with_timezone(&rtz);
    let before = window.end.with_timezone(&rtz);
    let result = set.after(after).before(before).all(MAX_OCCURRENCES);

    result
        .dates
        .iter()
        .map(|occ| occ.with_timezone(&tz))
        .filter(|occ| !master.exdates.iter().any(|ex| ex.matches(occ)))
        .filter(|occ| {
            let instant = occ.with_timezone(&Utc);
            !overridden
                .iter()
                .any(|(uid, rid)| Some(uid) == master.uid.as_ref() && *rid == instant)
        })
        .filter_map(|start| {
            let end = if master.all_day {
                local_midnight(start.date_naive() + Duration::days(span_days), tz)
            } else {
                start + duration
            };
            window.overlaps(&start, &end).then(|| CalendarEvent {
                start,
                end,
                all_day: master.all_day,
                summary: master.summary.clone(),
            })
        })
        .collect()
}

/// Undo RFC 5545 TEXT escaping
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') | Some('N') => out.push(' '),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out.trim().to_string()
}

/// Fetches every configured ICS feed for one render pass
pub struct CalendarClient {
    client: Client,
    urls: Vec<String>,
    tz: Tz,
    lookahead_days: u32,
}

impl CalendarClient {
    pub fn new(client: Client, urls: Vec<String>, tz: Tz, lookahead_days: u32) -> Self {
        Self { client, urls, tz, lookahead_days }
    }

    /// All feeds merged, sorted and capped; a failing feed contributes nothing
    pub async fn normalize_events(&self, now: DateTime<Tz>, max_count: usize) -> Vec<CalendarEvent> {
        let window = EventWindow::from_today(now.date_naive(), self.tz, self.lookahead_days);
        let mut events = Vec::new();

        for url in &self.urls {
            info!("Retrieving calendar {}", url);
            match self.fetch(url, &window).await {
                Ok(found) => {
                    debug!("{} events from {}", found.len(), url);
                    events.extend(found);
                }
                Err(e) => error!("Calendar {} failed: {}", url, e),
            }
        }

        normalize(events, window.start, max_count)
    }

    async fn fetch(&self, url: &str, window: &EventWindow) -> Result<Vec<CalendarEvent>, SourceError> {
        let url = match url.strip_prefix("webcal://") {
            Some(rest) => format!("https://{rest}"),
            None => url.to_string(),
        };
        let resp = check_status(self.client.get(&url).send().await?)?;
        let body = resp.text().await?;
        events_in_window(&body, self.tz, window)
    }
}
