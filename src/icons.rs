/*
 *  icons.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Footer icon selection: birthday cake, holiday, seasonal days
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

use chrono::{Datelike, NaiveDate, Weekday};
use log::debug;

use crate::assets::IconStore;
use crate::display::canvas::Bitmap;

pub const CAKE: &str = "Cake_icon";
pub const CAKE_LIT: &str = "Cake_icon_on";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSource {
    Birthday,
    Holiday,
    Seasonal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FooterIcon {
    pub key: String,
    pub image: Bitmap,
    pub source: IconSource,
}

/// One date-triggered footer icon
struct SeasonalRule {
    key: &'static str,
    applies: fn(NaiveDate) -> bool,
}

/// Evaluated top to bottom, every match is shown
const SEASONAL_RULES: &[SeasonalRule] = &[
    SeasonalRule { key: "Anniversary_icon", applies: |d| (d.month(), d.day()) == (2, 20) },
    SeasonalRule { key: "New_years_day_icon", applies: |d| (d.month(), d.day()) == (12, 31) },
    SeasonalRule { key: "Valentines_day_icon", applies: |d| (d.month(), d.day()) == (2, 14) },
    SeasonalRule { key: "Halloween_icon", applies: |d| (d.month(), d.day()) == (10, 31) },
    SeasonalRule {
        key: "Christmas_tree_icon",
        applies: |d| d.month() == 12 && matches!(d.day(), 24 | 25),
    },
    SeasonalRule {
        key: "Friday_13_icon",
        applies: |d| d.day() == 13 && d.weekday() == Weekday::Fri,
    },
];

/// Asset key for a holiday name: "Canada Day" -> "Canada_day_icon"
pub fn holiday_icon_key(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    let mut chars = cleaned.chars();
    let key: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    format!("{key}_icon")
}

/// Seasonal keys that apply on `date`, in display order
pub fn seasonal_keys(date: NaiveDate) -> Vec<&'static str> {
    SEASONAL_RULES
        .iter()
        .filter(|rule| (rule.applies)(date))
        .map(|rule| rule.key)
        .collect()
}

/// Footer icons for `date`: cake, at most one holiday, then seasonal ones.
///
/// Keys without an asset in `store` are dropped.
pub fn select_icons<S: IconStore + ?Sized>(
    date: NaiveDate,
    holiday: Option<&str>,
    has_birthday: bool,
    store: &S,
) -> Vec<FooterIcon> {
    let cake = if has_birthday { CAKE_LIT } else { CAKE };
    let holiday_key = holiday.filter(|h| !h.trim().is_empty()).map(holiday_icon_key);

    let wanted = std::iter::once((cake.to_string(), IconSource::Birthday))
        .chain(holiday_key.map(|k| (k, IconSource::Holiday)))
        .chain(
            seasonal_keys(date)
                .into_iter()
                .map(|k| (k.to_string(), IconSource::Seasonal)),
        );

    wanted
        .filter_map(|(key, source)| match store.icon(&key) {
            Some(image) => Some(FooterIcon { key, image, source }),
            None => {
                debug!("Footer icon {} has no asset, skipped", key);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryIconStore;
    use embedded_graphics::pixelcolor::BinaryColor;

    fn store() -> MemoryIconStore {
        let icon = Bitmap::new(4, 4, BinaryColor::On);
        [
            CAKE,
            CAKE_LIT,
            "Canada_day_icon",
            "Anniversary_icon",
            "New_years_day_icon",
            "Valentines_day_icon",
            "Halloween_icon",
            "Christmas_tree_icon",
            "Friday_13_icon",
        ]
        .iter()
        .fold(MemoryIconStore::new(), |s, k| s.with(k, icon.clone()))
    }

    fn keys(icons: &[FooterIcon]) -> Vec<&str> {
        icons.iter().map(|i| i.key.as_str()).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_holiday_key_normalisation() {
        assert_eq!(holiday_icon_key("Canada Day"), "Canada_day_icon");
        assert_eq!(holiday_icon_key("New Year’s Day"), "New_years_day_icon");
        assert_eq!(holiday_icon_key("st. jean-baptiste DAY"), "St._jean-baptiste_day_icon");
        assert_eq!(holiday_icon_key("Family's Day"), "Familys_day_icon");
    }

    #[test]
    fn test_christmas() {
        let icons = select_icons(date(2025, 12, 25), None, false, &store());
        assert_eq!(keys(&icons), vec![CAKE, "Christmas_tree_icon"]);
        assert_eq!(icons[0].source, IconSource::Birthday);
        assert_eq!(icons[1].source, IconSource::Seasonal);
    }

    #[test]
    fn test_halloween_with_missing_holiday_asset() {
        let icons = select_icons(date(2025, 10, 31), Some("Reformation Day"), false, &store());
        assert_eq!(keys(&icons), vec![CAKE, "Halloween_icon"]);
    }

    #[test]
    fn test_lit_cake_and_holiday() {
        let icons = select_icons(date(2025, 7, 1), Some("Canada Day"), true, &store());
        assert_eq!(keys(&icons), vec![CAKE_LIT, "Canada_day_icon"]);
        assert_eq!(icons[1].source, IconSource::Holiday);
    }

    #[test]
    fn test_friday_13th() {
        // 2026-02-13 is a Friday
        assert_eq!(seasonal_keys(date(2026, 2, 13)), vec!["Friday_13_icon"]);
        // 2026-03-13 is a Friday too, 2026-04-13 is not
        assert_eq!(seasonal_keys(date(2026, 3, 13)), vec!["Friday_13_icon"]);
        assert!(seasonal_keys(date(2026, 4, 13)).is_empty());
    }

    #[test]
    fn test_new_years_eve_and_valentines() {
        assert_eq!(seasonal_keys(date(2025, 12, 31)), vec!["New_years_day_icon"]);
        assert_eq!(seasonal_keys(date(2025, 2, 14)), vec!["Valentines_day_icon"]);
        assert_eq!(seasonal_keys(date(2025, 2, 20)), vec!["Anniversary_icon"]);
    }

    #[test]
    fn test_empty_store_yields_nothing() {
        let icons = select_icons(date(2025, 12, 25), None, true, &MemoryIconStore::new());
        assert!(icons.is_empty());
    }
}
