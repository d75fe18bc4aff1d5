//! Business-day calendar: holiday sets per region and business-day advances.
//!
//! Deterministic, pure logic. Holiday rules are computed from the calendar
//! (fixed dates with weekend-observance substitutes, Easter-derived dates,
//! nth-weekday rules) so any year range works without a lookup table.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{ForecastError, Result};

/// Market region whose public holidays are skipped by the advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Australian national public holidays
    Australia,
    /// United States market holidays
    UnitedStates,
}

impl Region {
    /// Human-readable region name, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Region::Australia => "Australia",
            Region::UnitedStates => "United States",
        }
    }
}

/// Set of public-holiday dates for a region and inclusive year range.
///
/// A pure function of `(region, start_year, end_year)`; read-only once built.
#[derive(Debug, Clone)]
pub struct HolidaySet {
    region: Region,
    start_year: i32,
    end_year: i32,
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    /// Compute the holiday set for `region` over `[start_year, end_year]`.
    pub fn build(region: Region, start_year: i32, end_year: i32) -> Result<Self> {
        if start_year > end_year {
            return Err(ForecastError::InvalidParameter(format!(
                "Year range start ({}) is after end ({})",
                start_year, end_year
            )));
        }

        let mut dates = BTreeSet::new();
        for year in start_year..=end_year {
            match region {
                Region::Australia => australia_holidays(year, &mut dates),
                Region::UnitedStates => united_states_holidays(year, &mut dates),
            }
        }

        Ok(Self {
            region,
            start_year,
            end_year,
            dates,
        })
    }

    /// Whether `date` is a holiday in this set.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Whether `date`'s year falls inside the precomputed range.
    pub fn covers(&self, date: NaiveDate) -> bool {
        (self.start_year..=self.end_year).contains(&date.year())
    }

    /// The region this set was built for.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Inclusive year range this set was built for.
    pub fn year_range(&self) -> (i32, i32) {
        (self.start_year, self.end_year)
    }

    /// All holiday dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }

    /// Number of holiday dates in the set.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the set holds no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Advance `from` by `count` business days, skipping weekends and holidays.
///
/// Returns the counted dates ascending; `count == 0` yields an empty vec.
/// `from` itself is never included. Every traversed date must fall inside
/// the holiday set's year range, otherwise the advance could silently
/// under-skip holidays; such a traversal fails with `CalendarRangeExceeded`.
pub fn add_business_days(
    from: NaiveDate,
    count: usize,
    holidays: &HolidaySet,
) -> Result<Vec<NaiveDate>> {
    let mut remaining = count;
    let mut current = from;
    let mut found = Vec::with_capacity(count);

    while remaining > 0 {
        current += Duration::days(1);
        if !holidays.covers(current) {
            return Err(ForecastError::CalendarRangeExceeded(format!(
                "Advance reached {} but the {} holiday set only covers {}..={}",
                current,
                holidays.region().name(),
                holidays.start_year,
                holidays.end_year
            )));
        }
        if current.weekday().num_days_from_monday() >= 5 {
            continue;
        }
        if holidays.contains(current) {
            continue;
        }
        found.push(current);
        remaining -= 1;
    }

    Ok(found)
}

/// Process-wide cache of holiday sets keyed by `(region, year range)`.
///
/// Initialize-once semantics: concurrent first use of the same key builds
/// the set exactly once; later callers share the `Arc`.
#[derive(Debug, Default)]
pub struct HolidayCache {
    inner: Mutex<HashMap<(Region, i32, i32), Arc<HolidaySet>>>,
}

impl HolidayCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the cached set for the key, building it under the lock on first use.
    pub fn get_or_build(
        &self,
        region: Region,
        start_year: i32,
        end_year: i32,
    ) -> Result<Arc<HolidaySet>> {
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(set) = map.get(&(region, start_year, end_year)) {
            return Ok(Arc::clone(set));
        }

        let built = Arc::new(HolidaySet::build(region, start_year, end_year)?);
        map.insert((region, start_year, end_year), Arc::clone(&built));
        Ok(built)
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Month/day arguments are fixed holiday definitions, always valid.
    NaiveDate::from_ymd_opt(year, month, day).expect("valid holiday date")
}

/// Easter Sunday for `year` via the anonymous Gregorian computus.
fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, month as u32, day as u32)
}

/// Nth (1-based) `weekday` of `month`.
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = ymd(year, month, 1);
    let offset = (7 + weekday.num_days_from_monday() as i64
        - first.weekday().num_days_from_monday() as i64)
        % 7;
    first + Duration::days(offset + 7 * (n as i64 - 1))
}

/// Last `weekday` of `month`.
fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let next_month = if month == 12 {
        ymd(year + 1, 1, 1)
    } else {
        ymd(year, month + 1, 1)
    };
    let last = next_month - Duration::days(1);
    let offset = (7 + last.weekday().num_days_from_monday() as i64
        - weekday.num_days_from_monday() as i64)
        % 7;
    last - Duration::days(offset)
}

/// The actual date plus, when it lands on a weekend, the following Monday.
fn with_monday_observance(date: NaiveDate, dates: &mut BTreeSet<NaiveDate>) {
    dates.insert(date);
    match date.weekday() {
        Weekday::Sat => {
            dates.insert(date + Duration::days(2));
        }
        Weekday::Sun => {
            dates.insert(date + Duration::days(1));
        }
        _ => {}
    }
}

/// The actual date plus the US-style substitute: Saturday observes the
/// preceding Friday, Sunday the following Monday.
fn with_nearest_weekday_observance(date: NaiveDate, dates: &mut BTreeSet<NaiveDate>) {
    dates.insert(date);
    match date.weekday() {
        Weekday::Sat => {
            dates.insert(date - Duration::days(1));
        }
        Weekday::Sun => {
            dates.insert(date + Duration::days(1));
        }
        _ => {}
    }
}

/// Australian national public holidays for one year.
fn australia_holidays(year: i32, dates: &mut BTreeSet<NaiveDate>) {
    // New Year's Day and Australia Day shift to Monday when on a weekend.
    with_monday_observance(ymd(year, 1, 1), dates);
    with_monday_observance(ymd(year, 1, 26), dates);

    let easter = easter_sunday(year);
    dates.insert(easter - Duration::days(2)); // Good Friday
    dates.insert(easter + Duration::days(1)); // Easter Monday

    // Anzac Day has no national weekend substitute.
    dates.insert(ymd(year, 4, 25));

    // Christmas and Boxing Day substitute past each other when on a weekend:
    // Dec 25 Sat -> Mon 27, Dec 25 Sun -> Tue 27; Dec 26 shifts two days.
    let christmas = ymd(year, 12, 25);
    let boxing = ymd(year, 12, 26);
    dates.insert(christmas);
    dates.insert(boxing);
    match christmas.weekday() {
        Weekday::Sat | Weekday::Sun => {
            dates.insert(ymd(year, 12, 27));
        }
        _ => {}
    }
    match boxing.weekday() {
        Weekday::Sat | Weekday::Sun => {
            dates.insert(ymd(year, 12, 28));
        }
        _ => {}
    }
}

/// United States market holidays for one year.
fn united_states_holidays(year: i32, dates: &mut BTreeSet<NaiveDate>) {
    with_nearest_weekday_observance(ymd(year, 1, 1), dates);
    dates.insert(nth_weekday(year, 1, Weekday::Mon, 3)); // Martin Luther King Jr. Day
    dates.insert(nth_weekday(year, 2, Weekday::Mon, 3)); // Washington's Birthday

    let easter = easter_sunday(year);
    dates.insert(easter - Duration::days(2)); // Good Friday

    dates.insert(last_weekday(year, 5, Weekday::Mon)); // Memorial Day
    with_nearest_weekday_observance(ymd(year, 6, 19), dates); // Juneteenth
    with_nearest_weekday_observance(ymd(year, 7, 4), dates); // Independence Day
    dates.insert(nth_weekday(year, 9, Weekday::Mon, 1)); // Labor Day
    dates.insert(nth_weekday(year, 11, Weekday::Thu, 4)); // Thanksgiving
    with_nearest_weekday_observance(ymd(year, 12, 25), dates); // Christmas
}
