//! Contribution streak computation over a daily contribution calendar.
//!
//! Dates are calendar days in UTC, matching the dates GitHub reports in the
//! contribution calendar.

use std::collections::HashMap;

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;

/// One day of the contribution calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: u32,
}

impl ContributionDay {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self { date, count }
    }
}

/// Contribution days in ascending date order, one entry per date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionCalendar {
    days: Vec<ContributionDay>,
}

impl ContributionCalendar {
    /// Sort the days by date and drop repeated dates (first one wins).
    pub fn new(mut days: Vec<ContributionDay>) -> Self {
        days.sort_by_key(|d| d.date);
        days.dedup_by_key(|d| d.date);
        Self { days }
    }

    pub fn days(&self) -> &[ContributionDay] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Compute streaks anchored on the current UTC date.
    pub fn streak_utc(&self) -> StreakResult {
        compute_streak(&self.days, Utc::now().date_naive())
    }
}

/// Streak summary for a calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakResult {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_contributions: u64,
}

/// Compute current and longest streaks plus the contribution total.
///
/// `days` must be in ascending date order. `today` is the anchor for the
/// current streak: when it has no contributions yet the anchor moves back one
/// day, so a streak is not reported broken before the day's data lands.
pub fn compute_streak(days: &[ContributionDay], today: NaiveDate) -> StreakResult {
    let total_contributions = days.iter().map(|d| u64::from(d.count)).sum();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for day in days {
        if let Some(p) = prev {
            if p.checked_add_days(Days::new(1)) != Some(day.date) {
                run = 0;
            }
        }
        if day.count > 0 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
        prev = Some(day.date);
    }

    let by_date: HashMap<NaiveDate, u32> = days.iter().map(|d| (d.date, d.count)).collect();
    let count_on = |date: NaiveDate| by_date.get(&date).copied().unwrap_or(0);

    let mut anchor = Some(today);
    if count_on(today) == 0 {
        anchor = today.checked_sub_days(Days::new(1));
    }

    let mut current = 0u32;
    while let Some(date) = anchor {
        if count_on(date) == 0 {
            break;
        }
        current += 1;
        anchor = date.checked_sub_days(Days::new(1));
    }

    StreakResult {
        current_streak: current,
        longest_streak: longest,
        total_contributions,
    }
}
