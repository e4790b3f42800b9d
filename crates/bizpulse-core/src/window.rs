//! Date-window resolution for post listings and chart aggregates.
//!
//! All listings and aggregates operate over a closed date range that never
//! includes the current (partial) day: the end date is clamped to yesterday,
//! and a missing range defaults to a trailing 7- or 30-day window.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
}

/// Default trailing-window length when no explicit range is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPreset {
    #[default]
    Days7,
    Days30,
}

impl WindowPreset {
    #[must_use]
    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "7d" => Some(Self::Days7),
            "30d" => Some(Self::Days30),
            _ => None,
        }
    }

    fn span_days(self) -> u64 {
        match self {
            Self::Days7 => 7,
            Self::Days30 => 30,
        }
    }
}

/// An inclusive date range with both endpoints strictly before today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// Resolves a window from optional user-supplied bounds.
    ///
    /// `to` is clamped to `today - 1`; a missing `from` defaults to a trailing
    /// window of `preset` length ending at the clamped `to`.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidRange`] when `from` lands after the
    /// clamped `to`.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        preset: WindowPreset,
        today: NaiveDate,
    ) -> Result<Self, WindowError> {
        let yesterday = today - Days::new(1);
        let to = to.map_or(yesterday, |d| d.min(yesterday));
        let from = from.unwrap_or(to - Days::new(preset.span_days() - 1));

        if from > to {
            return Err(WindowError::InvalidRange { from, to });
        }

        Ok(Self { from, to })
    }

    /// Resolves against the current UTC date.
    ///
    /// # Errors
    ///
    /// Same as [`DateWindow::resolve`].
    pub fn resolve_utc(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        preset: WindowPreset,
    ) -> Result<Self, WindowError> {
        Self::resolve(from, to, preset, Utc::now().date_naive())
    }

    /// Inclusive lower timestamp bound (midnight UTC of `from`).
    #[must_use]
    pub fn start_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.from.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    /// Exclusive upper timestamp bound (midnight UTC of the day after `to`).
    #[must_use]
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        let next = self.to + Days::new(1);
        Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn defaults_to_trailing_seven_days_ending_yesterday() {
        let today = date(2026, 3, 15);
        let w = DateWindow::resolve(None, None, WindowPreset::Days7, today).unwrap();
        assert_eq!(w.to, date(2026, 3, 14));
        assert_eq!(w.from, date(2026, 3, 8));
    }

    #[test]
    fn thirty_day_preset_spans_thirty_days() {
        let today = date(2026, 3, 15);
        let w = DateWindow::resolve(None, None, WindowPreset::Days30, today).unwrap();
        assert_eq!(w.to, date(2026, 3, 14));
        assert_eq!(w.from, date(2026, 2, 13));
    }

    #[test]
    fn end_date_clamped_to_yesterday() {
        let today = date(2026, 3, 15);
        let w = DateWindow::resolve(
            Some(date(2026, 3, 1)),
            Some(date(2026, 3, 20)),
            WindowPreset::Days7,
            today,
        )
        .unwrap();
        assert_eq!(w.to, date(2026, 3, 14), "today and future days are excluded");
        assert_eq!(w.from, date(2026, 3, 1));
    }

    #[test]
    fn explicit_past_range_kept_as_is() {
        let today = date(2026, 3, 15);
        let w = DateWindow::resolve(
            Some(date(2026, 1, 1)),
            Some(date(2026, 1, 31)),
            WindowPreset::Days7,
            today,
        )
        .unwrap();
        assert_eq!(w.from, date(2026, 1, 1));
        assert_eq!(w.to, date(2026, 1, 31));
    }

    #[test]
    fn from_after_clamped_to_is_rejected() {
        let today = date(2026, 3, 15);
        let result = DateWindow::resolve(
            Some(date(2026, 3, 15)),
            None,
            WindowPreset::Days7,
            today,
        );
        assert_eq!(
            result,
            Err(WindowError::InvalidRange {
                from: date(2026, 3, 15),
                to: date(2026, 3, 14),
            })
        );
    }

    #[test]
    fn from_only_defaults_to_yesterday_end() {
        let today = date(2026, 3, 15);
        let w = DateWindow::resolve(Some(date(2026, 3, 10)), None, WindowPreset::Days7, today)
            .unwrap();
        assert_eq!(w.from, date(2026, 3, 10));
        assert_eq!(w.to, date(2026, 3, 14));
    }

    #[test]
    fn timestamp_bounds_cover_full_days() {
        let w = DateWindow {
            from: date(2026, 3, 8),
            to: date(2026, 3, 14),
        };
        assert_eq!(w.start_at().to_rfc3339(), "2026-03-08T00:00:00+00:00");
        assert_eq!(w.end_exclusive().to_rfc3339(), "2026-03-15T00:00:00+00:00");
    }

    #[test]
    fn preset_parses_known_params() {
        assert_eq!(WindowPreset::from_param("7d"), Some(WindowPreset::Days7));
        assert_eq!(WindowPreset::from_param("30d"), Some(WindowPreset::Days30));
        assert_eq!(WindowPreset::from_param("90d"), None);
    }
}
