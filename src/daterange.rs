//! Date-range chunking for the NVD publication-date search.
//!
//! NVD rejects date-range queries spanning more than 120 days, so wide
//! lookback windows are split into contiguous sub-ranges. Windows use
//! inclusive day bounds; adjacent windows are separated by exactly one day.

use chrono::{Days, Months, NaiveDate, Utc};

/// Maximum window span in days. One under NVD's 120-day cap to absorb
/// boundary rounding on the upstream side.
pub const MAX_WINDOW_DAYS: u64 = 119;

/// An inclusive day range, rendered to NVD `pubStartDate`/`pubEndDate`
/// parameters as midnight-to-end-of-day timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn pub_start_param(&self) -> String {
        format!("{}T00:00:00.000", self.start)
    }

    pub fn pub_end_param(&self) -> String {
        format!("{}T23:59:59.999", self.end)
    }
}

/// Splits `[start, end]` into ordered, contiguous, non-overlapping windows
/// of at most `max_days` days each.
///
/// A span within `max_days` yields a single window; `start == end` yields a
/// single one-day window. Returns an empty list when `start > end`.
pub fn split_range(start: NaiveDate, end: NaiveDate, max_days: u64) -> Vec<DateWindow> {
    let mut windows = Vec::new();
    let mut cursor = start;

    while cursor <= end {
        let window_end = cursor
            .checked_add_days(Days::new(max_days))
            .unwrap_or(end)
            .min(end);
        windows.push(DateWindow {
            start: cursor,
            end: window_end,
        });
        cursor = match window_end.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    windows
}

/// The `[now - months, now]` lookback range used by analytics queries.
pub fn lookback_range(months: u32) -> (NaiveDate, NaiveDate) {
    let end = Utc::now().date_naive();
    let start = end
        .checked_sub_months(Months::new(months))
        .unwrap_or(end);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn short_span_yields_single_window() {
        let windows = split_range(date("2024-01-01"), date("2024-03-01"), MAX_WINDOW_DAYS);
        assert_eq!(
            windows,
            vec![DateWindow {
                start: date("2024-01-01"),
                end: date("2024-03-01"),
            }]
        );
    }

    #[test]
    fn same_day_yields_single_window() {
        let windows = split_range(date("2024-06-15"), date("2024-06-15"), MAX_WINDOW_DAYS);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, windows[0].end);
    }

    #[test]
    fn full_year_splits_into_four_windows() {
        let start = date("2024-01-01");
        let end = date("2024-12-31");
        let windows = split_range(start, end, MAX_WINDOW_DAYS);

        assert_eq!(windows.len(), 4);
        assert_eq!(windows[0].start, start);
        assert_eq!(windows.last().unwrap().end, end);
    }

    #[test]
    fn windows_are_contiguous_and_bounded() {
        let start = date("2023-01-01");
        let end = date("2024-12-31");
        let windows = split_range(start, end, MAX_WINDOW_DAYS);

        assert_eq!(windows[0].start, start);
        assert_eq!(windows.last().unwrap().end, end);
        for w in &windows {
            assert!(w.start <= w.end);
            assert!((w.end - w.start).num_days() <= MAX_WINDOW_DAYS as i64);
        }
        for pair in windows.windows(2) {
            // No gap, no overlap: next window starts the day after
            assert_eq!(pair[1].start, pair[0].end + Days::new(1));
        }
    }

    #[test]
    fn inverted_range_yields_no_windows() {
        let windows = split_range(date("2024-06-01"), date("2024-05-01"), MAX_WINDOW_DAYS);
        assert!(windows.is_empty());
    }

    #[test]
    fn window_params_span_whole_days() {
        let w = DateWindow {
            start: date("2024-01-01"),
            end: date("2024-04-29"),
        };
        assert_eq!(w.pub_start_param(), "2024-01-01T00:00:00.000");
        assert_eq!(w.pub_end_param(), "2024-04-29T23:59:59.999");
    }

    #[test]
    fn lookback_range_is_ordered() {
        let (start, end) = lookback_range(6);
        assert!(start < end);
    }
}
