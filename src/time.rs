//! Validity intervals and as-of semantics.
//!
//! Every bound is optional: a missing `from` stands for -∞ and a missing
//! `to` for +∞. The same overlap primitive backs both the as-of filter and
//! contradiction detection.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EndBoundary;
use crate::error::{ExecutionError, ValidationError};

/// A validity interval `[from, to)` with open bounds when absent.
///
/// # Examples
///
/// ```
/// use cnsql::ValidityInterval;
/// use chrono::Utc;
///
/// let always = ValidityInterval::open();
/// assert!(always.is_unbounded());
/// assert!(always.overlaps(&ValidityInterval::starting_at(Utc::now())));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ValidityInterval {
    /// Start of validity (inclusive). `None` means -∞.
    pub from: Option<DateTime<Utc>>,

    /// End of validity. `None` means +∞.
    pub to: Option<DateTime<Utc>>,
}

impl ValidityInterval {
    /// Creates an interval from optional bounds.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidInterval` if both bounds are present
    /// and `from > to`.
    pub fn new(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(ValidationError::InvalidInterval { from: f, to: t });
            }
        }
        Ok(Self { from, to })
    }

    /// The interval covering all time.
    #[must_use]
    pub const fn open() -> Self {
        Self { from: None, to: None }
    }

    /// An interval open on the right.
    #[must_use]
    pub const fn starting_at(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// An interval open on the left.
    #[must_use]
    pub const fn until(to: DateTime<Utc>) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// True if neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// As-of visibility of this interval at `ts`.
    ///
    /// `from <= ts` always; the end test depends on `boundary`.
    #[must_use]
    pub fn is_visible_at(&self, ts: DateTime<Utc>, boundary: EndBoundary) -> bool {
        let started = self.from.map_or(true, |from| from <= ts);
        let not_ended = match (self.to, boundary) {
            (None, _) => true,
            (Some(to), EndBoundary::Exclusive) => to > ts,
            (Some(to), EndBoundary::Inclusive) => to >= ts,
        };
        started && not_ended
    }

    /// True iff `max(start1, start2) < min(end1, end2)`.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let (start, end) = self.window_bounds(other);
        match (start, end) {
            (Some(s), Some(e)) => s < e,
            _ => true,
        }
    }

    /// The window `[max(start), min(end)]` if the intervals overlap.
    #[must_use]
    pub fn overlap_window(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let (from, to) = self.window_bounds(other);
        Some(Self { from, to })
    }

    fn window_bounds(&self, other: &Self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        // None is -inf for starts and +inf for ends, so Option's ordering
        // only works for the start side.
        let start = self.from.max(other.from);
        let end = match (self.to, other.to) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        };
        (start, end)
    }
}

impl std::fmt::Display for ValidityInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.from {
            Some(from) => write!(f, "[{from} → ")?,
            None => write!(f, "(-∞ → ")?,
        }
        match self.to {
            Some(to) => write!(f, "{to})"),
            None => write!(f, "∞)"),
        }
    }
}

/// As-of visibility for an optional instant: no instant means unfiltered.
#[must_use]
pub fn is_visible(
    asof: Option<DateTime<Utc>>,
    interval: &ValidityInterval,
    boundary: EndBoundary,
) -> bool {
    asof.map_or(true, |ts| interval.is_visible_at(ts, boundary))
}

/// Interprets an ISO-8601-like timestamp.
///
/// Accepts RFC 3339 (`2025-01-01T00:00:00Z`, `2025-01-01T02:00:00+02:00`),
/// compact offsets (`+0000`, `+02`), minute precision (`2025-01-01T00:00Z`)
/// and the basic form (`20250101T000000Z`). Date-times without an offset are
/// taken as UTC; bare dates (`2025-01-01`, `20250101`) mean midnight UTC.
///
/// # Errors
///
/// Returns `ExecutionError::InvalidAsOf` for anything else.
pub fn parse_instant(text: &str) -> Result<DateTime<Utc>, ExecutionError> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(naive.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%Y%m%d"] {
        if let Some(naive) = NaiveDate::parse_from_str(text, fmt)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(naive.and_utc());
        }
    }
    Err(ExecutionError::InvalidAsOf {
        value: text.to_string(),
        reason: "expected an ISO-8601 date or date-time".to_string(),
    })
}

/// Date-times ending in `Z` or a UTC offset (`+hh:mm`, `+hhmm` or `+hh`).
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y%m%dT%H%M%S%#z",
];

/// Date-times without an offset; read as UTC.
const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_reversed_bounds() {
        assert!(ValidityInterval::new(Some(at(2025, 1, 2)), Some(at(2025, 1, 1))).is_err());
        assert!(ValidityInterval::new(Some(at(2025, 1, 1)), Some(at(2025, 1, 1))).is_ok());
        assert!(ValidityInterval::new(None, Some(at(2025, 1, 1))).is_ok());
    }

    #[test]
    fn test_exclusive_end_hides_fact_at_boundary() {
        let interval = ValidityInterval::until(at(2025, 1, 1));
        assert!(!interval.is_visible_at(at(2025, 1, 1), EndBoundary::Exclusive));
        assert!(interval.is_visible_at(at(2025, 1, 1), EndBoundary::Inclusive));
    }

    #[test]
    fn test_start_is_inclusive_under_both_policies() {
        let interval = ValidityInterval::starting_at(at(2025, 1, 1));
        for boundary in [EndBoundary::Exclusive, EndBoundary::Inclusive] {
            assert!(interval.is_visible_at(at(2025, 1, 1), boundary));
            assert!(!interval.is_visible_at(at(2025, 1, 1) - Duration::seconds(1), boundary));
        }
    }

    #[test]
    fn test_open_interval_always_visible() {
        let interval = ValidityInterval::open();
        assert!(interval.is_visible_at(at(1970, 1, 1), EndBoundary::Exclusive));
        assert!(interval.is_visible_at(at(2999, 1, 1), EndBoundary::Exclusive));
    }

    #[test]
    fn test_no_asof_means_unfiltered() {
        let ended = ValidityInterval::new(Some(at(2000, 1, 1)), Some(at(2000, 1, 2))).unwrap();
        assert!(is_visible(None, &ended, EndBoundary::Exclusive));
        assert!(!is_visible(Some(at(2025, 1, 1)), &ended, EndBoundary::Exclusive));
    }

    #[test]
    fn test_is_unbounded_needs_both_sides_open() {
        assert!(ValidityInterval::open().is_unbounded());
        assert!(ValidityInterval::default().is_unbounded());
        assert!(!ValidityInterval::until(at(2025, 1, 1)).is_unbounded());
        assert!(!ValidityInterval::starting_at(at(2025, 1, 1)).is_unbounded());
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = ValidityInterval::until(at(2025, 1, 1));
        let b = ValidityInterval::starting_at(at(2025, 1, 1));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlap_window(&b).is_none());
    }

    #[test]
    fn test_overlap_window_is_max_start_min_end() {
        let a = ValidityInterval::new(Some(at(2024, 1, 1)), Some(at(2024, 6, 1))).unwrap();
        let b = ValidityInterval::new(Some(at(2024, 3, 1)), Some(at(2024, 12, 1))).unwrap();
        let window = a.overlap_window(&b).unwrap();
        assert_eq!(window.from, Some(at(2024, 3, 1)));
        assert_eq!(window.to, Some(at(2024, 6, 1)));
        assert_eq!(b.overlap_window(&a), Some(window));
    }

    #[test]
    fn test_overlap_window_keeps_open_sides() {
        let a = ValidityInterval::open();
        let b = ValidityInterval::until(at(2024, 6, 1));
        let window = a.overlap_window(&b).unwrap();
        assert_eq!(window.from, None);
        assert_eq!(window.to, Some(at(2024, 6, 1)));
    }

    #[test]
    fn test_parse_instant_formats() {
        let expected = at(2025, 1, 1);
        assert_eq!(parse_instant("2025-01-01T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_instant("2025-01-01T02:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_instant("2025-01-01T00:00:00").unwrap(), expected);
        assert_eq!(parse_instant("2025-01-01T00:00:00.000").unwrap(), expected);
        assert_eq!(parse_instant("2025-01-01").unwrap(), expected);
    }

    #[test]
    fn test_parse_instant_compact_offsets_and_basic_form() {
        let expected = at(2025, 1, 1);
        for text in [
            "2025-01-01T00:00:00+0000",
            "2025-01-01T03:30:00.000+0330",
            "2025-01-01T00:00Z",
            "2025-01-01T02:00+02:00",
            "2025-01-01T02:00+02",
            "2025-01-01 00:00:00z",
            "20250101T000000Z",
            "20241231T190000-0500",
            "20250101T000000",
            "20250101",
        ] {
            let parsed = parse_instant(text).unwrap_or_else(|e| panic!("{text}: {e}"));
            assert_eq!(parsed, expected, "{text}");
        }
        assert!(parse_instant("Z").is_err());
        assert!(parse_instant("2025-01-01Z").is_err());
    }

    #[test]
    fn test_parse_instant_rejects_garbage() {
        let err = parse_instant("RETURN").unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidAsOf { ref value, .. } if value == "RETURN"));
        assert!(parse_instant("2025-13-01").is_err());
    }

    #[test]
    fn test_display() {
        let display = format!("{}", ValidityInterval::open());
        assert!(display.contains("-∞"));
        assert!(display.contains("∞)"));
    }

    #[test]
    fn test_serialization_keeps_open_bounds_as_null() {
        let interval = ValidityInterval::until(at(2025, 1, 1));
        let json = serde_json::to_value(interval).unwrap();
        assert!(json["from"].is_null());
        let back: ValidityInterval = serde_json::from_value(json).unwrap();
        assert_eq!(back, interval);
    }
}
