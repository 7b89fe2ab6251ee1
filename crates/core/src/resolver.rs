//! # Slot Resolver
//!
//! Expands an [`AvailabilityProfile`] into concrete, timezone-normalized
//! UTC slots for a queried range. Resolution is pure: it never mutates the
//! profile and the same inputs always yield the same slots.
//!
//! For each calendar date of the range, interpreted in the profile's
//! timezone, coverage is determined as:
//!
//! 1. A [`DateOverride`] for the date fully supersedes the weekly pattern.
//! 2. Otherwise, available weekly rules for that weekday are unioned and
//!    blackout rules are subtracted (blackouts win on the same day).
//! 3. Local bounds convert to UTC endpoint-by-endpoint through the zone, so
//!    an interval straddling a DST transition shrinks or grows with the
//!    zone's offset rather than being shifted by a fixed duration.
//! 4. Slots contiguous in UTC across consecutive days are merged (a rule
//!    ending at `24:00` abutting the next day's `00:00` rule).
//!
//! [`DateOverride`]: crate::models::availability::DateOverride

use std::collections::VecDeque;

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::EngineResult;
use crate::models::availability::AvailabilityProfile;
use crate::models::slot::ResolvedSlot;

/// Resolve the profile into a lazy sequence of disjoint slots clamped to
/// `[range_start_utc, range_end_utc)`. A range outside all coverage yields
/// an empty sequence, not an error.
///
/// # Errors
///
/// Fails only if the profile carries a malformed timezone, which profile
/// writes already reject.
pub fn resolve<'a>(
    profile: &'a AvailabilityProfile,
    range_start_utc: DateTime<Utc>,
    range_end_utc: DateTime<Utc>,
) -> EngineResult<SlotIter<'a>> {
    let tz = profile.tz()?;
    let first_date = range_start_utc.with_timezone(&tz).date_naive();
    let last_date = range_end_utc.with_timezone(&tz).date_naive();
    Ok(SlotIter {
        profile,
        tz,
        next_date: first_date,
        last_date,
        range_start_utc,
        range_end_utc,
        day_slots: VecDeque::new(),
        pending: None,
        done: range_end_utc <= range_start_utc || first_date > last_date,
    })
}

/// Whether `[start_utc, end_utc)` is fully contained in a single resolved
/// slot. Partial containment is insufficient.
pub fn window_is_offerable(
    profile: &AvailabilityProfile,
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
) -> EngineResult<bool> {
    if end_utc <= start_utc {
        return Ok(false);
    }
    for slot in resolve(profile, start_utc, end_utc)? {
        if slot.contains(start_utc, end_utc) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Lazy iterator over resolved slots; each call to [`resolve`] yields a
/// fresh, restartable iteration over the same snapshot.
#[derive(Debug)]
pub struct SlotIter<'a> {
    profile: &'a AvailabilityProfile,
    tz: Tz,
    next_date: NaiveDate,
    last_date: NaiveDate,
    range_start_utc: DateTime<Utc>,
    range_end_utc: DateTime<Utc>,
    day_slots: VecDeque<ResolvedSlot>,
    // last slot held back so a contiguous successor can be merged into it
    pending: Option<ResolvedSlot>,
    done: bool,
}

impl Iterator for SlotIter<'_> {
    type Item = ResolvedSlot;

    fn next(&mut self) -> Option<ResolvedSlot> {
        loop {
            if let Some(slot) = self.day_slots.pop_front() {
                match self.pending.take() {
                    None => self.pending = Some(slot),
                    Some(held) if held.end_utc == slot.start_utc => {
                        self.pending = Some(ResolvedSlot {
                            start_utc: held.start_utc,
                            end_utc: slot.end_utc,
                        });
                    }
                    Some(held) => {
                        self.pending = Some(slot);
                        return Some(held);
                    }
                }
                continue;
            }
            if self.done {
                return self.pending.take();
            }
            let date = self.next_date;
            match date.succ_opt() {
                Some(next) if next <= self.last_date => self.next_date = next,
                _ => self.done = true,
            }
            self.day_slots = expand_date(
                self.profile,
                self.tz,
                date,
                self.range_start_utc,
                self.range_end_utc,
            );
        }
    }
}

/// Coverage for one local date, converted to UTC and clamped to the range.
fn expand_date(
    profile: &AvailabilityProfile,
    tz: Tz,
    date: NaiveDate,
    range_start_utc: DateTime<Utc>,
    range_end_utc: DateTime<Utc>,
) -> VecDeque<ResolvedSlot> {
    let mut out = VecDeque::new();
    for (start_minutes, end_minutes) in day_coverage(profile, date) {
        let start_utc = local_to_utc(tz, local_datetime(date, start_minutes));
        let end_utc = local_to_utc(tz, local_datetime(date, end_minutes));
        let start_utc = start_utc.max(range_start_utc);
        let end_utc = end_utc.min(range_end_utc);
        if start_utc < end_utc {
            out.push_back(ResolvedSlot { start_utc, end_utc });
        }
    }
    out
}

/// Local-time coverage for one date, as half-open minute intervals.
fn day_coverage(profile: &AvailabilityProfile, date: NaiveDate) -> Vec<(u16, u16)> {
    if let Some(date_override) = profile.date_overrides.get(&date) {
        if !date_override.is_available {
            return Vec::new();
        }
        return match (date_override.start_time, date_override.end_time) {
            (Some(start), Some(end)) => vec![(start.minutes(), end.minutes())],
            _ => vec![(0, 24 * 60)],
        };
    }

    let day_of_week = date.weekday().num_days_from_sunday() as u8;
    let mut open = Vec::new();
    let mut blocked = Vec::new();
    for rule in &profile.weekly_rules {
        if rule.day_of_week != day_of_week {
            continue;
        }
        let interval = (rule.start_time.minutes(), rule.end_time.minutes());
        if rule.is_available {
            open.push(interval);
        } else {
            blocked.push(interval);
        }
    }
    subtract_intervals(merge_intervals(open), merge_intervals(blocked))
}

/// `minutes` may be 1440 (`24:00`), which lands on the next day's midnight.
fn local_datetime(date: NaiveDate, minutes: u16) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(minutes))
}

/// Convert a local wall-clock instant to UTC through the zone's offset at
/// that instant. A repeated hour (fall-back) takes the earlier offset; a
/// skipped wall time (spring-forward) rolls forward to the first instant
/// that exists in the zone.
fn local_to_utc(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            // DST gaps are at most a few hours; probe minute-by-minute for
            // the far edge of the gap.
            let mut probe = naive;
            for _ in 0..(4 * 60) {
                probe += Duration::minutes(1);
                match tz.from_local_datetime(&probe) {
                    LocalResult::Single(dt) => return dt.with_timezone(&Utc),
                    LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
                    LocalResult::None => continue,
                }
            }
            Utc.from_utc_datetime(&naive)
        }
    }
}

/// Sort and union overlapping or touching intervals.
fn merge_intervals(mut intervals: Vec<(u16, u16)>) -> Vec<(u16, u16)> {
    intervals.sort_unstable();
    let mut merged: Vec<(u16, u16)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Remove `blocked` (disjoint, ascending) from `open` (disjoint, ascending).
fn subtract_intervals(open: Vec<(u16, u16)>, blocked: Vec<(u16, u16)>) -> Vec<(u16, u16)> {
    if blocked.is_empty() {
        return open;
    }
    let mut out = Vec::new();
    for (mut start, end) in open {
        for &(blocked_start, blocked_end) in &blocked {
            if blocked_end <= start || end <= blocked_start {
                continue;
            }
            if blocked_start > start {
                out.push((start, blocked_start));
            }
            start = start.max(blocked_end);
            if start >= end {
                break;
            }
        }
        if start < end {
            out.push((start, end));
        }
    }
    out
}
