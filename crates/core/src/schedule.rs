//! Event schedule derivation.
//!
//! A case is described by an anchor instant (the scheduled setup time) and a duration. Every
//! clinical event in a [`CaseEventTable`] is placed relative to one of:
//!
//! - the anchor (`Absolute`),
//! - the end of the case (`DurationRelative`, i.e. `duration - k` minutes after the anchor),
//! - another event resolved earlier in the table (`EventRelative`).
//!
//! Each computed time then receives a small random jitter so generated fixtures do not land
//! on suspiciously round timestamps.

use crate::constants::{DATE_FORMAT, DEFAULT_JITTER_MINUTES};
use crate::error::{CaseGenError, CaseGenResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// How an event's time relates to the anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOffset {
    /// Signed minute offset from the anchor.
    Absolute(i64),
    /// `duration - minutes_before_end` minutes from the anchor.
    DurationRelative(i64),
    /// `delta_minutes` from an event resolved earlier in the table.
    EventRelative { base_event: String, delta_minutes: i64 },
}

impl EventOffset {
    pub fn event_relative(base_event: impl Into<String>, delta_minutes: i64) -> Self {
        Self::EventRelative {
            base_event: base_event.into(),
            delta_minutes,
        }
    }
}

impl FromStr for EventOffset {
    type Err = CaseGenError;

    /// Parses the textual offset forms used in event tables:
    /// `-60`, `15`, `duration-30`, `exiting+5`, `in_pacu+60`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || CaseGenError::InvalidOffset(text.to_owned());

        if let Ok(minutes) = text.parse::<i64>() {
            return Ok(Self::Absolute(minutes));
        }

        let split_at = text
            .rfind(|c: char| c == '+' || c == '-')
            .ok_or_else(invalid)?;
        let (base, delta) = text.split_at(split_at);
        let base = base.trim();
        let delta: i64 = delta.replace(' ', "").parse().map_err(|_| invalid())?;

        let valid_name = !base.is_empty()
            && base
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(invalid());
        }

        if base == "duration" {
            if delta > 0 {
                // `duration+N` would place an event after the case ends; the tables only ever
                // count back from the end.
                return Err(invalid());
            }
            let before_end = delta.checked_neg().ok_or_else(invalid)?;
            return Ok(Self::DurationRelative(before_end));
        }

        Ok(Self::event_relative(base, delta))
    }
}

impl fmt::Display for EventOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(minutes) => write!(f, "{minutes}"),
            Self::DurationRelative(k) => write!(f, "duration-{k}"),
            Self::EventRelative {
                base_event,
                delta_minutes,
            } => write!(f, "{base_event}{delta_minutes:+}"),
        }
    }
}

/// One row of an event table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub name: String,
    pub offset: EventOffset,
}

/// Ordered, validated list of clinical events.
///
/// Construction guarantees that names are unique and that every `EventRelative` row refers
/// to an event that appears earlier, so evaluating rows in order always succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseEventTable {
    rows: Vec<EventRow>,
}

impl CaseEventTable {
    pub fn new(rows: Vec<EventRow>) -> CaseGenResult<Self> {
        if rows.is_empty() {
            return Err(CaseGenError::InvalidEventTable(
                "table must contain at least one event".into(),
            ));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for row in &rows {
            let name = row.name.as_str();
            if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
                return Err(CaseGenError::InvalidEventTable(format!(
                    "invalid event name '{name}'"
                )));
            }
            if let EventOffset::EventRelative { base_event, .. } = &row.offset {
                if !seen.contains(base_event.as_str()) {
                    return Err(CaseGenError::InvalidEventTable(format!(
                        "event '{name}' refers to '{base_event}', which is not defined before it"
                    )));
                }
            }
            if !seen.insert(name) {
                return Err(CaseGenError::InvalidEventTable(format!(
                    "event '{name}' is defined more than once"
                )));
            }
        }

        Ok(Self { rows })
    }

    /// Build a table from `(name, offset expression)` pairs.
    pub fn parse<'a, I>(rows: I) -> CaseGenResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let rows = rows
            .into_iter()
            .map(|(name, offset)| {
                Ok(EventRow {
                    name: name.to_owned(),
                    offset: offset.parse()?,
                })
            })
            .collect::<CaseGenResult<Vec<_>>>()?;
        Self::new(rows)
    }

    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Event names in table order.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.name.as_str())
    }
}

/// Built-in event tables.
///
/// The two profiles differ in how the late events are placed: `Legacy` puts the PACU events
/// at fixed offsets from the anchor, `Current` chains them off `exiting` and `in_pacu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventProfile {
    #[default]
    Current,
    Legacy,
}

impl EventProfile {
    pub const ALL: [EventProfile; 2] = [EventProfile::Current, EventProfile::Legacy];

    pub fn name(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Legacy => "legacy",
        }
    }

    fn rows(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Current => &[
                ("arrive", "-60"),
                ("in_preop", "-45"),
                ("out_preop", "-15"),
                ("planned_preop", "-45"),
                ("setup", "0"),
                ("intraop", "10"),
                ("started", "15"),
                ("closing", "duration-30"),
                ("complete", "duration-15"),
                ("exiting", "duration-10"),
                ("ordered_pacu", "exiting-5"),
                ("planned_pacu", "exiting-5"),
                ("in_pacu", "exiting+5"),
                ("out_pacu", "in_pacu+60"),
            ],
            Self::Legacy => &[
                ("arrive", "-60"),
                ("in_preop", "-45"),
                ("out_preop", "-15"),
                ("planned_preop", "-5"),
                ("setup", "0"),
                ("intraop", "10"),
                ("started", "15"),
                ("closing", "duration-30"),
                ("complete", "duration-15"),
                ("exiting", "duration-10"),
                ("ordered_pacu", "duration-5"),
                ("planned_pacu", "0"),
                ("in_pacu", "5"),
                ("out_pacu", "90"),
            ],
        }
    }

    pub fn table(self) -> CaseEventTable {
        CaseEventTable::parse(self.rows().iter().copied())
            .unwrap_or_else(|e| panic!("built-in event profile '{}' is invalid: {e}", self.name()))
    }
}

impl FromStr for EventProfile {
    type Err = CaseGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|profile| profile.name() == wanted)
            .ok_or_else(|| CaseGenError::UnknownProfile(s.trim().to_owned()))
    }
}

/// Source of per-event jitter, in whole minutes.
pub trait Jitter {
    /// Draw the jitter for the next event.
    fn sample_minutes(&mut self) -> i64;
}

/// Uniform jitter in `[-max_minutes, +max_minutes]`.
#[derive(Debug)]
pub struct RandomJitter<R> {
    rng: R,
    max_minutes: i64,
}

impl<R: Rng> RandomJitter<R> {
    pub fn new(rng: R, max_minutes: i64) -> Self {
        Self {
            rng,
            max_minutes: max_minutes.saturating_abs(),
        }
    }

    /// Jitter with the default ±2 minute bound.
    pub fn standard(rng: R) -> Self {
        Self::new(rng, DEFAULT_JITTER_MINUTES)
    }
}

impl<R: Rng> Jitter for RandomJitter<R> {
    fn sample_minutes(&mut self) -> i64 {
        self.rng.gen_range(-self.max_minutes..=self.max_minutes)
    }
}

/// Jitter that never moves an event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample_minutes(&mut self) -> i64 {
        0
    }
}

/// Whether jitter may reorder an event relative to the event it is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingPolicy {
    /// Jitter is applied as drawn; a derived event may land before its reference.
    #[default]
    Unordered,
    /// Events derived with a non-negative delta never land before their reference event.
    KeepAfterReference,
}

/// Concrete timestamps for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSchedule {
    anchor: NaiveDateTime,
    times: BTreeMap<String, NaiveDateTime>,
}

impl EventSchedule {
    pub fn anchor(&self) -> NaiveDateTime {
        self.anchor
    }

    pub fn get(&self, event: &str) -> Option<NaiveDateTime> {
        self.times.get(event).copied()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Events with their times, in name order. Iterate the table for clinical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NaiveDateTime)> {
        self.times.iter().map(|(name, time)| (name.as_str(), *time))
    }
}

/// Resolve every event in `table` against `anchor` and `duration_minutes`.
///
/// Uses [`OrderingPolicy::Unordered`], so jitter is applied exactly as drawn. See
/// [`resolve_schedule_with`] to pick another policy.
pub fn resolve_schedule<J>(
    anchor: NaiveDateTime,
    duration_minutes: i64,
    table: &CaseEventTable,
    jitter: &mut J,
) -> Option<EventSchedule>
where
    J: Jitter + ?Sized,
{
    resolve_schedule_with(
        anchor,
        duration_minutes,
        table,
        jitter,
        OrderingPolicy::Unordered,
    )
}

/// Resolve every event in `table` under the given ordering policy.
///
/// Returns `None` if any event would fall outside the representable date range.
pub fn resolve_schedule_with<J>(
    anchor: NaiveDateTime,
    duration_minutes: i64,
    table: &CaseEventTable,
    jitter: &mut J,
    ordering: OrderingPolicy,
) -> Option<EventSchedule>
where
    J: Jitter + ?Sized,
{
    let mut times: BTreeMap<String, NaiveDateTime> = BTreeMap::new();

    for row in table.rows() {
        let shift = jitter.sample_minutes();

        let time = match &row.offset {
            EventOffset::Absolute(minutes) => offset_by(anchor, minutes.checked_add(shift)?)?,
            EventOffset::DurationRelative(before_end) => {
                let minutes = duration_minutes.checked_sub(*before_end)?;
                offset_by(anchor, minutes.checked_add(shift)?)?
            }
            EventOffset::EventRelative {
                base_event,
                delta_minutes,
            } => {
                let reference = *times
                    .get(base_event)
                    .expect("event table references are validated on construction");
                let time = offset_by(reference, delta_minutes.checked_add(shift)?)?;
                if ordering == OrderingPolicy::KeepAfterReference && *delta_minutes >= 0 {
                    time.max(reference)
                } else {
                    time
                }
            }
        };

        tracing::trace!(event = %row.name, offset = %row.offset, %time, "resolved event");
        times.insert(row.name.clone(), time);
    }

    Some(EventSchedule { anchor, times })
}

fn offset_by(time: NaiveDateTime, minutes: i64) -> Option<NaiveDateTime> {
    time.checked_add_signed(TimeDelta::try_minutes(minutes)?)
}

/// Parse the anchor instant from the scheduled date and time field values.
///
/// Accepts `YYYYMMDD` for the date and `HHMM`, `HHMMSS`, `HH:MM` or `HH:MM:SS` for the time.
/// Returns `None` when either part is missing or unparseable; callers then render without
/// a schedule instead of failing.
pub fn parse_anchor(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date?.trim(), DATE_FORMAT).ok()?;
    let time = time?.trim();
    let time = ["%H%M%S", "%H%M", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(time, format).ok())?;
    Some(date.and_time(time))
}
