//! Home/Work/Other classification of grouped stops.
//!
//! Rule choice (the source material carries several divergent heuristics):
//! **window-overlap, duration-weighted**. A stop interval qualifies for a
//! role when it overlaps the corresponding hour-of-day window in local
//! clock time; among qualifying stops, occurrences are grouped by rounded
//! coordinates and the rounded location with the largest summed duration
//! wins. Home is selected first, Work among the remainder; with no
//! qualifying candidate the role stays unassigned; the classifier never
//! guesses in the absence of evidence.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, mean_center};
use crate::{CanonicalPlace, PlaceType, StopGroup};

/// A wrapping hour-of-day window `[start_hour, end_hour)`.
///
/// When `end_hour <= start_hour` the window wraps past midnight
/// (e.g. 20 → 8 covers evening through next morning).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl HourWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Whether the window crosses midnight.
    pub fn wraps(&self) -> bool {
        self.end_hour <= self.start_hour
    }

    /// Whether a whole hour falls inside the window.
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.wraps() {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            (self.start_hour..self.end_hour).contains(&hour)
        }
    }
}

/// Configuration for Home/Work/Other classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Hour window qualifying a stop as a Home candidate. Default: 20 → 8
    pub home_window: HourWindow,
    /// Hour window qualifying a stop as a Work candidate. Default: 8 → 20
    pub work_window: HourWindow,
    /// Minimum summed night duration for a Home assignment. Default: 3600.0
    pub min_home_duration_s: f64,
    /// Minimum summed day duration for a Work assignment. Default: 900.0
    pub min_work_duration_s: f64,
    /// Decimal places for the coordinate rounding that groups occurrences
    /// of the same physical location. Default: 3 (~110 m in latitude)
    pub round_precision: u32,
    /// Radius in meters within which other places join the chosen
    /// Home/Work location (re-groups rounding near-duplicates).
    /// Default: 100.0
    pub match_radius_m: f64,
    /// UTC offset in hours applied before hour-of-day tests, so windows
    /// run in the subject's local clock. Default: 0
    pub utc_offset_hours: i32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            home_window: HourWindow::new(20, 8),
            work_window: HourWindow::new(8, 20),
            min_home_duration_s: 3600.0,
            min_work_duration_s: 900.0,
            round_precision: 3,
            match_radius_m: 100.0,
            utc_offset_hours: 0,
        }
    }
}

impl ClassifierConfig {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }
}

/// Whether `[start, end]` overlaps at least one instant of `window` in the
/// clock frame given by `offset`.
///
/// The interval is tested against every calendar day it can touch,
/// including the previous day so that a wrapped window opened the evening
/// before still covers an early-morning interval.
pub fn overlaps_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window: &HourWindow,
    offset: FixedOffset,
) -> bool {
    let s = start.with_timezone(&offset).naive_local();
    let e = end.with_timezone(&offset).naive_local();
    if e < s {
        return false;
    }
    if e - s >= Duration::hours(24) {
        return true;
    }

    let mut day: NaiveDate = s.date().pred_opt().unwrap_or_else(|| s.date());
    let last = e.date();
    while day <= last {
        let ws = day.and_hms_opt(window.start_hour % 24, 0, 0).unwrap();
        let we = if window.wraps() {
            day.succ_opt()
                .unwrap_or(day)
                .and_hms_opt(window.end_hour % 24, 0, 0)
                .unwrap()
        } else {
            day.and_hms_opt(window.end_hour % 24, 0, 0).unwrap()
        };
        if s < we && e >= ws {
            return true;
        }
        day = match day.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }
    false
}

/// Rounded-coordinate key grouping occurrences of one physical location.
type RoundedKey = (i64, i64);

fn round_key(value: f64, precision: u32) -> i64 {
    (value * 10f64.powi(precision as i32)).round() as i64
}

/// Classify grouped stops into canonical places.
///
/// Output rows aggregate stop occurrences by (rounded lat, rounded lon,
/// type): at most one Home row, at most one Work row, and one Other row per
/// remaining rounded location. Each row records its member intervals in
/// `merged_starts`/`merged_ends` so the original occurrence set can be
/// reconstructed.
pub fn classify_places(stops: &[StopGroup], config: &ClassifierConfig) -> Vec<CanonicalPlace> {
    if stops.is_empty() {
        return Vec::new();
    }

    let offset = config.offset();
    let key_of = |s: &StopGroup| -> RoundedKey {
        (
            round_key(s.lat, config.round_precision),
            round_key(s.lon, config.round_precision),
        )
    };

    let mut assigned: Vec<Option<PlaceType>> = vec![None; stops.len()];

    // Home: rounded location with the largest summed home-window duration.
    let home_members = select_role(
        stops,
        &assigned,
        &config.home_window,
        config.min_home_duration_s,
        config.match_radius_m,
        offset,
        &key_of,
    );
    for &i in &home_members {
        assigned[i] = Some(PlaceType::Home);
    }

    // Work: same rule over the remaining stops and the work window.
    let work_members = select_role(
        stops,
        &assigned,
        &config.work_window,
        config.min_work_duration_s,
        config.match_radius_m,
        offset,
        &key_of,
    );
    for &i in &work_members {
        assigned[i] = Some(PlaceType::Work);
    }

    let mut places = Vec::new();
    if !home_members.is_empty() {
        places.push(build_place(PlaceType::Home, &home_members, stops));
    }
    if !work_members.is_empty() {
        places.push(build_place(PlaceType::Work, &work_members, stops));
    }

    // Everything else: one Other row per rounded location.
    let mut other_keys: Vec<RoundedKey> = Vec::new();
    let mut other_members: HashMap<RoundedKey, Vec<usize>> = HashMap::new();
    for (i, s) in stops.iter().enumerate() {
        if assigned[i].is_none() {
            let key = key_of(s);
            if !other_members.contains_key(&key) {
                other_keys.push(key);
            }
            other_members.entry(key).or_default().push(i);
        }
    }
    other_keys.sort_unstable();
    for key in other_keys {
        places.push(build_place(PlaceType::Other, &other_members[&key], stops));
    }

    places.sort_by_key(|p| p.start_time);
    debug!(
        "classified {} stops into {} places ({} home member(s), {} work member(s))",
        stops.len(),
        places.len(),
        home_members.len(),
        work_members.len()
    );
    places
}

/// Pick the winning rounded location for one role and return its member
/// indices, including unassigned stops pulled in by the match radius.
#[allow(clippy::too_many_arguments)]
fn select_role(
    stops: &[StopGroup],
    assigned: &[Option<PlaceType>],
    window: &HourWindow,
    min_duration_s: f64,
    match_radius_m: f64,
    offset: FixedOffset,
    key_of: &dyn Fn(&StopGroup) -> RoundedKey,
) -> Vec<usize> {
    let mut durations: HashMap<RoundedKey, f64> = HashMap::new();
    for (i, s) in stops.iter().enumerate() {
        if assigned[i].is_none() && overlaps_window(s.start_time, s.end_time, window, offset) {
            *durations.entry(key_of(s)).or_insert(0.0) += s.duration_s;
        }
    }

    // Deterministic argmax: largest duration, smallest key on ties.
    let mut ranked: Vec<(RoundedKey, f64)> = durations.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.cmp(&b.0)));

    let winner = match ranked.first() {
        Some(&(key, total)) if total >= min_duration_s => key,
        _ => return Vec::new(),
    };

    let mut members: Vec<usize> = stops
        .iter()
        .enumerate()
        .filter(|(i, s)| assigned[*i].is_none() && key_of(s) == winner)
        .map(|(i, _)| i)
        .collect();

    // Distance propagation: absorb near-duplicates of the chosen centroid.
    let coords: Vec<(f64, f64)> = members.iter().map(|&i| (stops[i].lat, stops[i].lon)).collect();
    let (center_lat, center_lon) = mean_center(&coords);
    for (i, s) in stops.iter().enumerate() {
        if assigned[i].is_none()
            && !members.contains(&i)
            && haversine_distance(center_lat, center_lon, s.lat, s.lon) <= match_radius_m
        {
            members.push(i);
        }
    }
    members.sort_unstable();
    members
}

fn build_place(place_type: PlaceType, member_indices: &[usize], stops: &[StopGroup]) -> CanonicalPlace {
    let members: Vec<&StopGroup> = member_indices.iter().map(|&i| &stops[i]).collect();

    let coords: Vec<(f64, f64)> = members.iter().map(|s| (s.lat, s.lon)).collect();
    let (lat, lon) = mean_center(&coords);

    let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> =
        members.iter().map(|s| (s.start_time, s.end_time)).collect();
    intervals.sort();
    let (merged_starts, merged_ends): (Vec<_>, Vec<_>) = intervals.into_iter().unzip();

    CanonicalPlace {
        place_type,
        start_time: members.iter().map(|s| s.start_time).min().unwrap(),
        end_time: members.iter().map(|s| s.end_time).max().unwrap(),
        duration_s: members.iter().map(|s| s.duration_s).sum(),
        lat,
        lon,
        group_size: members.iter().map(|s| s.group_size).sum(),
        merged_starts,
        merged_ends,
    }
}
