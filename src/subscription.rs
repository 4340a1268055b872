//! Subscription lifecycle: subscribe, check, reset.
//!
//! The state is re-derived from the store on every call. No record means no
//! subscription; a record older than its duration is expired and gets wiped
//! together with the rating log the first time it is checked.

use crate::classifier;
use crate::store::{Resource, StateStore};
use anyhow::{Context, Result};
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Duration used when `subscribe` gets no usable hour count.
pub const DEFAULT_DURATION_HOURS: i64 = 24;
pub const MIN_DURATION_HOURS: i64 = 15;
pub const MAX_DURATION_HOURS: i64 = 72;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Source of the current time in whole seconds since the Unix epoch.
pub trait Clock {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Settable clock for tests. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now: Rc<Cell<i64>>,
}

impl FixedClock {
    pub fn at(now: i64) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.set(now);
    }

    pub fn advance_hours(&self, hours: f64) {
        let secs = (hours * SECONDS_PER_HOUR).round() as i64;
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.get()
    }
}

/// The persisted subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionState {
    pub start_timestamp: i64,
    pub duration_hours: i64,
}

impl SubscriptionState {
    /// Parse the `key=value` record. Unknown keys are ignored and a missing
    /// key reads as 0.
    pub fn parse(text: &str) -> Result<Self> {
        let mut state = SubscriptionState {
            start_timestamp: 0,
            duration_hours: 0,
        };
        for line in text.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value: i64 = value
                .trim()
                .parse()
                .with_context(|| format!("bad value for {} in subscription record", key))?;
            match key.trim() {
                "duration_hours" => state.duration_hours = value,
                "start_timestamp" => state.start_timestamp = value,
                _ => {}
            }
        }
        Ok(state)
    }

    pub fn render(&self) -> String {
        format!(
            "duration_hours={}\nstart_timestamp={}\n",
            self.duration_hours, self.start_timestamp
        )
    }

    pub fn elapsed_hours(&self, now: i64) -> f64 {
        now.saturating_sub(self.start_timestamp) as f64 / SECONDS_PER_HOUR
    }
}

/// What a check found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubscriptionStatus {
    NoSubscription,
    Active { remaining_hours: f64 },
    Expired,
}

/// Parse the optional hour token of a `subscribe` directive.
///
/// Absent or unparsable tokens give [`DEFAULT_DURATION_HOURS`]; the result is
/// always clamped into `[MIN_DURATION_HOURS, MAX_DURATION_HOURS]`. The second
/// value is the rejected token, if any.
pub fn parse_duration(token: Option<&str>) -> (i64, Option<String>) {
    let (hours, rejected) = match token {
        None => (DEFAULT_DURATION_HOURS, None),
        Some(t) => match classifier::parse_integer(t) {
            Some(h) => (h, None),
            None => (DEFAULT_DURATION_HOURS, Some(t.to_string())),
        },
    };
    (hours.clamp(MIN_DURATION_HOURS, MAX_DURATION_HOURS), rejected)
}

/// Start a new subscription, replacing whatever was there.
pub fn subscribe(
    store: &mut dyn StateStore,
    clock: &dyn Clock,
    duration_hours: i64,
    out: &mut dyn Write,
) -> Result<SubscriptionState> {
    let state = SubscriptionState {
        start_timestamp: clock.now(),
        duration_hours,
    };
    store.save(Resource::Subscription, &state.render())?;
    info!(duration_hours, start = state.start_timestamp, "subscription activated");
    writeln!(out, "Subscription activated for {} hours!", duration_hours)?;
    Ok(state)
}

/// Read the current subscription, without reporting anything.
pub fn load(store: &dyn StateStore) -> Result<Option<SubscriptionState>> {
    store
        .load(Resource::Subscription)?
        .map(|text| SubscriptionState::parse(&text))
        .transpose()
}

/// Report the subscription status, resetting everything if it expired.
pub fn check(
    store: &mut dyn StateStore,
    clock: &dyn Clock,
    out: &mut dyn Write,
) -> Result<SubscriptionStatus> {
    let Some(state) = load(store)? else {
        writeln!(
            out,
            "No active subscription. Please subscribe to unlock this extension."
        )?;
        return Ok(SubscriptionStatus::NoSubscription);
    };

    let elapsed = state.elapsed_hours(clock.now());
    if elapsed > state.duration_hours as f64 {
        info!(elapsed, duration_hours = state.duration_hours, "subscription expired");
        writeln!(out, "Subscription expired! Restarting extension...")?;
        reset(store, out)?;
        return Ok(SubscriptionStatus::Expired);
    }

    let remaining_hours = state.duration_hours as f64 - elapsed;
    writeln!(
        out,
        "Subscription active. {:.2} hours remaining.",
        remaining_hours
    )?;
    Ok(SubscriptionStatus::Active { remaining_hours })
}

/// Delete the subscription record and the rating log. Missing records are
/// not an error.
pub fn reset(store: &mut dyn StateStore, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "Restarting extension and clearing subscription state..."
    )?;
    store.delete(Resource::Subscription).context("reset")?;
    store.delete(Resource::Ratings).context("reset")?;
    info!("extension state reset");
    writeln!(out, "Extension reset. You must start over.")?;
    Ok(())
}
