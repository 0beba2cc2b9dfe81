//! Trading calendar.
//!
//! Pure functions of (market, instant). The only data is a static table of
//! per-market timezones and trading windows, so every call is safe from any
//! thread without locking.
//!
//! Three schedule shapes exist:
//! - `AlwaysOpen` for CRYPTO.
//! - `Daily` session lists on trading weekdays (US, CN, TW). CN breaks for
//!   lunch, so it carries two sessions. HK has no entry of its own and
//!   shares the US calendar.
//! - `Weekly` rolling window for FOREX: closed from Friday 17:00 until
//!   Sunday 17:00 New York time, open otherwise.
//!
//! Timezone names resolve through the compiled tz database. If a name ever
//! fails to resolve, the entry's fixed UTC offset is used instead; that
//! fallback does not follow daylight-saving transitions.

use chrono::offset::LocalResult;
use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta,
    TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;

use crate::types::Market;

/// Upper bound on the day-by-day walk in [`next_open`]. One full week plus
/// one day always reaches a trading day for any non-empty weekday set.
const MAX_DAY_WALK: usize = 8;

const SECS_PER_MINUTE: u32 = 60;
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Half-open trading window `[open, close)` in minutes after local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub open: u32,
    pub close: u32,
}

impl Session {
    const fn new(open: u32, close: u32) -> Self {
        Self { open, close }
    }

    fn contains(&self, secs_of_day: u32) -> bool {
        secs_of_day >= self.open * SECS_PER_MINUTE && secs_of_day < self.close * SECS_PER_MINUTE
    }
}

const fn hm(hour: u32, minute: u32) -> u32 {
    hour * 60 + minute
}

#[derive(Debug, Clone, Copy)]
pub enum Schedule {
    AlwaysOpen,
    Daily {
        sessions: &'static [Session],
        weekdays: &'static [Weekday],
    },
    /// Closed from `close` until the following `open`, both given as
    /// (weekday, minute-of-day) in local time.
    Weekly {
        close: (Weekday, u32),
        open: (Weekday, u32),
    },
}

#[derive(Debug, Clone, Copy)]
pub struct CalendarEntry {
    pub tz_name: &'static str,
    pub fallback_offset_secs: i32,
    pub schedule: Schedule,
}

const MON_FRI: &[Weekday] = &[
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

const US: CalendarEntry = CalendarEntry {
    tz_name: "America/New_York",
    fallback_offset_secs: -5 * 3600,
    schedule: Schedule::Daily {
        sessions: &[Session::new(hm(9, 30), hm(16, 0))],
        weekdays: MON_FRI,
    },
};

const CN: CalendarEntry = CalendarEntry {
    tz_name: "Asia/Shanghai",
    fallback_offset_secs: 8 * 3600,
    schedule: Schedule::Daily {
        sessions: &[
            Session::new(hm(9, 30), hm(11, 30)),
            Session::new(hm(13, 0), hm(15, 0)),
        ],
        weekdays: MON_FRI,
    },
};

const TW: CalendarEntry = CalendarEntry {
    tz_name: "Asia/Taipei",
    fallback_offset_secs: 8 * 3600,
    schedule: Schedule::Daily {
        sessions: &[Session::new(hm(9, 0), hm(13, 30))],
        weekdays: MON_FRI,
    },
};

const CRYPTO: CalendarEntry = CalendarEntry {
    tz_name: "UTC",
    fallback_offset_secs: 0,
    schedule: Schedule::AlwaysOpen,
};

const FOREX: CalendarEntry = CalendarEntry {
    tz_name: "America/New_York",
    fallback_offset_secs: -5 * 3600,
    schedule: Schedule::Weekly {
        close: (Weekday::Fri, hm(17, 0)),
        open: (Weekday::Sun, hm(17, 0)),
    },
};

/// Static calendar entry for a market.
pub fn entry(market: Market) -> &'static CalendarEntry {
    match market {
        Market::Us | Market::Hk => &US,
        Market::Cn => &CN,
        Market::Tw => &TW,
        Market::Crypto => &CRYPTO,
        Market::Forex => &FOREX,
    }
}

/// Whether `market` is trading at `now`.
pub fn is_open(market: Market, now: DateTime<Utc>) -> bool {
    let cal = entry(market);
    let tz = MarketTz::resolve(cal);
    let local = tz.to_local(now);

    match cal.schedule {
        Schedule::AlwaysOpen => true,
        Schedule::Daily { sessions, weekdays } => {
            if !weekdays.contains(&local.weekday()) {
                return false;
            }
            let secs = local.time().num_seconds_from_midnight();
            sessions.iter().any(|s| s.contains(secs))
        }
        Schedule::Weekly { close, open } => {
            let now_secs = week_secs(local.weekday(), local.time().num_seconds_from_midnight());
            let close_secs = week_secs(close.0, close.1 * SECS_PER_MINUTE);
            let open_secs = week_secs(open.0, open.1 * SECS_PER_MINUTE);

            let closed = if close_secs <= open_secs {
                now_secs >= close_secs && now_secs < open_secs
            } else {
                now_secs >= close_secs || now_secs < open_secs
            };
            !closed
        }
    }
}

/// Earliest session start strictly after `now`.
///
/// For an always-open market this is `now` itself. Callers that already
/// know the market is open have no reason to ask.
pub fn next_open(market: Market, now: DateTime<Utc>) -> DateTime<Utc> {
    let cal = entry(market);
    let tz = MarketTz::resolve(cal);
    let local = tz.to_local(now);

    match cal.schedule {
        Schedule::AlwaysOpen => now,
        Schedule::Daily { sessions, weekdays } => {
            let mut day = local.date();
            for _ in 0..MAX_DAY_WALK {
                if weekdays.contains(&day.weekday()) {
                    // Sessions are ordered, so a lunch break resolves to the
                    // same day's afternoon open before moving on.
                    for s in sessions {
                        let start = tz.to_utc(day.and_time(minute_to_time(s.open)));
                        if start > now {
                            return start;
                        }
                    }
                }
                let Some(next) = day.succ_opt() else {
                    break;
                };
                day = next;
            }
            // Unreachable with a non-empty weekday table.
            now + TimeDelta::days(1)
        }
        Schedule::Weekly { open, .. } => {
            let (open_day, open_minute) = open;
            let ahead = (open_day.num_days_from_monday() + 7
                - local.weekday().num_days_from_monday())
                % 7;

            let time = minute_to_time(open_minute);
            let candidate = shift_days(local.date(), ahead as u64).map(|d| tz.to_utc(d.and_time(time)));

            match candidate {
                Some(t) if t > now => t,
                _ => shift_days(local.date(), ahead as u64 + 7)
                    .map(|d| tz.to_utc(d.and_time(time)))
                    .unwrap_or(now + TimeDelta::days(7)),
            }
        }
    }
}

/// Wall-clock time in the market's own timezone, for display.
pub fn local_time(market: Market, t: DateTime<Utc>) -> NaiveDateTime {
    MarketTz::resolve(entry(market)).to_local(t)
}

fn week_secs(day: Weekday, secs_of_day: u32) -> u32 {
    day.num_days_from_monday() * MINUTES_PER_DAY * SECS_PER_MINUTE + secs_of_day
}

fn minute_to_time(minute: u32) -> NaiveTime {
    let minute = minute % MINUTES_PER_DAY;
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap_or(NaiveTime::MIN)
}

fn shift_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

/// Resolved timezone of a calendar entry.
#[derive(Debug, Clone, Copy)]
enum MarketTz {
    Named(Tz),
    Fixed(FixedOffset),
}

impl MarketTz {
    fn resolve(cal: &CalendarEntry) -> Self {
        match cal.tz_name.parse::<Tz>() {
            Ok(tz) => MarketTz::Named(tz),
            Err(_) => MarketTz::Fixed(
                FixedOffset::east_opt(cal.fallback_offset_secs).unwrap_or_else(|| Utc.fix()),
            ),
        }
    }

    fn to_local(&self, t: DateTime<Utc>) -> NaiveDateTime {
        match self {
            MarketTz::Named(tz) => t.with_timezone(tz).naive_local(),
            MarketTz::Fixed(offset) => t.with_timezone(offset).naive_local(),
        }
    }

    fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self {
            MarketTz::Named(tz) => local_to_utc(tz, local),
            MarketTz::Fixed(offset) => local_to_utc(offset, local),
        }
    }
}

fn local_to_utc<Z: TimeZone>(tz: &Z, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Inside a spring-forward gap the wall clock skips an hour.
        LocalResult::None => tz
            .from_local_datetime(&(local + TimeDelta::hours(1)))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local)),
    }
}
