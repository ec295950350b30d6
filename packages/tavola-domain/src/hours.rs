use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Structured weekly schedule, persisted as JSONB on the venue row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeeklyHours {
	pub periods: Vec<Period>,
}

/// One opening span. Days count from Sunday (0) through Saturday (6); times
/// are minutes since midnight. A close before the open wraps past midnight
/// into the following day. Equal open and close means open around the clock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Period {
	pub day: u8,
	pub open_minute: u16,
	pub close_minute: u16,
}

pub fn is_open(hours: &WeeklyHours, day: u8, minute: u16) -> bool {
	hours.periods.iter().any(|period| period_covers(period, day, minute))
}

pub fn is_open_at(hours: &WeeklyHours, at: OffsetDateTime) -> bool {
	let day = at.weekday().number_days_from_sunday();
	let minute = u16::from(at.hour()) * 60 + u16::from(at.minute());

	is_open(hours, day, minute)
}

fn period_covers(period: &Period, day: u8, minute: u16) -> bool {
	if period.open_minute == period.close_minute {
		return period.day == day;
	}
	if period.open_minute < period.close_minute {
		return period.day == day && minute >= period.open_minute && minute < period.close_minute;
	}

	// Overnight span: the tail spills into the next calendar day.
	let next_day = (period.day + 1) % 7;

	(period.day == day && minute >= period.open_minute)
		|| (next_day == day && minute < period.close_minute)
}
