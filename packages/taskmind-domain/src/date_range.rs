use time::{Date, Duration, OffsetDateTime, Time, UtcOffset};

/// Inclusive `created_at` window, both ends in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
	pub start: OffsetDateTime,
	pub end: OffsetDateTime,
}
impl DateRange {
	pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Option<Self> {
		let start = start.to_offset(UtcOffset::UTC);
		let end = end.to_offset(UtcOffset::UTC);

		if start > end {
			return None;
		}

		Some(Self { start, end })
	}

	/// `[00:00:00, 23:59:59.999999999]` of `date` in UTC.
	pub fn whole_day(date: Date) -> Self {
		let start = date.with_time(Time::MIDNIGHT).assume_utc();
		let end = start + Duration::DAY - Duration::NANOSECOND;

		Self { start, end }
	}
}

/// Resolves the relative days that need no language model.
pub fn resolve_relative(query: &str, now: OffsetDateTime) -> Option<DateRange> {
	let today = now.to_offset(UtcOffset::UTC).date();
	let lowered = query.to_lowercase();
	let words = lowered
		.split(|c: char| !c.is_alphanumeric())
		.filter(|word| !word.is_empty())
		.collect::<Vec<_>>();
	let has = |needle: &str| words.iter().any(|word| *word == needle);

	match (has("today") || has("tonight"), has("yesterday")) {
		(true, false) => Some(DateRange::whole_day(today)),
		(false, true) => today.previous_day().map(DateRange::whole_day),
		(true, true) => today.previous_day().map(|yesterday| DateRange {
			start: DateRange::whole_day(yesterday).start,
			end: DateRange::whole_day(today).end,
		}),
		(false, false) => None,
	}
}
