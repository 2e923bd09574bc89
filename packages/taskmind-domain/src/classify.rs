use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
	/// Mentions a calendar period; todos are fetched by creation date.
	DateRange,
	/// Asks about edit metadata; every todo is listed so the model can compare timestamps.
	Metadata,
	Semantic,
}

const DATE_PATTERNS: [&str; 8] = [
	r"\b(today|tonight|yesterday|tomorrow)\b",
	r"\b(this|last|next|past|previous)\s+(week|month|year|weekend)\b",
	r"\b\d+\s+(day|days|week|weeks|month|months)\s+ago\b",
	r"\bsince\s+\w+",
	r"\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
	r"\b(jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(st|nd|rd|th)?\b",
	r"\b\d{4}-\d{2}-\d{2}\b",
	r"\b\d{1,2}/\d{1,2}(/\d{2,4})?\b",
];

const METADATA_PATTERNS: [&str; 1] = [r"\b(updated|modified|changed|edited)\b"];

pub fn classify(query: &str) -> QueryIntent {
	let lowered = query.to_lowercase();

	if matches_any(&DATE_PATTERNS, &lowered) {
		return QueryIntent::DateRange;
	}
	if matches_any(&METADATA_PATTERNS, &lowered) {
		return QueryIntent::Metadata;
	}

	QueryIntent::Semantic
}

/// The intent to use when date resolution yields no range.
pub fn fallback_intent(query: &str) -> QueryIntent {
	if matches_any(&METADATA_PATTERNS, &query.to_lowercase()) {
		QueryIntent::Metadata
	} else {
		QueryIntent::Semantic
	}
}

fn matches_any(patterns: &[&str], text: &str) -> bool {
	for pattern in patterns {
		if Regex::new(pattern).map(|re| re.is_match(text)).unwrap_or(false) {
			return true;
		}
	}

	false
}
