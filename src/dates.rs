//! Date parsing, ages and Spanish date formatting.

use chrono::{Datelike, Local, NaiveDate};

const MONTHS: [&str; 12] = [
	"enero",
	"febrero",
	"marzo",
	"abril",
	"mayo",
	"junio",
	"julio",
	"agosto",
	"septiembre",
	"octubre",
	"noviembre",
	"diciembre",
];

/// Today's date in the browser's time zone.
pub fn today() -> NaiveDate {
	Local::now().date_naive()
}

/// Parse `YYYY-MM-DD`, ignoring any trailing time component.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
	let day = raw.trim().get(..10)?;
	NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Completed years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
	let mut age = today.year() - birth.year();
	if (today.month(), today.day()) < (birth.month(), birth.day()) {
		age -= 1;
	}
	age
}

/// Lower-case Spanish month name for a 1-based month.
pub fn month_name(month: u32) -> &'static str {
	MONTHS[(month.clamp(1, 12) - 1) as usize]
}

/// `5 de marzo de 1990`
pub fn format_long(date: NaiveDate) -> String {
	format!(
		"{} de {} de {}",
		date.day(),
		month_name(date.month()),
		date.year()
	)
}

/// `YYYY-MM-DD`
pub fn iso(date: NaiveDate) -> String {
	date.format("%Y-%m-%d").to_string()
}
