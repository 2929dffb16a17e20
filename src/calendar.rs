//! Month grid with birthday occurrences.

use chrono::{Datelike, Duration, NaiveDate};

use crate::dates::month_name;
use crate::model::Person;

/// Six weeks of seven days.
pub const GRID_CELLS: usize = 42;

/// The month currently shown by the calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthCursor {
	pub year: i32,
	/// 1-based.
	pub month: u32,
}

impl MonthCursor {
	pub fn containing(date: NaiveDate) -> Self {
		Self {
			year: date.year(),
			month: date.month(),
		}
	}

	pub fn previous(self) -> Self {
		if self.month <= 1 {
			Self {
				year: self.year - 1,
				month: 12,
			}
		} else {
			Self {
				month: self.month - 1,
				..self
			}
		}
	}

	pub fn next(self) -> Self {
		if self.month >= 12 {
			Self {
				year: self.year + 1,
				month: 1,
			}
		} else {
			Self {
				month: self.month + 1,
				..self
			}
		}
	}

	/// `Octubre 2026`
	pub fn title(&self) -> String {
		let name = month_name(self.month);
		let mut chars = name.chars();
		let capitalized: String = match chars.next() {
			Some(first) => first.to_uppercase().chain(chars).collect(),
			None => String::new(),
		};
		format!("{capitalized} {}", self.year)
	}

	fn first_day(&self) -> Option<NaiveDate> {
		NaiveDate::from_ymd_opt(self.year, self.month.clamp(1, 12), 1)
	}
}

/// A birthday falling on a grid cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BirthdayOccurrence {
	pub name: String,
	/// Age reached on this occurrence.
	pub age: i32,
	/// The occurrence is today or already behind us.
	pub passed: bool,
}

impl BirthdayOccurrence {
	pub fn describe(&self) -> String {
		if self.passed {
			format!("Cumplió {} años", self.age)
		} else {
			format!("Cumplirá {} años", self.age)
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayCell {
	pub date: NaiveDate,
	/// False for the leading and trailing days of adjacent months.
	pub in_month: bool,
	pub is_today: bool,
	pub birthdays: Vec<BirthdayOccurrence>,
}

impl DayCell {
	pub fn day(&self) -> u32 {
		self.date.day()
	}

	pub fn has_birthday(&self) -> bool {
		!self.birthdays.is_empty()
	}
}

/// Build the 42-cell grid for `cursor`, weeks starting on Sunday.
pub fn month_grid(cursor: MonthCursor, today: NaiveDate, persons: &[Person]) -> Vec<DayCell> {
	let Some(first) = cursor.first_day() else {
		return Vec::new();
	};
	let leading = i64::from(first.weekday().num_days_from_sunday());
	let start = first - Duration::days(leading);

	start
		.iter_days()
		.take(GRID_CELLS)
		.map(|date| {
			let in_month = date.month() == first.month() && date.year() == first.year();
			DayCell {
				date,
				in_month,
				is_today: in_month && date == today,
				birthdays: if in_month {
					birthdays_on(date, today, persons)
				} else {
					Vec::new()
				},
			}
		})
		.collect()
}

fn birthdays_on(date: NaiveDate, today: NaiveDate, persons: &[Person]) -> Vec<BirthdayOccurrence> {
	persons
		.iter()
		.filter_map(|p| {
			let birth = p.birth_date?;
			(birth.month() == date.month() && birth.day() == date.day()).then(|| {
				BirthdayOccurrence {
					name: p.name.clone(),
					age: date.year() - birth.year(),
					passed: date <= today,
				}
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::Sex;
	use rstest::rstest;

	fn d(y: i32, m: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, day).unwrap()
	}

	fn person(name: &str, birth: NaiveDate) -> Person {
		Person {
			id: name.to_lowercase(),
			name: name.into(),
			image: None,
			birth_date: Some(birth),
			sex: Sex::Female,
			parent_id: None,
		}
	}

	#[rstest]
	#[case(2024, 2)]
	#[case(2023, 2)]
	#[case(2026, 2)]
	#[case(2021, 1)]
	#[case(2026, 8)]
	#[case(2024, 12)]
	fn grid_always_has_42_cells(#[case] year: i32, #[case] month: u32) {
		let grid = month_grid(MonthCursor { year, month }, d(2024, 1, 1), &[]);
		assert_eq!(grid.len(), GRID_CELLS);
		let first = grid.iter().position(|c| c.in_month).unwrap();
		assert_eq!(grid[first].day(), 1);
		assert!(first < 7);
	}

	#[test]
	fn leading_days_come_from_previous_month() {
		// October 2026 starts on a Thursday.
		let grid = month_grid(MonthCursor { year: 2026, month: 10 }, d(2026, 10, 19), &[]);
		let leading: Vec<u32> = grid.iter().take_while(|c| !c.in_month).map(DayCell::day).collect();
		assert_eq!(leading, [27, 28, 29, 30]);
		assert_eq!(grid.iter().filter(|c| c.in_month).count(), 31);
		assert_eq!(grid.last().unwrap().date, d(2026, 11, 7));
	}

	#[test]
	fn today_is_flagged_once() {
		let grid = month_grid(MonthCursor { year: 2026, month: 10 }, d(2026, 10, 19), &[]);
		let today: Vec<&DayCell> = grid.iter().filter(|c| c.is_today).collect();
		assert_eq!(today.len(), 1);
		assert_eq!(today[0].date, d(2026, 10, 19));

		let other = month_grid(MonthCursor { year: 2026, month: 11 }, d(2026, 10, 19), &[]);
		assert!(other.iter().all(|c| !c.is_today));
	}

	#[test]
	fn birthdays_recur_every_year() {
		let persons = [person("Ana", d(1950, 3, 5)), person("Luis", d(1990, 3, 20))];
		let today = d(2024, 3, 10);
		let grid = month_grid(MonthCursor { year: 2024, month: 3 }, today, &persons);

		let flagged: Vec<&DayCell> = grid.iter().filter(|c| c.has_birthday()).collect();
		assert_eq!(flagged.len(), 2);
		assert_eq!(
			flagged[0].birthdays,
			vec![BirthdayOccurrence {
				name: "Ana".into(),
				age: 74,
				passed: true
			}]
		);
		assert_eq!(flagged[1].birthdays[0].describe(), "Cumplirá 34 años");
		assert_eq!(flagged[0].birthdays[0].describe(), "Cumplió 74 años");
	}

	#[test]
	fn birthday_today_counts_as_passed() {
		let persons = [person("Ana", d(2000, 1, 1))];
		let grid = month_grid(MonthCursor { year: 2024, month: 1 }, d(2024, 1, 1), &persons);
		let cell = grid.iter().find(|c| c.has_birthday()).unwrap();
		assert!(cell.is_today);
		assert_eq!(cell.birthdays[0].age, 24);
		assert!(cell.birthdays[0].passed);
	}

	#[test]
	fn adjacent_month_days_never_carry_birthdays() {
		let persons = [person("Ana", d(1980, 2, 28))];
		let grid = month_grid(MonthCursor { year: 2026, month: 3 }, d(2026, 1, 1), &persons);
		assert!(grid.iter().all(|c| !c.has_birthday()));
	}

	#[test]
	fn navigation_rolls_the_year() {
		let jan = MonthCursor { year: 2024, month: 1 };
		assert_eq!(jan.previous(), MonthCursor { year: 2023, month: 12 });
		assert_eq!(jan.previous().next(), jan);
		let dec = MonthCursor { year: 2024, month: 12 };
		assert_eq!(dec.next(), MonthCursor { year: 2025, month: 1 });
		assert_eq!(dec.title(), "Diciembre 2024");
	}
}
