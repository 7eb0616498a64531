/* Copyright © 2024-2025 Adam Train <adam@adamtrain.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

use anyhow::{bail, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A calendar date with no time or zone attached, which is all a posting
/// date ever is.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct Date {
	year: u32,
	month: u8,
	day: u8,
}

impl Date {
	/// Constructor to parse a string in the "YYYY-mm-dd" format
	pub fn from_str(date_str: &str) -> Result<Date, Error> {
		let parts: Vec<&str> = date_str.trim().split('-').collect();
		if parts.len() != 3 {
			bail!("Date format must be YYYY-MM-DD: {}", date_str);
		}

		let year = parts[0].parse::<u32>()?;
		let month = parts[1].parse::<u8>()?;
		let day = parts[2].parse::<u8>()?;

		Date::from_ymd(year, month, day)
	}

	pub fn from_ymd(year: u32, month: u8, day: u8) -> Result<Date, Error> {
		if !Date::is_valid_date(year, month, day) {
			bail!("Invalid date: {:04}-{:02}-{:02}", year, month, day);
		}

		Ok(Date { year, month, day })
	}

	fn is_leap_year(year: u32) -> bool {
		(year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
	}

	fn days_in_month(year: u32, month: u8) -> u8 {
		match month {
			1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
			4 | 6 | 9 | 11 => 30,
			2 => {
				if Date::is_leap_year(year) {
					29
				} else {
					28
				}
			},
			_ => 0, // Invalid month
		}
	}

	fn is_valid_date(year: u32, month: u8, day: u8) -> bool {
		if year == 0 || year > 9999 {
			return false;
		}
		if !(1..=12).contains(&month) {
			return false;
		}
		if day < 1 || day > Date::days_in_month(year, month) {
			return false;
		}
		true
	}
}

impl PartialOrd for Date {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Date {
	fn cmp(&self, other: &Self) -> Ordering {
		(self.year, self.month, self.day).cmp(&(
			other.year,
			other.month,
			other.day,
		))
	}
}

impl fmt::Display for Date {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
	}
}

impl Serialize for Date {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Date {
	fn deserialize<D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Date::from_str(&s).map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_and_display() {
		let date = Date::from_str("2021-03-01").unwrap();
		assert_eq!(date, Date::from_ymd(2021, 3, 1).unwrap());
		assert_eq!(date.to_string(), "2021-03-01");
	}

	#[test]
	fn test_wrong_shape() {
		assert!(Date::from_str("2021/03/01").is_err());
		assert!(Date::from_str("2021-03").is_err());
		assert!(Date::from_str("yesterday").is_err());
	}

	#[test]
	fn test_leap_year() {
		assert!(Date::from_str("2024-02-29").is_ok());
		assert!(Date::from_str("2023-02-29").is_err());
		assert!(Date::from_str("2000-02-29").is_ok());
		assert!(Date::from_str("1900-02-29").is_err());
	}

	#[test]
	fn test_out_of_range_parts() {
		assert!(Date::from_ymd(2024, 13, 1).is_err());
		assert!(Date::from_ymd(2024, 4, 31).is_err());
		assert!(Date::from_ymd(0, 1, 1).is_err());
	}

	#[test]
	fn test_ordering() {
		let a = Date::from_str("2023-12-31").unwrap();
		let b = Date::from_str("2024-01-01").unwrap();
		assert!(a < b);
		assert_eq!(a.max(b), b);
	}

	#[test]
	fn test_serde_as_string() {
		let date = Date::from_str("2024-11-15").unwrap();
		let json = serde_json::to_string(&date).unwrap();
		assert_eq!(json, "\"2024-11-15\"");
		assert_eq!(serde_json::from_str::<Date>(&json).unwrap(), date);
	}
}
