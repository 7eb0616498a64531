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
use anyhow::{anyhow, bail, Error};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Sum;
use std::ops::{Add, Neg};

/// Beyond this many decimal places a fraction of 10^n no longer fits in a
/// u32, and no currency comes anywhere near it anyway.
const MAX_DECIMAL_PLACES: usize = 9;

/// A fixed-point number: an integer count of units, each worth
/// 1/`fraction`. This is the shape in which ledgers store money, e.g. 1234
/// units with a fraction of 100 is 12.34 in a two-decimal currency.
///
/// Two Quants compare by value regardless of fraction, so 1/10 equals
/// 10/100. Arithmetic between mismatched fractions happens in the finer of
/// the two.
#[derive(Clone, Copy, Debug)]
pub struct Quant {
	units: i128,
	fraction: u32,
}

impl Quant {
	pub fn zero() -> Self {
		Self {
			units: 0,
			fraction: 1,
		}
	}

	pub fn new(units: i128, fraction: u32) -> Self {
		if fraction == 0 {
			panic!("Fraction cannot be zero");
		}

		Self { units, fraction }
	}

	/// Parses decimal text as found in bank exports. A comma is accepted as
	/// the decimal separator. If both commas and dots appear, whichever
	/// comes last is the decimal separator and the other is digit grouping,
	/// so "1.234,56" and "1,234.56" are the same number. A lone comma is
	/// always read as a decimal separator.
	pub fn from_str(input: &str) -> Result<Self, Error> {
		let compact: String =
			input.chars().filter(|c| !c.is_whitespace()).collect();

		let (is_negative, unsigned) = match compact.strip_prefix('-') {
			Some(rest) => (true, rest),
			None => (false, compact.strip_prefix('+').unwrap_or(&compact)),
		};

		let normalized = match (unsigned.rfind(','), unsigned.rfind('.')) {
			(Some(comma), Some(dot)) if comma > dot => {
				unsigned.replace('.', "").replace(',', ".")
			},
			(Some(_), Some(_)) => unsigned.replace(',', ""),
			(Some(_), None) if unsigned.matches(',').count() > 1 => {
				unsigned.replace(',', "")
			},
			(Some(_), None) => unsigned.replace(',', "."),
			(None, _) => unsigned.to_string(),
		};

		let (whole, decimal) = match normalized.split_once('.') {
			Some((w, d)) => (w, d),
			None => (normalized.as_str(), ""),
		};

		let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
		if (whole.is_empty() && decimal.is_empty())
			|| !is_digits(whole)
			|| !is_digits(decimal)
		{
			bail!("Invalid decimal format: {}", input);
		}
		if decimal.len() > MAX_DECIMAL_PLACES {
			bail!("Too many decimal places: {}", input);
		}

		let fraction = 10u32.pow(decimal.len() as u32);
		let digits = format!("{}{}", whole, decimal);
		let magnitude = if digits.is_empty() {
			0
		} else {
			digits
				.parse::<i128>()
				.map_err(|e| anyhow!("Invalid decimal {}: {}", input, e))?
		};

		Ok(Self {
			units: if is_negative { -magnitude } else { magnitude },
			fraction,
		})
	}

	#[cfg(test)]
	pub fn units(&self) -> i128 {
		self.units
	}

	pub fn fraction(&self) -> u32 {
		self.fraction
	}

	pub fn is_zero(&self) -> bool {
		self.units == 0
	}

	/// Re-expresses this value in steps of 1/`fraction`, truncating toward
	/// zero whatever does not fit. The conversion happens exactly once, so
	/// callers that need two legs of a posting to cancel out must negate the
	/// result instead of rescaling twice.
	pub fn rescale(&self, fraction: u32) -> Result<Self, Error> {
		if fraction == 0 {
			bail!("Fraction cannot be zero");
		}

		let scaled = self
			.units
			.checked_mul(fraction as i128)
			.ok_or_else(|| anyhow!("Amount too large: {}", self))?;

		Ok(Self {
			units: scaled / self.fraction as i128,
			fraction,
		})
	}

	/// Reduced (units, fraction) pair, identical for equal values
	fn canonical(&self) -> (i128, u32) {
		let gcd = Self::gcd(self.units.unsigned_abs(), self.fraction as u128);
		(self.units / gcd as i128, (self.fraction as u128 / gcd) as u32)
	}

	/// Implementation of Euclid's algorithm for greatest common divisor
	fn gcd(mut a: u128, mut b: u128) -> u128 {
		while b != 0 {
			let temp = b;
			b = a % b;
			a = temp;
		}
		a
	}

	fn lcm(a: u32, b: u32) -> u32 {
		(a as u128 / Self::gcd(a as u128, b as u128) * b as u128) as u32
	}

	/// Whether the fraction is 10^n, and if so, n.
	fn decimal_places(&self) -> Option<usize> {
		let mut f = self.fraction;
		let mut places = 0;
		while f % 10 == 0 {
			f /= 10;
			places += 1;
		}
		(f == 1).then_some(places)
	}
}

impl fmt::Display for Quant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let places = match self.decimal_places() {
			Some(p) => p,
			None => return write!(f, "{}/{}", self.units, self.fraction),
		};

		let sign = if self.units < 0 { "-" } else { "" };
		let magnitude = self.units.unsigned_abs();
		if places == 0 {
			return write!(f, "{}{}", sign, magnitude);
		}

		let divisor = 10u128.pow(places as u32);
		write!(
			f,
			"{}{}.{:0width$}",
			sign,
			magnitude / divisor,
			magnitude % divisor,
			width = places
		)
	}
}

// -----------------
// -- BOILERPLATE --
// -----------------

impl Add for Quant {
	type Output = Self;

	fn add(self, rhs: Self) -> Self::Output {
		if self.fraction == rhs.fraction {
			return Self {
				units: self.units + rhs.units,
				fraction: self.fraction,
			};
		}

		let fraction = Self::lcm(self.fraction, rhs.fraction);
		let left = self.units * (fraction / self.fraction) as i128;
		let right = rhs.units * (fraction / rhs.fraction) as i128;

		Self {
			units: left + right,
			fraction,
		}
	}
}

impl Sum for Quant {
	fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
		iter.fold(Quant::zero(), |acc, q| acc + q)
	}
}

impl Neg for Quant {
	type Output = Self;

	fn neg(self) -> Self::Output {
		Self {
			units: -self.units,
			..self
		}
	}
}

impl PartialEq for Quant {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for Quant {}

impl PartialOrd for Quant {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Quant {
	fn cmp(&self, other: &Self) -> Ordering {
		let (lf, rf) = (self.fraction as i128, other.fraction as i128);
		// whole parts first; remainders are below 2^32 so their products fit
		self.units
			.div_euclid(lf)
			.cmp(&other.units.div_euclid(rf))
			.then_with(|| {
				(self.units.rem_euclid(lf) * rf).cmp(&(other.units.rem_euclid(rf) * lf))
			})
	}
}

impl Hash for Quant {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.canonical().hash(state);
	}
}

/// Stored as "units/fraction" so the fraction survives a round trip, e.g.
/// "1234/100" rather than "12.34".
impl Serialize for Quant {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&format!("{}/{}", self.units, self.fraction))
	}
}

impl<'de> Deserialize<'de> for Quant {
	fn deserialize<D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Self, D::Error> {
		struct QuantVisitor;

		impl Visitor<'_> for QuantVisitor {
			type Value = Quant;

			fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
				write!(f, "a string of the form \"units/fraction\"")
			}

			fn visit_str<E: de::Error>(self, v: &str) -> Result<Quant, E> {
				let (units, fraction) = v
					.split_once('/')
					.ok_or_else(|| E::custom(format!("missing '/': {}", v)))?;
				let units = units.parse::<i128>().map_err(E::custom)?;
				let fraction = fraction.parse::<u32>().map_err(E::custom)?;
				if fraction == 0 {
					return Err(E::custom("fraction cannot be zero"));
				}
				Ok(Quant::new(units, fraction))
			}
		}

		deserializer.deserialize_str(QuantVisitor)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	mod parsing {
		use super::*;

		#[test]
		fn test_plain_decimal() {
			let q = Quant::from_str("12.34").unwrap();
			assert_eq!(q.units(), 1234);
			assert_eq!(q.fraction(), 100);
		}

		#[test]
		fn test_comma_decimal_separator() {
			let q = Quant::from_str("12,34").unwrap();
			assert_eq!(q, Quant::new(1234, 100));
		}

		#[test]
		fn test_grouping_with_dot_decimal() {
			let q = Quant::from_str("1,234.56").unwrap();
			assert_eq!(q, Quant::new(123456, 100));
		}

		#[test]
		fn test_grouping_with_comma_decimal() {
			let q = Quant::from_str("1.234,56").unwrap();
			assert_eq!(q, Quant::new(123456, 100));
		}

		#[test]
		fn test_multiple_commas_are_grouping() {
			let q = Quant::from_str("1,234,567").unwrap();
			assert_eq!(q, Quant::new(1234567, 1));
		}

		#[test]
		fn test_negative_and_whitespace() {
			let q = Quant::from_str(" -42.5 ").unwrap();
			assert_eq!(q, Quant::new(-425, 10));
		}

		#[test]
		fn test_explicit_plus() {
			assert_eq!(Quant::from_str("+3").unwrap(), Quant::new(3, 1));
		}

		#[test]
		fn test_leading_decimal_point() {
			assert_eq!(Quant::from_str(".5").unwrap(), Quant::new(5, 10));
		}

		#[test]
		fn test_negative_zero_is_zero() {
			let q = Quant::from_str("-0.00").unwrap();
			assert!(q.is_zero());
			assert_eq!(q, Quant::zero());
		}

		#[test]
		fn test_garbage() {
			assert!(Quant::from_str("").is_err());
			assert!(Quant::from_str("abc").is_err());
			assert!(Quant::from_str("1.2.3x").is_err());
			assert!(Quant::from_str("-").is_err());
			assert!(Quant::from_str("12.3456789012").is_err());
		}
	}

	mod rescale {
		use super::*;

		#[test]
		fn test_to_cents() {
			let q = Quant::from_str("12.34").unwrap().rescale(100).unwrap();
			assert_eq!((q.units(), q.fraction()), (1234, 100));
		}

		#[test]
		fn test_whole_number_to_cents() {
			let q = Quant::from_str("7").unwrap().rescale(100).unwrap();
			assert_eq!(q.units(), 700);
		}

		#[test]
		fn test_truncates_toward_zero() {
			let pos = Quant::from_str("12.349").unwrap().rescale(100).unwrap();
			let neg = Quant::from_str("-12.349").unwrap().rescale(100).unwrap();
			assert_eq!(pos.units(), 1234);
			assert_eq!(neg.units(), -1234);
		}

		#[test]
		fn test_zero_decimal_currency() {
			let q = Quant::from_str("1500.75").unwrap().rescale(1).unwrap();
			assert_eq!(q.units(), 1500);
		}

		#[test]
		fn test_three_decimal_currency() {
			let q = Quant::from_str("1.5").unwrap().rescale(1000).unwrap();
			assert_eq!(q.units(), 1500);
		}

		#[test]
		fn test_zero_fraction() {
			assert!(Quant::from_str("1").unwrap().rescale(0).is_err());
		}
	}

	mod arithmetic {
		use super::*;

		#[test]
		fn test_negation_cancels() {
			let q = Quant::new(1234, 100);
			assert!((q + -q).is_zero());
		}

		#[test]
		fn test_add_mixed_fractions() {
			let sum = Quant::new(1, 10) + Quant::new(5, 100);
			assert_eq!(sum, Quant::new(15, 100));
			assert_eq!(sum.fraction(), 100);
		}

		#[test]
		fn test_sum() {
			let total: Quant =
				vec![Quant::new(100, 100), Quant::new(-25, 100)]
					.into_iter()
					.sum();
			assert_eq!(total, Quant::new(75, 100));
		}

		#[test]
		fn test_equality_across_fractions() {
			assert_eq!(Quant::new(1, 10), Quant::new(10, 100));
			assert!(Quant::new(-1, 10) < Quant::new(1, 100));
		}

		#[test]
		fn test_compare_huge_values_without_overflow() {
			let big = Quant::from_str("1000000000000000000000.000000001").unwrap();
			let bigger = Quant::from_str("1000000000000000000000.000000002").unwrap();
			let whole = Quant::new(10i128.pow(23), 100);

			assert_eq!(big, big);
			assert!(big < bigger);
			assert!(big > whole);
			assert!(-big < -whole);
			assert_eq!(Quant::new(10i128.pow(30), 10u32.pow(9)), whole);
		}

		#[test]
		fn test_hash_matches_equality() {
			use std::collections::HashSet;
			let mut set = HashSet::new();
			set.insert(Quant::new(1, 10));
			assert!(set.contains(&Quant::new(10, 100)));
		}
	}

	mod rendering {
		use super::*;

		#[test]
		fn test_display_decimal() {
			assert_eq!(Quant::new(1234, 100).to_string(), "12.34");
			assert_eq!(Quant::new(-5, 100).to_string(), "-0.05");
			assert_eq!(Quant::new(42, 1).to_string(), "42");
		}

		#[test]
		fn test_display_odd_fraction() {
			assert_eq!(Quant::new(3, 8).to_string(), "3/8");
		}

		#[test]
		fn test_serde_keeps_fraction() {
			let json = serde_json::to_string(&Quant::new(1200, 100)).unwrap();
			assert_eq!(json, "\"1200/100\"");

			let back: Quant = serde_json::from_str(&json).unwrap();
			assert_eq!((back.units(), back.fraction()), (1200, 100));
		}

		#[test]
		fn test_deserialize_rejects_zero_fraction() {
			assert!(serde_json::from_str::<Quant>("\"1/0\"").is_err());
		}
	}
}
