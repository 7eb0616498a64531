/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
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
use crate::util::date::Date;
use crate::util::quant::Quant;

/// One single-sided transaction record from a QIF file, before it is
/// expanded into a double-entry transaction. Optional text fields are never
/// Some("").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
	pub date: Date,
	/// Decimal text exactly as found in the source
	pub amount: String,
	/// Colon-delimited path of the account the entry was recorded in
	pub account: String,

	pub category: Option<String>,
	pub split_category: Option<String>,
	pub split_amount: Option<String>,

	pub memo: Option<String>,
	pub split_memo: Option<String>,
	pub payee: Option<String>,

	/// Check or reference number
	pub number: Option<String>,
	/// Reconciliation flag as exported; not acted upon
	pub cleared: Option<String>,
	pub address: Vec<String>,
}

impl Entry {
	pub fn new(date: Date, account: &str, amount: &str) -> Self {
		Self {
			date,
			amount: amount.to_string(),
			account: account.to_string(),
			category: None,
			split_category: None,
			split_amount: None,
			memo: None,
			split_memo: None,
			payee: None,
			number: None,
			cleared: None,
			address: vec![],
		}
	}

	/// The amount actually posted to the primary account.
	pub fn posting_amount(&self) -> &str {
		self.split_amount.as_deref().unwrap_or(&self.amount)
	}

	/// Account path named for the other side of the posting, if the entry
	/// names one at all.
	pub fn offset_category(&self) -> Option<&str> {
		non_empty(self.split_category.as_deref())
			.or_else(|| non_empty(self.category.as_deref()))
	}

	pub fn offset_memo(&self) -> Option<&String> {
		self.split_memo.as_ref().or(self.memo.as_ref())
	}

	pub fn fingerprint(&self) -> Fingerprint {
		Fingerprint {
			date: self.date,
			account: self.account.trim().to_string(),
			amount: AmountKey::from(self.amount.as_str()),
			category: normalize(&self.category),
			split_category: normalize(&self.split_category),
			split_amount: self.split_amount.as_deref().map(AmountKey::from),
			memo: normalize(&self.memo),
			split_memo: normalize(&self.split_memo),
			payee: normalize(&self.payee),
			number: normalize(&self.number),
			cleared: normalize(&self.cleared),
			address: self.address.iter().map(|a| a.trim().to_string()).collect(),
		}
	}
}

fn non_empty(s: Option<&str>) -> Option<&str> {
	s.map(str::trim).filter(|s| !s.is_empty())
}

fn normalize(s: &Option<String>) -> Option<String> {
	non_empty(s.as_deref()).map(str::to_string)
}

/// Identity of an entry for duplicate detection within a run. Covers every
/// field of the entry; text is trimmed and amounts compare by value, so
/// "12,34" and "12.34" are the same amount.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
	date: Date,
	account: String,
	amount: AmountKey,
	category: Option<String>,
	split_category: Option<String>,
	split_amount: Option<AmountKey>,
	memo: Option<String>,
	split_memo: Option<String>,
	payee: Option<String>,
	number: Option<String>,
	cleared: Option<String>,
	address: Vec<String>,
}

/// Amounts that fail to parse still take part in the identity, by text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum AmountKey {
	Value(Quant),
	Text(String),
}

impl From<&str> for AmountKey {
	fn from(s: &str) -> Self {
		match Quant::from_str(s) {
			Ok(q) => AmountKey::Value(q),
			Err(_) => AmountKey::Text(s.trim().to_string()),
		}
	}
}
