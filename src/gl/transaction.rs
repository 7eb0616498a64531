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
use crate::gl::account::AccountId;
use crate::util::date::Date;
use crate::util::quant::Quant;
use anyhow::{bail, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
	Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransactionId(pub(crate) usize);

/// A double-entry transaction in a single currency.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
	currency: String,
	/// Fraction the currency was posted with; every split uses it.
	fraction: u32,

	posted: Date,
	/// Wall clock time at which this was recorded, not the posting date
	entered: DateTime<Utc>,

	description: String,
	notes: Option<String>,

	splits: Vec<Split>,
}

impl Transaction {
	pub fn new(
		currency: &str,
		fraction: u32,
		posted: Date,
		entered: DateTime<Utc>,
	) -> Self {
		Self {
			currency: currency.to_string(),
			fraction,
			posted,
			entered,
			description: String::new(),
			notes: None,
			splits: vec![],
		}
	}

	pub fn currency(&self) -> &str {
		&self.currency
	}

	pub fn posted(&self) -> &Date {
		&self.posted
	}

	#[cfg(test)]
	pub fn entered(&self) -> &DateTime<Utc> {
		&self.entered
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	pub fn notes(&self) -> Option<&String> {
		self.notes.as_ref()
	}

	pub fn splits(&self) -> &[Split] {
		&self.splits
	}

	pub fn set_description(&mut self, description: &str) {
		self.description = description.to_string();
	}

	pub fn set_notes(&mut self, notes: Option<String>) {
		self.notes = notes;
	}

	pub fn add_split(&mut self, split: Split) {
		self.splits.push(split);
	}

	/// Sum of all split values. Zero for anything fit to be stored.
	pub fn imbalance(&self) -> Quant {
		self.splits.iter().map(|s| s.value).sum()
	}

	/// Structural checks that do not need the owning book. Account
	/// existence is checked by the book on commit.
	pub fn validate(&self) -> Result<(), Error> {
		if self.splits.len() < 2 {
			bail!(
				"Transaction on {} needs at least two splits, has {}",
				self.posted,
				self.splits.len()
			)
		}

		for split in &self.splits {
			if split.value.fraction() != self.fraction
				|| split.amount.fraction() != self.fraction
			{
				bail!(
					"Split of {} is not in 1/{} {} units",
					split.value,
					self.fraction,
					self.currency
				)
			}
			if split.value != split.amount {
				bail!("Split value {} differs from amount {} in a single-currency transaction", split.value, split.amount)
			}
		}

		let imbalance = self.imbalance();
		if !imbalance.is_zero() {
			bail!(
				"Unbalanced transaction on {} ({} {} left over)",
				self.posted,
				imbalance,
				self.currency
			)
		}

		Ok(())
	}
}

/// One leg of a transaction. With no currency conversion in play, value
/// (in the transaction currency) and amount (in the account commodity) are
/// always the same number.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Split {
	account: AccountId,
	value: Quant,
	amount: Quant,
	memo: Option<String>,
}

impl Split {
	pub fn new(account: AccountId, value: Quant, memo: Option<String>) -> Self {
		Self {
			account,
			value,
			amount: value,
			memo,
		}
	}

	pub fn account(&self) -> AccountId {
		self.account
	}

	pub fn value(&self) -> Quant {
		self.value
	}

	pub fn amount(&self) -> Quant {
		self.amount
	}

	pub fn memo(&self) -> Option<&String> {
		self.memo.as_ref()
	}
}
