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
use crate::gl::book::Book;
use crate::gl::commodity::Commodity;
use crate::gl::transaction::TransactionId;
use crate::import::resolver::lookup_account;
use crate::parsing::entry::Entry;
use crate::util::quant::Quant;
use anyhow::{anyhow, Error};
use chrono::{DateTime, Utc};

/// Account the other side of an entry is posted to.
pub fn offset_path(entry: &Entry, currency_code: &str) -> String {
	match entry.offset_category() {
		Some(category) => category.to_string(),
		None => format!("Imbalance-{}", currency_code),
	}
}

/// Posts one entry to the book as a balanced transaction: the primary
/// account gets the entry amount and the offsetting account its negation.
///
/// Accounts are created as needed. If anything fails after the transaction
/// was begun, it is rolled back; accounts created on the way stay.
pub fn build(
	book: &mut Book,
	entry: &Entry,
	currency: &Commodity,
	entered: DateTime<Utc>,
) -> Result<TransactionId, Error> {
	let primary = lookup_account(book, entry.account.trim())?;
	let offset = lookup_account(book, &offset_path(entry, currency.mnemonic()))?;

	let value = Quant::from_str(entry.posting_amount())
		.and_then(|q| q.rescale(currency.fraction()))
		.map_err(|e| anyhow!("Entry of {}: {}", entry.date, e))?;

	let (description, notes) = match &entry.payee {
		Some(payee) => (payee.as_str(), entry.memo.clone()),
		None => (entry.memo.as_deref().unwrap_or_default(), None),
	};

	book.begin_edit(currency, entry.date, entered)?;

	let populated = (|| -> Result<(), Error> {
		book.set_description(description)?;
		book.set_notes(notes)?;
		book.add_split(primary, value, None)?;
		book.add_split(offset, -value, entry.offset_memo().cloned())
	})();

	if let Err(e) = populated {
		book.rollback_edit();
		return Err(e);
	}

	// commit discards the pending transaction itself when it is invalid
	book.commit_edit()
}
