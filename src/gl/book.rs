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
use crate::gl::account::{Account, AccountId, AccountType};
use crate::gl::commodity::{Commodity, CommodityTable};
use crate::gl::transaction::{Split, Transaction, TransactionId};
use crate::util::date::Date;
use crate::util::quant::Quant;
use anyhow::{anyhow, bail, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const ROOT_ACCOUNT_NAME: &str = "Root Account";

/// The in-memory ledger: an account tree, the commodities money can be
/// posted in, and the transactions posted so far.
///
/// Accounts live in an arena where index 0 is always the root. Transactions
/// are assembled one at a time through begin_edit / commit_edit; only a
/// transaction that passes validation on commit becomes part of the book.
#[derive(Debug, Serialize, Deserialize)]
pub struct Book {
	accounts: Vec<Account>,
	#[serde(default)]
	commodities: CommodityTable,
	#[serde(default)]
	transactions: Vec<Transaction>,

	/// Transaction currently being assembled, if any
	#[serde(skip)]
	pending: Option<Transaction>,
}

impl Book {
	/// Creates a book holding nothing but a root account, denominated in
	/// the given commodity if any.
	pub fn new(commodity: Option<&str>) -> Self {
		Self {
			accounts: vec![Account::new(
				ROOT_ACCOUNT_NAME,
				AccountType::Root,
				false,
				commodity.map(str::to_string),
			)],
			commodities: Default::default(),
			transactions: vec![],
			pending: None,
		}
	}

	/// Checks the internal consistency of a book that came from disk:
	/// a root exists and every reference points inside the arena, and
	/// every account is reachable from the root exactly once.
	pub fn check(&self) -> Result<(), Error> {
		if self.accounts.is_empty() {
			bail!("Book has no root account")
		}

		let mut seen = vec![false; self.accounts.len()];
		let mut stack = vec![self.root_account()];
		while let Some(id) = stack.pop() {
			if seen[id.0] {
				bail!("Account {} appears twice in the tree", id)
			}
			seen[id.0] = true;

			for &child in self.accounts[id.0].children() {
				if child.0 >= self.accounts.len() {
					bail!("Account {} refers to missing child {}", id, child)
				}
				stack.push(child);
			}
		}

		if let Some(orphan) = seen.iter().position(|&s| !s) {
			bail!("Account {} is not reachable from the root", orphan)
		}

		for (i, tx) in self.transactions.iter().enumerate() {
			for split in tx.splits() {
				if split.account().0 >= self.accounts.len() {
					bail!("Transaction {} refers to missing account {}", i, split.account())
				}
			}
		}

		Ok(())
	}

	// --------------
	// -- ACCOUNTS --
	// --------------

	pub fn root_account(&self) -> AccountId {
		AccountId(0)
	}

	pub fn account(&self, id: AccountId) -> Option<&Account> {
		self.accounts.get(id.0)
	}

	pub fn account_count(&self) -> usize {
		self.accounts.len()
	}

	/// Finds a direct child of `parent` by exact name.
	pub fn lookup_by_name(
		&self,
		parent: AccountId,
		name: &str,
	) -> Option<AccountId> {
		self.account(parent)?
			.children()
			.iter()
			.copied()
			.find(|&child| self.accounts[child.0].name() == name)
	}

	/// Finds an account by its colon-delimited path from the root, without
	/// creating anything.
	#[cfg(test)]
	pub fn find_account(&self, path: &str) -> Option<AccountId> {
		path.split(':').try_fold(self.root_account(), |parent, name| {
			self.lookup_by_name(parent, name)
		})
	}

	/// Attaches a new account under `parent`, returning its id.
	pub fn append_child(
		&mut self,
		parent: AccountId,
		account: Account,
	) -> Result<AccountId, Error> {
		if self.account(parent).is_none() {
			bail!("Parent account {} does not exist", parent)
		}
		if account.name().is_empty() {
			bail!("Account is empty")
		}
		if self.lookup_by_name(parent, account.name()).is_some() {
			bail!(
				"Account {} already exists under {}",
				account.name(),
				self.full_name(parent)
			)
		}

		let id = AccountId(self.accounts.len());
		self.accounts.push(account);
		self.accounts[parent.0].push_child(id);
		Ok(id)
	}

	/// Colon-delimited path of the account from the root, excluding the
	/// root itself. Empty for the root.
	pub fn full_name(&self, id: AccountId) -> String {
		let mut path = vec![];
		if self.path_to(self.root_account(), id, &mut path) {
			path.iter()
				.map(|&a| self.accounts[a.0].name())
				.collect::<Vec<_>>()
				.join(":")
		} else {
			String::new()
		}
	}

	fn path_to(
		&self,
		from: AccountId,
		target: AccountId,
		path: &mut Vec<AccountId>,
	) -> bool {
		if from == target {
			return true;
		}

		for &child in self.accounts[from.0].children() {
			path.push(child);
			if self.path_to(child, target, path) {
				return true;
			}
			path.pop();
		}

		false
	}

	// -----------------
	// -- COMMODITIES --
	// -----------------

	pub fn commodity_table(&self) -> &CommodityTable {
		&self.commodities
	}

	// ------------------
	// -- TRANSACTIONS --
	// ------------------

	pub fn transactions(&self) -> &[Transaction] {
		&self.transactions
	}

	pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
		self.transactions.get(id.0)
	}

	/// Starts assembling a transaction. Only one may be pending at a time.
	pub fn begin_edit(
		&mut self,
		currency: &Commodity,
		posted: Date,
		entered: DateTime<Utc>,
	) -> Result<(), Error> {
		if self.pending.is_some() {
			bail!("A transaction is already being edited")
		}

		self.pending = Some(Transaction::new(
			currency.mnemonic(),
			currency.fraction(),
			posted,
			entered,
		));
		Ok(())
	}

	pub fn set_description(&mut self, description: &str) -> Result<(), Error> {
		self.pending_mut()?.set_description(description);
		Ok(())
	}

	pub fn set_notes(&mut self, notes: Option<String>) -> Result<(), Error> {
		self.pending_mut()?.set_notes(notes);
		Ok(())
	}

	pub fn add_split(
		&mut self,
		account: AccountId,
		value: Quant,
		memo: Option<String>,
	) -> Result<(), Error> {
		if self.account(account).is_none() {
			bail!("Split refers to missing account {}", account)
		}

		self.pending_mut()?.add_split(Split::new(account, value, memo));
		Ok(())
	}

	/// Takes the pending transaction, validates it, and adds it to the
	/// book. A transaction that fails validation is discarded, so the book
	/// never holds a partial or unbalanced transaction.
	pub fn commit_edit(&mut self) -> Result<TransactionId, Error> {
		let tx = self
			.pending
			.take()
			.ok_or_else(|| anyhow!("No transaction is being edited"))?;

		tx.validate()?;

		let id = TransactionId(self.transactions.len());
		self.transactions.push(tx);
		Ok(id)
	}

	/// Discards the pending transaction, if any.
	pub fn rollback_edit(&mut self) {
		self.pending = None;
	}

	pub fn is_editing(&self) -> bool {
		self.pending.is_some()
	}

	fn pending_mut(&mut self) -> Result<&mut Transaction, Error> {
		self.pending
			.as_mut()
			.ok_or_else(|| anyhow!("No transaction is being edited"))
	}

	/// Plain-text rendering of a transaction with full account names.
	pub fn render<'a>(&'a self, tx: &'a Transaction) -> Rendered<'a> {
		Rendered { book: self, tx }
	}
}

/// Display adapter pairing a transaction with the book that can name its
/// accounts.
pub struct Rendered<'a> {
	book: &'a Book,
	tx: &'a Transaction,
}

impl fmt::Display for Rendered<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let tx = self.tx;

		// Render the header line with date and description
		writeln!(f, "{} {}", tx.posted(), tx.description())?;

		// Render the notes, word-wrapping at 80 characters overall
		if let Some(notes) = tx.notes() {
			for line in wrap_text(notes, 69) {
				writeln!(f, "\t// {}", line)?;
			}
		}

		let lines: Vec<(String, String, Option<&String>)> = tx
			.splits()
			.iter()
			.map(|s| {
				(self.book.full_name(s.account()), s.value().to_string(), s.memo())
			})
			.collect();

		let account_width =
			lines.iter().map(|(a, _, _)| a.len()).max().unwrap_or(0);
		let value_width =
			lines.iter().map(|(_, v, _)| v.len()).max().unwrap_or(0);

		for (account, value, memo) in lines {
			write!(
				f,
				"\t{:<account_width$}  {:>value_width$} {}",
				account,
				value,
				tx.currency(),
			)?;
			match memo {
				Some(m) if !m.is_empty() => writeln!(f, "  ; {}", m)?,
				_ => writeln!(f)?,
			}
		}

		Ok(())
	}
}

/// Helper function to wrap text into lines of specified width
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
	let mut lines = Vec::new();
	let mut current_line = String::new();

	for word in text.split_whitespace() {
		if !current_line.is_empty()
			&& current_line.len() + word.len() + 1 > max_width
		{
			lines.push(current_line);
			current_line = String::new();
		}
		if !current_line.is_empty() {
			current_line.push(' ');
		}
		current_line.push_str(word);
	}

	if !current_line.is_empty() {
		lines.push(current_line);
	}

	lines
}
