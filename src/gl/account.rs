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
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an account in the book's account arena. Only meaningful for
/// the book that handed it out.
#[derive(
	Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub(crate) usize);

impl fmt::Display for AccountId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Accounts created by the importer inherit their parent's type; the other
/// types come from ledgers written by other tools and are kept on save.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
	Root,
	Asset,
	Bank,
	Cash,
	Credit,
	Liability,
	Equity,
	Income,
	Expense,
}

/// A node in the account tree. The node owns the list of its children;
/// there is no link back to the parent, since every walk starts at the
/// root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
	name: String,
	#[serde(rename = "type")]
	typ: AccountType,
	is_placeholder: bool,
	commodity: Option<String>,
	#[serde(default)]
	children: Vec<AccountId>,
}

impl Account {
	pub fn new(
		name: &str,
		typ: AccountType,
		is_placeholder: bool,
		commodity: Option<String>,
	) -> Self {
		Self {
			name: name.to_string(),
			typ,
			is_placeholder,
			commodity,
			children: vec![],
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn typ(&self) -> AccountType {
		self.typ
	}

	#[cfg(test)]
	pub fn is_placeholder(&self) -> bool {
		self.is_placeholder
	}

	pub fn commodity(&self) -> Option<&String> {
		self.commodity.as_ref()
	}

	pub fn children(&self) -> &[AccountId] {
		&self.children
	}

	pub(crate) fn push_child(&mut self, id: AccountId) {
		self.children.push(id);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_foreign_account_type_survives_round_trip() {
		let json = r#"{"name":"Wallet","type":"cash","is_placeholder":false,"commodity":"EUR"}"#;
		let account: Account = serde_json::from_str(json).unwrap();
		assert_eq!(account.typ(), AccountType::Cash);
		assert!(account.children().is_empty());

		let back = serde_json::to_value(&account).unwrap();
		assert_eq!(back["type"], "cash");
	}

	#[test]
	fn test_unknown_account_type_rejected() {
		let json = r#"{"name":"X","type":"stock","is_placeholder":false,"commodity":null}"#;
		assert!(serde_json::from_str::<Account>(json).is_err());
	}
}
