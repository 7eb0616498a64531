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
use crate::gl::account::{Account, AccountId};
use crate::gl::book::Book;
use anyhow::{anyhow, bail, Error};

/// Walks `path` down from `parent`, creating every account that does not
/// exist yet. A created account takes its type and commodity from its
/// parent and is a placeholder unless it is the last segment.
pub fn resolve(
	book: &mut Book,
	parent: AccountId,
	path: &[&str],
) -> Result<AccountId, Error> {
	let Some((&name, rest)) = path.split_first() else {
		return Ok(parent);
	};
	if name.is_empty() {
		bail!("Account path has an empty segment")
	}

	let child = match book.lookup_by_name(parent, name) {
		Some(child) => child,
		None => {
			let parent_account = book
				.account(parent)
				.ok_or_else(|| anyhow!("Account {} does not exist", parent))?;
			let account = Account::new(
				name,
				parent_account.typ(),
				!rest.is_empty(),
				parent_account.commodity().cloned(),
			);

			let id = book.append_child(parent, account)?;
			log::info!("Adding account {}", book.full_name(id));
			id
		},
	};

	resolve(book, child, rest)
}

/// Resolves a colon-delimited path such as "Assets:Bank:Checking" from the
/// root of the book.
pub fn lookup_account(book: &mut Book, path: &str) -> Result<AccountId, Error> {
	let segments: Vec<&str> = path.split(':').collect();
	if segments.iter().any(|s| s.is_empty()) {
		bail!("Account path {:?} is empty or has an empty segment", path)
	}

	let root = book.root_account();
	resolve(book, root, &segments)
		.map_err(|e| anyhow!("Cannot resolve account {}: {}", path, e))
}
