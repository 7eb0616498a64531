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
use crate::parsing::filesystem::write_atomically;
use anyhow::{anyhow, bail, Context, Error};
use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// An open handle on a ledger file. While a session is open, a lock file
/// next to the ledger keeps other sessions out. Changes to the book only
/// reach the disk on save; ending a session without saving discards them.
pub struct Session {
	path: PathBuf,
	lock_path: PathBuf,
	book: Book,
	locked: bool,
}

impl Session {
	/// Opens the ledger at `path`, or starts a new, empty book denominated
	/// in `currency` if there is no file there yet. Nothing is written until
	/// the first save.
	pub fn open(path: &Path, currency: &str) -> Result<Self, Error> {
		let lock_path = lock_path_for(path)?;

		match OpenOptions::new().write(true).create_new(true).open(&lock_path)
		{
			Ok(_) => {},
			Err(e) if e.kind() == ErrorKind::AlreadyExists => bail!(
				"Ledger {} is locked by another session (remove {} if that session is gone)",
				path.display(),
				lock_path.display()
			),
			Err(e) => {
				return Err(anyhow!(
					"failed to lock {}: {}",
					path.display(),
					e
				))
			},
		}

		// From here on the lock must be released on failure, which dropping
		// the session does.
		let mut session = Self {
			path: path.to_path_buf(),
			lock_path,
			book: Book::new(Some(currency)),
			locked: true,
		};

		if path.exists() {
			log::debug!("Loading ledger {}..", path.display());
			session.book = load_book(path)?;
			log::debug!(
				"Loaded {} accounts and {} transactions",
				session.book.account_count(),
				session.book.transactions().len()
			);
		} else {
			log::info!(
				"Ledger {} does not exist yet; starting a new book",
				path.display()
			);
		}

		Ok(session)
	}

	pub fn book(&self) -> &Book {
		&self.book
	}

	pub fn book_mut(&mut self) -> &mut Book {
		&mut self.book
	}

	/// Writes the whole book back to the ledger file, atomically.
	pub fn save(&mut self) -> Result<(), Error> {
		if !self.locked {
			bail!("Session for {} has already ended", self.path.display())
		}
		if self.book.is_editing() {
			bail!("Cannot save while a transaction is being edited")
		}

		log::debug!("Saving ledger {}..", self.path.display());
		let json = serde_json::to_vec_pretty(&self.book)?;
		write_atomically(&self.path, &json)
	}

	/// Closes the session, discarding anything unsaved and releasing the
	/// lock.
	pub fn end(mut self) {
		self.release();
	}

	fn release(&mut self) {
		if !self.locked {
			return;
		}
		self.locked = false;

		if let Err(e) = fs::remove_file(&self.lock_path) {
			log::warn!(
				"Could not remove lock file {}: {}",
				self.lock_path.display(),
				e
			);
		}
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		self.release();
	}
}

fn lock_path_for(path: &Path) -> Result<PathBuf, Error> {
	let name = path
		.file_name()
		.and_then(|n| n.to_str())
		.ok_or_else(|| anyhow!("Ledger path has no file name: {}", path.display()))?;
	Ok(path.with_file_name(format!("{}.LCK", name)))
}

fn load_book(path: &Path) -> Result<Book, Error> {
	let content = fs::read_to_string(path)
		.with_context(|| format!("failed to read ledger {}", path.display()))?;
	let book: Book = serde_json::from_str(&content)
		.with_context(|| format!("failed to parse ledger {}", path.display()))?;
	book.check()
		.with_context(|| format!("ledger {} is inconsistent", path.display()))?;
	Ok(book)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gl::account::{Account, AccountType};
	use tempfile::tempdir;

	#[test]
	fn test_new_ledger_not_written_until_save() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("books.json");

		let session = Session::open(&path, "EUR").unwrap();
		assert_eq!(session.book().account_count(), 1);
		session.end();

		assert!(!path.exists());
	}

	#[test]
	fn test_save_and_reopen() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("books.json");

		let mut session = Session::open(&path, "EUR").unwrap();
		let root = session.book().root_account();
		session
			.book_mut()
			.append_child(
				root,
				Account::new("Assets", AccountType::Asset, true, None),
			)
			.unwrap();
		session.save().unwrap();
		session.end();

		let session = Session::open(&path, "USD").unwrap();
		assert!(session.book().find_account("Assets").is_some());
		// currency only applies to new books
		let root = session.book().root_account();
		let root = session.book().account(root).unwrap();
		assert_eq!(root.commodity().unwrap(), "EUR");
	}

	#[test]
	fn test_second_session_is_locked_out() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("books.json");

		let first = Session::open(&path, "EUR").unwrap();
		assert!(Session::open(&path, "EUR").is_err());

		first.end();
		assert!(Session::open(&path, "EUR").is_ok());
	}

	#[test]
	fn test_lock_released_on_drop_and_on_load_failure() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("books.json");
		fs::write(&path, "not json").unwrap();

		assert!(Session::open(&path, "EUR").is_err());
		assert!(!dir.path().join("books.json.LCK").exists());

		{
			let _session = Session::open(dir.path().join("other.json").as_path(), "EUR").unwrap();
			assert!(dir.path().join("other.json.LCK").exists());
		}
		assert!(!dir.path().join("other.json.LCK").exists());
	}

	#[test]
	fn test_unsaved_changes_are_discarded() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("books.json");

		let mut session = Session::open(&path, "EUR").unwrap();
		session.save().unwrap();
		let root = session.book().root_account();
		session
			.book_mut()
			.append_child(
				root,
				Account::new("Assets", AccountType::Asset, false, None),
			)
			.unwrap();
		session.end();

		let session = Session::open(&path, "EUR").unwrap();
		assert!(session.book().find_account("Assets").is_none());
	}
}
