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
use crate::parsing::filesystem::write_atomically;
use anyhow::{Context, Error};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Names of the source files imported by earlier runs. A file whose name is
/// in here is skipped as a whole.
#[derive(Debug)]
pub struct ConsumedSourceCache {
	path: PathBuf,
	imported: BTreeSet<String>,
}

impl ConsumedSourceCache {
	/// Reads the cache file, or starts empty if there is none yet.
	pub fn load(path: &Path) -> Result<Self, Error> {
		let imported = if path.exists() {
			let content = fs::read_to_string(path).with_context(|| {
				format!("failed to read cache {}", path.display())
			})?;
			serde_json::from_str(&content).with_context(|| {
				format!("failed to parse cache {}", path.display())
			})?
		} else {
			log::debug!("No cache at {}, starting empty", path.display());
			BTreeSet::new()
		};

		Ok(Self {
			path: path.to_path_buf(),
			imported,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn contains(&self, name: &str) -> bool {
		self.imported.contains(name)
	}

	pub fn insert(&mut self, name: &str) {
		self.imported.insert(name.to_string());
	}

	pub fn len(&self) -> usize {
		self.imported.len()
	}

	/// Rewrites the cache file with the current contents.
	pub fn save(&self) -> Result<(), Error> {
		log::debug!(
			"Saving {} imported file names to {}",
			self.imported.len(),
			self.path.display()
		);
		let json = serde_json::to_vec(&self.imported)?;
		write_atomically(&self.path, &json)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_missing_file_is_empty() {
		let dir = tempdir().unwrap();
		let cache = ConsumedSourceCache::load(&dir.path().join("c.json")).unwrap();
		assert_eq!(cache.len(), 0);
		assert!(!cache.contains("a.qif"));
	}

	#[test]
	fn test_save_and_load() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("c.json");

		let mut cache = ConsumedSourceCache::load(&path).unwrap();
		cache.insert("a.qif");
		cache.insert("b.qif");
		cache.insert("a.qif");
		cache.save().unwrap();

		let text = fs::read_to_string(&path).unwrap();
		assert_eq!(text, r#"["a.qif","b.qif"]"#);

		let cache = ConsumedSourceCache::load(&path).unwrap();
		assert_eq!(cache.len(), 2);
		assert!(cache.contains("b.qif"));
	}

	#[test]
	fn test_reads_unordered_array() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("c.json");
		fs::write(&path, r#"["z.qif", "y.qif"]"#).unwrap();

		let cache = ConsumedSourceCache::load(&path).unwrap();
		assert!(cache.contains("z.qif"));
		assert!(cache.contains("y.qif"));
	}

	#[test]
	fn test_corrupt_file_is_an_error() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("c.json");
		fs::write(&path, "{").unwrap();
		assert!(ConsumedSourceCache::load(&path).is_err());
	}
}
