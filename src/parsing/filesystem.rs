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
use crate::config::config_file::Config;
use anyhow::{anyhow, bail, Context, Error};
use dirs::home_dir;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const DEFAULT_CONFIG_PATH: &str = ".config/qif-import/config.toml";
const DEFAULT_CACHE_PATH: &str = ".qif-import-cache.json";

/// Knows where things live on disk relative to the user's home directory.
pub struct Filesystem {
	home: Option<PathBuf>,
}

impl Filesystem {
	pub fn new() -> Self {
		Self { home: home_dir() }
	}

	#[cfg(test)]
	pub fn with_home(home: &Path) -> Self {
		Self {
			home: Some(home.to_path_buf()),
		}
	}

	fn home(&self) -> Result<&PathBuf, Error> {
		self.home
			.as_ref()
			.ok_or_else(|| anyhow!("Unable to determine home directory"))
	}

	/// Turns a leading "~/" into the home directory.
	pub fn expand(&self, path: &str) -> Result<PathBuf, Error> {
		match path.strip_prefix("~/") {
			Some(rest) => Ok(self.home()?.join(rest)),
			None => Ok(PathBuf::from(path)),
		}
	}

	pub fn default_cache_path(&self) -> Result<PathBuf, Error> {
		Ok(self.home()?.join(DEFAULT_CACHE_PATH))
	}

	/// Fetches the config from the given path, or default path if none.
	/// The default file is optional and its absence means an empty config;
	/// a path given explicitly must exist.
	pub fn get_config(
		&self,
		custom_config_path: Option<&String>,
	) -> Result<Config, Error> {
		let config_path = match custom_config_path {
			None => {
				let path = self.home()?.join(DEFAULT_CONFIG_PATH);
				if !path.exists() {
					log::debug!("No config at {}, using defaults", path.display());
					return Ok(Config::default());
				}
				path
			},
			Some(p) => self.expand(p)?,
		};

		let content = fs::read_to_string(&config_path).with_context(|| {
			format!("failed to read config {}", config_path.display())
		})?;
		let config: Config = toml::from_str(&content)
			.map_err(|e| anyhow!("failed to parse config: {}", e))?;

		Ok(config)
	}
}

/// The last component of a path, which is how sources are identified
/// across runs regardless of the directory they were imported from.
pub fn base_name(path: &Path) -> Result<String, Error> {
	match path.file_name().and_then(|n| n.to_str()) {
		Some(name) => Ok(name.to_string()),
		None => bail!("Path has no usable file name: {}", path.display()),
	}
}

/// Replaces the file at `path` with `contents` such that a reader sees
/// either the old file or the new one, never a partial write. The data goes
/// to a temporary file in the same directory first, which is then renamed
/// over the target.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), Error> {
	let dir = match path.parent() {
		Some(p) if !p.as_os_str().is_empty() => p,
		_ => Path::new("."),
	};

	let mut tmp = NamedTempFile::new_in(dir).with_context(|| {
		format!("failed to create temporary file in {}", dir.display())
	})?;
	tmp.write_all(contents)?;
	tmp.as_file().sync_all()?;
	tmp.persist(path)
		.map_err(|e| anyhow!("failed to replace {}: {}", path.display(), e))?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_expand_home() {
		let fs = Filesystem::with_home(Path::new("/home/someone"));
		assert_eq!(
			fs.expand("~/books.json").unwrap(),
			PathBuf::from("/home/someone/books.json")
		);
		assert_eq!(
			fs.expand("/abs/books.json").unwrap(),
			PathBuf::from("/abs/books.json")
		);
		assert_eq!(fs.expand("rel~/x").unwrap(), PathBuf::from("rel~/x"));
	}

	#[test]
	fn test_missing_default_config_is_empty() {
		let dir = tempdir().unwrap();
		let fs = Filesystem::with_home(dir.path());
		let config = fs.get_config(None).unwrap();
		assert!(config.import.is_none());
	}

	#[test]
	fn test_missing_explicit_config_fails() {
		let dir = tempdir().unwrap();
		let fs = Filesystem::with_home(dir.path());
		let path = dir.path().join("nope.toml").display().to_string();
		assert!(fs.get_config(Some(&path)).is_err());
	}

	#[test]
	fn test_default_config_is_read() {
		let dir = tempdir().unwrap();
		let config_dir = dir.path().join(".config/qif-import");
		fs::create_dir_all(&config_dir).unwrap();
		fs::write(
			config_dir.join("config.toml"),
			"[import]\ncurrency = \"CHF\"\n",
		)
		.unwrap();

		let fs = Filesystem::with_home(dir.path());
		let config = fs.get_config(None).unwrap();
		assert_eq!(config.import.unwrap().currency.as_deref(), Some("CHF"));
	}

	#[test]
	fn test_base_name() {
		assert_eq!(
			base_name(Path::new("/a/b/export.qif")).unwrap(),
			"export.qif"
		);
		assert_eq!(base_name(Path::new("export.qif")).unwrap(), "export.qif");
		assert!(base_name(Path::new("/")).is_err());
	}

	#[test]
	fn test_write_atomically_replaces() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("out.json");
		fs::write(&path, "old").unwrap();

		write_atomically(&path, b"new").unwrap();

		assert_eq!(fs::read_to_string(&path).unwrap(), "new");
		// nothing else left behind
		assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
	}
}
