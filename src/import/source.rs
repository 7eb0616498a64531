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
use crate::import::cache::ConsumedSourceCache;
use crate::import::device::{DeviceFile, DeviceTransport};
use crate::parsing::entry::Entry;
use crate::parsing::filesystem::base_name;
use crate::parsing::qif;
use anyhow::{anyhow, Context, Error};
use regex::Regex;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const MTP_SCHEME: &str = "mtp:";

/// Where a batch of entries comes from.
#[derive(Debug)]
pub enum SourceSpec {
	Local(PathBuf),
	/// Files on the MTP device whose names match, from the start
	Device(Regex),
}

impl SourceSpec {
	pub fn parse(spec: &str) -> Result<Self, Error> {
		match spec.strip_prefix(MTP_SCHEME) {
			Some(pattern) => {
				let regex = Regex::new(&format!("^(?:{})", pattern))
					.map_err(|e| anyhow!("Invalid pattern in {}: {}", spec, e))?;
				Ok(SourceSpec::Device(regex))
			},
			None => Ok(SourceSpec::Local(PathBuf::from(spec))),
		}
	}

	/// Reads every entry from this source that has not been imported before
	/// and records what was read in `cache`.
	pub fn read(
		&self,
		cache: &mut ConsumedSourceCache,
		transport: &dyn DeviceTransport,
	) -> Result<Vec<Entry>, Error> {
		log::debug!("Reading {}..", self);

		let entries = match self {
			SourceSpec::Local(path) => read_local(path, cache)?,
			SourceSpec::Device(regex) => read_device(regex, cache, transport)?,
		};

		log::debug!("Read {} entries from {}", entries.len(), self);
		Ok(entries)
	}
}

impl fmt::Display for SourceSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SourceSpec::Local(path) => write!(f, "{}", path.display()),
			// strip the anchor added in parse
			SourceSpec::Device(regex) => {
				let pattern = regex.as_str();
				let pattern = pattern
					.strip_prefix("^(?:")
					.and_then(|p| p.strip_suffix(')'))
					.unwrap_or(pattern);
				write!(f, "{}{}", MTP_SCHEME, pattern)
			},
		}
	}
}

fn read_local(
	path: &Path,
	cache: &mut ConsumedSourceCache,
) -> Result<Vec<Entry>, Error> {
	let name = base_name(path)?;
	if cache.contains(&name) {
		log::info!("Skipping {} (already imported)", name);
		return Ok(vec![]);
	}

	let entries = parse_file(path)?;
	cache.insert(&name);
	Ok(entries)
}

fn read_device(
	regex: &Regex,
	cache: &mut ConsumedSourceCache,
	transport: &dyn DeviceTransport,
) -> Result<Vec<Entry>, Error> {
	let mut entries = vec![];

	for file in transport.enumerate()? {
		if !regex.is_match(&file.name) {
			continue;
		}
		log::debug!(
			"Found matching file on MTP device: \"{}\" (ID: {})",
			file.name,
			file.id
		);

		if cache.contains(&file.name) {
			log::info!("Skipping {} (already imported)", file.name);
			continue;
		}

		entries.extend(fetch_and_parse(&file, transport)?);
		cache.insert(&file.name);
	}

	Ok(entries)
}

/// The copy lives in a temporary file that is gone once parsed.
fn fetch_and_parse(
	file: &DeviceFile,
	transport: &dyn DeviceTransport,
) -> Result<Vec<Entry>, Error> {
	let tmp = tempfile::Builder::new()
		.prefix("qif-import-")
		.suffix(&format!("-{}", file.name))
		.tempfile()?;

	transport
		.fetch(file, tmp.path())
		.with_context(|| format!("failed to fetch {}", file.name))?;

	let entries = parse_file(tmp.path())
		.with_context(|| format!("in {} from MTP device", file.name))?;
	log::debug!("Read {} entries from {}", entries.len(), file.name);
	Ok(entries)
}

fn parse_file(path: &Path) -> Result<Vec<Entry>, Error> {
	let file = File::open(path)
		.with_context(|| format!("failed to open {}", path.display()))?;
	qif::parse(BufReader::new(file))
		.with_context(|| format!("failed to parse {}", path.display()))
}
