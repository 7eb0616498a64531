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
use crate::config::config_file::Mtp;
use anyhow::{anyhow, bail, Error};
use std::path::Path;
use std::process::{Command, Output};

const DEFAULT_FILES_CMD: &str = "mtp-files";
const DEFAULT_GETFILE_CMD: &str = "mtp-getfile";

/// A file as listed by a removable device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceFile {
	/// Device-assigned handle used to fetch the file
	pub id: String,
	pub name: String,
}

/// Access to the files on a removable device.
pub trait DeviceTransport {
	fn enumerate(&self) -> Result<Vec<DeviceFile>, Error>;

	/// Copies the file off the device to `dest`, replacing it.
	fn fetch(&self, file: &DeviceFile, dest: &Path) -> Result<(), Error>;
}

/// Talks to an MTP device (phones, mostly) through the libmtp command line
/// tools.
pub struct MtpTools {
	files_cmd: String,
	getfile_cmd: String,
}

impl MtpTools {
	pub fn new(config: Option<&Mtp>) -> Self {
		let files_cmd = config.and_then(|c| c.files_cmd.clone());
		let getfile_cmd = config.and_then(|c| c.getfile_cmd.clone());

		Self {
			files_cmd: files_cmd.unwrap_or_else(|| DEFAULT_FILES_CMD.into()),
			getfile_cmd: getfile_cmd
				.unwrap_or_else(|| DEFAULT_GETFILE_CMD.into()),
		}
	}
}

impl DeviceTransport for MtpTools {
	fn enumerate(&self) -> Result<Vec<DeviceFile>, Error> {
		log::debug!("Listing files on MTP device..");
		let output = run(Command::new(&self.files_cmd), &self.files_cmd)?;

		// mtp-files reports some of its findings on stderr
		let mut listing = String::from_utf8_lossy(&output.stdout).to_string();
		listing.push_str(&String::from_utf8_lossy(&output.stderr));

		let files = parse_listing(&listing);
		log::debug!("{} files on MTP device", files.len());
		Ok(files)
	}

	fn fetch(&self, file: &DeviceFile, dest: &Path) -> Result<(), Error> {
		log::debug!("Fetching {} (ID: {}) from MTP device", file.name, file.id);

		let mut cmd = Command::new(&self.getfile_cmd);
		cmd.arg(&file.id).arg(dest);
		run(cmd, &self.getfile_cmd)?;
		Ok(())
	}
}

fn run(mut cmd: Command, name: &str) -> Result<Output, Error> {
	let output = cmd
		.output()
		.map_err(|e| anyhow!("failed to run {}: {}", name, e))?;

	if !output.status.success() {
		let stderr = String::from_utf8_lossy(&output.stderr);
		bail!(
			"{} failed (exit {}): {}",
			name,
			output.status.code().unwrap_or(-1),
			stderr.trim()
		)
	}

	Ok(output)
}

/// Pairs each "Filename:" line with the "File ID:" line before it. Keys are
/// matched case-insensitively; everything else in the listing is noise.
fn parse_listing(listing: &str) -> Vec<DeviceFile> {
	let mut files = vec![];
	let mut last_id: Option<String> = None;

	for line in listing.lines() {
		let Some((key, value)) = line.trim().split_once(':') else {
			continue;
		};

		match key.trim().to_ascii_lowercase().as_str() {
			"file id" => last_id = Some(value.trim().to_string()),
			"filename" => match &last_id {
				Some(id) => files.push(DeviceFile {
					id: id.clone(),
					name: value.trim().to_string(),
				}),
				None => log::debug!(
					"Ignoring file {} listed without an ID",
					value.trim()
				),
			},
			_ => {},
		}
	}

	files
}
