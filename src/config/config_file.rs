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
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
	pub import: Option<Import>,
	pub mtp: Option<Mtp>,
}

/// Defaults for the command line flags of the same purpose. Flags win.
#[derive(Debug, Default, Deserialize)]
pub struct Import {
	/// ISO 4217 code entries are posted in
	pub currency: Option<String>,
	pub ledger_file: Option<String>,
	/// Where the names of already imported files are remembered
	pub cache_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Mtp {
	/// Program that lists the files on the device (mtp-tools' mtp-files)
	pub files_cmd: Option<String>,
	/// Program that copies one file off the device (mtp-tools' mtp-getfile)
	pub getfile_cmd: Option<String>,
}
