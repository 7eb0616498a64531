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
use crate::import::device::MtpTools;
use crate::import::importer::{run, ImportOptions};
use crate::parsing::filesystem::Filesystem;
use anyhow::{anyhow, Error};
use clap::Parser;
use log::LevelFilter;
use std::process::ExitCode;

mod config;
mod gl;
mod import;
mod parsing;
mod util;

const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Parser)]
#[command(
	name = "qif-import",
	version,
	about = "Import QIF transactions into a double-entry ledger"
)]
struct Cli {
	// ----------------
	// -- POSITIONAL --
	// ----------------
	/// Input QIF file(s), can also be "mtp:<PATTERN>" to import from an MTP
	/// device
	#[arg(required = true)]
	files: Vec<String>,

	// -----------
	// -- FLAGS --
	// -----------
	/// Verbose (debug) logging
	#[arg(short, long, conflicts_with = "quiet")]
	verbose: bool,

	/// Silent mode, only log warnings
	#[arg(short, long)]
	quiet: bool,

	/// Noop, do not write anything
	#[arg(long)]
	dry_run: bool,

	/// Only import transactions on or after this date (YYYY-MM-DD)
	#[arg(long)]
	date_from: Option<String>,

	/// Currency ISO code (default: EUR)
	#[arg(short, long, value_name = "ISOCODE")]
	currency: Option<String>,

	/// Ledger data file
	#[arg(short = 'f', long)]
	ledger_file: Option<String>,

	/// File remembering already imported inputs
	/// (default: ~/.qif-import-cache.json)
	#[arg(long)]
	cache: Option<String>,

	/// Custom config file location
	/// (default: ~/.config/qif-import/config.toml)
	#[arg(long)]
	config: Option<String>,
}

impl Cli {
	fn log_level(&self) -> LevelFilter {
		if self.verbose {
			LevelFilter::Debug
		} else if self.quiet {
			LevelFilter::Warn
		} else {
			LevelFilter::Info
		}
	}
}

fn main() -> ExitCode {
	let args = Cli::parse();

	// RUST_LOG, if set, still wins over the flags
	env_logger::Builder::new()
		.filter_level(args.log_level())
		.format_target(false)
		.parse_default_env()
		.init();

	match execute(args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			log::error!("{:#}", e);
			ExitCode::FAILURE
		},
	}
}

fn execute(args: Cli) -> Result<(), Error> {
	let fs = Filesystem::new();
	let config = fs.get_config(args.config.as_ref())?;
	let defaults = config.import.unwrap_or_default();

	let currency = args
		.currency
		.or(defaults.currency)
		.unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

	let ledger_file = args.ledger_file.or(defaults.ledger_file).ok_or_else(|| {
		anyhow!("No ledger file given; use -f or set ledger_file in the config")
	})?;

	let cache_path = match args.cache.or(defaults.cache_file) {
		Some(path) => fs.expand(&path)?,
		None => fs.default_cache_path()?,
	};

	let options = ImportOptions::new(
		&args.files,
		fs.expand(&ledger_file)?,
		&currency,
		args.date_from.as_deref(),
		args.dry_run,
	)?;

	let cache = ConsumedSourceCache::load(&cache_path)?;
	log::debug!(
		"{} files already imported according to {}",
		cache.len(),
		cache.path().display()
	);

	let transport = MtpTools::new(config.mtp.as_ref());
	let (summary, cache) = run(&options, cache, &transport)?;
	log::info!("{}", summary);

	if options.dry_run {
		log::debug!("** DRY-RUN ** cache not saved");
	} else {
		cache.save()?;
	}

	Ok(())
}
