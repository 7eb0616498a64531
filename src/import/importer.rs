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
use crate::gl::commodity::{CommodityTable, ISO4217};
use crate::gl::session::Session;
use crate::import::builder::build;
use crate::import::cache::ConsumedSourceCache;
use crate::import::dedup::{DedupFilter, Verdict};
use crate::import::device::DeviceTransport;
use crate::import::source::SourceSpec;
use crate::parsing::entry::Entry;
use crate::util::date::Date;
use anyhow::{anyhow, Error};
use chrono::Utc;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a run stopped. Every variant means nothing was saved.
#[derive(Debug, Error)]
pub enum ImportError {
	#[error("Could not read {name}: {cause:#}")]
	SourceRead { name: String, cause: Error },

	#[error("Could not update ledger {ledger}: {cause:#}")]
	LedgerWrite { ledger: String, cause: Error },

	#[error("Invalid configuration: {0:#}")]
	Config(Error),
}

/// Everything a run needs to know, validated up front.
#[derive(Debug)]
pub struct ImportOptions {
	pub sources: Vec<SourceSpec>,
	pub ledger_file: PathBuf,
	/// ISO 4217 code all entries are posted in
	pub currency: String,
	/// Entries dated before this are skipped
	pub date_from: Option<Date>,
	pub dry_run: bool,
}

impl ImportOptions {
	pub fn new(
		inputs: &[String],
		ledger_file: PathBuf,
		currency: &str,
		date_from: Option<&str>,
		dry_run: bool,
	) -> Result<Self, ImportError> {
		let currency = currency.trim().to_uppercase();
		if CommodityTable::default().lookup(ISO4217, &currency).is_none() {
			return Err(ImportError::Config(anyhow!(
				"unknown currency {}",
				currency
			)));
		}

		let date_from = date_from
			.map(Date::from_str)
			.transpose()
			.map_err(|e| ImportError::Config(anyhow!("--date-from: {}", e)))?;

		let sources = inputs
			.iter()
			.map(|s| SourceSpec::parse(s))
			.collect::<Result<Vec<_>, _>>()
			.map_err(ImportError::Config)?;

		Ok(Self {
			sources,
			ledger_file,
			currency,
			date_from,
			dry_run,
		})
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
	pub gathered: usize,
	pub imported: usize,
	pub skipped_by_date: usize,
	pub skipped_duplicate: usize,
}

impl fmt::Display for RunSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} entries read, {} imported, {} before the start date, {} duplicates",
			self.gathered,
			self.imported,
			self.skipped_by_date,
			self.skipped_duplicate
		)
	}
}

/// Runs one import: reads every source, then posts whatever survives the
/// filters to the ledger and saves it (unless this is a dry run).
///
/// The cache comes back updated with the sources consumed; persisting it
/// is up to the caller, and only makes sense when this returns Ok and the
/// run was not a dry run.
pub fn run(
	options: &ImportOptions,
	mut cache: ConsumedSourceCache,
	transport: &dyn DeviceTransport,
) -> Result<(RunSummary, ConsumedSourceCache), ImportError> {
	let mut entries = vec![];
	for source in &options.sources {
		let read = source.read(&mut cache, transport).map_err(|cause| {
			ImportError::SourceRead {
				name: source.to_string(),
				cause,
			}
		})?;
		entries.extend(read);
	}

	let mut summary = RunSummary {
		gathered: entries.len(),
		..Default::default()
	};

	if entries.is_empty() {
		log::info!("Nothing new to import");
		return Ok((summary, cache));
	}

	let ledger_error = |cause: Error| ImportError::LedgerWrite {
		ledger: options.ledger_file.display().to_string(),
		cause,
	};

	log::debug!("Opening ledger {}..", options.ledger_file.display());
	let mut session = Session::open(&options.ledger_file, &options.currency)
		.map_err(ledger_error)?;

	// Any failure from here on ends the session without saving
	let posted = post_entries(&mut session, &entries, options, &mut summary)
		.and_then(|_| {
			if options.dry_run {
				log::info!("** DRY-RUN ** ledger not saved");
				Ok(())
			} else {
				session.save()
			}
		});
	session.end();
	posted.map_err(ledger_error)?;

	Ok((summary, cache))
}

fn post_entries(
	session: &mut Session,
	entries: &[Entry],
	options: &ImportOptions,
	summary: &mut RunSummary,
) -> Result<(), Error> {
	let currency = session
		.book()
		.commodity_table()
		.lookup(ISO4217, &options.currency)
		.cloned()
		.ok_or_else(|| {
			anyhow!("Currency {} is not known to the ledger", options.currency)
		})?;

	let mut filter = DedupFilter::new(options.date_from);
	let book = session.book_mut();

	for entry in entries {
		match filter.check(entry) {
			Verdict::BeforeFloor => summary.skipped_by_date += 1,
			Verdict::Duplicate => summary.skipped_duplicate += 1,
			Verdict::Accept => {
				let id = build(book, entry, &currency, Utc::now())?;
				summary.imported += 1;

				if options.dry_run {
					if let Some(tx) = book.transaction(id) {
						log::info!("Would import:\n{}", book.render(tx));
					}
				}
			},
		}
	}

	Ok(())
}
