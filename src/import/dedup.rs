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
use crate::parsing::entry::{Entry, Fingerprint};
use crate::util::date::Date;
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
	Accept,
	BeforeFloor,
	Duplicate,
}

/// Decides, entry by entry, what a run imports. Only remembers entries
/// within one run; whole files seen by earlier runs are kept out by the
/// consumed-source cache instead.
#[derive(Debug)]
pub struct DedupFilter {
	date_from: Option<Date>,
	seen: HashSet<Fingerprint>,
}

impl DedupFilter {
	pub fn new(date_from: Option<Date>) -> Self {
		Self {
			date_from,
			seen: HashSet::new(),
		}
	}

	/// Accepted entries are remembered, so a second identical entry is
	/// reported as a duplicate.
	pub fn check(&mut self, entry: &Entry) -> Verdict {
		if let Some(floor) = self.date_from {
			if entry.date < floor {
				log::info!(
					"Skipping entry {} ({})",
					entry.date,
					entry.posting_amount()
				);
				return Verdict::BeforeFloor;
			}
		}

		if !self.seen.insert(entry.fingerprint()) {
			log::info!(
				"Skipping entry {} ({}) --- already imported!",
				entry.date,
				entry.posting_amount()
			);
			return Verdict::Duplicate;
		}

		Verdict::Accept
	}
}
