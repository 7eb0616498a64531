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
use crate::parsing::entry::Entry;
use crate::util::date::Date;
use anyhow::{anyhow, bail, Error};
use std::io::BufRead;

/// What the lines following a `!` header describe.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Section {
	/// Nothing seen yet
	Start,
	/// `!Account`: names the account subsequent transactions belong to
	Account,
	/// `!Type:Bank`, `!Type:Cash`, `!Type:CCard`, ...
	Transactions,
	/// Category lists, memorized transactions, investments: not imported
	Ignored,
}

/// Fields of the transaction currently being read, up to its `^`.
#[derive(Default)]
struct PendingItem {
	date: Option<Date>,
	amount: Option<String>,
	/// `U` amount; only used when there is no `T`
	alt_amount: Option<String>,
	payee: Option<String>,
	memo: Option<String>,
	category: Option<String>,
	number: Option<String>,
	cleared: Option<String>,
	address: Vec<String>,
	split_category: Option<String>,
	split_memo: Option<String>,
	split_amount: Option<String>,
	splits_seen: usize,
	is_empty: bool,
}

impl PendingItem {
	fn new() -> Self {
		Self {
			is_empty: true,
			..Default::default()
		}
	}
}

/// Parses QIF text into entries, in file order.
///
/// The account of each entry comes from the most recent `!Account` block.
/// Items of a section that does not hold bank-style transactions are
/// skipped. Anything malformed fails the whole parse with the line number.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<Entry>, Error> {
	let mut entries = vec![];

	let mut section = Section::Start;
	let mut current_account: Option<String> = None;
	let mut account_name: Option<String> = None;
	let mut item = PendingItem::new();
	let mut last_line_no = 0;

	for (i, line) in reader.lines().enumerate() {
		let line_no = i + 1;
		last_line_no = line_no;
		let line = line?;
		let line = line
			.trim_start_matches('\u{feff}')
			.trim_end_matches(['\r', '\n']);

		if line.trim().is_empty() {
			continue;
		}

		if let Some(header) = line.strip_prefix('!') {
			if !item.is_empty {
				bail!("Header inside an unterminated item (line {})", line_no)
			}
			section = match section_for(header.trim()) {
				Some(s) => s,
				// switches like !Option:AutoSwitch do not open a section
				None => continue,
			};
			account_name = None;
			continue;
		}

		let mut chars = line.chars();
		let code = chars.next().unwrap_or_default();
		let value = chars.as_str().trim();

		match section {
			Section::Start => {
				bail!("Data before any !Type or !Account header (line {})", line_no)
			},
			Section::Ignored => continue,
			Section::Account => match code {
				'N' => account_name = Some(value.to_string()),
				'^' => match account_name.take() {
					Some(name) if !name.is_empty() => {
						log::debug!("Switching to account {}", name);
						current_account = Some(name);
					},
					_ => bail!("Account block without a name (line {})", line_no),
				},
				// type, description, limits and balances do not matter here
				_ => {},
			},
			Section::Transactions => {
				if code == '^' {
					let finished = std::mem::replace(&mut item, PendingItem::new());
					entries.push(finish_item(
						finished,
						current_account.as_ref(),
						line_no,
					)?);
					continue;
				}

				read_field(&mut item, code, value, line_no)?;
			},
		}
	}

	// Tolerate a final item that is missing its terminator
	if section == Section::Transactions && !item.is_empty {
		log::debug!("Last item of the file has no terminating ^");
		entries.push(finish_item(item, current_account.as_ref(), last_line_no)?);
	}

	Ok(entries)
}

fn section_for(header: &str) -> Option<Section> {
	let lower = header.to_ascii_lowercase();
	if lower == "account" {
		return Some(Section::Account);
	}
	if lower.starts_with("option:") || lower.starts_with("clear:") {
		return None;
	}

	match lower.strip_prefix("type:") {
		Some("bank" | "cash" | "ccard" | "oth a" | "oth l") => {
			Some(Section::Transactions)
		},
		_ => {
			log::debug!("Skipping section !{}", header);
			Some(Section::Ignored)
		},
	}
}

fn read_field(
	item: &mut PendingItem,
	code: char,
	value: &str,
	line_no: usize,
) -> Result<(), Error> {
	let text = (!value.is_empty()).then(|| value.to_string());

	match code {
		'D' => {
			item.date = Some(
				parse_date(value)
					.map_err(|e| anyhow!("{} (line {})", e, line_no))?,
			)
		},
		'T' => item.amount = text,
		'U' => item.alt_amount = text,
		'P' => item.payee = text,
		'M' => item.memo = text,
		'L' => item.category = text,
		'N' => item.number = text,
		'C' => item.cleared = text,
		'A' => item.address.push(value.to_string()),
		'S' => {
			item.splits_seen += 1;
			if item.splits_seen > 1 {
				bail!(
					"Transactions with more than one split are not supported (line {})",
					line_no
				)
			}
			item.split_category = text;
		},
		'E' => item.split_memo = text,
		'$' => item.split_amount = text,
		_ => {
			log::debug!("Ignoring unknown field {:?} (line {})", code, line_no);
			return Ok(());
		},
	}

	item.is_empty = false;
	Ok(())
}

fn finish_item(
	item: PendingItem,
	account: Option<&String>,
	line_no: usize,
) -> Result<Entry, Error> {
	let date = item
		.date
		.ok_or_else(|| anyhow!("Transaction without a date (line {})", line_no))?;
	let amount = item.amount.or(item.alt_amount).ok_or_else(|| {
		anyhow!("Transaction without an amount (line {})", line_no)
	})?;
	let account = account.ok_or_else(|| {
		anyhow!(
			"Transaction before any !Account block names its account (line {})",
			line_no
		)
	})?;

	Ok(Entry {
		date,
		amount,
		account: account.clone(),
		category: item.category,
		split_category: item.split_category,
		split_amount: item.split_amount,
		memo: item.memo,
		split_memo: item.split_memo,
		payee: item.payee,
		number: item.number,
		cleared: item.cleared,
		address: item.address,
	})
}

/// Reads the date formats seen in the wild:
///
/// - `2021/03/01` and `2021-03-01` (year first, as GnuCash writes them)
/// - `01.03.2021` (day first, dotted)
/// - `3/1/2021`, `3/1/21` (US month first)
/// - `3/ 1'21` (Quicken: apostrophe before the year means 2000s)
pub fn parse_date(input: &str) -> Result<Date, Error> {
	let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();

	let (body, quicken_year) = match compact.split_once('\'') {
		Some((md, y)) => (md.to_string(), Some(y.to_string())),
		None => (compact.clone(), None),
	};

	let separator = match body.chars().find(|c| matches!(c, '/' | '-' | '.')) {
		Some(s) => s,
		None => bail!("Unrecognized date: {}", input),
	};

	let mut parts: Vec<&str> = body.split(separator).collect();
	if let Some(y) = &quicken_year {
		parts.push(y);
	}
	if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
		bail!("Unrecognized date: {}", input);
	}

	let num = |s: &str| {
		s.parse::<u32>()
			.map_err(|_| anyhow!("Unrecognized date: {}", input))
	};

	let (year_text, month, day) = if parts[0].len() == 4 {
		(parts[0], num(parts[1])?, num(parts[2])?)
	} else if separator == '.' {
		(parts[2], num(parts[1])?, num(parts[0])?)
	} else {
		(parts[2], num(parts[0])?, num(parts[1])?)
	};

	let year = num(year_text)?;
	let year = match year_text.len() {
		4 => year,
		1 | 2 if quicken_year.is_some() || year < 70 => 2000 + year,
		1 | 2 => 1900 + year,
		_ => bail!("Unrecognized year in date: {}", input),
	};

	if month > 12 || day > 31 {
		bail!("Invalid date: {}", input);
	}

	Date::from_ymd(year, month as u8, day as u8)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse_str(text: &str) -> Result<Vec<Entry>, Error> {
		parse(text.as_bytes())
	}

	const GNUCASH_ANDROID: &str = "\
!Account
NAssets:Current Assets:Cash
TCash
^
!Type:Cash
D2021/03/01
T-12.34
PCafe Mundo
Mlunch
SExpenses:Dining
E
$-12.34
^
D2021/03/02
T-5,00
Mbus
LExpenses:Transport
^
!Account
NLiabilities:Credit Card
^
!Type:CCard
D2021/03/03
T-100.00
N1001
CX
^
";

	fn date(s: &str) -> Date {
		Date::from_str(s).unwrap()
	}

	#[test]
	fn test_parse_gnucash_android_export() {
		let entries = parse_str(GNUCASH_ANDROID).unwrap();
		assert_eq!(entries.len(), 3);

		let first = &entries[0];
		assert_eq!(first.date, date("2021-03-01"));
		assert_eq!(first.account, "Assets:Current Assets:Cash");
		assert_eq!(first.amount, "-12.34");
		assert_eq!(first.payee.as_deref(), Some("Cafe Mundo"));
		assert_eq!(first.memo.as_deref(), Some("lunch"));
		assert_eq!(first.split_category.as_deref(), Some("Expenses:Dining"));
		assert_eq!(first.split_memo, None);
		assert_eq!(first.split_amount.as_deref(), Some("-12.34"));

		let second = &entries[1];
		assert_eq!(second.amount, "-5,00");
		assert_eq!(second.category.as_deref(), Some("Expenses:Transport"));
		assert_eq!(second.payee, None);
		assert_eq!(second.account, "Assets:Current Assets:Cash");

		let third = &entries[2];
		assert_eq!(third.account, "Liabilities:Credit Card");
		assert_eq!(third.number.as_deref(), Some("1001"));
		assert_eq!(third.cleared.as_deref(), Some("X"));
	}

	#[test]
	fn test_crlf_bom_and_blank_lines() {
		let text = "\u{feff}!Account\r\nNAssets:Bank\r\n^\r\n\r\n!Type:Bank\r\nD2021-01-05\r\nT10\r\n^\r\n";
		let entries = parse_str(text).unwrap();
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].account, "Assets:Bank");
		assert_eq!(entries[0].amount, "10");
	}

	#[test]
	fn test_u_amount_used_without_t() {
		let text = "!Account\nNA:B\n^\n!Type:Bank\nD2021/01/05\nU7.50\n^\n";
		assert_eq!(parse_str(text).unwrap()[0].amount, "7.50");
	}

	#[test]
	fn test_address_lines_accumulate() {
		let text = "!Account\nNA:B\n^\n!Type:Bank\nD2021/01/05\nT1\nA1 Main St\nASpringfield\n^\n";
		let entry = &parse_str(text).unwrap()[0];
		assert_eq!(entry.address, vec!["1 Main St", "Springfield"]);
	}

	#[test]
	fn test_missing_final_terminator() {
		let text = "!Account\nNA:B\n^\n!Type:Bank\nD2021/01/05\nT1";
		assert_eq!(parse_str(text).unwrap().len(), 1);
	}

	#[test]
	fn test_ignored_sections_and_switches() {
		let text = "!Option:AutoSwitch\n!Account\nNA:B\n^\n!Clear:AutoSwitch\n!Type:Cat\nNGroceries\nE\n^\n!Type:Bank\nD2021/01/05\nT1\n^\n";
		let entries = parse_str(text).unwrap();
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].account, "A:B");
	}

	#[test]
	fn test_errors() {
		// no account
		assert!(parse_str("!Type:Bank\nD2021/01/05\nT1\n^\n").is_err());
		// no date
		assert!(parse_str("!Account\nNA\n^\n!Type:Bank\nT1\n^\n").is_err());
		// no amount
		assert!(parse_str("!Account\nNA\n^\n!Type:Bank\nD2021/01/05\n^\n").is_err());
		// bad date
		assert!(parse_str("!Account\nNA\n^\n!Type:Bank\nDyesterday\nT1\n^\n").is_err());
		// data before any header
		assert!(parse_str("D2021/01/05\nT1\n^\n").is_err());
		// multiple splits
		let multi = "!Account\nNA\n^\n!Type:Bank\nD2021/01/05\nT-3\nSX\n$-1\nSY\n$-2\n^\n";
		assert!(parse_str(multi).is_err());
	}

	#[test]
	fn test_account_block_needs_a_name() {
		let empty = parse_str("!Account\nN\n^\n!Type:Bank\nD2021/01/05\nT1\n^\n");
		let err = empty.unwrap_err().to_string();
		assert!(err.contains("line 3"), "{}", err);

		let missing = "!Account\nTBank\n^\n!Type:Bank\nD2021/01/05\nT1\n^\n";
		assert!(parse_str(missing).is_err());
	}

	#[test]
	fn test_unterminated_item_error_names_last_line() {
		let text = "!Account\nNA:B\n^\n!Type:Bank\nD2021/01/05\nMno amount";
		let err = parse_str(text).unwrap_err().to_string();
		assert!(err.contains("without an amount (line 6)"), "{}", err);
	}

	#[test]
	fn test_empty_input() {
		assert!(parse_str("").unwrap().is_empty());
	}

	mod dates {
		use super::*;

		#[test]
		fn test_year_first() {
			assert_eq!(parse_date("2021/03/01").unwrap(), date("2021-03-01"));
			assert_eq!(parse_date("2021-3-1").unwrap(), date("2021-03-01"));
		}

		#[test]
		fn test_dotted_day_first() {
			assert_eq!(parse_date("01.03.2021").unwrap(), date("2021-03-01"));
		}

		#[test]
		fn test_us_month_first() {
			assert_eq!(parse_date("3/1/2021").unwrap(), date("2021-03-01"));
			assert_eq!(parse_date("12/31/98").unwrap(), date("1998-12-31"));
			assert_eq!(parse_date("1/5/04").unwrap(), date("2004-01-05"));
		}

		#[test]
		fn test_quicken_apostrophe() {
			assert_eq!(parse_date("3/ 1'21").unwrap(), date("2021-03-01"));
			assert_eq!(parse_date("12/25'2004").unwrap(), date("2004-12-25"));
		}

		#[test]
		fn test_invalid() {
			assert!(parse_date("").is_err());
			assert!(parse_date("2021").is_err());
			assert!(parse_date("2021/02/30").is_err());
			assert!(parse_date("13/01/2021").is_err());
			assert!(parse_date("1/2/123").is_err());
		}
	}
}
