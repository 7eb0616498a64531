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
use serde::{Deserialize, Serialize};

/// Namespace under which national currencies live.
pub const ISO4217: &str = "ISO4217";

/// Currency code and number of minor units per major unit.
const ISO4217_FRACTIONS: [(&str, u32); 44] = [
	("AED", 100),
	("ARS", 100),
	("AUD", 100),
	("BGN", 100),
	("BHD", 1000),
	("BRL", 100),
	("CAD", 100),
	("CHF", 100),
	("CLP", 1),
	("CNY", 100),
	("CZK", 100),
	("DKK", 100),
	("EUR", 100),
	("GBP", 100),
	("HKD", 100),
	("HUF", 100),
	("IDR", 100),
	("ILS", 100),
	("INR", 100),
	("ISK", 1),
	("JOD", 1000),
	("JPY", 1),
	("KRW", 1),
	("KWD", 1000),
	("MXN", 100),
	("MYR", 100),
	("NOK", 100),
	("NZD", 100),
	("OMR", 1000),
	("PHP", 100),
	("PLN", 100),
	("RON", 100),
	("RUB", 100),
	("SAR", 100),
	("SEK", 100),
	("SGD", 100),
	("THB", 100),
	("TND", 1000),
	("TRY", 100),
	("TWD", 100),
	("UAH", 100),
	("USD", 100),
	("VND", 1),
	("ZAR", 100),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
	namespace: String,
	mnemonic: String,
	/// Smallest tradable unit as 1/fraction of the whole, e.g. 100 for cents
	fraction: u32,
}

impl Commodity {
	pub fn mnemonic(&self) -> &str {
		&self.mnemonic
	}

	pub fn fraction(&self) -> u32 {
		self.fraction
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommodityTable {
	commodities: Vec<Commodity>,
}

impl Default for CommodityTable {
	fn default() -> Self {
		let commodities = ISO4217_FRACTIONS
			.iter()
			.map(|&(code, fraction)| Commodity {
				namespace: ISO4217.to_string(),
				mnemonic: code.to_string(),
				fraction,
			})
			.collect();

		Self { commodities }
	}
}

impl CommodityTable {
	pub fn lookup(&self, namespace: &str, mnemonic: &str) -> Option<&Commodity> {
		self.commodities
			.iter()
			.find(|c| c.namespace == namespace && c.mnemonic == mnemonic)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_lookup_known_currencies() {
		let table = CommodityTable::default();
		assert_eq!(table.lookup(ISO4217, "EUR").unwrap().fraction(), 100);
		assert_eq!(table.lookup(ISO4217, "JPY").unwrap().fraction(), 1);
		assert_eq!(table.lookup(ISO4217, "KWD").unwrap().fraction(), 1000);
	}

	#[test]
	fn test_lookup_is_namespaced_and_exact() {
		let table = CommodityTable::default();
		assert!(table.lookup("NASDAQ", "EUR").is_none());
		assert!(table.lookup(ISO4217, "eur").is_none());
		assert!(table.lookup(ISO4217, "XYZ").is_none());
	}
}
