//! Document arithmetic shown on invoice, bill, quote and journal forms.
//!
//! The backend owns authoritative totals. These helpers reproduce what the
//! forms display and send, so a saved record carries the same `subTotal`,
//! `totalTax` and `total` the user saw.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One priced line on a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Quantity.
    pub qty: f64,
    /// Unit price.
    pub price: f64,
    /// Tax rate in percent.
    #[serde(default)]
    pub tax_rate: f64,
}

impl LineItem {
    /// `qty × price`.
    pub fn amount(&self) -> f64 {
        self.qty * self.price
    }

    /// Tax on the line amount.
    pub fn tax(&self) -> f64 {
        self.amount() * self.tax_rate / 100.0
    }
}

/// How line amounts relate to tax (`lineAmountType` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAmountType {
    /// Code 1.
    TaxExclusive,
    /// Code 2. The only type whose total includes the tax.
    TaxInclusive,
    /// Any other code.
    NoTax,
}

impl LineAmountType {
    /// Decode the wire code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::TaxExclusive,
            2 => Self::TaxInclusive,
            _ => Self::NoTax,
        }
    }

    /// Read `lineAmountType` from a record; absent or non-numeric values
    /// count as [`Self::NoTax`].
    pub fn from_record(record: &Value) -> Self {
        record
            .get("lineAmountType")
            .and_then(Value::as_i64)
            .map_or(Self::NoTax, Self::from_code)
    }
}

/// Totals of a priced document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocumentTotals {
    /// Sum of line amounts before tax.
    pub sub_total: f64,
    /// Sum of line taxes.
    pub total_tax: f64,
    /// Amount due.
    pub total: f64,
}

impl DocumentTotals {
    /// Compute totals for `items`.
    ///
    /// # Examples
    /// ```
    /// use ledger_client::domain::{DocumentTotals, LineAmountType, LineItem};
    ///
    /// let items = [LineItem { qty: 2.0, price: 50.0, tax_rate: 15.0 }];
    /// let totals = DocumentTotals::compute(&items, LineAmountType::TaxInclusive);
    /// assert_eq!(totals.sub_total, 100.0);
    /// assert_eq!(totals.total_tax, 15.0);
    /// assert_eq!(totals.total, 115.0);
    /// ```
    pub fn compute(items: &[LineItem], amount_type: LineAmountType) -> Self {
        let sub_total: f64 = items.iter().map(LineItem::amount).sum();
        let total_tax: f64 = items.iter().map(LineItem::tax).sum();
        let total = match amount_type {
            LineAmountType::TaxInclusive => sub_total + total_tax,
            LineAmountType::TaxExclusive | LineAmountType::NoTax => sub_total,
        };
        Self {
            sub_total,
            total_tax,
            total,
        }
    }

    /// Write `subTotal`, `totalTax` and `total` onto a record object.
    /// Non-object records are left untouched.
    pub fn apply_to(&self, record: &mut Value) {
        if let Value::Object(fields) = record {
            insert_amount(fields, "subTotal", self.sub_total);
            insert_amount(fields, "totalTax", self.total_tax);
            insert_amount(fields, "total", self.total);
        }
    }
}

fn insert_amount(fields: &mut Map<String, Value>, key: &str, amount: f64) {
    let value = serde_json::Number::from_f64(amount).map_or(Value::Null, Value::Number);
    fields.insert(key.to_owned(), value);
}

/// One journal posting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JournalLine {
    /// Debit amount.
    #[serde(default)]
    pub debit: f64,
    /// Credit amount.
    #[serde(default)]
    pub credit: f64,
}

/// Debit and credit sums of a journal or trial balance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JournalTotals {
    /// Sum of debits.
    pub debit: f64,
    /// Sum of credits.
    pub credit: f64,
}

impl JournalTotals {
    /// Sum the lines.
    pub fn compute(lines: &[JournalLine]) -> Self {
        lines.iter().fold(Self::default(), |acc, line| Self {
            debit: acc.debit + line.debit,
            credit: acc.credit + line.credit,
        })
    }

    /// Whether debits equal credits to the cent.
    pub fn is_balanced(&self) -> bool {
        to_cents(self.debit) == to_cents(self.credit)
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Two decimals with thousands separators; `0.00` for zero or non-finite
/// input.
pub fn format_amount(amount: f64) -> String {
    format_fixed(amount, 2, true)
}

/// Four decimals without separators, as used for exchange rates.
pub fn format_rate(amount: f64) -> String {
    format_fixed(amount, 4, false)
}

fn format_fixed(amount: f64, decimals: usize, group: bool) -> String {
    if amount == 0.0 || !amount.is_finite() {
        return "0.00".to_owned();
    }
    let fixed = format!("{amount:.decimals$}");
    if !group {
        return fixed;
    }
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    //! Arithmetic and formatting coverage.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn items() -> Vec<LineItem> {
        vec![
            LineItem {
                qty: 3.0,
                price: 10.0,
                tax_rate: 15.0,
            },
            LineItem {
                qty: 1.0,
                price: 70.0,
                tax_rate: 0.0,
            },
        ]
    }

    #[rstest]
    #[case(LineAmountType::TaxExclusive, 100.0)]
    #[case(LineAmountType::TaxInclusive, 104.5)]
    #[case(LineAmountType::NoTax, 100.0)]
    fn total_adds_tax_only_for_inclusive(#[case] amount_type: LineAmountType, #[case] total: f64) {
        let totals = DocumentTotals::compute(&items(), amount_type);
        assert!((totals.sub_total - 100.0).abs() < f64::EPSILON);
        assert!((totals.total_tax - 4.5).abs() < f64::EPSILON);
        assert!((totals.total - total).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(json!({"lineAmountType": 2}), LineAmountType::TaxInclusive)]
    #[case(json!({"lineAmountType": 1}), LineAmountType::TaxExclusive)]
    #[case(json!({"lineAmountType": 3}), LineAmountType::NoTax)]
    #[case(json!({}), LineAmountType::NoTax)]
    fn reads_amount_type_from_records(#[case] record: Value, #[case] expected: LineAmountType) {
        assert_eq!(LineAmountType::from_record(&record), expected);
    }

    #[test]
    fn apply_writes_wire_fields() {
        let mut record = json!({"id": "INV-1", "lineAmountType": 2});
        DocumentTotals::compute(&items(), LineAmountType::TaxInclusive).apply_to(&mut record);
        assert_eq!(record["subTotal"], json!(100.0));
        assert_eq!(record["totalTax"], json!(4.5));
        assert_eq!(record["total"], json!(104.5));
    }

    #[test]
    fn line_items_deserialise_from_wire_names() {
        let item: LineItem =
            serde_json::from_value(json!({"qty": 2, "price": 5.5, "taxRate": 10}))
                .expect("line item");
        assert!((item.tax() - 1.1).abs() < 1e-9);
    }

    #[rstest]
    #[case(&[(10_000.0, 0.0), (5_000.0, 0.0), (0.0, 3_000.0), (0.0, 12_000.0)], true)]
    #[case(&[(0.1, 0.0), (0.2, 0.0), (0.0, 0.3)], true)]
    #[case(&[(100.0, 0.0), (0.0, 99.99)], false)]
    fn journal_balance_compares_cents(#[case] lines: &[(f64, f64)], #[case] balanced: bool) {
        let lines: Vec<JournalLine> = lines
            .iter()
            .map(|&(debit, credit)| JournalLine { debit, credit })
            .collect();
        assert_eq!(JournalTotals::compute(&lines).is_balanced(), balanced);
    }

    #[rstest]
    #[case(0.0, "0.00")]
    #[case(f64::NAN, "0.00")]
    #[case(5.0, "5.00")]
    #[case(1234.5, "1,234.50")]
    #[case(1_234_567.891, "1,234,567.89")]
    #[case(-98_765.4, "-98,765.40")]
    #[case(100.0, "100.00")]
    fn formats_amounts(#[case] amount: f64, #[case] expected: &str) {
        assert_eq!(format_amount(amount), expected);
    }

    #[test]
    fn formats_rates_to_four_places() {
        assert_eq!(format_rate(1.5), "1.5000");
        assert_eq!(format_rate(0.0), "0.00");
    }
}
