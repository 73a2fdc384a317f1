//! Debug-quality table formatting.
//!
//! No alignment, no width logic; a tab-separated header row followed by one
//! line per record with the degree in the last column. Meant for test
//! failure output and ad-hoc inspection.

use std::fmt::Write as _;

use crate::records::Table;

pub fn ugly_print(table: &Table) -> String {
    let mut buf = table
        .schema()
        .iter()
        .map(|(name, _)| name.to_string())
        .collect::<Vec<_>>()
        .join("\t");
    buf.push_str("\trank");

    for record in table.iter() {
        buf.push('\n');
        for value in record.values() {
            // Writing into a String cannot fail.
            let _ = write!(buf, "{value}\t");
        }
        let _ = write!(buf, "{}", record.degree());
    }

    buf
}
