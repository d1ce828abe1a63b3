use std::io::Write;

use crate::error::{QuerySimError, Result};
use crate::features::FEATURE_COLUMNS;
use crate::generate::engine::DatasetRecord;

/// Header row: `sql,pattern,<14 features>,execution_time_ms,is_slow`.
pub fn csv_header() -> String {
    let mut cols = vec!["sql", "pattern"];
    cols.extend(FEATURE_COLUMNS);
    cols.extend(["execution_time_ms", "is_slow"]);
    cols.join(",")
}

/// Write records as CSV, one row per record, streaming to `writer`.
/// Execution time is always printed with two decimals.
pub fn write_csv<W: Write>(writer: &mut W, records: &[DatasetRecord]) -> Result<()> {
    writeln!(writer, "{}", csv_header()).map_err(|e| QuerySimError::Output {
        message: "writing CSV header".to_string(),
        source: e,
    })?;

    for (i, record) in records.iter().enumerate() {
        let mut fields = Vec::with_capacity(FEATURE_COLUMNS.len() + 4);
        fields.push(csv_escape(&record.sql));
        fields.push(record.pattern.to_string());
        fields.extend(record.features.to_array().iter().map(|v| v.to_string()));
        fields.push(format!("{:.2}", record.execution_time_ms));
        fields.push(record.is_slow.to_string());

        writeln!(writer, "{}", fields.join(",")).map_err(|e| QuerySimError::Output {
            message: format!("writing CSV row {}", i + 1),
            source: e,
        })?;
    }

    writer.flush().map_err(|e| QuerySimError::Output {
        message: "flushing CSV output".to_string(),
        source: e,
    })?;
    Ok(())
}

/// Escape a string for CSV: quote if it contains comma, quote, or newline.
fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
