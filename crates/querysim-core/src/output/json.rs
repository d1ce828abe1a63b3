use std::io::Write;

use crate::error::{QuerySimError, Result};
use crate::generate::engine::DatasetRecord;

/// Write records as JSON Lines: one compact object per line, fields in the
/// same order as the CSV columns.
///
/// Streams record by record, so memory stays flat regardless of dataset size.
pub fn write_jsonl<W: Write>(writer: &mut W, records: &[DatasetRecord]) -> Result<()> {
    for (i, record) in records.iter().enumerate() {
        serde_json::to_writer(&mut *writer, record).map_err(|e| QuerySimError::Output {
            message: format!("serializing record {}", i + 1),
            source: e.into(),
        })?;
        writer.write_all(b"\n").map_err(|e| QuerySimError::Output {
            message: format!("writing record {}", i + 1),
            source: e,
        })?;
    }

    writer.flush().map_err(|e| QuerySimError::Output {
        message: "flushing JSONL output".to_string(),
        source: e,
    })?;
    Ok(())
}

/// Read records back from JSON Lines text. Blank lines are skipped.
pub fn read_jsonl(text: &str) -> Result<Vec<DatasetRecord>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                QuerySimError::Other(format!("invalid JSONL record on line {}: {}", i + 1, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::engine::WorkloadGenerator;

    #[test]
    fn test_one_object_per_line() {
        let records = WorkloadGenerator::with_defaults()
            .generate(25, Some(3), None)
            .unwrap();
        let mut buf = Vec::new();
        write_jsonl(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 25);
        for line in text.lines() {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(v.as_object().unwrap().len(), 18);
        }
        assert_eq!(read_jsonl(&text).unwrap(), records);
    }

    #[test]
    fn test_read_reports_line_number() {
        let err = read_jsonl("\n{not json}\n").unwrap_err();
        assert!(format!("{}", err).contains("line 2"));
    }
}
