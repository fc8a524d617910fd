use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::ReportFormat;
use crate::transcribe::BatchReport;

/// Column order of the aggregated CSV report.
const CSV_HEADER: &str = "title,url,duration,transcript,filename,processed_at";

/// Write the aggregate files the chosen format asks for and return their
/// paths. Per-item `.txt` files are the pipeline's job; this only covers the
/// aggregates, so `text` writes nothing here.
pub fn write_report(
    report: &BatchReport,
    output_dir: &Path,
    format: ReportFormat,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    match format {
        ReportFormat::Text => {}
        ReportFormat::Csv => written.push(write_csv(report, output_dir)?),
        ReportFormat::Json => written.push(write_json(report, output_dir)?),
        ReportFormat::All => {
            written.push(write_csv(report, output_dir)?);
            written.push(write_json(report, output_dir)?);
        }
    }

    Ok(written)
}

/// Write the aggregated CSV table. An empty report still yields a valid file
/// containing just the header row.
pub fn write_csv(report: &BatchReport, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("report.csv");
    fs_err::write(&path, format_as_csv(report))?;
    Ok(path)
}

/// Write the aggregated JSON document: an array with one record per item.
/// An empty report yields an empty array.
pub fn write_json(report: &BatchReport, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("report.json");
    fs_err::write(&path, format_as_json(report)?)?;
    Ok(path)
}

pub fn format_as_csv(report: &BatchReport) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for item in &report.items {
        let duration = item
            .duration
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let fields = [
            item.title.as_str(),
            item.url.as_str(),
            duration.as_str(),
            item.transcript.as_str(),
            item.filename.as_str(),
            &item.processed_at.to_rfc3339(),
        ];

        let row: Vec<String> = fields.iter().map(|f| escape_csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

pub fn format_as_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(&report.items).context("Failed to serialize report")
}

/// Quote a field if it contains a delimiter, quote or line break, doubling
/// embedded quotes per RFC 4180. Transcripts routinely contain all three.
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::ItemResult;
    use chrono::Utc;

    fn sample_item(title: &str, url: &str, transcript: &str) -> ItemResult {
        ItemResult {
            url: url.to_string(),
            title: title.to_string(),
            duration: Some(62.0),
            transcript: transcript.to_string(),
            filename: crate::utils::sanitize_filename(title, 100),
            text_path: PathBuf::from("downloads/x.txt"),
            processed_at: Utc::now(),
        }
    }

    /// Minimal RFC 4180 parser, enough to round-trip our own writer.
    fn parse_csv(text: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => in_quotes = false,
                    _ => field.push(c),
                }
            } else {
                match c {
                    '"' => in_quotes = true,
                    ',' => row.push(std::mem::take(&mut field)),
                    '\n' => {
                        row.push(std::mem::take(&mut field));
                        rows.push(std::mem::take(&mut row));
                    }
                    _ => field.push(c),
                }
            }
        }
        if !field.is_empty() || !row.is_empty() {
            row.push(field);
            rows.push(row);
        }
        rows
    }

    #[test]
    fn test_escape_csv_field() {
        assert_eq!(escape_csv_field("plain"), "plain");
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_empty_report_still_produces_valid_files() {
        let dir = tempfile::tempdir().unwrap();
        let report = BatchReport::default();

        let csv_path = write_csv(&report, dir.path()).unwrap();
        let json_path = write_json(&report, dir.path()).unwrap();

        let csv = std::fs::read_to_string(csv_path).unwrap();
        assert_eq!(csv, format!("{}\n", CSV_HEADER));

        let json = std::fs::read_to_string(json_path).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_csv_round_trip_preserves_fields() {
        let report = BatchReport {
            items: vec![
                sample_item(
                    "My Talk: Part 1!",
                    "https://youtu.be/abc123",
                    "Transcript with, commas\nand \"quotes\" and newlines",
                ),
                sample_item("Café 日本語", "https://youtu.be/def456", "plain text"),
            ],
        };

        let rows = parse_csv(&format_as_csv(&report));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], CSV_HEADER.split(',').collect::<Vec<_>>());

        for (row, item) in rows[1..].iter().zip(&report.items) {
            assert_eq!(row[0], item.title);
            assert_eq!(row[1], item.url);
            assert_eq!(row[2], "62");
            assert_eq!(row[3], item.transcript);
            assert_eq!(row[4], item.filename);
        }
    }

    #[test]
    fn test_csv_unknown_duration() {
        let mut item = sample_item("Title", "https://youtu.be/abc", "text");
        item.duration = None;
        let report = BatchReport { items: vec![item] };

        let rows = parse_csv(&format_as_csv(&report));
        assert_eq!(rows[1][2], "unknown");
    }

    #[test]
    fn test_json_round_trip_preserves_unicode() {
        let report = BatchReport {
            items: vec![sample_item(
                "Café 日本語",
                "https://youtu.be/def456",
                "añécdote — 字幕",
            )],
        };

        let json = format_as_json(&report).unwrap();
        // Unicode stays literal, not ASCII-escaped.
        assert!(json.contains("日本語"));

        let parsed: Vec<ItemResult> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, report.items[0].title);
        assert_eq!(parsed[0].transcript, report.items[0].transcript);
        assert_eq!(parsed[0].duration, report.items[0].duration);
        assert_eq!(parsed[0].filename, report.items[0].filename);
    }

    #[test]
    fn test_write_report_format_selection() {
        let dir = tempfile::tempdir().unwrap();
        let report = BatchReport::default();

        assert!(write_report(&report, dir.path(), ReportFormat::Text)
            .unwrap()
            .is_empty());
        assert_eq!(
            write_report(&report, dir.path(), ReportFormat::Csv).unwrap(),
            vec![dir.path().join("report.csv")]
        );
        assert_eq!(
            write_report(&report, dir.path(), ReportFormat::All)
                .unwrap()
                .len(),
            2
        );
    }
}
