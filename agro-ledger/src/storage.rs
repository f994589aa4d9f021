//! Flat-file record storage
//!
//! Every persisted entity is one line of `|`-delimited fields. Sub-lists use
//! `,` inside a single field.
//!
//! # Files
//!
//! - `blockchain.dat` - the chain, one block per line
//! - `products.dat`, `suppliers.dat`, ... - one file per entity kind
//!
//! Loading is lenient: a malformed line is logged and skipped, the rest of the
//! file still loads.

use crate::error::{Error, Result};
use std::fmt::Display;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Field delimiter
pub const FIELD_DELIMITER: char = '|';

/// Sub-list delimiter
pub const LIST_DELIMITER: char = ',';

/// A value persisted as one delimited line
pub trait Record: Sized {
    /// Record kind used in diagnostics
    const KIND: &'static str;

    /// Minimum number of fields a valid line carries
    const MIN_FIELDS: usize;

    /// When set, the last field absorbs any remaining delimiters
    const MAX_FIELDS: Option<usize> = None;

    /// Encode as a single line (no trailing newline)
    fn to_line(&self) -> String;

    /// Decode from already split fields (at least `MIN_FIELDS` long)
    fn from_fields(fields: &[&str]) -> Result<Self>;

    /// Decode from a single line
    fn from_line(line: &str) -> Result<Self> {
        let fields = split_fields(line, Self::KIND, Self::MIN_FIELDS, Self::MAX_FIELDS)?;
        Self::from_fields(&fields)
    }
}

/// Split a line into fields, failing when fewer than `min_fields` are present
pub fn split_fields<'a>(
    line: &'a str,
    kind: &'static str,
    min_fields: usize,
    max_fields: Option<usize>,
) -> Result<Vec<&'a str>> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);

    let fields: Vec<&str> = match max_fields {
        Some(max) => line.splitn(max, FIELD_DELIMITER).collect(),
        None => line.split(FIELD_DELIMITER).collect(),
    };

    if fields.len() < min_fields {
        return Err(Error::malformed(
            kind,
            format!("expected at least {} fields, found {}", min_fields, fields.len()),
        ));
    }

    Ok(fields)
}

/// Parse one field, naming it in the error
pub fn parse_field<T>(kind: &'static str, name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::malformed(kind, format!("invalid {} '{}': {}", name, value, e)))
}

/// Parse a `,`-separated list field; empty entries are ignored
pub fn parse_list<T>(kind: &'static str, name: &str, value: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .split(LIST_DELIMITER)
        .filter(|item| !item.trim().is_empty())
        .map(|item| parse_field(kind, name, item))
        .collect()
}

/// Join values into a `,`-separated list field
pub fn join_list<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(&LIST_DELIMITER.to_string())
}

/// Outcome of loading one record file
#[derive(Debug)]
pub struct LoadReport<T> {
    /// Successfully decoded records, in file order
    pub records: Vec<T>,

    /// Number of lines skipped as malformed
    pub skipped: usize,
}

/// Load every record of a file, skipping malformed lines
pub fn load_records<T: Record>(path: impl AsRef<Path>) -> Result<LoadReport<T>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let mut records = Vec::new();
    let mut skipped = 0;

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match T::from_line(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    kind = T::KIND,
                    file = %path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping malformed record"
                );
            }
        }
    }

    tracing::debug!(
        kind = T::KIND,
        file = %path.display(),
        loaded = records.len(),
        skipped,
        "Records loaded"
    );

    Ok(LoadReport { records, skipped })
}

/// Write records to a file, one per line
///
/// The file is written next to its destination and renamed into place.
pub fn save_records<'a, T, I>(path: impl AsRef<Path>, records: I) -> Result<usize>
where
    T: Record + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let path = path.as_ref();
    let staging = path.with_extension("tmp");

    let mut count = 0;
    {
        let mut writer = BufWriter::new(fs::File::create(&staging)?);
        for record in records {
            writeln!(writer, "{}", record.to_line())?;
            count += 1;
        }
        writer.flush()?;
    }

    fs::rename(&staging, path)?;

    tracing::debug!(kind = T::KIND, file = %path.display(), count, "Records saved");

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        id: u32,
        tags: Vec<u32>,
    }

    impl Record for Pair {
        const KIND: &'static str = "pair";
        const MIN_FIELDS: usize = 2;

        fn to_line(&self) -> String {
            format!("{}|{}", self.id, join_list(&self.tags))
        }

        fn from_fields(fields: &[&str]) -> Result<Self> {
            Ok(Pair {
                id: parse_field(Self::KIND, "id", fields[0])?,
                tags: parse_list(Self::KIND, "tag", fields[1])?,
            })
        }
    }

    #[test]
    fn test_split_fields_minimum() {
        assert!(split_fields("a|b", "pair", 3, None).is_err());
        assert_eq!(split_fields("a|b|c|d", "pair", 3, None).unwrap().len(), 4);
        assert_eq!(split_fields("a|b|c|d", "pair", 3, Some(3)).unwrap()[2], "c|d");
    }

    #[test]
    fn test_parse_list_ignores_empty_entries() {
        let values: Vec<u32> = parse_list("pair", "tag", "1,,2,").unwrap();
        assert_eq!(values, vec![1, 2]);
        assert!(parse_list::<u32>("pair", "tag", "").unwrap().is_empty());
        assert!(parse_list::<u32>("pair", "tag", "1,x").is_err());
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.dat");
        fs::write(&path, "1|2,3\nbroken\n\n2|\n3|x\n").unwrap();

        let report: LoadReport<Pair> = load_records(&path).unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(
            report.records,
            vec![Pair { id: 1, tags: vec![2, 3] }, Pair { id: 2, tags: vec![] }]
        );
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.dat");
        let pairs = vec![Pair { id: 7, tags: vec![1, 1] }];

        assert_eq!(save_records(&path, &pairs).unwrap(), 1);
        assert!(!path.with_extension("tmp").exists());

        let report: LoadReport<Pair> = load_records(&path).unwrap();
        assert_eq!(report.records, pairs);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_records::<Pair>(dir.path().join("absent.dat"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
