// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV import rows.
//!
//! Rows have no header and at least five fields in the order
//! `secret, meta, type, url, user`; extra fields are ignored. Each row is
//! stored under `lowercase(meta)` with spaces replaced by underscores.

use std::io::Read;
use std::path::Path;

use passdb_core::{Credential, PassdbError};
use tracing::debug;

const MIN_FIELDS: usize = 5;

/// One parsed CSV row and the name it will be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based line the row started on.
    pub line: u64,
    pub key: String,
    pub credential: Credential,
}

/// Name a row with the given meta field is stored under.
pub fn import_key(meta: &str) -> String {
    meta.to_lowercase().replace(' ', "_")
}

/// Parse every row of a CSV file.
pub fn read_rows_from_path(path: &Path) -> Result<Vec<ImportRow>, PassdbError> {
    let file = std::fs::File::open(path).map_err(|e| PassdbError::io(path, e))?;
    read_rows(std::io::BufReader::new(file))
}

/// Parse every row from `reader`. Any malformed row fails the whole import
/// before anything is written.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ImportRow>, PassdbError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| PassdbError::Import {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() < MIN_FIELDS {
            return Err(PassdbError::Import {
                line,
                message: format!(
                    "expected at least {MIN_FIELDS} fields, found {}",
                    record.len()
                ),
            });
        }

        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        let credential = Credential {
            pass: field(0),
            meta: field(1),
            kind: field(2),
            url: field(3),
            user: field(4),
        };
        let key = import_key(&credential.meta);
        debug!(line, key = %key, "parsed import row");
        rows.push(ImportRow {
            line,
            key,
            credential,
        });
    }
    Ok(rows)
}
