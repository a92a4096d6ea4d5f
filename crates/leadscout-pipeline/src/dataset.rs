//! CSV dataset output.
//!
//! Rows are appended in batches; every batch is flushed and synced before
//! the caller writes a checkpoint that counts it.

use crate::atomic::{parent_dir, write_atomically};
use crate::error::Result;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use leadscout_core::Lead;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Columns present in every dataset.
pub const BASE_COLUMNS: [&str; 12] = [
    "niche",
    "city",
    "business_name",
    "formatted_address",
    "latitude",
    "longitude",
    "phone",
    "google_maps_url",
    "website_url",
    "rating",
    "ratings_count",
    "place_id",
];

/// Columns added when email extraction is enabled.
pub const EMAIL_COLUMNS: [&str; 2] = ["emails_found", "email_source_page"];

/// Separator between multiple emails in one cell.
pub const EMAIL_SEPARATOR: &str = "; ";

/// Header for a dataset with or without the email columns.
#[must_use]
pub fn header(with_emails: bool) -> Vec<&'static str> {
    let mut columns = BASE_COLUMNS.to_vec();
    if with_emails {
        columns.extend(EMAIL_COLUMNS);
    }
    columns
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn lead_record(lead: &Lead, with_emails: bool) -> Vec<String> {
    let mut record = vec![
        lead.niche.label().to_string(),
        lead.city.label().to_string(),
        lead.business_name.clone(),
        lead.formatted_address.clone(),
        opt(lead.latitude),
        opt(lead.longitude),
        opt(lead.phone.as_deref()),
        opt(lead.google_maps_url.as_deref()),
        opt(lead.website_url.as_deref()),
        opt(lead.rating),
        opt(lead.ratings_count),
        lead.place_id.clone(),
    ];
    if with_emails {
        record.push(lead.emails_found.join(EMAIL_SEPARATOR));
        record.push(opt(lead.email_source_page.as_deref()));
    }
    record
}

/// Append-only CSV writer for one run.
pub struct DatasetWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    with_emails: bool,
    rows: usize,
}

impl DatasetWriter {
    /// Start a new dataset, truncating any existing file.
    pub fn create(path: &Path, with_emails: bool) -> Result<Self> {
        fs::create_dir_all(parent_dir(path))?;
        let file = File::create(path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(header(with_emails))?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        tracing::info!(path = %path.display(), with_emails, "started new dataset");
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            with_emails,
            rows: 0,
        })
    }

    /// Reopen a dataset for a resumed run.
    ///
    /// The file is rewritten to hold only its first `keep_rows` rows (rows
    /// past that were written after the last checkpoint) under the current
    /// header. Columns missing from the old file are left empty. A missing
    /// file starts an empty dataset.
    pub fn resume(path: &Path, with_emails: bool, keep_rows: usize) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "dataset missing on resume, starting empty");
            return Self::create(path, with_emails);
        }

        let columns = header(with_emails);
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let old_header = reader.headers()?.clone();
        let mapping: Vec<Option<usize>> = columns
            .iter()
            .map(|c| old_header.iter().position(|h| h == *c))
            .collect();

        let mut kept: Vec<StringRecord> = Vec::with_capacity(keep_rows);
        let mut dropped = 0usize;
        for record in reader.records() {
            let record = record?;
            if kept.len() < keep_rows {
                kept.push(remap(&record, &mapping));
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            tracing::warn!(dropped, "trimmed dataset rows not covered by the checkpoint");
        }

        write_atomically(path, |file| {
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
            writer.write_record(&columns)?;
            for record in &kept {
                writer.write_record(record)?;
            }
            writer.flush()?;
            Ok(())
        })?;

        let file = OpenOptions::new().append(true).open(path)?;
        let writer = WriterBuilder::new().has_headers(false).from_writer(file);

        tracing::info!(path = %path.display(), rows = kept.len(), "resumed dataset");
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            with_emails,
            rows: kept.len(),
        })
    }

    /// Append leads, then flush and sync so the rows are durable.
    pub fn append(&mut self, leads: &[Lead]) -> Result<()> {
        if leads.is_empty() {
            return Ok(());
        }
        for lead in leads {
            self.writer.write_record(lead_record(lead, self.with_emails))?;
        }
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.rows += leads.len();
        tracing::debug!(path = %self.path.display(), appended = leads.len(), rows = self.rows, "dataset flushed");
        Ok(())
    }

    /// Data rows in the file.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }
}

fn remap(record: &StringRecord, mapping: &[Option<usize>]) -> StringRecord {
    mapping
        .iter()
        .map(|idx| idx.and_then(|i| record.get(i)).unwrap_or_default())
        .collect()
}

/// Write a copy of `source` holding only leads with both a website and at
/// least one email. Returns the number of rows written.
pub fn export_contactable(source: &Path, dest: &Path) -> Result<usize> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(source)?;
    let columns = reader.headers()?.clone();
    let website = columns.iter().position(|h| h == "website_url");
    let emails = columns.iter().position(|h| h == "emails_found");

    let mut rows = Vec::new();
    if let (Some(website), Some(emails)) = (website, emails) {
        for record in reader.records() {
            let record = record?;
            let has = |i: usize| record.get(i).is_some_and(|v| !v.trim().is_empty());
            if has(website) && has(emails) {
                rows.push(record);
            }
        }
    } else {
        tracing::warn!(path = %source.display(), "dataset has no email columns, nothing to export");
    }

    write_atomically(dest, |file| {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(&columns)?;
        for record in &rows {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    })?;

    tracing::info!(rows = rows.len(), path = %dest.display(), "exported contactable leads");
    Ok(rows.len())
}
