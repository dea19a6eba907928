//! Newsletter contact import from CSV files.
//!
//! The pipeline is pure and synchronous: it reads the uploaded text, maps the
//! header onto known columns, builds typed [`CandidateContact`]s and partitions
//! them against the contacts a website already has. Persisting the result is
//! up to the caller.

mod csv_parser;
mod dedupe;
pub mod export;
mod header_mapper;
mod row_normalizer;

pub use csv_parser::{detect_delimiter, parse_line};
pub use dedupe::{dedupe, DedupeOutcome};
pub use export::{export_contacts, sample_csv};
pub use header_mapper::{ColumnMap, NameSource};
pub use row_normalizer::{split_full_name, split_tags, RowNormalizer};

use shared_types::{CandidateContact, Contact, ImportError, ImportPreview, Tag};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Lowercased tag name to id, for case-insensitive lookups.
pub fn tag_index(tags: &[Tag]) -> HashMap<String, i64> {
    tags.iter().map(|t| (t.name.to_lowercase(), t.id)).collect()
}

/// Lowercased emails of stored contacts.
pub fn email_set(contacts: &[Contact]) -> HashSet<String> {
    contacts.iter().map(|c| c.email.trim().to_lowercase()).collect()
}

/// Rejects anything that is not a `.csv` file before its content is read.
pub fn ensure_csv_filename(filename: &str) -> Result<(), ImportError> {
    let is_csv = Path::new(filename)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        Ok(())
    } else {
        Err(ImportError::UnsupportedFile(filename.to_string()))
    }
}

/// Parses file content into candidates, in file order, before deduplication.
///
/// Content with no lines, or only a header line, yields no candidates.
pub fn parse_contacts(content: &str, known_tags: &[Tag]) -> Result<Vec<CandidateContact>, ImportError> {
    let lines = csv_parser::split_lines(csv_parser::strip_bom(content));

    let Some((header_line, data_lines)) = lines.split_first() else {
        return Ok(Vec::new());
    };

    let delimiter = detect_delimiter(header_line);
    let headers = parse_line(header_line, delimiter);
    let columns = ColumnMap::from_headers(&headers)?;

    tracing::debug!(
        "Parsing {} data rows with delimiter {:?} and columns {:?}",
        data_lines.len(),
        delimiter,
        columns
    );

    let index = tag_index(known_tags);
    let normalizer = RowNormalizer::new(columns, delimiter, &index);

    Ok(data_lines
        .iter()
        .filter_map(|line| normalizer.normalize(line))
        .collect())
}

/// Reads an uploaded contact file for one website
pub struct ContactCsvImporter {
    known_tags: Vec<Tag>,
    existing_emails: HashSet<String>,
}

impl ContactCsvImporter {
    pub fn new(known_tags: Vec<Tag>, existing_contacts: &[Contact]) -> Self {
        Self {
            known_tags,
            existing_emails: email_set(existing_contacts),
        }
    }

    pub fn preview_file(&self, filename: &str, content: &str) -> Result<ImportPreview, ImportError> {
        ensure_csv_filename(filename)?;
        self.preview(content)
    }

    pub fn preview(&self, content: &str) -> Result<ImportPreview, ImportError> {
        let rows = parse_contacts(content, &self.known_tags)?;
        let outcome = dedupe(rows, &self.existing_emails);

        Ok(ImportPreview {
            contacts: outcome.contacts,
            duplicates: outcome.duplicates,
            existing: outcome.existing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ContactStatus;

    const SCENARIO: &str = "email,first_name,last_name,status,tags\n\
                            a@x.com,A,One,active,\"VIP, Lead\"\n\
                            a@x.com,Dup,Row,pending,\n\
                            b@x.com,B,Two,,Lead\n";

    fn contact(id: i64, email: &str) -> Contact {
        Contact {
            id,
            website_id: 1,
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            status: ContactStatus::Pending,
            tags: vec![],
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_scenario_against_empty_website() {
        let importer = ContactCsvImporter::new(vec![], &[]);
        let preview = importer.preview_file("contacts.csv", SCENARIO).unwrap();

        assert_eq!(preview.contacts.len(), 2);
        assert_eq!(preview.contacts[0].email, "a@x.com");
        assert_eq!(preview.contacts[0].first_name, "A");
        assert_eq!(preview.contacts[0].status, ContactStatus::Active);
        assert_eq!(preview.contacts[0].tag_names, vec!["VIP", "Lead"]);
        assert_eq!(preview.contacts[1].email, "b@x.com");
        assert_eq!(preview.contacts[1].status, ContactStatus::Pending);
        assert_eq!(preview.contacts[1].tag_names, vec!["Lead"]);
        assert_eq!(preview.duplicates, vec!["a@x.com"]);
        assert!(preview.existing.is_empty());
    }

    #[test]
    fn test_reimport_is_all_existing() {
        let stored = vec![contact(1, "A@x.com"), contact(2, "b@x.com")];
        let importer = ContactCsvImporter::new(vec![], &stored);
        let preview = importer.preview(SCENARIO).unwrap();

        assert!(preview.contacts.is_empty());
        assert_eq!(preview.existing, vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_semicolon_file_with_bom() {
        let content = "\u{feff}E-Mail;Name;Subscriber Status\r\nann@x.com;Ann Lee;yes\r\n";
        let rows = parse_contacts(content, &[]).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].first_name, "Ann");
        assert_eq!(rows[0].last_name, "Lee");
        assert_eq!(rows[0].status, ContactStatus::Active);
    }

    #[test]
    fn test_empty_and_header_only_files() {
        assert!(parse_contacts("", &[]).unwrap().is_empty());
        assert!(parse_contacts("   \n", &[]).unwrap().is_empty());
        assert!(parse_contacts("email,name\n", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_header_only_without_email_column_fails() {
        let err = parse_contacts("name,status\nAnn,active\n", &[]).unwrap_err();
        assert!(matches!(err, ImportError::MissingEmailColumn));
    }

    #[test]
    fn test_rows_without_email_produce_no_candidates() {
        let content = "email,name\n,Ann\n  ,Bob\nc@x.com,Cid\n";
        let rows = parse_contacts(content, &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows.len() <= 3);
    }

    #[test]
    fn test_rejects_non_csv_files() {
        let importer = ContactCsvImporter::new(vec![], &[]);
        let err = importer.preview_file("contacts.xlsx", SCENARIO).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFile(_)));

        assert!(ensure_csv_filename("CONTACTS.CSV").is_ok());
        assert!(ensure_csv_filename("csv").is_err());
    }

    #[test]
    fn test_known_tags_resolve_case_insensitively() {
        let tags = vec![Tag {
            id: 4,
            website_id: 1,
            name: "Lead".to_string(),
            color: "#6b7280".to_string(),
            is_system: false,
            created_at: 0,
        }];
        let rows = parse_contacts("email,tags\na@x.com,\"LEAD, New\"\n", &tags).unwrap();

        assert_eq!(rows[0].tag_names, vec!["LEAD", "New"]);
        assert!(rows[0].tag_ids.contains(&4));
        assert_eq!(rows[0].tag_ids.len(), 1);
    }
}
