use super::csv_parser::parse_row;
use super::header_mapper::{ColumnMap, NameSource};
use shared_types::{CandidateContact, ContactStatus};
use std::collections::HashMap;

/// Turns data lines into typed candidates using a fixed column layout
pub struct RowNormalizer<'a> {
    columns: ColumnMap,
    delimiter: char,
    tag_index: &'a HashMap<String, i64>,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(columns: ColumnMap, delimiter: char, tag_index: &'a HashMap<String, i64>) -> Self {
        Self {
            columns,
            delimiter,
            tag_index,
        }
    }

    /// Returns `None` for rows without an email.
    pub fn normalize(&self, line: &str) -> Option<CandidateContact> {
        let fields = parse_row(line, self.delimiter, self.columns.width);

        let email = cell(&fields, Some(self.columns.email));
        if email.is_empty() {
            return None;
        }

        let mut contact = CandidateContact::new(email);

        let (first_name, last_name) = self.names(&fields);
        contact.first_name = first_name;
        contact.last_name = last_name;

        let status = cell(&fields, self.columns.status);
        if !status.is_empty() {
            contact.status = ContactStatus::from_import_value(status);
        }

        contact.tag_names = split_tags(cell(&fields, self.columns.tags));
        contact.tag_ids = contact
            .tag_names
            .iter()
            .filter_map(|name| self.tag_index.get(&name.to_lowercase()).copied())
            .collect();

        Some(contact)
    }

    fn names(&self, fields: &[String]) -> (String, String) {
        match self.columns.name_source() {
            NameSource::Split { first, last } => (
                cell(fields, Some(first)).to_string(),
                cell(fields, Some(last)).to_string(),
            ),
            NameSource::FullName(index) => split_full_name(cell(fields, Some(index))),
            NameSource::Partial { first, last } => {
                (cell(fields, first).to_string(), cell(fields, last).to_string())
            }
        }
    }
}

fn cell(fields: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|i| fields.get(i))
        .map(|s| s.trim())
        .unwrap_or("")
}

/// First whitespace-separated token is the first name, the rest the last name.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Comma separated tag names, trimmed, empties dropped, order kept.
pub fn split_tags(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(cells: &[&str]) -> ColumnMap {
        let headers: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        ColumnMap::from_headers(&headers).unwrap()
    }

    #[test]
    fn test_normalize_full_row() {
        let tag_index = HashMap::from([("lead".to_string(), 7)]);
        let normalizer = RowNormalizer::new(
            columns(&["email", "first_name", "last_name", "status", "tags"]),
            ',',
            &tag_index,
        );

        let contact = normalizer
            .normalize(r#"A@X.com,Ann,One,Subscribed,"VIP, lead, ,VIP""#)
            .unwrap();

        assert_eq!(contact.email, "A@X.com");
        assert_eq!(contact.email_key(), "a@x.com");
        assert_eq!(contact.first_name, "Ann");
        assert_eq!(contact.last_name, "One");
        assert_eq!(contact.status, ContactStatus::Active);
        assert_eq!(contact.tag_names, vec!["VIP", "lead", "VIP"]);
        assert_eq!(contact.tag_ids.iter().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_empty_email_is_skipped() {
        let tag_index = HashMap::new();
        let normalizer = RowNormalizer::new(columns(&["name", "email"]), ',', &tag_index);

        assert!(normalizer.normalize("Ann One,   ").is_none());
        assert!(normalizer.normalize("Ann One").is_none());
    }

    #[test]
    fn test_full_name_split() {
        let tag_index = HashMap::new();
        let normalizer = RowNormalizer::new(columns(&["email", "display name"]), ',', &tag_index);

        let contact = normalizer.normalize("a@x.com,  Mary   Ann  van Dyke ").unwrap();
        assert_eq!(contact.first_name, "Mary");
        assert_eq!(contact.last_name, "Ann van Dyke");

        let contact = normalizer.normalize("b@x.com,Cher").unwrap();
        assert_eq!(contact.first_name, "Cher");
        assert_eq!(contact.last_name, "");
    }

    #[test]
    fn test_defaults_without_optional_columns() {
        let tag_index = HashMap::new();
        let normalizer = RowNormalizer::new(columns(&["email"]), ',', &tag_index);

        let contact = normalizer.normalize("a@x.com").unwrap();
        assert_eq!(contact.first_name, "");
        assert_eq!(contact.last_name, "");
        assert_eq!(contact.status, ContactStatus::Pending);
        assert!(contact.tag_names.is_empty());
        assert!(contact.tag_ids.is_empty());
    }

    #[test]
    fn test_empty_status_defaults_to_pending() {
        let tag_index = HashMap::new();
        let normalizer = RowNormalizer::new(columns(&["email", "status"]), ';', &tag_index);

        let contact = normalizer.normalize("a@x.com;").unwrap();
        assert_eq!(contact.status, ContactStatus::Pending);

        let contact = normalizer.normalize("a@x.com;unsubscribed").unwrap();
        assert_eq!(contact.status, ContactStatus::Unsubscribed);
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags(" a , b,,c "), vec!["a", "b", "c"]);
        assert!(split_tags("").is_empty());
    }
}
