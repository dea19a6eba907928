use shared_types::ImportError;

const EMAIL_HEADERS: &[&str] = &[
    "email",
    "e-mail",
    "email address",
    "email_address",
    "e-mail address",
    "mail",
];

const FIRST_NAME_HEADERS: &[&str] = &[
    "first name",
    "first_name",
    "firstname",
    "given name",
    "given_name",
];

const LAST_NAME_HEADERS: &[&str] = &[
    "last name",
    "last_name",
    "lastname",
    "surname",
    "family name",
    "family_name",
];

const FULL_NAME_HEADERS: &[&str] = &[
    "name",
    "full name",
    "full_name",
    "fullname",
    "username",
    "user name",
    "user_name",
    "display name",
    "display_name",
];

const STATUS_HEADERS: &[&str] = &[
    "status",
    "email status",
    "email_status",
    "subscriber status",
    "subscriber_status",
    "subscription status",
    "subscription_status",
    "contact status",
    "contact_status",
];

const TAG_HEADERS: &[&str] = &["tags", "tag", "labels", "groups"];

/// Where each logical column sits in the uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub width: usize,
    pub email: usize,
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub full_name: Option<usize>,
    pub status: Option<usize>,
    pub tags: Option<usize>,
}

/// How first and last names are derived for each row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    Split { first: usize, last: usize },
    FullName(usize),
    Partial {
        first: Option<usize>,
        last: Option<usize>,
    },
}

impl ColumnMap {
    pub fn from_headers(headers: &[String]) -> Result<Self, ImportError> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

        let email = find_column(&normalized, EMAIL_HEADERS).ok_or(ImportError::MissingEmailColumn)?;

        Ok(Self {
            width: normalized.len(),
            email,
            first_name: find_column(&normalized, FIRST_NAME_HEADERS),
            last_name: find_column(&normalized, LAST_NAME_HEADERS),
            full_name: find_column(&normalized, FULL_NAME_HEADERS),
            status: find_column(&normalized, STATUS_HEADERS),
            tags: find_column(&normalized, TAG_HEADERS),
        })
    }

    pub fn name_source(&self) -> NameSource {
        match (self.first_name, self.last_name, self.full_name) {
            (Some(first), Some(last), _) => NameSource::Split { first, last },
            (_, _, Some(full)) => NameSource::FullName(full),
            (first, last, None) => NameSource::Partial { first, last },
        }
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().trim_matches('"').trim().to_lowercase()
}

fn find_column(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    headers.iter().position(|h| synonyms.contains(&h.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_maps_standard_columns() {
        let map = ColumnMap::from_headers(&headers(&[
            "email",
            "first_name",
            "last_name",
            "status",
            "tags",
        ]))
        .unwrap();

        assert_eq!(map.email, 0);
        assert_eq!(map.first_name, Some(1));
        assert_eq!(map.last_name, Some(2));
        assert_eq!(map.status, Some(3));
        assert_eq!(map.tags, Some(4));
        assert_eq!(map.width, 5);
        assert_eq!(map.name_source(), NameSource::Split { first: 1, last: 2 });
    }

    #[test]
    fn test_subscriber_status_is_a_status_column() {
        let map = ColumnMap::from_headers(&headers(&["Email Address", "Subscriber Status"])).unwrap();
        assert_eq!(map.email, 0);
        assert_eq!(map.status, Some(1));
    }

    #[test]
    fn test_quoted_and_padded_headers() {
        let map = ColumnMap::from_headers(&headers(&["\"Name\"", " \"E-Mail\" "])).unwrap();
        assert_eq!(map.email, 1);
        assert_eq!(map.name_source(), NameSource::FullName(0));
    }

    #[test]
    fn test_missing_email_column() {
        let err = ColumnMap::from_headers(&headers(&["name", "status"])).unwrap_err();
        assert!(matches!(err, ImportError::MissingEmailColumn));
        assert_eq!(err.to_string(), "CSV must contain an \"email\" column");
    }

    #[test]
    fn test_first_match_wins() {
        let map = ColumnMap::from_headers(&headers(&["mail", "email"])).unwrap();
        assert_eq!(map.email, 0);
    }

    #[test]
    fn test_partial_name_columns() {
        let map = ColumnMap::from_headers(&headers(&["email", "firstname"])).unwrap();
        assert_eq!(
            map.name_source(),
            NameSource::Partial {
                first: Some(1),
                last: None
            }
        );
    }
}
