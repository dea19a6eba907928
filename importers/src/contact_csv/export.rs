use csv::WriterBuilder;
use shared_types::{Contact, ImportError};

const EXPORT_HEADERS: [&str; 5] = ["email", "first_name", "last_name", "status", "tags"];

const SAMPLE_ROWS: [[&str; 5]; 3] = [
    ["jane@example.com", "Jane", "Doe", "active", "Customer, VIP"],
    ["john@example.com", "John", "Smith", "pending", "Lead"],
    ["max@example.com", "Max", "Mustermann", "unsubscribed", ""],
];

/// Writes contacts in the layout the importer reads back.
pub fn export_contacts(contacts: &[Contact]) -> Result<String, ImportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| ImportError::Export(e.to_string()))?;

    for contact in contacts {
        let tags = contact
            .tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        writer
            .write_record([
                contact.email.as_str(),
                contact.first_name.as_str(),
                contact.last_name.as_str(),
                contact.status.as_str(),
                tags.as_str(),
            ])
            .map_err(|e| ImportError::Export(e.to_string()))?;
    }

    into_string(writer)
}

/// Template offered for download next to the import dialog.
///
/// Status accepts `pending`, `active`, `confirmed` and `unsubscribed`, plus
/// common aliases such as `subscribed`, `yes` or `opted out`.
pub fn sample_csv() -> Result<String, ImportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| ImportError::Export(e.to_string()))?;
    for row in SAMPLE_ROWS {
        writer
            .write_record(row)
            .map_err(|e| ImportError::Export(e.to_string()))?;
    }

    into_string(writer)
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String, ImportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::Export(e.to_string()))
}
