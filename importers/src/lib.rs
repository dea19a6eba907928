//! Importers Crate
//!
//! This crate turns files uploaded through the dashboard into typed records
//! that the API can persist. It is designed to stay free of any database or
//! HTTP concerns so that it can be reused and tested in isolation.
//!
//! # Architecture
//!
//! - **Types**: Contact, tag and import types are defined in the `shared-types` crate
//! - **Implementations**: File parsing and export live in this crate
//!
//! # Available Importers
//!
//! - `ContactCsvImporter`: Reads newsletter contacts from CSV files
//!
//! # Example
//!
//! ```rust,ignore
//! use importers::ContactCsvImporter;
//!
//! let importer = ContactCsvImporter::new(tags, &contacts);
//! let preview = importer.preview_file("contacts.csv", &content)?;
//! println!("{}", preview.message());
//! ```

pub mod contact_csv;

// Re-export commonly used types
pub use contact_csv::{export_contacts, sample_csv, ContactCsvImporter};
