pub mod contact_import;
pub mod import_manager;
