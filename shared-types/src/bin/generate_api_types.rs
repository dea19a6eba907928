use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Website types
    types.push(clean_type(Website::export_to_string()?));
    types.push(clean_type(CreateWebsiteRequest::export_to_string()?));
    types.push(clean_type(WebsitesResponse::export_to_string()?));

    // Contact types
    types.push(clean_type(ContactStatus::export_to_string()?));
    types.push(clean_type(Contact::export_to_string()?));
    types.push(clean_type(CreateContactRequest::export_to_string()?));
    types.push(clean_type(UpdateContactRequest::export_to_string()?));
    types.push(clean_type(ContactsResponse::export_to_string()?));

    // Tag types
    types.push(clean_type(Tag::export_to_string()?));
    types.push(clean_type(CreateTagRequest::export_to_string()?));
    types.push(clean_type(TagsResponse::export_to_string()?));

    // Import types
    types.push(clean_type(CandidateContact::export_to_string()?));
    types.push(clean_type(ImportPreview::export_to_string()?));
    types.push(clean_type(ImportRowError::export_to_string()?));
    types.push(clean_type(ImportResult::export_to_string()?));
    types.push(clean_type(TagAssignment::export_to_string()?));
    types.push(clean_type(TagFailureKind::export_to_string()?));
    types.push(clean_type(TagFailure::export_to_string()?));
    types.push(clean_type(ImportSummary::export_to_string()?));
    types.push(clean_type(ImportJobStatus::export_to_string()?));
    types.push(clean_type(ImportJob::export_to_string()?));
    types.push(clean_type(PreviewImportRequest::export_to_string()?));
    types.push(clean_type(PreviewImportResponse::export_to_string()?));
    types.push(clean_type(StartImportRequest::export_to_string()?));
    types.push(clean_type(StartImportResponse::export_to_string()?));

    let output_dir = Path::new("../dashboard/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Everything lands in one file, so cross-type imports are dropped
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
