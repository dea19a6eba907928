use shared_types::CandidateContact;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupeOutcome {
    pub contacts: Vec<CandidateContact>,
    /// Lowercased emails seen more than once in the file, first-seen order
    pub duplicates: Vec<String>,
    /// Lowercased emails the website already has, first-seen order
    pub existing: Vec<String>,
}

/// Partitions rows into importable, same-file duplicates and already stored.
///
/// `existing_emails` must hold lowercased addresses. The first occurrence of an
/// email in the file wins; later ones are reported as duplicates.
pub fn dedupe(rows: Vec<CandidateContact>, existing_emails: &HashSet<String>) -> DedupeOutcome {
    let mut accepted: HashSet<String> = HashSet::new();
    let mut duplicates_seen: HashSet<String> = HashSet::new();
    let mut existing_seen: HashSet<String> = HashSet::new();
    let mut outcome = DedupeOutcome::default();

    for row in rows {
        let key = row.email_key();

        if accepted.contains(&key) {
            if duplicates_seen.insert(key.clone()) {
                outcome.duplicates.push(key);
            }
        } else if existing_emails.contains(&key) {
            if existing_seen.insert(key.clone()) {
                outcome.existing.push(key);
            }
        } else {
            accepted.insert(key);
            outcome.contacts.push(row);
        }
    }

    outcome
}
