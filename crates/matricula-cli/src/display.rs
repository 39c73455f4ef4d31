//! Terminal rendering of records and stored progress.
//!
//! Records and pages are numbered from 1 on screen; indices are 0-based
//! everywhere else.

use matricula_core::{DocumentProgress, FieldKey, PageCursor, ProgressStore, Record, RecordProgress};

// ── Record cards ──

/// Print a record as a card: the extracted fields, then one checkbox line
/// per reviewable field.
pub fn print_record_card(file_name: &str, index: usize, record: &Record, progress: &ProgressStore) {
    println!("=== Registro {} ===", index + 1);
    println!("  {:<14} {}", "tipo", record.kind);
    println!("  {:<14} {} {}", "valor", record.amount.value, record.amount.currency);
    println!("  {:<14} {}", "data", record.date);
    if !record.description.is_empty() {
        println!("  {:<14} {}", "objeto", record.description);
    }
    println!("  {:<14} {}%", "pct", record.pct);
    println!();

    for key in FieldKey::for_record(record) {
        let checked = progress.get_field(file_name, index, key);
        println!("  [{}] {:<20} {}", if checked { "x" } else { " " }, key.to_string(), field_label(record, key));
    }

    let tally = progress.tally(file_name, index, record);
    println!("  {}/{} confirmed", tally.confirmed, tally.total);
    println!();
}

fn field_label(record: &Record, key: FieldKey) -> String {
    match key {
        FieldKey::Tipo => "Tipo de registro correto?".to_string(),
        FieldKey::Valor => "Valor correto?".to_string(),
        FieldKey::DocAlienante(i) => record
            .grantors
            .get(i)
            .map(|p| format!("{} - {} (Alienante)", p.name, p.document))
            .unwrap_or_default(),
        FieldKey::DocAdquirente(i) => record
            .grantees
            .get(i)
            .map(|p| format!("{} - {} (Adquirente)", p.name, p.document))
            .unwrap_or_default(),
    }
}

/// Footer under a page of cards. Omitted for single-page documents.
pub fn print_page_footer(cursor: &PageCursor) {
    let pagination = cursor.pagination();
    if !pagination.needs_controls() {
        return;
    }
    let range = cursor.visible_range();
    println!(
        "Página {}/{} (registros {}-{} de {})",
        cursor.page() + 1,
        pagination.num_pages(),
        range.start + 1,
        range.end,
        pagination.total()
    );
}

// ── Stored progress ──

/// Print every stored document, whether or not it was uploaded this run.
pub fn print_progress(progress: &ProgressStore) {
    if progress.is_empty() {
        println!("No saved progress.");
        return;
    }
    for name in progress.document_names() {
        if let Some(doc) = progress.document(name) {
            print_document(name, doc);
        }
    }
}

/// Counts here are over stored flags, which may include positional keys for
/// parties a re-uploaded record no longer has. Record cards use
/// `ProgressStore::tally`, which counts only the live record's keys.
fn print_document(name: &str, doc: &DocumentProgress) {
    let status = if doc.is_finalized() { " (finalizado)" } else { "" };
    println!("Arquivo: {name}{status}");
    for (index, record) in doc.records() {
        let (confirmed, stored) = stored_flags(record);
        println!("  Registro {:<6} {}/{} stored flags", index + 1, confirmed, stored);
        for (key, value) in record.iter() {
            println!("    [{}] {}", if value { "x" } else { " " }, key);
        }
    }
    println!();
}

fn stored_flags(record: &RecordProgress) -> (usize, usize) {
    (record.iter().filter(|(_, v)| *v).count(), record.len())
}
