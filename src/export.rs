//! CSV export of the cached catalog.

use crate::core::MovieRecord;

const HEADER: &str = "imdbID,title,year,genre,director,actors,plot,runtime,rating";

fn csv_escape(s: &str) -> String {
    if s.contains('"') || s.contains(',') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render records as CSV, one row per record in the given order
pub fn records_to_csv(records: &[MovieRecord]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            csv_escape(&record.external_id),
            csv_escape(&record.title),
            optional(record.year),
            csv_escape(&record.genres.join(", ")),
            csv_escape(record.director.as_deref().unwrap_or("")),
            csv_escape(&record.actors.join(", ")),
            csv_escape(record.plot.as_deref().unwrap_or("")),
            optional(record.runtime_minutes),
            optional(record.rating),
        ));
    }
    out
}
