//! JSON-lines corpus loading
//!
//! One document object per line; each object needs a string `id`. Blank
//! lines are skipped.

use crate::{Document, Error, Result};
use std::fs;
use std::path::Path;

pub fn load_documents(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let documents = parse_documents(&content)?;
    tracing::info!(
        path = %path.display(),
        documents = documents.len(),
        "Loaded event corpus"
    );
    Ok(documents)
}

pub fn parse_documents(content: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let document: Document =
            serde_json::from_str(line).map_err(|e| Error::InvalidDocument {
                line: i + 1,
                message: e.to_string(),
            })?;
        documents.push(document);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_blank_lines() {
        let docs = parse_documents("{\"id\":\"a\",\"year\":1990}\n\n{\"id\":\"b\"}\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].id, "b");
    }

    #[test]
    fn reports_bad_line_number() {
        let err = parse_documents("{\"id\":\"a\"}\n{\"year\":1990}\n").unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { line: 2, .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"id\":\"e1\",\"location\":[\"Paris\"]}}").unwrap();
        let docs = load_documents(file.path()).unwrap();
        assert_eq!(docs[0].values("location"), vec!["Paris"]);
    }
}
