use crate::Result;
use crate::crawl::ServiceRecord;
use camino::Utf8Path;
use core::fmt::Write;
use ohno::IntoAppError;
use std::fs;

/// Render records as a pretty-printed JSON array.
pub fn generate_json<W: Write>(records: &[ServiceRecord], writer: &mut W) -> Result<()> {
    write!(writer, "{}", serde_json::to_string_pretty(records)?)?;
    Ok(())
}

/// Write records to `path` as UTF-8 JSON, creating parent directories as needed.
pub fn write_json(records: &[ServiceRecord], path: &Utf8Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create output directory '{parent}'"))?;
    }

    let mut json = String::new();
    generate_json(records, &mut json)?;
    fs::write(path, json).into_app_err_with(|| format!("unable to write dataset to '{path}'"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::{DocumentLink, EntityId};
    use camino::Utf8PathBuf;
    use serde_json::{Value, json};

    fn sample() -> Vec<ServiceRecord> {
        vec![
            ServiceRecord::new(
                EntityId::from(1),
                "Société Générale",
                "Grade C",
                vec![DocumentLink::new("Conditions", "https://example.fr/cgu").unwrap()],
            )
            .unwrap(),
            ServiceRecord::new(EntityId::from(2), "Other", "N/A", Vec::new()).unwrap(),
        ]
    }

    #[test]
    fn test_generate_json_is_indented_array() {
        let mut out = String::new();
        generate_json(&sample(), &mut out).unwrap();

        assert!(out.starts_with("[\n  {"));
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[1], json!({"id": 2, "name": "Other", "rating": "N/A", "documents": []}));
    }

    #[test]
    fn test_generate_json_keeps_non_ascii() {
        let mut out = String::new();
        generate_json(&sample(), &mut out).unwrap();
        assert!(out.contains("Société Générale"));
    }

    #[test]
    fn test_generate_json_empty() {
        let mut out = String::new();
        generate_json(&[], &mut out).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_write_json_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("data/TOSDR/out.json")).unwrap();

        write_json(&sample(), &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed[0]["name"], json!("Société Générale"));
    }
}
