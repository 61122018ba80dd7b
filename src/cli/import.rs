use super::ui;
use crate::core::{Importer, RecordStore};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Imports a JSON search-result export straight into the store.
pub async fn import_file(store: Arc<dyn RecordStore>, file: &Path, data_type: &str) -> Result<()> {
    if data_type.trim().is_empty() {
        anyhow::bail!("DataType is required!");
    }
    let content = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let spinner = ui::new_spinner(&format!("Importing {}", file.display()));
    let result = Importer::new(store).process_data(&content, data_type).await;
    spinner.finish_and_clear();

    let summary = result.with_context(|| format!("Failed to import {}", file.display()))?;
    println!(
        "{} {} records as {}",
        ui::style_text("Imported", ui::StyleType::Highlight),
        summary.records,
        ui::style_text(data_type, ui::StyleType::Label)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RecordFilter, Window};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_import_file_into_memory_store() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        std::fs::write(
            file.path(),
            r#"{"hits": {"hits": [
                {"_source": {"symbol": "AAPL", "currency": "USD"}},
                {"_source": {"symbol": "SAP", "currency": "EUR"}}
            ]}}"#,
        )?;
        let store = Arc::new(MemoryStore::new());

        import_file(store.clone(), file.path(), "Quotes").await?;

        let page = store
            .query(&RecordFilter::default(), None, Window { start: 0, end: 9 })
            .await?;
        assert_eq!(page.match_count, 2);
        assert!(page.rows.iter().all(|r| r.datatype == "Quotes"));
        Ok(())
    }

    #[tokio::test]
    async fn test_import_file_requires_data_type() {
        let store = Arc::new(MemoryStore::new());
        let err = import_file(store, Path::new("missing.json"), " ")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "DataType is required!");
    }

    #[tokio::test]
    async fn test_import_file_rejects_invalid_json() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        std::fs::write(file.path(), "not json")?;
        let store = Arc::new(MemoryStore::new());

        let err = import_file(store.clone(), file.path(), "Quotes")
            .await
            .unwrap_err();

        assert_eq!(err.root_cause().to_string(), "Invalid JSON file content!");
        assert!(store.is_empty().await);
        Ok(())
    }
}
