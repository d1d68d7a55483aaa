//! Copy hand-edited event document frontmatter back into the store.

use std::fs;
use std::path::{Path, PathBuf};

use super::SyncReport;
use crate::db::EventRepository;
use crate::markdown::{frontmatter, FrontmatterError};
use crate::models::CellValue;
use crate::render::event_doc::FRONTMATTER_FIELDS;
use crate::render::WriteOutcome;

/// Store columns set by the document's frontmatter, in mapping order.
pub fn pulled_columns(contents: &str) -> Result<Vec<(String, CellValue)>, FrontmatterError> {
    let (fm, _) = frontmatter::parse(contents)?;
    Ok(FRONTMATTER_FIELDS
        .iter()
        .filter_map(|(key, column)| {
            fm.get(key)
                .map(|value| (column.to_string(), CellValue::from_yaml(value)))
        })
        .collect())
}

/// Update stored events from `<events_dir>/<event_id>.md` frontmatter.
///
/// Rows are only ever updated; documents without a matching row are skipped.
pub async fn pull_frontmatter(
    repo: &EventRepository,
    events_dir: &Path,
) -> std::io::Result<SyncReport> {
    let mut paths: Vec<PathBuf> = fs::read_dir(events_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    let mut report = SyncReport::new();
    for path in paths {
        let Some(event_id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", path.display(), e);
                report.fail(event_id, e);
                continue;
            }
        };

        let values = match pulled_columns(&contents) {
            Ok(values) if values.is_empty() => {
                tracing::info!("Skipping {}: no mapped frontmatter fields", path.display());
                report.skip(event_id, "no mapped frontmatter fields");
                continue;
            }
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                report.skip(event_id, e);
                continue;
            }
        };

        match repo.exists(&event_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Skipping {}: no stored event '{}'", path.display(), event_id);
                report.skip(event_id, "no stored event with this id");
                continue;
            }
            Err(e) => {
                tracing::error!("Failed to look up '{}': {}", event_id, e);
                report.fail(event_id, e);
                continue;
            }
        }

        let columns: Vec<String> = values.iter().map(|(column, _)| column.clone()).collect();
        match repo.update_columns(&event_id, values).await {
            Ok(0) => {
                tracing::warn!("No changes made for '{}'", event_id);
                report.skip(event_id, "no rows changed");
            }
            Ok(_) => {
                tracing::info!("Updated '{}' with fields: {}", event_id, columns.join(", "));
                report.record(WriteOutcome::Updated);
            }
            Err(e) => {
                tracing::error!("Failed to update '{}': {}", event_id, e);
                report.fail(event_id, e);
            }
        }
    }

    Ok(report)
}
