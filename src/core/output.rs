use crate::domain::ports::{OutputFormat, Storage, TransformResult};
use crate::utils::error::{ExportError, Result};
use serde::Serialize;

/// Writes the rendered document in the requested format.
pub async fn write_result<S: Storage>(
    storage: &S,
    format: OutputFormat,
    result: TransformResult,
) -> Result<String> {
    let (document, format) = match (format, result.csv_output) {
        (OutputFormat::Csv, Some(csv)) => (csv, OutputFormat::Csv),
        (OutputFormat::Csv, None) => {
            tracing::warn!("{} has no tabular form, writing JSON instead", result.name);
            (result.json_output, OutputFormat::Json)
        }
        (OutputFormat::Json, _) => (result.json_output, OutputFormat::Json),
    };

    let file_name = format!("{}.{}", result.name, format.extension());
    tracing::debug!("Writing {} ({} bytes)", file_name, document.len());
    storage.write_file(&file_name, document.as_bytes()).await
}

/// Renders rows as CSV with a header taken from the row's field names.
pub fn to_csv<R: Serialize>(rows: impl IntoIterator<Item = R>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
