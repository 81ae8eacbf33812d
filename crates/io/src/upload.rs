// Upload batches
//
// The file format is decided once, from the extension, when an upload is
// classified. Batches are fail-fast: the first bad file aborts the batch and
// no datasets are returned.

use std::path::Path;

use askgrid_engine::{Dataset, Table};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// Extension other than .csv / .xlsx
    #[error("Invalid file type: {name}. Please upload a valid CSV or Excel file.")]
    InvalidFileType { name: String },
    /// Parse failure, including an unknown sheet name
    #[error("Error uploading file {name}: {cause}")]
    Parse { name: String, cause: String },
    /// Could not read the file from disk
    #[error("Error uploading file {name}: {cause}")]
    Io { name: String, cause: String },
}

impl UploadError {
    /// Name of the file that aborted the batch
    pub fn file_name(&self) -> &str {
        match self {
            UploadError::InvalidFileType { name }
            | UploadError::Parse { name, .. }
            | UploadError::Io { name, .. } => name,
        }
    }
}

/// Format of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// `sheet: None` selects the first sheet
    Spreadsheet { sheet: Option<String> },
}

/// One named byte stream plus the user's sheet choice (spreadsheets only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
    pub sheet: Option<String>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes, sheet: None }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Read a file from disk; the upload is named after the file name.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path).map_err(|e| UploadError::Io {
            name: name.clone(),
            cause: e.to_string(),
        })?;
        Ok(Self::new(name, bytes))
    }

    /// Classify by name suffix (case-insensitive). A bare `.csv` counts.
    pub fn format(&self) -> Result<SourceFormat, UploadError> {
        let name = self.name.to_ascii_lowercase();

        if name.ends_with(".csv") {
            Ok(SourceFormat::Csv)
        } else if name.ends_with(".xlsx") {
            Ok(SourceFormat::Spreadsheet { sheet: self.sheet.clone() })
        } else {
            Err(UploadError::InvalidFileType { name: self.name.clone() })
        }
    }
}

/// Parse one upload into a dataset keyed by its file name.
pub fn ingest(upload: &Upload) -> Result<Dataset, UploadError> {
    let format = upload.format()?;
    let parsed: Result<Table, String> = match &format {
        SourceFormat::Csv => crate::csv::parse(&upload.bytes),
        SourceFormat::Spreadsheet { sheet } => crate::xlsx::parse(&upload.bytes, sheet.as_deref()),
    };

    let table = parsed.map_err(|cause| UploadError::Parse {
        name: upload.name.clone(),
        cause,
    })?;

    log::info!(
        "ingested {} ({:?}): {} rows x {} columns",
        upload.name,
        format,
        table.row_count(),
        table.col_count()
    );
    Ok(Dataset::new(upload.name.clone(), table))
}

/// Parse a batch in order. The first failure aborts the whole batch.
pub fn ingest_batch(uploads: &[Upload]) -> Result<Vec<Dataset>, UploadError> {
    uploads.iter().map(ingest).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSENGERS: &[u8] = b"Survived,Sex,Age\n0,male,22\n1,female,38\n";

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Upload::new("a.csv", vec![]).format(), Ok(SourceFormat::Csv));
        assert_eq!(Upload::new("A.CSV", vec![]).format(), Ok(SourceFormat::Csv));
        assert_eq!(Upload::new(".csv", vec![]).format(), Ok(SourceFormat::Csv));
        assert_eq!(
            Upload::new(".xlsx", vec![]).format(),
            Ok(SourceFormat::Spreadsheet { sheet: None })
        );
        assert_eq!(
            Upload::new("book.xlsx", vec![]).with_sheet("Q1").format(),
            Ok(SourceFormat::Spreadsheet { sheet: Some("Q1".into()) })
        );
        assert_eq!(
            Upload::new("book.xlsx", vec![]).format(),
            Ok(SourceFormat::Spreadsheet { sheet: None })
        );
    }

    #[test]
    fn test_txt_is_rejected() {
        let err = ingest(&Upload::new("data.txt", b"a,b\n1,2\n".to_vec())).unwrap_err();
        assert_eq!(err, UploadError::InvalidFileType { name: "data.txt".into() });
        assert_eq!(
            err.to_string(),
            "Invalid file type: data.txt. Please upload a valid CSV or Excel file."
        );
        assert!(Upload::new("noext", vec![]).format().is_err());
        assert!(Upload::new("old.xls", vec![]).format().is_err());
        assert!(Upload::new("report.csv.bak", vec![]).format().is_err());
    }

    #[test]
    fn test_valid_csv_yields_one_dataset() {
        let datasets = ingest_batch(&[Upload::new("passengers.csv", PASSENGERS.to_vec())]).unwrap();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].name(), "passengers.csv");
        assert_eq!(datasets[0].table().row_count(), 2);
    }

    #[test]
    fn test_batch_is_fail_fast() {
        let batch = vec![
            Upload::new("passengers.csv", PASSENGERS.to_vec()),
            Upload::new("notes.txt", b"hello".to_vec()),
            Upload::new("more.csv", PASSENGERS.to_vec()),
        ];
        let err = ingest_batch(&batch).unwrap_err();
        assert_eq!(err.file_name(), "notes.txt");
    }

    #[test]
    fn test_parse_failure_names_the_file() {
        let err = ingest(&Upload::new("broken.csv", b"a\n1,2\n".to_vec())).unwrap_err();
        assert!(matches!(err, UploadError::Parse { .. }));
        assert!(err.to_string().starts_with("Error uploading file broken.csv: "));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("passengers.csv");
        std::fs::write(&path, PASSENGERS).unwrap();

        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.name, "passengers.csv");
        assert!(ingest(&upload).is_ok());

        let missing = Upload::from_path(&dir.path().join("gone.csv")).unwrap_err();
        assert!(matches!(missing, UploadError::Io { .. }));
    }
}
