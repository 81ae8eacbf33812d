// Files from the command line as upload batches

use std::path::{Path, PathBuf};

use askgrid_io::{Upload, UploadError};

/// Sheet choice for `path` from `FILE=SHEET` arguments. FILE may be the
/// path as given or just its file name.
fn sheet_for<'a>(path: &Path, sheets: &'a [String]) -> Option<&'a str> {
    let full = path.to_string_lossy();
    let name = path.file_name().map(|n| n.to_string_lossy());

    sheets.iter().find_map(|arg| {
        let (file, sheet) = arg.split_once('=')?;
        let matches = file == full || name.as_deref() == Some(file);
        matches.then_some(sheet)
    })
}

/// Read every file into an upload, in order. Stops at the first unreadable
/// file.
pub fn read_uploads(files: &[PathBuf], sheets: &[String]) -> Result<Vec<Upload>, UploadError> {
    files
        .iter()
        .map(|path| {
            let upload = Upload::from_path(path)?;
            Ok(match sheet_for(path, sheets) {
                Some(sheet) => upload.with_sheet(sheet),
                None => upload,
            })
        })
        .collect()
}
