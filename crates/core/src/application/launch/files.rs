// Uploaded-File Validation

use crate::domain::{ScriptDescriptor, UploadedFile};
use crate::error::{AppError, Result};

/// Validate the uploaded files for a launch request.
///
/// Runs to completion before any file is persisted, all-or-nothing:
/// - two files sharing a filename → DuplicateFileName
/// - a declared input-file option not covered by an uploaded filename →
///   MissingRequiredFile
pub fn validate_files(descriptor: &ScriptDescriptor, files: &[UploadedFile]) -> Result<()> {
    let mut seen: Vec<&str> = Vec::new();
    for file in files {
        if seen.contains(&file.filename.as_str()) {
            return Err(AppError::Validation(format!(
                "There are two files with the same name: {}",
                file.filename
            )));
        }
        seen.push(&file.filename);
    }

    for option in &descriptor.input_file_options {
        if !seen.contains(&option.as_str()) {
            return Err(AppError::Validation(format!(
                "Files given in properties aren't all present in the request: missing {}",
                option
            )));
        }
    }

    Ok(())
}
