// Uploaded File Model

/// A file part supplied with a launch request.
///
/// Held in memory only until it is streamed into the process workspace.
/// Filenames within one request must be unique; the launch path enforces
/// this before anything touches disk.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}
