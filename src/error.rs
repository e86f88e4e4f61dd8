use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModzipError {
    #[error("{kind}: {message}")]
    Container { kind: String, message: String },
    #[error("no info.json under vehicles/ or levels/")]
    NoMetadata,
    #[error("insufficient metadata: {0}")]
    InsufficientMetadata(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("config invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("invalid field operation: {0}")]
    InvalidFieldOp(String),
}

impl ModzipError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Container { .. } => "E_CONTAINER",
            Self::NoMetadata => "E_NO_METADATA",
            Self::InsufficientMetadata(_) => "E_INSUFFICIENT_METADATA",
            Self::Validation(_) => "E_VALIDATION",
            Self::InvalidConfig(_) => "E_CONFIG",
            Self::InvalidFieldOp(_) => "E_FIELD_OP",
        }
    }

    /// Short form used in CSV error columns: `BadZipFile` for format
    /// errors, otherwise the rendered message.
    pub fn cell_text(&self) -> String {
        match self {
            Self::Container { kind, .. } if kind == "BadZipFile" => kind.clone(),
            other => other.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for ModzipError {
    fn from(err: zip::result::ZipError) -> Self {
        use zip::result::ZipError;
        let kind = match &err {
            ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => "BadZipFile",
            ZipError::Io(_) => "IoError",
            ZipError::FileNotFound => "FileNotFound",
            _ => "ZipError",
        };
        Self::Container {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ModzipError {
    fn from(err: std::io::Error) -> Self {
        Self::Container {
            kind: "IoError".to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ModzipError;

    #[test]
    fn bad_zip_renders_short_cell_text() {
        let err = ModzipError::Container {
            kind: "BadZipFile".to_string(),
            message: "invalid Zip archive: Could not find EOCD".to_string(),
        };
        assert_eq!(err.cell_text(), "BadZipFile");
        assert_eq!(err.code(), "E_CONTAINER");
    }

    #[test]
    fn io_error_keeps_message() {
        let err = ModzipError::from(std::io::Error::other("disk gone"));
        assert_eq!(err.cell_text(), "IoError: disk gone");
    }
}
