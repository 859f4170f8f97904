use std::path::PathBuf;

/// Errors that can occur during scene conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The XML document could not be parsed.
    #[error("XML parse error for {path}: {message}")]
    Xml { path: PathBuf, message: String },

    /// A required child element is absent.
    #[error("Missing element <{element}> in <{parent}>")]
    MissingElement { element: String, parent: String },

    /// A required attribute is absent.
    #[error("Missing attribute '{attribute}' on <{element}>")]
    MissingAttribute { attribute: String, element: String },

    /// An attribute or element text is not a well-formed number.
    #[error("Invalid number '{value}' for '{attribute}' on <{element}>")]
    InvalidNumber {
        element: String,
        attribute: String,
        value: String,
    },

    /// A trile orientation outside the four discrete yaw steps.
    #[error("Invalid trile orientation {0} (expected 0..=3)")]
    InvalidOrientation(i32),

    /// Failed to read or decode a raster image.
    #[error("Image decode error for {path}: {message}")]
    ImageDecode { path: PathBuf, message: String },

    /// A referenced document does not exist.
    #[error("Missing document: {path}")]
    MissingDocument { path: PathBuf },

    /// Input validation failed (frame outside sheet, wrong root, etc.).
    #[error("Validation error: {0}")]
    Validation(String),
}
