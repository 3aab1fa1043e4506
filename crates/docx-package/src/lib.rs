//! DOCX package reader/writer.
//!
//! Provides a paragraph-level abstraction over the zipped-XML package that
//! underlies `.docx` files: paragraph text and properties, style definitions
//! with based-on inheritance, section margins, and numbering presence. The
//! abstraction never assumes which tool produced the package.

pub mod document;
pub mod paragraph;
pub mod styles;
mod writer;

pub use document::DocxDocument;
pub use paragraph::{Paragraph, Spacing};
pub use styles::{FontInfo, StyleDefinition, StyleSheet};

use thiserror::Error;

/// Errors raised by package reading and writing.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a valid package archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed XML in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("missing package part: {0}")]
    MissingPart(String),
}
