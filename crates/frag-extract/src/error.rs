//! Error types for markup reading.
//!
//! These never escape the public pipelines: the parser logs them and keeps the
//! tree it has built so far.

/// Error while reading storage-format markup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MarkupError {
    /// XML reader error.
    #[error("XML read error at byte {position}")]
    Xml {
        /// Byte offset reported by the reader.
        position: u64,
        /// Underlying reader error.
        #[source]
        source: quick_xml::Error,
    },

    /// Encoding error while decoding names or text.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}
