//! Fragment extraction from Confluence storage-format pages.
//!
//! A page body is turned into hybrid Markdown text in one of two views:
//!
//! - [`render_all`]: every fragment, colored drafts included;
//! - [`render_approved`]: only approved fragments. Text in a non-black color
//!   is a pending edit and is left out, together with links surrounded by
//!   pending text.
//!
//! Both views share one pipeline: [`MarkupParser`] builds a lenient tree,
//! [`HistoryRemover`] cuts change log sections, [`Serializer`] renders the
//! tree through a [`ColorGate`], and [`Normalizer`] cleans up the text.
//!
//! # Example
//!
//! ```
//! use frag_extract::{render_all, render_approved};
//!
//! let page = r#"<p>Готово <span style="color: red;">черновик</span></p>"#;
//! assert_eq!(render_all(page), "Готово черновик");
//! assert_eq!(render_approved(page), "Готово");
//! ```

mod color;
mod entities;
mod error;
mod extractor;
mod history;
mod links;
mod normalize;
mod parser;
mod policy;
mod serializer;
mod tree;

pub use color::{
    AncestorChain, ApprovedGate, ColorGate, ColorStatus, OpenGate, classify_own, is_black_color,
    is_pending_in_context,
};
pub use error::MarkupError;
pub use extractor::{Extractor, render_all, render_approved};
pub use history::{HistoryRemover, HistoryReport, is_history_text};
pub use links::keep_link;
pub use normalize::{Normalizer, normalize};
pub use parser::MarkupParser;
pub use policy::ExtractionPolicy;
pub use serializer::{Serializer, TABLE_LABEL};
pub use tree::{Document, Element, Node, TagKind};
