//! Extraction pipelines.

use crate::color::{ApprovedGate, ColorGate, OpenGate};
use crate::history::HistoryRemover;
use crate::normalize::Normalizer;
use crate::parser::MarkupParser;
use crate::policy::ExtractionPolicy;
use crate::serializer::Serializer;

/// Turns a storage-format page body into normalized text under one policy.
///
/// Stateless between calls: the same input always gives the same output, and
/// one extractor can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    policy: ExtractionPolicy,
    parser: MarkupParser,
    history: HistoryRemover,
    normalizer: Normalizer,
}

impl Extractor {
    /// Create an extractor for a policy.
    #[must_use]
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self {
            policy,
            parser: MarkupParser::new(),
            history: HistoryRemover::new(),
            normalizer: Normalizer::new(policy.clean_brackets),
        }
    }

    /// The policy this extractor applies.
    #[must_use]
    pub fn policy(&self) -> &ExtractionPolicy {
        &self.policy
    }

    /// Extract text from a page body.
    ///
    /// Empty or whitespace-only input gives an empty string. Malformed markup
    /// is rendered from whatever could be parsed.
    #[must_use]
    pub fn extract(&self, markup: &str) -> String {
        if markup.trim().is_empty() {
            return String::new();
        }
        tracing::debug!(
            input_len = markup.len(),
            include_colored = self.policy.include_colored,
            "Extracting fragments"
        );

        let mut document = self.parser.parse(markup);
        self.history.remove(&mut document);

        let gate: &dyn ColorGate = if self.policy.include_colored {
            &OpenGate
        } else {
            &ApprovedGate
        };
        let rendered = Serializer::new(&self.policy, gate).render_document(&document);
        let output = self.normalizer.normalize(&rendered);

        tracing::debug!(output_len = output.len(), "Extracted fragments");
        output
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractionPolicy::default())
    }
}

/// Render every fragment of a page, colored ones included.
#[must_use]
pub fn render_all(markup: &str) -> String {
    Extractor::new(ExtractionPolicy::all()).extract(markup)
}

/// Render only the approved fragments of a page.
#[must_use]
pub fn render_approved(markup: &str) -> String {
    Extractor::new(ExtractionPolicy::approved()).extract(markup)
}
