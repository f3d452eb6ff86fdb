//! Lenient storage-format reader with namespace support.

#![allow(clippy::unused_self)] // Unit struct methods have &self for API consistency

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::entities::{decode_reference, prepare_markup};
use crate::error::MarkupError;
use crate::tree::{Document, Element, Node};

/// Storage-format XML namespaces.
const NAMESPACES: &[(&str, &str)] = &[
    ("ac", "http://www.atlassian.com/schema/confluence/4/ac/"),
    ("ri", "http://www.atlassian.com/schema/confluence/4/ri/"),
];

/// Synthetic wrapper element around the page body.
const ROOT_TAG: &str = "frag-root";

/// Elements that never have children, even without a self-closing slash.
const VOID_ELEMENTS: &[&str] = &[
    "br", "hr", "img", "col", "input", "meta", "link", "wbr", "source", "area", "embed",
];

/// Parse storage-format markup into a [`Document`].
///
/// Unbalanced and unknown tags never abort parsing: end tags close the nearest
/// open element with the same name, unmatched end tags are ignored, and
/// elements still open at end of input are closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupParser;

impl MarkupParser {
    /// Create a new parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse markup into a document tree.
    ///
    /// A reader error ends parsing early; it is logged and the tree built up
    /// to that point is returned.
    pub fn parse(&self, markup: &str) -> Document {
        let markup = prepare_markup(markup);

        let namespace_decls = NAMESPACES
            .iter()
            .map(|(prefix, uri)| format!(r#"xmlns:{prefix}="{uri}""#))
            .collect::<Vec<_>>()
            .join(" ");
        let wrapped = format!("<{ROOT_TAG} {namespace_decls}>{markup}</{ROOT_TAG}>");

        let mut reader = Reader::from_str(&wrapped);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut builder = TreeBuilder::default();
        if let Err(err) = self.read_events(&mut reader, &mut builder) {
            tracing::warn!(error = %err, "Malformed markup, keeping partially parsed tree");
        }
        builder.finish()
    }

    fn read_events<R: BufRead>(
        &self,
        reader: &mut Reader<R>,
        builder: &mut TreeBuilder,
    ) -> Result<(), MarkupError> {
        let mut buf = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|source| MarkupError::Xml {
                    position: u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX),
                    source,
                })?;

            match event {
                Event::Start(e) => {
                    let element = self.decode_element(reader, &e);
                    if element.name == ROOT_TAG {
                        // wrapper
                    } else if VOID_ELEMENTS.contains(&element.name.as_str()) {
                        builder.append(Node::Element(element));
                    } else {
                        builder.open(element);
                    }
                }
                Event::Empty(e) => {
                    let element = self.decode_element(reader, &e);
                    builder.append(Node::Element(element));
                }
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e)?;
                    builder.text(&text);
                }
                Event::GeneralRef(e) => {
                    let reference = reader.decoder().decode(&e)?;
                    builder.text(&decode_reference(&reference));
                }
                Event::CData(e) => {
                    builder.text(&String::from_utf8_lossy(&e));
                }
                Event::End(e) => {
                    let name = self.decode_name(reader, e.name().as_ref());
                    if name != ROOT_TAG {
                        builder.close(&name);
                    }
                }
                Event::Eof => return Ok(()),
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
            buf.clear();
        }
    }

    fn decode_element<R: BufRead>(&self, reader: &Reader<R>, e: &BytesStart) -> Element {
        let mut element = Element::new(self.decode_name(reader, e.name().as_ref()));
        element.attrs = self.decode_attrs(reader, e);
        element
    }

    fn decode_name<R: BufRead>(&self, reader: &Reader<R>, name: &[u8]) -> String {
        let name = reader.decoder().decode(name).map_or_else(
            |_| String::from_utf8_lossy(name).into_owned(),
            std::borrow::Cow::into_owned,
        );
        name.to_ascii_lowercase()
    }

    fn decode_attrs<R: BufRead>(
        &self,
        reader: &Reader<R>,
        e: &BytesStart,
    ) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        for attr in e.html_attributes().flatten() {
            let key = reader.decoder().decode(attr.key.as_ref()).map_or_else(
                |_| String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                std::borrow::Cow::into_owned,
            );

            if key.starts_with("xmlns") {
                continue;
            }

            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                std::borrow::Cow::into_owned,
            );

            attrs.insert(key, value);
        }
        attrs
    }
}

/// Stack of open elements; closed elements are appended to their parent.
#[derive(Debug, Default)]
struct TreeBuilder {
    roots: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn open(&mut self, element: Element) {
        self.open.push(element);
    }

    fn append(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let siblings = match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        if let Some(Node::Text(last)) = siblings.last_mut() {
            last.push_str(text);
        } else {
            siblings.push(Node::Text(text.to_owned()));
        }
    }

    fn close(&mut self, name: &str) {
        let Some(position) = self.open.iter().rposition(|element| element.name == name) else {
            tracing::debug!(tag = name, "Ignoring unmatched end tag");
            return;
        };
        while self.open.len() > position {
            if let Some(element) = self.open.pop() {
                self.append(Node::Element(element));
            }
        }
    }

    fn finish(mut self) -> Document {
        while let Some(element) = self.open.pop() {
            self.append(Node::Element(element));
        }
        Document::new(self.roots)
    }
}
