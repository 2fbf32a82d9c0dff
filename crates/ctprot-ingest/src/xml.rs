//! Minimal XML element tree over `quick-xml`.
//!
//! Protocol definition files are small (tens of kilobytes), so the whole
//! document is materialized and queried by tag name rather than streamed.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{IngestError, Result};

/// One XML element with its attributes, children, and direct text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Descendants with the given tag, in document order (self excluded).
    pub fn descendants_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.descendants_named(name, out);
        }
    }

    pub fn find_descendants(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.descendants_named(name, &mut out);
        out
    }

    /// Trimmed text of the first descendant with the given tag.
    pub fn descendant_text(&self, name: &str) -> Option<&str> {
        self.find_descendants(name)
            .first()
            .map(|element| element.text.trim())
    }
}

fn element_from_start(start: &BytesStart) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| IngestError::XmlSyntax(e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| IngestError::XmlSyntax(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

/// Parse a document into its root element.
pub fn parse(input: &str) -> Result<Element> {
    let mut reader = Reader::from_str(input);
    // Text is trimmed once assembled (`descendant_text`), not per fragment:
    // entity references split text into fragments and per-fragment trimming
    // would eat the spaces around them.
    reader.config_mut().trim_text(false);

    // The stack bottom is a synthetic holder for top-level elements.
    let mut stack = vec![Element::default()];

    loop {
        match reader
            .read_event()
            .map_err(|e| IngestError::XmlSyntax(e.to_string()))?
        {
            Event::Start(start) => stack.push(element_from_start(&start)?),
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                stack
                    .last_mut()
                    .ok_or_else(|| IngestError::XmlSyntax("unbalanced document".into()))?
                    .children
                    .push(element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| IngestError::XmlSyntax("unbalanced close tag".into()))?;
                stack
                    .last_mut()
                    .ok_or_else(|| IngestError::XmlSyntax("close tag without open".into()))?
                    .children
                    .push(element);
            }
            Event::Text(text) => {
                // Entity references arrive as separate `GeneralRef` events;
                // decode handles the document encoding.
                let decoded = text
                    .decode()
                    .map_err(|e| IngestError::XmlSyntax(e.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&decoded);
                }
            }
            Event::GeneralRef(reference) => {
                let resolved = match reference
                    .resolve_char_ref()
                    .map_err(|e| IngestError::XmlSyntax(e.to_string()))?
                {
                    Some(ch) => ch,
                    None => match reference.as_ref() {
                        b"amp" => '&',
                        b"lt" => '<',
                        b"gt" => '>',
                        b"apos" => '\'',
                        b"quot" => '"',
                        other => {
                            return Err(IngestError::XmlSyntax(format!(
                                "unknown entity `&{};`",
                                String::from_utf8_lossy(other)
                            )));
                        }
                    },
                };
                if let Some(top) = stack.last_mut() {
                    top.text.push(resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(IngestError::XmlSyntax("unclosed element".into()));
    }
    let holder = stack.remove(0);
    holder
        .children
        .into_iter()
        .next()
        .ok_or_else(|| IngestError::XmlSyntax("empty document".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_in_order() {
        let root = parse(
            r#"<Root>
                <Entry EntryNo="1"><Name>first</Name></Entry>
                <Entry EntryNo="2"><Name>second</Name></Entry>
            </Root>"#,
        )
        .unwrap();
        assert_eq!(root.name, "Root");
        let entries = root.find_descendants("Entry");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].attribute("EntryNo"), Some("1"));
        assert_eq!(entries[1].descendant_text("Name"), Some("second"));
    }

    #[test]
    fn descendant_text_reaches_deep_tags() {
        let root = parse("<A><B><C><Voltage> 120 </Voltage></C></B></A>").unwrap();
        assert_eq!(root.descendant_text("Voltage"), Some("120"));
        assert_eq!(root.descendant_text("Current"), None);
    }

    #[test]
    fn text_entities_are_unescaped() {
        let root = parse("<A><Name>Chest &amp; Abdomen</Name></A>").unwrap();
        assert_eq!(root.descendant_text("Name"), Some("Chest & Abdomen"));
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(parse("<A><B>").is_err());
        assert!(parse("").is_err());
    }
}
