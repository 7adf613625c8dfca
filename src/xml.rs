//! XML rendition of an annotated document.
//!
//! Writes the processed text with every accepted annotation as an inline
//! element named after its type:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <document source="story.txt"><text><Location id="0" majorType="gazetteer">Paris</Location> is nice.</text></document>
//! ```
//!
//! Offsets are processed-text offsets, so no repositioning is involved.

use crate::document::Document;
use crate::markup::char_boundaries;
use crate::sorted_list::SortedAnnotationList;
use anyhow::Result;
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use std::io::Cursor;
use tracing::debug;

/// Serialize `doc.content` with the accepted annotations inlined
pub fn to_xml(doc: &Document, accepted: &SortedAnnotationList<'_>) -> Result<String> {
    let text = doc.content.as_str();
    let boundaries = char_boundaries(text);
    let char_len = boundaries.len() - 1;

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let source = doc.locator.to_string();
    let mut document = BytesStart::new("document");
    document.push_attribute(("source", source.as_str()));
    writer.write_event(Event::Start(document))?;
    writer.write_event(Event::Start(BytesStart::new("text")))?;

    let mut cursor = 0;
    for annotation in accepted.iter() {
        if annotation.start > annotation.end || annotation.end > char_len || annotation.start < cursor {
            debug!(
                "Leaving annotation {} [{}, {}) out of XML for {}",
                annotation.id, annotation.start, annotation.end, doc.locator
            );
            continue;
        }
        let start = boundaries[annotation.start];
        let end = boundaries[annotation.end];
        write_text(&mut writer, &text[boundaries[cursor]..start])?;

        let name = element_name(&annotation.kind);
        let id = annotation.id.to_string();
        let mut element = BytesStart::new(name.as_str());
        element.push_attribute(("id", id.as_str()));
        for (feature, value) in &annotation.features {
            let feature = element_name(feature);
            if feature != "id" {
                element.push_attribute((feature.as_str(), value.as_str()));
            }
        }

        if start == end {
            writer.write_event(Event::Empty(element))?;
        } else {
            writer.write_event(Event::Start(element))?;
            write_text(&mut writer, &text[start..end])?;
            writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        }
        cursor = annotation.end;
    }
    write_text(&mut writer, &text[boundaries[cursor]..])?;

    writer.write_event(Event::End(BytesEnd::new("text")))?;
    writer.write_event(Event::End(BytesEnd::new("document")))?;

    let result = writer.into_inner().into_inner();
    Ok(String::from_utf8(result)?)
}

fn write_text<W: std::io::Write>(writer: &mut Writer<W>, text: &str) -> Result<()> {
    if !text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    Ok(())
}

/// Make a type label usable as an XML name
fn element_name(label: &str) -> String {
    let mut name: String = label
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    if !name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}
