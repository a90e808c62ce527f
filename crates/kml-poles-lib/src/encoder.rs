//! Serialization of placemarks into a KML document

use crate::{Placemark, Result, utils};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Name given to generated documents unless the caller overrides it
pub const DEFAULT_DOCUMENT_NAME: &str = "Generated KML with Poles";

/// Options for the generated document
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodeOptions {
    /// `Document/name`; omitted when `None`
    pub document_name: Option<String>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            document_name: Some(DEFAULT_DOCUMENT_NAME.to_string()),
        }
    }
}

/// Write `placemarks` as a UTF-8 KML 2.2 document with two-space indentation
///
/// Each placemark becomes `Placemark/name` plus `Placemark/Point/coordinates`
/// holding `x,y,0`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn encode(placemarks: &[Placemark], options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("kml").with_attributes([("xmlns", utils::KML_NAMESPACE)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("Document")))?;

    if let Some(name) = &options.document_name {
        write_text_element(&mut writer, "name", name)?;
    }

    for placemark in placemarks {
        writer.write_event(Event::Start(BytesStart::new("Placemark")))?;
        write_text_element(&mut writer, "name", &placemark.name)?;
        writer.write_event(Event::Start(BytesStart::new("Point")))?;
        write_text_element(
            &mut writer,
            "coordinates",
            &utils::format_coordinate(placemark.position),
        )?;
        writer.write_event(Event::End(BytesEnd::new("Point")))?;
        writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Document")))?;
    writer.write_event(Event::End(BytesEnd::new("kml")))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    tracing::debug!(
        "Encoded {} placemarks into {} bytes",
        placemarks.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
