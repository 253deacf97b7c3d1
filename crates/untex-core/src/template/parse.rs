//! XML template documents
//!
//! ```xml
//! <template>
//!   <document type="article" options="a4paper">
//!     <preamble>...</preamble>
//!     <prefix>...</prefix>
//!     <suffix>...</suffix>
//!   </document>
//!   <packages>
//!     <package name="geometry" options="margin=2cm"/>
//!   </packages>
//!   <assets>
//!     <asset path="logo.png">iVBORw0KGgo...</asset>
//!   </assets>
//! </template>
//! ```
//!
//! Text is read untrimmed so that indentation survives until the template is
//! resolved.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Asset, Package, Template};
use crate::error::TemplateError;

/// Element whose text content is being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Preamble,
    Prefix,
    Suffix,
    Asset,
}

impl TextField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"preamble" => Some(TextField::Preamble),
            b"prefix" => Some(TextField::Prefix),
            b"suffix" => Some(TextField::Suffix),
            b"asset" => Some(TextField::Asset),
            _ => None,
        }
    }
}

pub(super) fn parse_template(xml: &str) -> Result<Template, TemplateError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut template = Template::default();
    let mut seen_root = false;
    let mut seen_document = false;
    let mut field: Option<TextField> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"template" => seen_root = true,
                    b"document" => {
                        read_document(e, &mut template)?;
                        seen_document = true;
                    }
                    b"package" => {
                        template.add_package(read_package(e)?);
                    }
                    b"asset" => {
                        template.assets.push(read_asset(e)?);
                        field = Some(TextField::Asset);
                        text.clear();
                    }
                    other => {
                        if let Some(f) = TextField::from_name(other) {
                            field = Some(f);
                            text.clear();
                        }
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"template" => seen_root = true,
                    b"document" => {
                        read_document(e, &mut template)?;
                        seen_document = true;
                    }
                    b"package" => {
                        template.add_package(read_package(e)?);
                    }
                    b"asset" => template.assets.push(read_asset(e)?),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.local_name();
                if field.is_some() && TextField::from_name(name.as_ref()) == field {
                    let value = std::mem::take(&mut text);
                    match field.take() {
                        Some(TextField::Preamble) => template.document.preamble = value,
                        Some(TextField::Prefix) => template.document.prefix = value,
                        Some(TextField::Suffix) => template.document.suffix = value,
                        Some(TextField::Asset) => {
                            if let Some(asset) = template.assets.last_mut() {
                                asset.data = value;
                            }
                        }
                        None => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TemplateError::Xml(e)),
            _ => {}
        }
    }

    if !seen_root {
        return Err(TemplateError::Malformed(
            "missing <template> root element".to_string(),
        ));
    }
    if !seen_document || template.document.class.is_empty() {
        return Err(TemplateError::Malformed(
            "<document> element with a type attribute is required".to_string(),
        ));
    }

    Ok(template)
}

fn read_document(e: &BytesStart, template: &mut Template) -> Result<(), TemplateError> {
    template.document.class = attribute(e, b"type")?.unwrap_or_default();
    template.document.options = attribute(e, b"options")?.unwrap_or_default();
    Ok(())
}

fn read_package(e: &BytesStart) -> Result<Package, TemplateError> {
    let name = attribute(e, b"name")?
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| TemplateError::Malformed("<package> without a name".to_string()))?;
    let options = attribute(e, b"options")?.unwrap_or_default();
    Ok(Package::with_options(name, options))
}

fn read_asset(e: &BytesStart) -> Result<Asset, TemplateError> {
    let path = attribute(e, b"path")?
        .ok_or_else(|| TemplateError::Malformed("<asset> without a path".to_string()))?;
    Ok(Asset {
        path,
        data: String::new(),
    })
}

fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>, TemplateError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
