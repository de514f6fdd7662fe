//! Element-level walking of the object graph XML.
//!
//! ```text
//! <object class="Page" package="...">
//!   <id name="id">42</id>
//!   <property name="title"><![CDATA[Home]]></property>
//!   <property name="space" class="Space" package="..."><id name="id">7</id></property>
//!   <collection name="labellings" class="java.util.Collection">
//!     <element class="Labelling" package="..."><id name="id">9</id></element>
//!   </collection>
//! </object>
//! ```

use std::io::{BufReader, Read};

use cxi_types::{EntityId, EntityKind, PropertyRecord, PropertyValue};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, trace};

use crate::error::{DecodeError, DecodeResult};
use crate::progress::CountingReader;
use crate::repair::repair;

const LIST_CLASSES: &[&str] = &["java.util.List", "java.util.Collection"];
const SET_CLASS: &str = "java.util.Set";

/// One `<object>` element before kind-specific handling.
#[derive(Debug)]
pub(crate) struct RawObject {
    pub class: String,
    pub id: Option<String>,
    pub properties: PropertyRecord,
}

/// Forward-only reader over `<object>` elements.
pub(crate) struct ObjectReader<R: Read> {
    reader: Reader<BufReader<CountingReader<R>>>,
    buf: Vec<u8>,
}

impl<R: Read> ObjectReader<R> {
    pub(crate) fn new(input: R) -> Self {
        Self {
            reader: Reader::from_reader(BufReader::new(CountingReader::new(input))),
            buf: Vec::new(),
        }
    }

    /// Bytes consumed from the underlying input.
    pub(crate) fn bytes_read(&self) -> u64 {
        self.reader.get_ref().get_ref().bytes_read()
    }

    /// The next object, or `None` at the end of the input.
    pub(crate) fn next_object(&mut self) -> DecodeResult<Option<RawObject>> {
        loop {
            match self.next_event()? {
                Event::Start(e) if e.name().as_ref() == b"object" => {
                    return self.read_object(&e, false).map(Some);
                }
                Event::Empty(e) if e.name().as_ref() == b"object" => {
                    return self.read_object(&e, true).map(Some);
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    fn next_event(&mut self) -> DecodeResult<Event<'static>> {
        self.buf.clear();
        Ok(self.reader.read_event_into(&mut self.buf)?.into_owned())
    }

    fn skip(&mut self, start: &BytesStart<'_>) -> DecodeResult<()> {
        self.buf.clear();
        self.reader.read_to_end_into(start.name(), &mut self.buf)?;
        Ok(())
    }

    fn read_object(&mut self, start: &BytesStart<'_>, empty: bool) -> DecodeResult<RawObject> {
        let class = attribute(start, "class")?.ok_or(DecodeError::MissingAttribute {
            element: "object",
            attribute: "class",
        })?;
        let mut object = RawObject {
            class,
            id: None,
            properties: PropertyRecord::new(),
        };
        if empty {
            return Ok(object);
        }

        loop {
            match self.next_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"id" => object.id = Some(self.read_text()?),
                    b"property" | b"collection" => {
                        let name = property_name(&e)?;
                        if let Some(value) = self.decode_property(&e, false)? {
                            object.properties.set(name, value);
                        }
                    }
                    _ => self.skip(&e)?,
                },
                Event::Empty(e) => {
                    if matches!(e.name().as_ref(), b"property" | b"collection") {
                        let name = property_name(&e)?;
                        if let Some(value) = self.decode_property(&e, true)? {
                            object.properties.set(name, value);
                        }
                    }
                }
                Event::End(_) => return Ok(object),
                Event::Eof => return Err(DecodeError::UnexpectedEof),
                _ => {}
            }
        }
    }

    /// Decode one property, collection or collection element.
    ///
    /// Returns `None` for values that are skipped: unsupported classes and
    /// references whose id does not parse.
    fn decode_property(
        &mut self,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> DecodeResult<Option<PropertyValue>> {
        let Some(class) = attribute(start, "class")? else {
            let text = if empty { String::new() } else { self.read_text()? };
            return Ok(Some(PropertyValue::Text(text)));
        };

        if LIST_CLASSES.contains(&class.as_str()) {
            return Ok(Some(PropertyValue::List(self.read_items(empty)?)));
        }
        if class == SET_CLASS {
            return Ok(Some(PropertyValue::set_from(self.read_items(empty)?)));
        }
        if EntityKind::is_reference_class(&class) {
            let id = if empty { None } else { self.read_reference_id()? };
            let Some(text) = id else {
                return Err(DecodeError::MissingId {
                    property: attribute(start, "name")?.unwrap_or_default(),
                    class,
                });
            };
            let kind = EntityKind::from_class(&class);
            return Ok(match EntityId::parse(kind.id_shape(), &text) {
                Ok(id) => Some(PropertyValue::Reference(id)),
                Err(e) => {
                    debug!(class = %class, text = %text, error = %e, "unreadable reference id");
                    None
                }
            });
        }

        trace!(class = %class, "skipping unsupported property");
        if !empty {
            self.skip(start)?;
        }
        Ok(None)
    }

    fn read_items(&mut self, empty: bool) -> DecodeResult<Vec<PropertyValue>> {
        let mut items = Vec::new();
        if empty {
            return Ok(items);
        }
        loop {
            match self.next_event()? {
                Event::Start(e) => items.extend(self.decode_property(&e, false)?),
                Event::Empty(e) => items.extend(self.decode_property(&e, true)?),
                Event::End(_) => return Ok(items),
                Event::Eof => return Err(DecodeError::UnexpectedEof),
                _ => {}
            }
        }
    }

    /// Text of the `<id>` child of a reference, if there is one.
    fn read_reference_id(&mut self) -> DecodeResult<Option<String>> {
        let mut id = None;
        loop {
            match self.next_event()? {
                Event::Start(e) if e.name().as_ref() == b"id" => id = Some(self.read_text()?),
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => return Ok(id),
                Event::Eof => return Err(DecodeError::UnexpectedEof),
                _ => {}
            }
        }
    }

    /// Repaired text content up to the end of the current element.
    fn read_text(&mut self) -> DecodeResult<String> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Text(e) => text.push_str(&e.unescape()?),
                Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => return Ok(repair(&text).into_owned()),
                Event::Eof => return Err(DecodeError::UnexpectedEof),
                _ => {}
            }
        }
    }
}

fn attribute(start: &BytesStart<'_>, name: &str) -> DecodeResult<Option<String>> {
    match start.try_get_attribute(name).map_err(quick_xml::Error::from)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn property_name(start: &BytesStart<'_>) -> DecodeResult<String> {
    attribute(start, "name")?.ok_or(DecodeError::MissingAttribute {
        element: "property",
        attribute: "name",
    })
}
