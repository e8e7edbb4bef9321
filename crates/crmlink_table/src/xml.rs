//! Markup table format.
//!
//! ```xml
//! <DataTable name="account">
//!     <row>
//!         <name>Contoso</name>
//!         <Full_x0020_Name>Jane Doe</Full_x0020_Name>
//!         <code type="string">00042</code>
//!     </row>
//! </DataTable>
//! ```

use crate::error::{TableError, TableResult};
use crate::format::TableFormat;
use crate::table::TabularData;
use crmlink_codec::{decode_name, encode_name, format_table_text, parse_text_value, Map, Value};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

const ROOT_ELEMENT: &str = "DataTable";
const ROW_ELEMENT: &str = "row";
const NAME_ATTRIBUTE: &str = "name";
const TYPE_ATTRIBUTE: &str = "type";
/// Type tags whose values are text by definition.
const TEXT_TYPES: [&str; 2] = ["string", "memo"];

/// One element per row, one child element per non-null field.
///
/// Field names go through the name codec. Field text is re-typed on load
/// (boolean, number, date, else text); values tagged `{type, value}` keep
/// their tag in a `type` attribute and their text exactly as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormat;

impl TableFormat for XmlFormat {
    fn extension(&self) -> &'static str {
        "xml"
    }

    fn serialize(&self, table: &TabularData) -> TableResult<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(TableError::xml)?;

        let mut root = BytesStart::new(ROOT_ELEMENT);
        if let Some(name) = table.name() {
            root.push_attribute((NAME_ATTRIBUTE, name));
        }
        writer
            .write_event(Event::Start(root))
            .map_err(TableError::xml)?;

        for row in table.rows() {
            write_row(&mut writer, row)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))
            .map_err(TableError::xml)?;
        Ok(writer.into_inner())
    }

    fn deserialize(&self, bytes: &[u8]) -> TableResult<TabularData> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();

        let mut table: Option<TabularData> = None;
        let mut depth = 0usize;
        let mut row: Option<Map> = None;
        let mut field: Option<PendingField> = None;

        loop {
            match reader.read_event_into(&mut buf).map_err(TableError::xml)? {
                Event::Start(e) => {
                    match depth {
                        0 => table = Some(start_table(&e)?),
                        1 => row = Some(Map::new()),
                        2 => field = Some(PendingField::from_element(&e)?),
                        _ => {}
                    }
                    depth += 1;
                }
                Event::Empty(e) => match depth {
                    0 => table = Some(start_table(&e)?),
                    1 => push_row(&mut table, Map::new()),
                    2 => {
                        let pending = PendingField::from_element(&e)?;
                        if let Some(row) = row.as_mut() {
                            pending.finish(row);
                        }
                    }
                    _ => {}
                },
                Event::Text(e) if depth == 3 => {
                    if let Some(pending) = field.as_mut() {
                        pending.text.push_str(&e.unescape().map_err(TableError::xml)?);
                    }
                }
                Event::CData(e) if depth == 3 => {
                    if let Some(pending) = field.as_mut() {
                        pending.text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    match depth {
                        2 => {
                            if let (Some(pending), Some(row)) = (field.take(), row.as_mut()) {
                                pending.finish(row);
                            }
                        }
                        1 => {
                            if let Some(row) = row.take() {
                                push_row(&mut table, row);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        table.ok_or_else(|| TableError::invalid_document("no root element"))
    }
}

fn write_row(writer: &mut Writer<Vec<u8>>, row: &Map) -> TableResult<()> {
    let fields: Vec<(&str, &Value)> = row
        .iter()
        .filter(|(key, value)| !value.is_null() && !key.is_empty())
        .collect();

    if fields.is_empty() {
        return writer
            .write_event(Event::Empty(BytesStart::new(ROW_ELEMENT)))
            .map_err(TableError::xml);
    }

    writer
        .write_event(Event::Start(BytesStart::new(ROW_ELEMENT)))
        .map_err(TableError::xml)?;
    for (key, value) in fields {
        let tag = encode_name(key);
        let mut element = BytesStart::new(tag.as_str());
        let text = match value.as_tagged() {
            Some((type_name, inner)) => {
                element.push_attribute((TYPE_ATTRIBUTE, type_name));
                format_table_text(inner)
            }
            None => format_table_text(value),
        }
        .unwrap_or_default();

        writer
            .write_event(Event::Start(element))
            .map_err(TableError::xml)?;
        writer
            .write_event(Event::Text(BytesText::new(&text)))
            .map_err(TableError::xml)?;
        writer
            .write_event(Event::End(BytesEnd::new(tag.as_str())))
            .map_err(TableError::xml)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(ROW_ELEMENT)))
        .map_err(TableError::xml)
}

fn start_table(root: &BytesStart<'_>) -> TableResult<TabularData> {
    let mut table = TabularData::new();
    table.set_name(attribute(root, NAME_ATTRIBUTE)?);
    debug!(name = ?table.name(), "reading markup table");
    Ok(table)
}

fn push_row(table: &mut Option<TabularData>, row: Map) {
    if let Some(table) = table.as_mut() {
        table.push(row);
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> TableResult<Option<String>> {
    match element.try_get_attribute(name).map_err(TableError::xml)? {
        Some(attr) => Ok(Some(
            attr.unescape_value().map_err(TableError::xml)?.into_owned(),
        )),
        None => Ok(None),
    }
}

/// A field element whose text is still being collected.
struct PendingField {
    name: String,
    type_name: Option<String>,
    text: String,
}

impl PendingField {
    fn from_element(element: &BytesStart<'_>) -> TableResult<Self> {
        let tag = std::str::from_utf8(element.name().as_ref())
            .map_err(TableError::xml)?
            .to_string();
        Ok(Self {
            name: decode_name(&tag),
            type_name: attribute(element, TYPE_ATTRIBUTE)?,
            text: String::new(),
        })
    }

    fn finish(self, row: &mut Map) {
        let parsed = parse_text_value(&self.text);
        let value = match self.type_name {
            Some(type_name) if is_text_type(&type_name) => Value::tagged(type_name, self.text),
            // Tagged text is only re-typed when that loses nothing, so
            // `00042` stays text.
            Some(type_name) => {
                let canonical = format_table_text(&parsed).is_some_and(|t| t == self.text);
                if canonical {
                    Value::tagged(type_name, parsed)
                } else {
                    Value::tagged(type_name, self.text)
                }
            }
            None => parsed,
        };
        row.insert(self.name, value);
    }
}

fn is_text_type(type_name: &str) -> bool {
    TEXT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(type_name))
}
