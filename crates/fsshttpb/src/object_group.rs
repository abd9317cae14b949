//! Object group data elements and the package that carries them.
//!
//! An object group pairs a list of object declarations with a list of object
//! data entries, matched by position. Each data element wraps one object
//! group, and a data element package carries any number of data elements.

use uuid::Uuid;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::binary::{
    CellId, decode_binary_item, decode_cell_id_array, decode_ex_guid_array, encode_binary_item,
    encode_cell_id_array, encode_ex_guid_array,
};
use crate::compact::{decode_compact_u64, encode_compact_u64};
use crate::cursor::ByteCursor;
use crate::error::ParseError;
use crate::exguid::ExGuid;
use crate::header::StreamObjectType;
use crate::stream::{next_is, read_compound, read_object, write_compound, write_object};

/// Data element type value for object groups.
pub const OBJECT_GROUP_DATA_ELEMENT_TYPE: u64 = 0x04;

/// Declaration of one object in an object group.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectGroupObjectDeclare {
    /// Identifier of the declared object.
    pub ex_guid: ExGuid,
    /// Partition the object belongs to.
    pub partition_id: u64,
    /// Size of the object's data in bytes.
    pub data_size: u64,
    /// Number of objects the object references.
    pub object_references_count: u64,
    /// Number of cells the object references.
    pub cell_references_count: u64,
}

impl ObjectGroupObjectDeclare {
    /// Appends the stream object encoding to `out`.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        let mut items = Vec::with_capacity(32);
        self.ex_guid.encode_to(&mut items);
        encode_compact_u64(self.partition_id, &mut items);
        encode_compact_u64(self.data_size, &mut items);
        encode_compact_u64(self.object_references_count, &mut items);
        encode_compact_u64(self.cell_references_count, &mut items);
        write_object(out, StreamObjectType::ObjectGroupObjectDeclare, &items);
    }

    /// Decodes one declaration.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        read_object(cursor, StreamObjectType::ObjectGroupObjectDeclare, |items| {
            Ok(Self {
                ex_guid: ExGuid::decode(items)?,
                partition_id: decode_compact_u64(items)?,
                data_size: decode_compact_u64(items)?,
                object_references_count: decode_compact_u64(items)?,
                cell_references_count: decode_compact_u64(items)?,
            })
        })
    }
}

/// Data of one object in an object group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectGroupObjectData {
    /// Objects this object references, in order.
    pub object_ex_guids: Vec<ExGuid>,
    /// Cells this object references.
    pub cell_ids: Vec<CellId>,
    /// Serialized object bytes.
    pub data: Vec<u8>,
}

impl ObjectGroupObjectData {
    /// Appends the stream object encoding to `out`.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        let mut items = Vec::with_capacity(self.data.len() + 32);
        encode_ex_guid_array(&self.object_ex_guids, &mut items);
        encode_cell_id_array(&self.cell_ids, &mut items);
        encode_binary_item(&self.data, &mut items);
        write_object(out, StreamObjectType::ObjectGroupObjectData, &items);
    }

    /// Decodes one data entry.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        read_object(cursor, StreamObjectType::ObjectGroupObjectData, |items| {
            Ok(Self {
                object_ex_guids: decode_ex_guid_array(items)?,
                cell_ids: decode_cell_id_array(items)?,
                data: decode_binary_item(items)?.to_vec(),
            })
        })
    }
}

/// Serial number of a data element: nil, or a GUID scoped 64-bit value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialNumber {
    /// Scoping GUID. Nil means the serial number is absent.
    pub guid: Uuid,
    /// Serial value.
    pub value: u64,
}

impl SerialNumber {
    /// Appends the wire encoding to `out`.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        if self.guid.is_nil() {
            out.push(0x00);
            return;
        }
        out.push(0x80);
        out.extend_from_slice(&self.guid.to_bytes_le());
        out.extend_from_slice(&self.value.to_le_bytes());
    }

    /// Decodes a serial number.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        let offset = cursor.position();
        match cursor.read_u8()? {
            0x00 => Ok(Self::default()),
            0x80 => Ok(Self {
                guid: Uuid::from_bytes_le(cursor.read_array::<16>()?),
                value: cursor.read_u64_le()?,
            }),
            tag => Err(ParseError::InvalidSerialNumber { offset, tag }),
        }
    }
}

/// One object group, wrapped in a data element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectGroupDataElement {
    /// Identifier of the data element.
    pub data_element_ex_guid: ExGuid,
    /// Serial number of the data element.
    pub serial_number: SerialNumber,
    /// Object declarations, paired by position with `objects`.
    pub declarations: Vec<ObjectGroupObjectDeclare>,
    /// Object data entries.
    pub objects: Vec<ObjectGroupObjectData>,
}

impl ObjectGroupDataElement {
    /// Iterates declarations paired with their data.
    pub fn entries(&self) -> impl Iterator<Item = (&ObjectGroupObjectDeclare, &ObjectGroupObjectData)> {
        self.declarations.iter().zip(self.objects.iter())
    }

    /// Appends the data element encoding to `out`.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        let mut items = Vec::with_capacity(40);
        self.data_element_ex_guid.encode_to(&mut items);
        self.serial_number.encode_to(&mut items);
        encode_compact_u64(OBJECT_GROUP_DATA_ELEMENT_TYPE, &mut items);
        write_compound(out, StreamObjectType::DataElement, &items, |body| {
            write_compound(body, StreamObjectType::ObjectGroupDeclarations, &[], |decls| {
                for declaration in &self.declarations {
                    declaration.encode_to(decls);
                }
            });
            write_compound(body, StreamObjectType::ObjectGroupData, &[], |data| {
                for object in &self.objects {
                    object.encode_to(data);
                }
            });
        });
    }

    /// Decodes one object group data element.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, ParseError> {
        read_compound(cursor, StreamObjectType::DataElement, |items, body| {
            let data_element_ex_guid = ExGuid::decode(items)?;
            let serial_number = SerialNumber::decode(items)?;
            let type_offset = items.position();
            let element_type = decode_compact_u64(items)?;
            if element_type != OBJECT_GROUP_DATA_ELEMENT_TYPE {
                return Err(ParseError::UnsupportedDataElement {
                    offset: type_offset,
                    found: element_type,
                });
            }

            let declarations =
                read_compound(body, StreamObjectType::ObjectGroupDeclarations, |_, decls| {
                    let mut declarations = Vec::new();
                    while next_is(decls, StreamObjectType::ObjectGroupObjectDeclare) {
                        declarations.push(ObjectGroupObjectDeclare::decode(decls)?);
                    }
                    Ok(declarations)
                })?;
            let objects = read_compound(body, StreamObjectType::ObjectGroupData, |_, data| {
                let mut objects = Vec::new();
                while next_is(data, StreamObjectType::ObjectGroupObjectData) {
                    objects.push(ObjectGroupObjectData::decode(data)?);
                }
                Ok(objects)
            })?;

            if declarations.len() != objects.len() {
                return Err(ParseError::DeclarationCountMismatch {
                    declarations: declarations.len(),
                    data: objects.len(),
                });
            }
            Ok(Self {
                data_element_ex_guid,
                serial_number,
                declarations,
                objects,
            })
        })
    }
}

/// Ordered collection of object group data elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataElementPackage {
    /// Data elements in wire order.
    pub elements: Vec<ObjectGroupDataElement>,
}

impl DataElementPackage {
    /// Serializes the package.
    #[cfg_attr(feature = "tracing", instrument(target = "fsshttpb::wire", level = "debug", skip(self), fields(elements = self.elements.len()), name = "encode_package"))]
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // The single reserved byte is always zero.
        write_compound(&mut out, StreamObjectType::DataElementPackage, &[0x00], |body| {
            for element in &self.elements {
                element.encode_to(body);
            }
        });
        out
    }

    /// Parses a package that must span all of `bytes`.
    #[cfg_attr(feature = "tracing", instrument(target = "fsshttpb::wire", level = "debug", skip(bytes), fields(len = bytes.len()), name = "decode_package"))]
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut cursor = ByteCursor::new(bytes);
        let package = read_compound(
            &mut cursor,
            StreamObjectType::DataElementPackage,
            |items, body| {
                items.read_u8()?;
                let mut elements = Vec::new();
                while next_is(body, StreamObjectType::DataElement) {
                    elements.push(ObjectGroupDataElement::decode(body)?);
                }
                Ok(Self { elements })
            },
        )?;
        cursor.expect_end()?;
        Ok(package)
    }
}
