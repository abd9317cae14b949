//! Reading and writing whole stream objects.
//!
//! A simple object is a start header followed by exactly `length` bytes of
//! fields. A compound object is a start header, `length` bytes of its own
//! fields, any number of child objects, and an end header.

use crate::cursor::ByteCursor;
use crate::error::ParseError;
use crate::header::{
    StreamObjectHeader, StreamObjectType, at_end_header, decode_end_header, encode_end_header,
};

/// Appends a simple stream object whose fields are `items`.
pub fn write_object(out: &mut Vec<u8>, object_type: StreamObjectType, items: &[u8]) {
    debug_assert!(!object_type.is_compound());
    #[cfg(feature = "tracing")]
    logging::trace_wire!(object = %object_type, len = items.len(), "write object");
    StreamObjectHeader::new(object_type, items.len() as u64).encode_to(out);
    out.extend_from_slice(items);
}

/// Appends a compound stream object: header, `items`, whatever `children`
/// writes, then the end header.
pub fn write_compound<F>(out: &mut Vec<u8>, object_type: StreamObjectType, items: &[u8], children: F)
where
    F: FnOnce(&mut Vec<u8>),
{
    debug_assert!(object_type.is_compound());
    #[cfg(feature = "tracing")]
    logging::trace_wire!(object = %object_type, len = items.len(), "write compound");
    StreamObjectHeader::new(object_type, items.len() as u64).encode_to(out);
    out.extend_from_slice(items);
    children(out);
    encode_end_header(object_type, out);
}

/// Returns the type of the next object without consuming anything.
pub fn peek_object_type(cursor: &ByteCursor<'_>) -> Result<StreamObjectType, ParseError> {
    let mut lookahead = *cursor;
    StreamObjectHeader::decode(&mut lookahead).map(|header| header.object_type)
}

/// Reports whether the next object is a start header of `object_type`.
#[must_use]
pub fn next_is(cursor: &ByteCursor<'_>, object_type: StreamObjectType) -> bool {
    !at_end_header(cursor) && peek_object_type(cursor).is_ok_and(|found| found == object_type)
}

/// Reads the start header of the next object and checks its type.
///
/// Returns a cursor limited to the object's own fields; `cursor` is advanced
/// past them. For compound objects the children follow in `cursor`.
pub fn open_object<'a>(
    cursor: &mut ByteCursor<'a>,
    expected: StreamObjectType,
) -> Result<ByteCursor<'a>, ParseError> {
    let offset = cursor.position();
    let header = StreamObjectHeader::decode(cursor)?;
    if header.object_type != expected {
        return Err(ParseError::UnexpectedType {
            offset,
            expected,
            found: header.object_type,
        });
    }
    #[cfg(feature = "tracing")]
    logging::trace_wire!(object = %expected, offset, len = header.length, "read object");
    let length = usize::try_from(header.length).map_err(|_| ParseError::LengthOverflow {
        offset,
        value: header.length,
    })?;
    cursor.split_to(length)
}

/// Verifies that `items` was consumed exactly.
pub fn close_items(items: &ByteCursor<'_>, object_type: StreamObjectType, declared_at: usize) -> Result<(), ParseError> {
    if items.is_empty() {
        return Ok(());
    }
    let declared = (items.position() + items.remaining() - declared_at) as u64;
    Err(ParseError::LengthMismatch {
        offset: declared_at,
        object: object_type,
        declared,
        consumed: declared - items.remaining() as u64,
    })
}

/// Reads a simple object, handing its fields to `parse`, and checks that
/// `parse` consumed all of them.
pub fn read_object<'a, T, F>(
    cursor: &mut ByteCursor<'a>,
    expected: StreamObjectType,
    parse: F,
) -> Result<T, ParseError>
where
    F: FnOnce(&mut ByteCursor<'a>) -> Result<T, ParseError>,
{
    let mut items = open_object(cursor, expected)?;
    let start = items.position();
    let value = parse(&mut items)?;
    close_items(&items, expected, start)?;
    Ok(value)
}

/// Reads a compound object. `parse` receives the object's own fields and the
/// outer cursor positioned at the first child; it must consume every child.
/// The end header is checked afterwards.
pub fn read_compound<'a, T, F>(
    cursor: &mut ByteCursor<'a>,
    expected: StreamObjectType,
    parse: F,
) -> Result<T, ParseError>
where
    F: FnOnce(&mut ByteCursor<'a>, &mut ByteCursor<'a>) -> Result<T, ParseError>,
{
    let mut items = open_object(cursor, expected)?;
    let start = items.position();
    let value = parse(&mut items, cursor)?;
    close_items(&items, expected, start)?;
    decode_end_header(cursor, expected)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::{decode_compact_u64, encode_compact_u64};

    #[test]
    fn simple_object_round_trip() {
        let mut out = Vec::new();
        write_object(&mut out, StreamObjectType::DataSizeObject, &42u64.to_le_bytes());
        let mut cursor = ByteCursor::new(&out);
        assert!(next_is(&cursor, StreamObjectType::DataSizeObject));
        let value = read_object(&mut cursor, StreamObjectType::DataSizeObject, |items| {
            items.read_u64_le()
        })
        .expect("read");
        assert_eq!(value, 42);
        assert!(cursor.is_empty());
    }

    #[test]
    fn unread_fields_are_an_over_parse_error() {
        let mut out = Vec::new();
        write_object(&mut out, StreamObjectType::SignatureObject, &[1, 2, 3]);
        let mut cursor = ByteCursor::new(&out);
        let err = read_object(&mut cursor, StreamObjectType::SignatureObject, |items| {
            items.read_u8()
        })
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::LengthMismatch {
                offset: 2,
                object: StreamObjectType::SignatureObject,
                declared: 3,
                consumed: 1
            }
        );
    }

    #[test]
    fn compound_object_reads_children_until_end() {
        let mut out = Vec::new();
        let mut items = Vec::new();
        encode_compact_u64(5, &mut items);
        write_compound(&mut out, StreamObjectType::ObjectGroupData, &items, |body| {
            write_object(body, StreamObjectType::DataSizeObject, &1u64.to_le_bytes());
            write_object(body, StreamObjectType::DataSizeObject, &2u64.to_le_bytes());
        });

        let mut cursor = ByteCursor::new(&out);
        let (own, children) = read_compound(
            &mut cursor,
            StreamObjectType::ObjectGroupData,
            |items, body| {
                let own = decode_compact_u64(items)?;
                let mut children = Vec::new();
                while next_is(body, StreamObjectType::DataSizeObject) {
                    children.push(read_object(body, StreamObjectType::DataSizeObject, |i| {
                        i.read_u64_le()
                    })?);
                }
                Ok((own, children))
            },
        )
        .expect("compound");
        assert_eq!(own, 5);
        assert_eq!(children, [1, 2]);
        assert!(cursor.is_empty());
    }

    #[test]
    fn wrong_type_is_reported_with_offset() {
        let mut out = vec![0xAA];
        write_object(&mut out, StreamObjectType::SignatureObject, &[]);
        let mut cursor = ByteCursor::new(&out);
        cursor.read_u8().expect("skip");
        assert_eq!(
            open_object(&mut cursor, StreamObjectType::DataSizeObject).unwrap_err(),
            ParseError::UnexpectedType {
                offset: 1,
                expected: StreamObjectType::DataSizeObject,
                found: StreamObjectType::SignatureObject
            }
        );
    }
}
