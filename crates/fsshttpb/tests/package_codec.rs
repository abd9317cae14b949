//! Integration tests for data element package encoding.

use fsshttpb::{
    ByteCursor, CellId, DataElementPackage, ExGuid, ObjectGroupDataElement, ObjectGroupObjectData,
    ObjectGroupObjectDeclare, ParseError, SerialNumber, StreamObjectHeader, StreamObjectType,
};
use proptest::prelude::*;
use uuid::Uuid;

// ============================================================================
// Strategies
// ============================================================================

fn ex_guid() -> impl Strategy<Value = ExGuid> {
    (any::<u32>(), any::<u128>()).prop_map(|(value, guid)| ExGuid::new(value, Uuid::from_u128(guid)))
}

fn object() -> impl Strategy<Value = (ObjectGroupObjectDeclare, ObjectGroupObjectData)> {
    (
        ex_guid(),
        prop::collection::vec(ex_guid(), 0..4),
        prop::collection::vec((ex_guid(), ex_guid()), 0..2),
        prop::collection::vec(any::<u8>(), 0..300),
        any::<u64>(),
    )
        .prop_map(|(id, refs, cells, data, partition)| {
            let declare = ObjectGroupObjectDeclare {
                ex_guid: id,
                partition_id: partition,
                data_size: data.len() as u64,
                object_references_count: refs.len() as u64,
                cell_references_count: cells.len() as u64,
            };
            let cell_ids = cells
                .into_iter()
                .map(|(ex_guid1, ex_guid2)| CellId { ex_guid1, ex_guid2 })
                .collect();
            let data = ObjectGroupObjectData {
                object_ex_guids: refs,
                cell_ids,
                data,
            };
            (declare, data)
        })
}

fn element() -> impl Strategy<Value = ObjectGroupDataElement> {
    (ex_guid(), prop::collection::vec(object(), 0..5)).prop_map(|(id, objects)| {
        let (declarations, objects) = objects.into_iter().unzip();
        ObjectGroupDataElement {
            data_element_ex_guid: id,
            serial_number: SerialNumber::default(),
            declarations,
            objects,
        }
    })
}

proptest! {
    #[test]
    fn package_decode_inverts_encode(elements in prop::collection::vec(element(), 0..4)) {
        let package = DataElementPackage { elements };
        let bytes = package.to_bytes();
        prop_assert_eq!(DataElementPackage::parse(&bytes).expect("parse"), package);
    }
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn package_must_start_with_package_header() {
    let mut bytes = Vec::new();
    StreamObjectHeader::new(StreamObjectType::DataElement, 0).encode_to(&mut bytes);
    assert!(matches!(
        DataElementPackage::parse(&bytes),
        Err(ParseError::UnexpectedType {
            offset: 0,
            expected: StreamObjectType::DataElementPackage,
            found: StreamObjectType::DataElement,
        })
    ));
}

#[test]
fn empty_input_is_truncated() {
    assert_eq!(
        DataElementPackage::parse(&[]),
        Err(ParseError::Truncated {
            offset: 0,
            needed: 1
        })
    );
}

#[test]
fn large_object_uses_large_length_header() {
    let data = ObjectGroupObjectData {
        object_ex_guids: Vec::new(),
        cell_ids: Vec::new(),
        data: vec![7; 40_000],
    };
    let mut out = Vec::new();
    data.encode_to(&mut out);
    let mut cursor = ByteCursor::new(&out);
    let header = StreamObjectHeader::decode(&mut cursor).expect("header");
    assert!(header.length > 32_767);
    assert_eq!(
        ObjectGroupObjectData::decode(&mut ByteCursor::new(&out)).expect("decode"),
        data
    );
}
