#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `fsshttpb` implements the binary building blocks that object groups are
//! made of: compact integers, extended GUIDs, length-prefixed binary items,
//! stream object headers, and the object group data element itself.
//!
//! # Design
//!
//! Decoding goes through a [`ByteCursor`] that records absolute offsets, so a
//! [`ParseError`] always names the byte at which decoding stopped. Every
//! structure exposes `encode_to(&self, &mut Vec<u8>)` and
//! `decode(&mut ByteCursor)`; stream objects are framed by the helpers in
//! [`stream`], which enforce that an object's fields consume exactly the
//! length declared in its header and that compound objects close with a
//! matching end header.
//!
//! # Examples
//!
//! ```
//! use fsshttpb::{ByteCursor, ExGuid, StreamObjectType, stream};
//! use uuid::Uuid;
//!
//! let id = ExGuid::new(5, Uuid::from_u128(1));
//! let mut items = Vec::new();
//! id.encode_to(&mut items);
//!
//! let mut out = Vec::new();
//! stream::write_object(&mut out, StreamObjectType::SignatureObject, &items);
//!
//! let mut cursor = ByteCursor::new(&out);
//! let decoded = stream::read_object(&mut cursor, StreamObjectType::SignatureObject, |items| {
//!     ExGuid::decode(items)
//! })
//! .unwrap();
//! assert_eq!(decoded, id);
//! ```

mod binary;
mod compact;
mod cursor;
mod error;
mod exguid;
pub mod header;
mod object_group;
pub mod stream;

pub use binary::{
    CellId, decode_binary_item, decode_cell_id_array, decode_ex_guid_array, encode_binary_item,
    encode_cell_id_array, encode_ex_guid_array,
};
pub use compact::{compact_u64_len, decode_compact_len, decode_compact_u64, encode_compact_u64};
pub use cursor::ByteCursor;
pub use error::ParseError;
pub use exguid::{ExGuid, ExGuidGenerator};
pub use header::{StreamObjectHeader, StreamObjectType};
pub use object_group::{
    DataElementPackage, OBJECT_GROUP_DATA_ELEMENT_TYPE, ObjectGroupDataElement,
    ObjectGroupObjectData, ObjectGroupObjectDeclare, SerialNumber,
};
