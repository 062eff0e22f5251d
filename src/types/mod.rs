//! Primitive kinds, type tags and the scalar value codec

pub mod codec;
pub mod descriptor;
pub mod kind;
pub mod value;

pub use codec::{decode_scalar, encode_scalar};
pub use descriptor::TypeDescriptor;
pub use kind::PrimitiveKind;
pub use value::Value;
