// Binding layer
//
// Maps typed records onto positional statement slots:
// - types: column types, field views and the `Column` trait
// - record: the `Record` trait for tuples and `sql_record!` structs
// - descriptor: slot descriptors derived once from a template
// - converter: per-slot translators for values that cannot bind directly
// - table: parameter and result binding tables refreshed per execution

mod converter;
mod descriptor;
mod macros;
mod record;
pub(crate) mod table;
mod types;

pub use descriptor::{SlotDescriptor, build_slots};
pub use record::Record;
pub use types::{
    ByteWidth, Column, FieldMut, FieldRef, FixedText, FixedTextSlot, Null, Representation,
    SemanticType, SqlType, Target, WideText, sql_type_of,
};
