use std::sync::Arc;

use crate::error::{Side, SqlBindError};

use super::record::Record;
use super::types::{ByteWidth, Representation, SemanticType, SqlType};

/// Description of one positional parameter or result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDescriptor {
    pub index: usize,
    pub semantic: SemanticType,
    pub width: ByteWidth,
    pub nullable: bool,
    pub representation: Representation,
    pub requires_conversion: bool,
}

impl SlotDescriptor {
    fn new(index: usize, ty: SqlType) -> Self {
        Self {
            index,
            semantic: ty.semantic,
            width: ty.width,
            nullable: ty.nullable,
            representation: ty.representation,
            requires_conversion: needs_converter(ty),
        }
    }
}

/// Integers, floats and null flags bind straight from the field.
fn needs_converter(ty: SqlType) -> bool {
    !matches!(
        ty.semantic,
        SemanticType::Integer | SemanticType::Float | SemanticType::NullFlag
    )
}

/// Derive the slot descriptors of one statement side from a template.
///
/// `expected` is the placeholder count (parameters) or the backend column
/// count (results).
///
/// # Errors
///
/// Returns `SqlBindError::ConfigError` when the template's slot count does
/// not equal `expected` or a field reports no type.
pub fn build_slots<T: Record + ?Sized>(
    template: &T,
    expected: usize,
    side: Side,
) -> Result<Arc<[SlotDescriptor]>, SqlBindError> {
    let count = template.slot_count();
    if count != expected {
        return Err(SqlBindError::ConfigError(format!(
            "{side} template has {count} slots but the statement expects {expected}"
        )));
    }
    (0..count)
        .map(|index| {
            template
                .sql_type(index)
                .map(|ty| SlotDescriptor::new(index, ty))
                .ok_or_else(|| {
                    SqlBindError::ConfigError(format!("{side} template has no type for slot {index}"))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_follow_template_order() {
        let template = (0i32, String::new(), None::<Vec<u8>>);
        let slots = build_slots(&template, 3, Side::Results).unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].width, ByteWidth::Fixed(4));
        assert!(!slots[0].requires_conversion);
        assert_eq!(slots[1].semantic, SemanticType::VariableText);
        assert!(slots[1].requires_conversion);
        assert!(slots[2].nullable);
        assert_eq!(slots[2].index, 2);
    }

    #[test]
    fn count_mismatch_is_configuration_error() {
        let err = build_slots(&(1i64,), 2, Side::Parameters).unwrap_err();
        assert!(matches!(err, SqlBindError::ConfigError(_)));
    }
}
