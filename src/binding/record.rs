use super::types::{Column, FieldMut, FieldRef, SqlType};

/// A typed record whose fields map positionally onto statement slots.
///
/// A zero-valued instance serves as the template a statement derives its
/// slot descriptors from. Implemented for `()`, tuples of [`Column`] types
/// and, through [`crate::sql_record!`], for plain structs.
pub trait Record {
    fn slot_count(&self) -> usize;

    fn sql_type(&self, index: usize) -> Option<SqlType>;

    fn field(&self, index: usize) -> Option<FieldRef<'_>>;

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
}

impl Record for () {
    fn slot_count(&self) -> usize {
        0
    }

    fn sql_type(&self, _index: usize) -> Option<SqlType> {
        None
    }

    fn field(&self, _index: usize) -> Option<FieldRef<'_>> {
        None
    }

    fn field_mut(&mut self, _index: usize) -> Option<FieldMut<'_>> {
        None
    }
}

macro_rules! impl_tuple_record {
    ($count:expr; $($idx:tt $name:ident),+) => {
        impl<$($name: Column),+> Record for ($($name,)+) {
            fn slot_count(&self) -> usize {
                $count
            }

            fn sql_type(&self, index: usize) -> Option<SqlType> {
                match index {
                    $($idx => Some($name::SQL_TYPE),)+
                    _ => None,
                }
            }

            fn field(&self, index: usize) -> Option<FieldRef<'_>> {
                match index {
                    $($idx => Some(self.$idx.field()),)+
                    _ => None,
                }
            }

            fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
                match index {
                    $($idx => Some(self.$idx.field_mut()),)+
                    _ => None,
                }
            }
        }
    };
}

impl_tuple_record!(1; 0 A);
impl_tuple_record!(2; 0 A, 1 B);
impl_tuple_record!(3; 0 A, 1 B, 2 C);
impl_tuple_record!(4; 0 A, 1 B, 2 C, 3 D);
impl_tuple_record!(5; 0 A, 1 B, 2 C, 3 D, 4 E);
impl_tuple_record!(6; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_tuple_record!(7; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
impl_tuple_record!(8; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);
impl_tuple_record!(9; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I);
impl_tuple_record!(10; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J);
impl_tuple_record!(11; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K);
impl_tuple_record!(12; 0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L);
