/// Implement [`Record`](crate::Record) for a struct whose fields are all
/// [`Column`](crate::Column) types. Fields are bound in the order listed.
///
/// ```rust
/// use sqlbind::sql_record;
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
///
/// sql_record!(User { id, name, email });
/// ```
#[macro_export]
macro_rules! sql_record {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::Record for $ty {
            fn slot_count(&self) -> usize {
                [$(stringify!($field)),+].len()
            }

            #[allow(unused_assignments)]
            fn sql_type(&self, index: usize) -> ::std::option::Option<$crate::SqlType> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::std::option::Option::Some($crate::binding::sql_type_of(&self.$field));
                    }
                    position += 1;
                )+
                ::std::option::Option::None
            }

            #[allow(unused_assignments)]
            fn field(&self, index: usize) -> ::std::option::Option<$crate::FieldRef<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::std::option::Option::Some($crate::Column::field(&self.$field));
                    }
                    position += 1;
                )+
                ::std::option::Option::None
            }

            #[allow(unused_assignments)]
            fn field_mut(&mut self, index: usize) -> ::std::option::Option<$crate::FieldMut<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::std::option::Option::Some($crate::Column::field_mut(&mut self.$field));
                    }
                    position += 1;
                )+
                ::std::option::Option::None
            }
        }
    };
}
