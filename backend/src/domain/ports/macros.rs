//! Declares port error enums together with snake-case constructors.
//!
//! Every variant carries named fields; the generated constructor for
//! `Connection { message: String }` is `connection(message: impl Into<String>)`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? } => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field: $ty),* },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = concat!("Build [`", stringify!($name), "::", stringify!($variant), "`].")]
                    pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                        Self::$variant { $($field: $field.into()),* }
                    }
                }
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Constructor generation.

    define_port_error! {
        pub enum SamplePortError {
            Connection { message: String } => "connection: {message}",
            RowCount { table: String, count: u64 } => "{table} has {count} rows",
        }
    }

    #[test]
    fn string_fields_accept_borrowed_input() {
        let error = SamplePortError::connection("refused");
        assert_eq!(error.to_string(), "connection: refused");
    }

    #[test]
    fn multi_word_variants_become_snake_case_constructors() {
        let error = SamplePortError::row_count("users", 3_u64);
        assert_eq!(
            error,
            SamplePortError::RowCount {
                table: "users".to_owned(),
                count: 3
            }
        );
        assert_eq!(error.to_string(), "users has 3 rows");
    }
}
