//! Struct introspection contract.
//!
//! A struct-shaped argument bundle declares an ordered list of argument keys
//! (one per field) and knows how to build itself from an [`Environment`] and
//! how to flatten itself back into one. The resolution engine only ever sees
//! the keys and environments; it never reflects over Rust types itself.

use crate::environment::Environment;
use crate::key::ArgKey;

/// A struct whose fields are resolvable arguments.
///
/// Implement by hand or with [`arg_struct!`](crate::arg_struct).
pub trait ArgStruct: Sized + Send + Sync + 'static {
    /// Keys declared by this struct, in field order.
    fn arg_keys() -> Vec<ArgKey>;

    /// Build the struct from `env`. `None` if any field is missing.
    fn from_env(env: &Environment) -> Option<Self>;

    /// Flatten the struct into an environment holding one value per field.
    fn into_env(self) -> Environment;
}

/// The empty bundle. Used by converters that take no inputs.
impl ArgStruct for () {
    fn arg_keys() -> Vec<ArgKey> {
        Vec::new()
    }

    fn from_env(_env: &Environment) -> Option<Self> {
        Some(())
    }

    fn into_env(self) -> Environment {
        Environment::new()
    }
}

/// Define a struct and implement [`ArgStruct`] for it.
///
/// Each field becomes an argument key named after the field, or after the
/// string literal given with `=>`. Field types must be `Clone + Send + Sync`.
///
/// ```
/// use argmapper_types::{arg_struct, ArgKey, ArgStruct, Environment};
///
/// arg_struct! {
///     #[derive(Debug, Clone)]
///     pub struct Listen {
///         pub port: u16 => "Port",
///         pub host: String,
///     }
/// }
///
/// assert_eq!(
///     Listen::arg_keys(),
///     vec![ArgKey::of::<u16>("Port"), ArgKey::of::<String>("host")]
/// );
///
/// let env = Environment::new()
///     .with("Port", 8080u16)
///     .with("host", "localhost".to_string());
/// let listen = Listen::from_env(&env).unwrap();
/// assert_eq!(listen.port, 8080);
/// ```
#[macro_export]
macro_rules! arg_struct {
    (@key_name $field:ident) => {
        stringify!($field)
    };
    (@key_name $field:ident, $tag:literal) => {
        $tag
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::ArgStruct for $name {
            fn arg_keys() -> ::std::vec::Vec<$crate::ArgKey> {
                ::std::vec![
                    $( $crate::ArgKey::of::<$ty>($crate::arg_struct!(@key_name $field $(, $tag)?)) ),*
                ]
            }

            #[allow(unused_variables)]
            fn from_env(env: &$crate::Environment) -> ::std::option::Option<Self> {
                ::std::option::Option::Some(Self {
                    $(
                        $field: env.get_as::<$ty>($crate::arg_struct!(@key_name $field $(, $tag)?))?,
                    )*
                })
            }

            #[allow(unused_mut)]
            fn into_env(self) -> $crate::Environment {
                let mut env = $crate::Environment::new();
                $(
                    env.set($crate::arg_struct!(@key_name $field $(, $tag)?), self.$field);
                )*
                env
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{ArgKey, ArgStruct, Environment};

    arg_struct! {
        #[derive(Debug, Clone, PartialEq)]
        struct Connection {
            dsn: String => "DSN",
            pool_size: u32,
        }
    }

    arg_struct! {
        struct Nothing {}
    }

    #[test]
    fn test_keys_follow_field_order_and_tags() {
        assert_eq!(
            Connection::arg_keys(),
            vec![ArgKey::of::<String>("DSN"), ArgKey::of::<u32>("pool_size")]
        );
        assert!(Nothing::arg_keys().is_empty());
    }

    #[test]
    fn test_from_env_requires_every_field() {
        let partial = Environment::new().with("DSN", "postgres://".to_string());
        assert!(Connection::from_env(&partial).is_none());

        let full = partial.with("pool_size", 4u32);
        assert_eq!(
            Connection::from_env(&full),
            Some(Connection {
                dsn: "postgres://".into(),
                pool_size: 4
            })
        );
    }

    #[test]
    fn test_into_env_uses_key_names() {
        let env = Connection {
            dsn: "sqlite::memory:".into(),
            pool_size: 1,
        }
        .into_env();
        assert_eq!(env.get_as::<String>("DSN").as_deref(), Some("sqlite::memory:"));
        assert_eq!(env.get_as::<u32>("pool_size"), Some(1));
    }

    #[test]
    fn test_unit_bundle_is_empty() {
        assert!(<()>::arg_keys().is_empty());
        assert_eq!(<()>::from_env(&Environment::new()), Some(()));
    }
}
