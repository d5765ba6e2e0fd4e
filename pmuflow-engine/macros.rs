//! Declarative macros to reduce boilerplate across the pmuflow codebase

/// Define an identifier enum with `name()`, `all()` and `from_name()`
///
/// # Example
/// ```
/// use pmuflow::id_enum;
///
/// id_enum! {
///     pub enum Level {
///         User => "u",
///         Kernel => "k",
///     }
/// }
///
/// assert_eq!(Level::User.name(), "u");
/// assert_eq!(Level::from_name("k"), Some(Level::Kernel));
/// assert_eq!(Level::all().len(), 2);
/// assert_eq!(Level::COUNT, 2);
/// ```
///
/// Expands to:
/// - An enum with Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord derives
/// - A `name(&self) -> &'static str` method
/// - An `all() -> Vec<Self>` method in declaration order
/// - A `from_name(&str) -> Option<Self>` lookup (exact match)
/// - A `COUNT` constant
#[macro_export]
macro_rules! id_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $str:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            pub const COUNT: usize = [$($str,)*].len();

            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }

            pub fn all() -> Vec<$name> {
                vec![$($name::$variant,)*]
            }

            pub fn from_name(name: &str) -> Option<$name> {
                match name {
                    $($str => Some($name::$variant),)*
                    _ => None,
                }
            }
        }
    };
}
