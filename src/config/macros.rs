/// Configuration macros for zero-repetition config definitions
///
/// `config_struct!` defines a configuration section with embedded defaults in
/// a single declaration.

/// Define a configuration struct with embedded defaults
///
/// Generates:
/// - The struct with public fields
/// - The Default implementation with the listed values
/// - Serde support with `#[serde(default)]`, so partial TOML files work
///
/// # Example
/// ```
/// nsbridge::config_struct! {
///     pub struct RangeConfig {
///         page_size: usize = 200,
///         enabled: bool = true,
///     }
/// }
///
/// let cfg = RangeConfig::default();
/// assert_eq!(cfg.page_size, 200);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
