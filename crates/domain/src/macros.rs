//! Macro for wire-string enums
//!
//! Upstream APIs report small closed sets of values as lowercase strings
//! (repeat mode, device state). This macro gives such enums a `Display` that
//! prints the wire string and a case-insensitive `FromStr`.
//!
//! # Example
//!
//! ```rust
//! use nadctl_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Transport {
//!     Playing,
//!     Paused,
//! }
//!
//! impl_domain_status_conversions!(Transport {
//!     Playing => "playing",
//!     Paused => "paused",
//! });
//!
//! assert_eq!(Transport::Paused.to_string(), "paused");
//! assert_eq!("PLAYING".parse::<Transport>().unwrap(), Transport::Playing);
//! ```

/// Implements `Display` and `FromStr` for an enum from a variant/string table.
///
/// Parsing lowercases the input before matching, so the strings in the table
/// must be lowercase.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("invalid {}: {:?}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Transport {
        Playing,
        Paused,
        Stopped,
    }

    impl_domain_status_conversions!(Transport {
        Playing => "playing",
        Paused => "paused",
        Stopped => "stopped",
    });

    #[test]
    fn display_prints_wire_string() {
        assert_eq!(Transport::Playing.to_string(), "playing");
        assert_eq!(format!("{:>8}", Transport::Paused.to_string()), "  paused");
    }

    #[test]
    fn parse_ignores_case_and_whitespace() {
        assert_eq!(Transport::from_str(" Stopped ").unwrap(), Transport::Stopped);
        assert_eq!(Transport::from_str("PAUSED").unwrap(), Transport::Paused);
    }

    #[test]
    fn parse_rejects_unknown_values() {
        let err = Transport::from_str("rewinding").unwrap_err();
        assert_eq!(err, "invalid Transport: \"rewinding\"");
    }
}
