//! Error type shared by graph construction, configuration validation and
//! run dispatch.
//!
//! Only fatal conditions are errors. A search that finds no route is a
//! normal [`RouteOutcome`](crate::cost::RouteOutcome) value.

/// Defines [`ErrorKind`], its `Display` impl and one constructor per kind.
macro_rules! error_kinds {
    ($(
        ($kind:ident, $ctor:ident)
    ),*) => {
        /// The kind of error that occurred.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum ErrorKind {
            $(
                $kind,
            )*
        }

        impl std::fmt::Display for ErrorKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$kind => write!(f, "{}", stringify!($kind)),
                    )*
                }
            }
        }

        impl Error {
            $(
                #[doc = concat!(
                    "Creates a new [`Error`] of kind `",
                    stringify!($kind),
                    "` with the given description."
                )]
                pub fn $ctor(desc: impl Into<String>) -> Self {
                    Self {
                        kind: ErrorKind::$kind,
                        desc: desc.into(),
                    }
                }
            )*
        }
    };
}

error_kinds!(
    (InvalidGraph, invalid_graph),
    (UnknownStation, unknown_station),
    (InvalidConfiguration, invalid_configuration)
);

/// A fatal error raised before any search begins.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    desc: String,
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &str {
        &self.desc
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.desc)
    }
}

impl std::error::Error for Error {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
