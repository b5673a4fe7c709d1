use std::fmt;

///
/// ValueTag
///
/// Value-variant tag used in diagnostics and coercion errors.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueTag {
    Blob,
    Bool,
    Calendar,
    Enum,
    Float32,
    Float64,
    Int32,
    Int64,
    List,
    Map,
    Null,
    Object,
    Ref,
    Text,
    Timestamp,
    Ulid,
}

impl ValueTag {
    /// Stable human-readable value kind label for diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Blob => "Blob",
            Self::Bool => "Bool",
            Self::Calendar => "Calendar",
            Self::Enum => "Enum",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::List => "List",
            Self::Map => "Map",
            Self::Null => "Null",
            Self::Object => "Object",
            Self::Ref => "Ref",
            Self::Text => "Text",
            Self::Timestamp => "Timestamp",
            Self::Ulid => "Ulid",
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int32 | Self::Int64 | Self::Float32 | Self::Float64
        )
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
