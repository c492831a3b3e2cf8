//! Type annotations as they appear in source.
//!
//! The language only knows a handful of builtin scalar types. Any other name
//! parses as [`TypeTag::Identifier`] so the parser stays permissive, and is
//! rejected during code generation when it has to be lowered.

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    Integer,
    Float,
    Boolean,
    String,
    Char,
    Void,
    Identifier(String),
}

impl TypeTag {
    /// Maps a source spelling to its tag.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Integer" => TypeTag::Integer,
            "Float" => TypeTag::Float,
            "Boolean" => TypeTag::Boolean,
            "String" => TypeTag::String,
            "Char" => TypeTag::Char,
            "Void" => TypeTag::Void,
            other => TypeTag::Identifier(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeTag::Integer => "Integer",
            TypeTag::Float => "Float",
            TypeTag::Boolean => "Boolean",
            TypeTag::String => "String",
            TypeTag::Char => "Char",
            TypeTag::Void => "Void",
            TypeTag::Identifier(name) => name,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeTag::Void)
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
