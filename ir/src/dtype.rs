//! Element data types for tensors.

use std::fmt;

/// Semantic element type of a tensor.
///
/// This mirrors the dtype tags of the training frameworks we import from,
/// without carrying any runtime representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    BFloat16,
    #[default]
    Float32,
    Float64,
    Str,
}

impl DType {
    /// Size of one element in bytes. `None` for variable-size types.
    pub fn size_bytes(&self) -> Option<usize> {
        use DType::*;
        match self {
            Bool | Int8 | UInt8 => Some(1),
            Int16 | UInt16 | Float16 | BFloat16 => Some(2),
            Int32 | UInt32 | Float32 => Some(4),
            Int64 | UInt64 | Float64 => Some(8),
            Str => None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float16 | DType::BFloat16 | DType::Float32 | DType::Float64)
    }

    pub fn is_integer(&self) -> bool {
        use DType::*;
        matches!(self, Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float16 => "float16",
            DType::BFloat16 => "bfloat16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Str => "string",
        };
        f.write_str(name)
    }
}
