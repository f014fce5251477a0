//! Primitive types, passing modes and array shapes shared by the raw AST,
//! the symbol table, and the semantic analyzer.

use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PrimitiveType {
    Int,
    Char,
    /// Void; valid only as a function's declared return type.
    Nothing,
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Int => write!(f, "int"),
            PrimitiveType::Char => write!(f, "char"),
            PrimitiveType::Nothing => write!(f, "nothing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PassingMode {
    ByValue,
    ByReference,
}

/// A finite ordered list of dimensions, optionally with the leading
/// dimension marked "open" (unknown at compile time). An empty shape
/// denotes a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct ArrayShape {
    /// `true` iff this shape's first dimension is unspecified. Only
    /// meaningful when `dims` is non-empty.
    pub leading_open: bool,
    /// Concrete dimension sizes. `dims[0]` is a placeholder (`0`) when
    /// `leading_open` is set; all other entries are positive.
    pub dims: Vec<u32>,
}

impl ArrayShape {
    pub fn scalar() -> Self {
        ArrayShape::default()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    pub fn fixed(dims: Vec<u32>) -> Self {
        ArrayShape {
            leading_open: false,
            dims,
        }
    }

    pub fn open_leading(trailing: Vec<u32>) -> Self {
        let mut dims = vec![0];
        dims.extend(trailing);
        ArrayShape {
            leading_open: true,
            dims,
        }
    }

    /// Shape of `a[i]` given the shape of `a`: drop the first dimension.
    pub fn tail(&self) -> ArrayShape {
        if self.dims.is_empty() {
            return ArrayShape::scalar();
        }
        ArrayShape {
            leading_open: false,
            dims: self.dims[1..].to_vec(),
        }
    }

    /// Structural shape match: equal rank, trailing dimensions equal
    /// component-by-component, leading dimension ignored when either side
    /// has it marked open.
    pub fn matches(&self, other: &ArrayShape) -> bool {
        if self.dims.len() != other.dims.len() {
            return false;
        }
        let skip_leading = self.leading_open || other.leading_open;
        self.dims
            .iter()
            .zip(other.dims.iter())
            .enumerate()
            .all(|(i, (a, b))| (skip_leading && i == 0) || a == b)
    }
}
