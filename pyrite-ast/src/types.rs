//! The type algebra.
//!
//! `Struct` and `Enum` carry their field/variant data directly in the `Type`
//! value rather than through a side table of definitions, so a resolved
//! expression type is self-contained and equality between two `Type` values
//! is always structural equality.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloatWidth {
    W32,
    W64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Int(IntWidth),
    Float(FloatWidth),
    Bool,
    Char,
    String,
    Void,

    Reference {
        mutable: bool,
        inner: Box<Type>,
    },
    Pointer {
        mutable: bool,
        inner: Box<Type>,
    },

    Array {
        element: Box<Type>,
        size: u64,
    },
    Slice {
        element: Box<Type>,
    },
    Tuple(Vec<Type>),

    /// Fields preserve declaration order; this is the source of truth for
    /// struct layout (spec'd as insertion order, optionally sorted later
    /// for deterministic builds).
    Struct {
        name: String,
        fields: Vec<(String, Type)>,
    },
    /// Variant data is absent (`None`) for unit variants. The variant's tag
    /// is always its index in `variants`.
    Enum {
        name: String,
        variants: Vec<(String, Option<Vec<Type>>)>,
    },

    /// The instantiated form of a generic type. Before monomorphization,
    /// `base` may be `None` (unresolved); after, it always points at the
    /// concrete underlying type.
    Generic {
        name: String,
        base: Option<Box<Type>>,
        type_args: Vec<Type>,
    },

    Function {
        param_types: Vec<Type>,
        return_type: Option<Box<Type>>,
    },

    Trait {
        name: String,
        associated_types: Vec<String>,
        methods: Vec<String>,
    },
    Opaque {
        name: String,
    },
    /// Only ever present during generic type checking; must never survive
    /// monomorphization.
    TypeVariable {
        name: String,
    },
    SelfType,
}

impl Type {
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference { .. })
    }

    pub fn is_mutable_reference(&self) -> bool {
        matches!(self, Type::Reference { mutable: true, .. })
    }

    pub fn inner_type(&self) -> Option<&Type> {
        match self {
            Type::Reference { inner, .. }
            | Type::Pointer { inner, .. }
            | Type::Array { element: inner, .. }
            | Type::Slice { element: inner } => Some(inner),
            _ => None,
        }
    }

    /// True for types whose values must never outlive their scope by
    /// reference (i.e. everything except references/pointers to them).
    pub fn contains_type_variable(&self) -> bool {
        match self {
            Type::TypeVariable { .. } => true,
            Type::Reference { inner, .. }
            | Type::Pointer { inner, .. }
            | Type::Array { element: inner, .. }
            | Type::Slice { element: inner } => inner.contains_type_variable(),
            Type::Tuple(items) => items.iter().any(Type::contains_type_variable),
            Type::Struct { fields, .. } => {
                fields.iter().any(|(_, ty)| ty.contains_type_variable())
            }
            Type::Enum { variants, .. } => variants.iter().any(|(_, data)| {
                data.as_ref()
                    .is_some_and(|tys| tys.iter().any(Type::contains_type_variable))
            }),
            Type::Generic { type_args, .. } => {
                type_args.iter().any(Type::contains_type_variable)
            }
            Type::Function {
                param_types,
                return_type,
            } => {
                param_types.iter().any(Type::contains_type_variable)
                    || return_type
                        .as_ref()
                        .is_some_and(|t| t.contains_type_variable())
            }
            _ => false,
        }
    }

    /// Copy vs. Move classification (spec §4.3): primitives, shared
    /// references, raw pointers, and tuples/arrays of Copy types are Copy;
    /// everything else (String, Struct, Enum with a non-Copy field, Slice,
    /// exclusive references, closures) is Move.
    pub fn is_copy(&self) -> bool {
        match self {
            Type::Int(_) | Type::Float(_) | Type::Bool | Type::Char => true,
            Type::Reference { mutable, .. } => !mutable,
            Type::Pointer { .. } => true,
            Type::Tuple(items) => items.iter().all(Type::is_copy),
            Type::Array { element, .. } => element.is_copy(),
            Type::Struct { fields, .. } => fields.iter().all(|(_, ty)| ty.is_copy()),
            Type::Enum { variants, .. } => variants.iter().all(|(_, data)| {
                data.as_ref()
                    .is_none_or(|tys| tys.iter().all(Type::is_copy))
            }),
            Type::Void | Type::SelfType => true,
            _ => false,
        }
    }

    pub fn void() -> Type {
        Type::Void
    }

    pub fn i32() -> Type {
        Type::Int(IntWidth::W32)
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int(IntWidth::W8) => write!(f, "i8"),
            Type::Int(IntWidth::W16) => write!(f, "i16"),
            Type::Int(IntWidth::W32) => write!(f, "i32"),
            Type::Int(IntWidth::W64) => write!(f, "i64"),
            Type::Float(FloatWidth::W32) => write!(f, "f32"),
            Type::Float(FloatWidth::W64) => write!(f, "f64"),
            Type::Bool => write!(f, "bool"),
            Type::Char => write!(f, "char"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::Reference { mutable, inner } => {
                write!(f, "&{}{}", if *mutable { "mut " } else { "" }, inner)
            }
            Type::Pointer { mutable, inner } => {
                write!(f, "*{}{}", if *mutable { "mut " } else { "const " }, inner)
            }
            Type::Array { element, size } => write!(f, "[{}; {}]", element, size),
            Type::Slice { element } => write!(f, "&[{}]", element),
            Type::Tuple(items) => {
                write!(f, "(")?;
                for (i, ty) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                write!(f, ")")
            }
            Type::Struct { name, .. } => write!(f, "{}", name),
            Type::Enum { name, .. } => write!(f, "{}", name),
            Type::Generic {
                name, type_args, ..
            } => {
                write!(f, "{}", name)?;
                if !type_args.is_empty() {
                    write!(f, "<")?;
                    for (i, ty) in type_args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", ty)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Type::Function {
                param_types,
                return_type,
            } => {
                write!(f, "fn(")?;
                for (i, ty) in param_types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                write!(f, ")")?;
                if let Some(ret) = return_type {
                    write!(f, " -> {}", ret)?;
                }
                Ok(())
            }
            Type::Trait { name, .. } => write!(f, "dyn {}", name),
            Type::Opaque { name } => write!(f, "{}", name),
            Type::TypeVariable { name } => write!(f, "{}", name),
            Type::SelfType => write!(f, "Self"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_classification() {
        assert!(Type::i32().is_copy());
        assert!(!Type::String.is_copy());
        assert!(Type::Reference {
            mutable: false,
            inner: Box::new(Type::String)
        }
        .is_copy());
        assert!(!Type::Reference {
            mutable: true,
            inner: Box::new(Type::String)
        }
        .is_copy());

        let point = Type::Struct {
            name: "Point".to_string(),
            fields: vec![("x".to_string(), Type::i32()), ("y".to_string(), Type::i32())],
        };
        assert!(point.is_copy());

        let owned = Type::Struct {
            name: "Owned".to_string(),
            fields: vec![("s".to_string(), Type::String)],
        };
        assert!(!owned.is_copy());
    }

    #[test]
    fn type_variable_detection() {
        let generic = Type::Generic {
            name: "Vec".to_string(),
            base: None,
            type_args: vec![Type::TypeVariable {
                name: "T".to_string(),
            }],
        };
        assert!(generic.contains_type_variable());
        assert!(!Type::i32().contains_type_variable());
    }
}
