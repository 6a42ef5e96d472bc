//! AST type → LLVM type lowering (spec §4.7 conventions).

use super::errors::CodegenError;
use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;
use pyrite_ast::{IntWidth, Type};

/// An enum's tagged-union payload width is capped at 8 64-bit slots.
pub const MAX_ENUM_PAYLOAD_FIELDS: usize = 8;

pub fn max_payload_fields(variants: &[(String, Option<Vec<Type>>)]) -> usize {
    variants
        .iter()
        .map(|(_, data)| data.as_ref().map_or(0, |tys| tys.len()))
        .max()
        .unwrap_or(0)
        .min(MAX_ENUM_PAYLOAD_FIELDS)
}

/// Two-word `{i8*, i64}` pair (pointer, length), per spec: `String`, and the
/// same shape reused for `Slice<T>`'s `{T*, i64}` when `T` needs no distinct
/// pointee — strings are the byte-slice special case.
pub fn string_type<'ctx>(context: &'ctx Context) -> inkwell::types::StructType<'ctx> {
    context.struct_type(
        &[
            context.i8_type().ptr_type(Default::default()).into(),
            context.i64_type().into(),
        ],
        false,
    )
}

pub fn llvm_type<'ctx>(
    context: &'ctx Context,
    ty: &Type,
) -> Result<BasicTypeEnum<'ctx>, CodegenError> {
    Ok(match ty {
        Type::Int(IntWidth::W8) => context.i8_type().into(),
        Type::Int(IntWidth::W16) => context.i16_type().into(),
        Type::Int(IntWidth::W32) => context.i32_type().into(),
        Type::Int(IntWidth::W64) => context.i64_type().into(),
        Type::Float(pyrite_ast::FloatWidth::W32) => context.f32_type().into(),
        Type::Float(pyrite_ast::FloatWidth::W64) => context.f64_type().into(),
        Type::Bool => context.bool_type().into(),
        Type::Char => context.i32_type().into(),
        Type::Void => context.i32_type().into(),
        Type::String => string_type(context).into(),

        Type::Reference { inner, .. } | Type::Pointer { inner, .. } => {
            let _ = llvm_type(context, inner)?;
            context.ptr_type(Default::default()).into()
        }

        Type::Array { element, size } => {
            let elem = llvm_type(context, element)?;
            elem.array_type(*size as u32).into()
        }
        Type::Slice { element } => {
            let elem = llvm_type(context, element)?;
            context
                .struct_type(
                    &[
                        elem.ptr_type(Default::default()).into(),
                        context.i64_type().into(),
                    ],
                    false,
                )
                .into()
        }
        Type::Tuple(items) => {
            let fields: Result<Vec<_>, _> = items.iter().map(|t| llvm_type(context, t)).collect();
            context.struct_type(&fields?, false).into()
        }

        Type::Struct { fields, .. } => {
            let llvm_fields: Result<Vec<_>, _> =
                fields.iter().map(|(_, t)| llvm_type(context, t)).collect();
            context.struct_type(&llvm_fields?, false).into()
        }
        Type::Enum { variants, .. } => {
            let payload_fields = max_payload_fields(variants);
            if payload_fields == 0 {
                context.i32_type().into()
            } else {
                let mut fields = vec![context.i32_type().into()];
                fields.extend((0..payload_fields).map(|_| context.i64_type().into()));
                context.struct_type(&fields, false).into()
            }
        }

        // List<T> = {T*, i64 len, i64 cap}.
        Type::Generic { name, type_args, .. } if name == "List" => {
            let elem = type_args
                .first()
                .map(|t| llvm_type(context, t))
                .transpose()?
                .unwrap_or_else(|| context.i64_type().into());
            context
                .struct_type(
                    &[
                        elem.ptr_type(Default::default()).into(),
                        context.i64_type().into(),
                        context.i64_type().into(),
                    ],
                    false,
                )
                .into()
        }
        // Map<K,V> / Set<T> are opaque runtime-managed handles.
        Type::Generic { name, .. } if name == "Map" || name == "Set" => {
            context.ptr_type(Default::default()).into()
        }
        Type::Generic { base: Some(base), .. } => llvm_type(context, base)?,
        Type::Generic { name, .. } => {
            return Err(CodegenError::new(format!(
                "unresolved generic type `{}` reached codegen",
                name
            )))
        }

        // A runtime closure is a two-word {fn ptr, env ptr} pair.
        Type::Function { .. } => context
            .struct_type(
                &[
                    context.ptr_type(Default::default()).into(),
                    context.ptr_type(Default::default()).into(),
                ],
                false,
            )
            .into(),

        Type::Opaque { .. } => context.ptr_type(Default::default()).into(),

        Type::Trait { name, .. } => {
            return Err(CodegenError::new(format!(
                "trait object type `{}` has no direct codegen representation (dispatch is always static)",
                name
            )))
        }
        Type::TypeVariable { name } => {
            return Err(CodegenError::new(format!(
                "type variable `{}` was not resolved before codegen",
                name
            )))
        }
        Type::SelfType => {
            return Err(CodegenError::new("`Self` type was not resolved before codegen"))
        }
    })
}
