//! Conversion from Grace's primitive types and array shapes to `inkwell`
//! LLVM types.

use inkwell::context::Context;
use inkwell::types::{BasicMetadataTypeEnum, BasicTypeEnum};
use inkwell::AddressSpace;

use crate::ast::{ArrayShape, PassingMode, PrimitiveType};

pub fn llvm_scalar_type<'ctx>(ctx: &'ctx Context, ty: PrimitiveType) -> BasicTypeEnum<'ctx> {
    match ty {
        PrimitiveType::Int => ctx.i32_type().into(),
        PrimitiveType::Char => ctx.i8_type().into(),
        // `nothing` only ever appears as a return type, never as a value;
        // callers never construct a `BasicTypeEnum` for it.
        PrimitiveType::Nothing => ctx.i8_type().into(),
    }
}

/// The LLVM type used to pass a value as a formal parameter: scalars by
/// value, arrays and by-reference scalars as a pointer to the element
/// type (an open leading dimension decays to a flat pointer; trailing
/// dimensions are baked into the GEP arithmetic at each access site, not
/// into the pointee type, so every array parameter has the same pointee
/// regardless of rank).
pub fn llvm_param_type<'ctx>(
    ctx: &'ctx Context,
    ty: PrimitiveType,
    shape: &ArrayShape,
    passing: PassingMode,
) -> BasicMetadataTypeEnum<'ctx> {
    if !shape.is_scalar() || passing == PassingMode::ByReference {
        ctx.ptr_type(AddressSpace::default()).into()
    } else {
        llvm_scalar_type(ctx, ty).into()
    }
}

pub fn llvm_return_type<'ctx>(ctx: &'ctx Context, ty: PrimitiveType) -> Option<BasicTypeEnum<'ctx>> {
    match ty {
        PrimitiveType::Nothing => None,
        other => Some(llvm_scalar_type(ctx, other)),
    }
}
