//! Declares the runtime library's `extern "C"` prototypes and emits the
//! `ascii` compatibility thunk.
//!
//! These names are also seeded into the symbol table before the outermost
//! function is checked, so calls to them resolve during semantic analysis;
//! here the equivalent job is declaring the LLVM functions those calls
//! ultimately resolve to.

use inkwell::module::Linkage;
use inkwell::AddressSpace;

use super::CodegenContext;

/// Names that skip the `user_` prefix and argument-threading rewrite
/// codegen applies to every user-defined function.
pub const LIBRARY_NAMES: &[&str] = &[
    "writeInteger",
    "writeChar",
    "writeString",
    "readInteger",
    "readChar",
    "readString",
    "ord",
    "chr",
    "strlen",
    "strcmp",
    "strcpy",
    "strcat",
    "ascii",
];

pub fn is_library_function(name: &str) -> bool {
    LIBRARY_NAMES.contains(&name)
}

pub fn declare_library<'ctx>(ctx: &CodegenContext<'ctx>) {
    let i32t = ctx.context.i32_type();
    let i8t = ctx.context.i8_type();
    let voidt = ctx.context.void_type();
    let ptr = ctx.context.ptr_type(AddressSpace::default());

    macro_rules! extern_fn {
        ($name:expr, $ret:expr, [$($arg:expr),*]) => {{
            let fn_type = $ret.fn_type(&[$($arg.into()),*], false);
            ctx.module.add_function($name, fn_type, Some(Linkage::External));
        }};
    }

    extern_fn!("writeInteger", voidt, [i32t]);
    extern_fn!("writeChar", voidt, [i8t]);
    extern_fn!("writeString", voidt, [ptr]);
    extern_fn!("readInteger", i32t, []);
    extern_fn!("readChar", i8t, []);
    extern_fn!("readString", voidt, [i32t, ptr]);
    extern_fn!("ord", i32t, [i8t]);
    extern_fn!("chr", i8t, [i32t]);
    extern_fn!("strlen", i32t, [ptr]);
    extern_fn!("strcmp", i32t, [ptr, ptr]);
    extern_fn!("strcpy", voidt, [ptr, ptr]);
    extern_fn!("strcat", voidt, [ptr, ptr]);

    // `ascii` is canonicalized to `ord`: emit it as a thunk rather than a
    // second extern symbol so both names are always available to call
    // sites regardless of which the runtime library itself actually
    // exports.
    let ord = ctx.module.get_function("ord").expect("ord just declared");
    let ascii_type = i32t.fn_type(&[i8t.into()], false);
    let ascii = ctx.module.add_function("ascii", ascii_type, None);
    let entry = ctx.context.append_basic_block(ascii, "entry");
    ctx.builder.position_at_end(entry);
    let arg = ascii.get_nth_param(0).expect("ascii has one parameter");
    let result = ctx
        .builder
        .build_call(ord, &[arg.into()], "ascii_call")
        .expect("build ascii->ord call");
    let result_value = result
        .try_as_basic_value()
        .left()
        .expect("ord returns a value");
    ctx.builder
        .build_return(Some(&result_value))
        .expect("build ascii return");
}
