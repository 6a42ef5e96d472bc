//! Declarations for the runtime-library interface (spec §4.7). This crate
//! never defines these symbols — they are the runtime library's job.

use super::types::string_type;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::AddressSpace;

pub fn declare_all<'ctx>(context: &'ctx Context, module: &Module<'ctx>) {
    let i32t = context.i32_type();
    let i64t = context.i64_type();
    let ptr = context.ptr_type(AddressSpace::default());
    let void = context.void_type();
    let strt = string_type(context);

    module.add_function("printf", i32t.fn_type(&[ptr.into()], true), None);
    module.add_function("malloc", ptr.fn_type(&[i64t.into()], false), None);
    module.add_function("free", void.fn_type(&[ptr.into()], false), None);

    module.add_function("pyrite_print_int", void.fn_type(&[i32t.into()], false), None);
    module.add_function("pyrite_panic", void.fn_type(&[strt.into()], false), None);
    module.add_function(
        "pyrite_check_bounds",
        void.fn_type(&[i64t.into(), i64t.into()], false),
        None,
    );
    module.add_function("pyrite_assert", void.fn_type(&[context.bool_type().into(), strt.into()], false), None);
    module.add_function("pyrite_fail", void.fn_type(&[strt.into()], false), None);

    for op in ["list_new", "list_push", "list_get", "list_set", "list_len"] {
        module.add_function(op, ptr.fn_type(&[ptr.into(), i64t.into()], true), None);
    }
    for op in ["map_new", "map_get", "map_set", "map_len"] {
        module.add_function(op, ptr.fn_type(&[ptr.into(), ptr.into()], true), None);
    }
    for op in ["set_new", "set_add", "set_contains", "set_len"] {
        module.add_function(op, ptr.fn_type(&[ptr.into(), ptr.into()], true), None);
    }
}
