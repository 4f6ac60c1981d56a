use bytecode::BytecodeBuilder;
use object::special::{names, CLOSURE_SLOT_COUNT, METHOD_SLOT_COUNT, NUMBER_RAW, STRING_RAW};
use object::{new_compiled_method, Class, ClassRef, ClassRegistry, SlotOutOfRange};

use crate::interpreter::block_value_selector;

/// Largest argument count with a kernel `value…` method.
pub const MAX_BLOCK_ARGS: usize = 3;

/// Build the kernel class registry.
///
/// Installs the classes the interpreter itself resolves (`String`, `Number`,
/// `BlockClosure`, `CompiledMethod`, the `true`/`false` singletons,
/// `UndefinedObject`, `Class`) under `Object`, plus the kernel methods that
/// route closure invocation, method installation, instantiation and
/// identity through the builtin table.
pub fn bootstrap() -> Result<ClassRegistry, SlotOutOfRange> {
    let registry = ClassRegistry::new();

    let object = Class::new(names::OBJECT, None, 0);
    let class = Class::new(names::CLASS, Some(object.clone()), 0);
    let undefined = Class::new(names::UNDEFINED_OBJECT, Some(object.clone()), 0);
    let string = Class::new(names::STRING, Some(object.clone()), STRING_RAW + 1);
    let number = Class::new(names::NUMBER, Some(object.clone()), NUMBER_RAW + 1);
    let boolean = Class::new(names::BOOLEAN, Some(object.clone()), 0);
    let true_class = Class::new(names::TRUE_CLASS, Some(boolean.clone()), 0);
    let false_class = Class::new(names::FALSE_CLASS, Some(boolean.clone()), 0);
    let true_obj = Class::with_metaclass(names::TRUE, None, 0, true_class.clone());
    let false_obj = Class::with_metaclass(names::FALSE, None, 0, false_class.clone());
    let block_closure = Class::new(names::BLOCK_CLOSURE, Some(object.clone()), CLOSURE_SLOT_COUNT);
    let compiled_method =
        Class::new(names::COMPILED_METHOD, Some(object.clone()), METHOD_SLOT_COUNT);

    for c in [
        &object,
        &class,
        &undefined,
        &string,
        &number,
        &boolean,
        &true_class,
        &false_class,
        &true_obj,
        &false_obj,
        &block_closure,
        &compiled_method,
    ] {
        registry.install(c.clone());
    }

    for argc in 0..=MAX_BLOCK_ARGS {
        define_builtin_method(
            &block_closure,
            &compiled_method,
            &block_value_selector(argc),
            argc,
            "blockValue",
            true,
        )?;
    }
    define_builtin_method(&class, &compiled_method, "addMethod:", 1, "addMethod", false)?;
    define_builtin_method(&class, &compiled_method, "basicNew", 0, "basicNew", true)?;
    define_builtin_method(&object, &compiled_method, "==", 1, "identical", true)?;

    log::debug!("kernel bootstrapped with {} globals", registry.len());
    Ok(registry)
}

/// Install `holder>>selector` whose body calls `builtin` and then answers
/// either the builtin's result or self.
fn define_builtin_method(
    holder: &ClassRef,
    compiled_method: &ClassRef,
    selector: &str,
    argc: usize,
    builtin: &str,
    answers_result: bool,
) -> Result<(), SlotOutOfRange> {
    let mut b = BytecodeBuilder::new();
    b.builtin(builtin);
    if answers_result {
        b.answer();
    } else {
        b.answer_self();
    }
    let method = new_compiled_method(compiled_method, b.into_bytecode(), selector, argc, 0)?;
    holder.define_method(selector, method);
    Ok(())
}
