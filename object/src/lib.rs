mod boxing;
mod class;
mod executable;
mod handle;
mod lookup;
mod objects;
mod registry;
pub mod special;
mod value;

pub use boxing::{box_literal, unbox_number, unbox_str, MissingGlobal};
pub use class::{Class, ClassRef, SuperclassChain};
pub use executable::{new_block_closure, new_compiled_method, ClosureInfo, MethodInfo};
pub use handle::{FrameRef, ThreadId};
pub use lookup::{class_of, lookup, LookupResult};
pub use objects::{Instance, ObjectRef, SlotOutOfRange};
pub use registry::ClassRegistry;
pub use value::Value;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytecode::{BytecodeBuilder, Literal};

    use super::special::*;
    use super::*;

    fn kernel() -> ClassRegistry {
        let registry = ClassRegistry::new();
        let object = Class::new(names::OBJECT, None, 0);
        registry.install(object.clone());
        registry.install(Class::new(names::STRING, Some(object.clone()), 1));
        registry.install(Class::new(names::NUMBER, Some(object.clone()), 1));
        registry.install(Class::new(names::TRUE, Some(object.clone()), 0));
        registry.install(Class::new(names::FALSE, Some(object.clone()), 0));
        registry.install(Class::new(
            names::COMPILED_METHOD,
            Some(object.clone()),
            METHOD_SLOT_COUNT,
        ));
        registry.install(Class::new(names::BLOCK_CLOSURE, Some(object), CLOSURE_SLOT_COUNT));
        registry
    }

    fn method(registry: &ClassRegistry, selector: &str, argc: usize) -> ObjectRef {
        let class = registry.get(names::COMPILED_METHOD).expect("kernel class");
        let mut b = BytecodeBuilder::new();
        b.answer_self();
        new_compiled_method(&class, b.into_bytecode(), selector, argc, 0).expect("method")
    }

    // ── Instances ──────────────────────────────────────────────────

    #[test]
    fn instance_slot_count_matches_class() {
        let point = Class::new("Point", None, 2);
        let p = Instance::new(&point);
        assert_eq!(p.slot_count(), 2);
        assert!(p.slot(0).expect("slot").is_nil());
        assert!(p.slot(2).is_none());
    }

    #[test]
    fn set_slot_out_of_range_keeps_length() {
        let point = Class::new("Point", None, 2);
        let p = Instance::new(&point);
        p.set_slot(1, Value::Int(7)).expect("in range");
        let err = p.set_slot(2, Value::Int(8)).expect_err("out of range");
        assert_eq!(err, SlotOutOfRange { index: 2, len: 2 });
        assert_eq!(p.slot_count(), 2);
        assert_eq!(p.slot(1), Some(Value::Int(7)));
    }

    // ── Lookup ─────────────────────────────────────────────────────

    #[test]
    fn lookup_walks_superclass_chain() {
        let registry = kernel();
        let object = registry.get(names::OBJECT).expect("Object");
        let shape = Class::new("Shape", Some(object.clone()), 0);
        let circle = Class::new("Circle", Some(shape.clone()), 1);
        let area = method(&registry, "area", 0);
        shape.define_method("area", area.clone());

        match lookup(&circle, "area") {
            LookupResult::Found { holder, method, depth } => {
                assert!(Arc::ptr_eq(&holder, &shape));
                assert!(Arc::ptr_eq(&method, &area));
                assert_eq!(depth, 1);
            }
            LookupResult::None => panic!("expected area to resolve"),
        }
        assert!(!lookup(&circle, "perimeter").is_found());
    }

    #[test]
    fn lookup_first_match_wins() {
        let registry = kernel();
        let object = registry.get(names::OBJECT).expect("Object");
        let shape = Class::new("Shape", Some(object), 0);
        let square = Class::new("Square", Some(shape.clone()), 0);
        shape.define_method("name", method(&registry, "name", 0));
        let own = method(&registry, "name", 0);
        square.define_method("name", own.clone());

        match lookup(&square, "name") {
            LookupResult::Found { method, depth, .. } => {
                assert!(Arc::ptr_eq(&method, &own));
                assert_eq!(depth, 0);
            }
            LookupResult::None => panic!("expected name to resolve"),
        }
    }

    #[test]
    fn superclass_chain_ends_at_root() {
        let root = Class::new("Root", None, 0);
        let mid = Class::new("Mid", Some(root.clone()), 0);
        let leaf = Class::new("Leaf", Some(mid), 0);
        let names: Vec<String> = SuperclassChain::new(&leaf)
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, ["Leaf", "Mid", "Root"]);
        assert!(leaf.inherits_from(&root));
        assert!(!root.inherits_from(&leaf));
    }

    #[test]
    fn class_of_class_object_uses_metaclass() {
        let registry = kernel();
        let true_class = registry.get(names::TRUE).expect("True");
        let singleton = Class::with_metaclass("true", None, 0, true_class.clone());
        let class = class_of(&Value::Class(singleton), &registry).expect("class");
        assert!(Arc::ptr_eq(&class, &true_class));
        assert!(class_of(&Value::Int(1), &registry).is_none());
    }

    // ── Boxing ─────────────────────────────────────────────────────

    #[test]
    fn string_literals_are_not_interned() {
        let registry = kernel();
        let lit = Literal::from("hello");
        let a = box_literal(&lit, &registry).expect("box");
        let b = box_literal(&lit, &registry).expect("box");
        assert!(!a.is_identical(&b));
        assert_eq!(unbox_str(&a).as_deref(), Some("hello"));
        assert_eq!(unbox_str(&a), unbox_str(&b));
    }

    #[test]
    fn number_literal_boxes_raw_value() {
        let registry = kernel();
        let v = box_literal(&Literal::Number(2.5), &registry).expect("box");
        let obj = v.as_object().expect("instance");
        assert_eq!(obj.class().name(), names::NUMBER);
        assert_eq!(unbox_number(&v), Some(2.5));
    }

    #[test]
    fn booleans_map_to_singletons() {
        let registry = kernel();
        let a = box_literal(&Literal::Bool(true), &registry).expect("box");
        let b = box_literal(&Literal::Bool(true), &registry).expect("box");
        assert!(a.as_class().is_some());
        assert!(a.is_identical(&b));
        let f = box_literal(&Literal::Bool(false), &registry).expect("box");
        assert!(!a.is_identical(&f));
    }

    #[test]
    fn boxing_without_string_class_fails() {
        let registry = ClassRegistry::new();
        assert!(registry.is_empty());
        let err = box_literal(&Literal::from("x"), &registry).expect_err("missing");
        assert_eq!(err.name, names::STRING);
        assert!(matches!(box_literal(&Literal::Nil, &registry), Ok(Value::Nil)));
    }

    // ── Executables ────────────────────────────────────────────────

    #[test]
    fn compiled_method_locals_count() {
        let registry = kernel();
        let class = registry.get(names::COMPILED_METHOD).expect("kernel class");
        let m = new_compiled_method(&class, BytecodeBuilder::new().into_bytecode(), "at:put:", 2, 1)
            .expect("method");
        let info = MethodInfo::read(&m).expect("well formed");
        assert_eq!(info.locals, 4);
        assert_eq!(info.argc, 2);
        assert_eq!(&*info.selector, "at:put:");
    }

    #[test]
    fn closure_fields_round_trip() {
        let registry = kernel();
        let class = registry.get(names::BLOCK_CLOSURE).expect("kernel class");
        let creator = FrameRef::new(ThreadId(1), 3, 9);
        let home = FrameRef::new(ThreadId(1), 1, 2);
        let c = new_block_closure(
            &class,
            BytecodeBuilder::new().into_bytecode(),
            2,
            1,
            creator,
            home,
        )
        .expect("closure");
        let info = ClosureInfo::read(&c).expect("well formed");
        assert_eq!(info.creator, creator);
        assert_eq!(info.home, home);
        assert_eq!((info.argc, info.arg_start), (2, 1));
    }

    #[test]
    fn executable_needs_enough_slots() {
        let tiny = Class::new(names::COMPILED_METHOD, None, 2);
        let err = new_compiled_method(&tiny, BytecodeBuilder::new().into_bytecode(), "x", 0, 0)
            .expect_err("too few slots");
        assert_eq!(err.index, METHOD_ARGC);
    }
}
