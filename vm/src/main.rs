use clap::{Parser as ClapParser, ValueEnum};
use std::{process, sync::Arc};

use bytecode::{disassemble, Bytecode, BytecodeBuilder};
use object::special::NUMBER_RAW;
use object::{new_compiled_method, unbox_number, Class, FrameRef, Instance, Value};

use vm::primitives::BuiltinDesc;
use vm::{Interpreter, RuntimeError, VmSettings, MAX_FRAMES, VM};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Program to run
    #[arg(value_enum, default_value_t = Demo::Point)]
    demo: Demo,

    /// Call depth limit per thread
    #[arg(long, default_value_t = MAX_FRAMES, help = "Maximum frames per call thread")]
    max_frames: usize,

    /// Fail on unrecognized primitive keywords
    #[arg(long, help = "Treat unknown primitive keywords as errors")]
    strict_primitives: bool,

    /// Print the program's bytecode instead of executing it
    #[arg(long, help = "Dump bytecode for the selected demo")]
    dump_bytecode: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Demo {
    /// Define Point>>x, y, setX:y:, + and add two points
    Point,
    /// Leave a method early from inside a nested block
    NonLocalReturn,
    /// Recurse until the call depth limit is hit
    Recursion,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let settings = VmSettings {
        max_frames: cli.max_frames,
        strict_primitives: cli.strict_primitives,
        ..VmSettings::default()
    };
    let mut vm = match VM::bootstrap(settings) {
        Ok(vm) => vm,
        Err(err) => {
            eprintln!("Error bootstrapping kernel: {}", err);
            process::exit(1);
        }
    };
    vm.builtins.register(BuiltinDesc::new("numberAdd", number_add));
    if cli.demo == Demo::Point {
        if let Err(err) = install_point(&vm) {
            eprintln!("Error installing Point: {}", err);
            process::exit(1);
        }
    }

    let program = match cli.demo {
        Demo::Point => point_program(),
        Demo::NonLocalReturn => escape_program(),
        Demo::Recursion => recursion_program(),
    };

    if cli.dump_bytecode {
        println!("== {:?} ==", cli.demo);
        print!("{}", disassemble(&program));
        return;
    }

    let vm = Arc::new(vm);
    let mut interp = Interpreter::new(vm);
    match interp.run(program, Value::Nil) {
        Ok(value) => print_value(&value),
        Err(err) => {
            eprintln!(
                "Error executing {:?} at depth {}: {}",
                cli.demo,
                interp.thread().depth(),
                err
            );
            process::exit(1);
        }
    }
}

fn print_value(value: &Value) {
    match unbox_number(value) {
        Some(n) => println!("{n}"),
        None => println!("{value:?}"),
    }
}

/// Host builtin: the receiver Number plus the argument Number.
fn number_add(interp: &mut Interpreter, frame: FrameRef) -> Result<(), RuntimeError> {
    let f = interp.frame(frame).ok_or(RuntimeError::NoActiveFrame)?;
    let receiver = f.receiver();
    let arg = f.local(1)?;
    let (Some(a), Some(b)) = (unbox_number(&receiver), unbox_number(&arg)) else {
        return Err(RuntimeError::TypeError {
            expected: "Number",
            got: if unbox_number(&receiver).is_none() { receiver } else { arg },
        });
    };
    let class = interp.vm().classes.require("Number")?;
    let sum = Instance::new(&class);
    sum.set_slot(NUMBER_RAW, Value::Number(a + b))
        .map_err(|_| RuntimeError::TypeError {
            expected: "Number with a raw slot",
            got: Value::Class(class.clone()),
        })?;
    interp
        .frame_mut(frame)
        .ok_or(RuntimeError::NoActiveFrame)?
        .push(Value::Object(sum));
    Ok(())
}

/// Host-side setup for the `Point` demo: the `Point` class and a
/// `Number>>+` backed by the `numberAdd` builtin.
fn install_point(vm: &VM) -> Result<(), RuntimeError> {
    let root = vm.classes.require("Object")?;
    vm.classes.install(Class::new("Point", Some(root), 2));

    let number = vm.classes.require("Number")?;
    let compiled_method = vm.classes.require("CompiledMethod")?;
    let mut b = BytecodeBuilder::new();
    b.builtin("numberAdd");
    b.answer();
    let add = new_compiled_method(&compiled_method, b.into_bytecode(), "+", 1, 0)
        .map_err(|_| RuntimeError::TypeError {
            expected: "CompiledMethod with method slots",
            got: Value::Class(compiled_method.clone()),
        })?;
    number.define_method("+", add);
    Ok(())
}

/// Evaluates `((Point new setX: 1 y: 2) + (Point new setX: 3 y: 4)) y`
/// after compiling the `Point` methods at run time.
fn point_program() -> Bytecode {
    let mut b = BytecodeBuilder::new();
    // Point>>x  ^x
    b.push_global("Point");
    b.method("x", 0, 0, |m| {
        m.push_inst_var(0);
        m.answer();
    });
    b.send("addMethod:", 2);
    b.drop();
    // Point>>y  ^y
    b.push_global("Point");
    b.method("y", 0, 0, |m| {
        m.push_inst_var(1);
        m.answer();
    });
    b.send("addMethod:", 2);
    b.drop();
    // Point>>setX: ax y: ay  x := ax. y := ay
    b.push_global("Point");
    b.method("setX:y:", 2, 0, |m| {
        m.push_local(1);
        m.store_inst_var(0);
        m.push_local(2);
        m.store_inst_var(1);
        m.answer_self();
    });
    b.send("addMethod:", 2);
    b.drop();
    // Point>>+ other  ^Point new setX: x + other x y: y + other y
    b.push_global("Point");
    b.method("+", 1, 0, |m| {
        m.push_global("Point");
        m.send("basicNew", 1);
        m.push_inst_var(0);
        m.push_local(1);
        m.send("x", 1);
        m.send("+", 2);
        m.push_inst_var(1);
        m.push_local(1);
        m.send("y", 1);
        m.send("+", 2);
        m.send("setX:y:", 3);
        m.answer();
    });
    b.send("addMethod:", 2);
    b.drop();

    point_literal(&mut b, 1.0, 2.0);
    point_literal(&mut b, 3.0, 4.0);
    b.send("+", 2);
    b.send("y", 1);
    b.answer();
    b.into_bytecode()
}

fn point_literal(b: &mut BytecodeBuilder, x: f64, y: f64) {
    b.push_global("Point");
    b.send("basicNew", 1);
    b.push_literal(x);
    b.push_literal(y);
    b.send("setX:y:", 3);
}

/// `Object>>detect` answers 42 from inside a block nested in a block; the
/// trailing `^'unreachable'` never runs.
fn escape_program() -> Bytecode {
    let mut b = BytecodeBuilder::new();
    b.push_global("Object");
    b.method("detect", 0, 0, |m| {
        m.block(0, 1, |outer| {
            outer.block(0, 1, |inner| {
                inner.push_literal(42.0);
                inner.answer_block();
            });
            outer.send("value", 1);
        });
        m.send("value", 1);
        m.drop();
        m.push_literal("unreachable");
        m.answer();
    });
    b.send("addMethod:", 2);
    b.drop();
    b.push_global("Object");
    b.send("basicNew", 1);
    b.send("detect", 1);
    b.answer();
    b.into_bytecode()
}

/// `Object>>recurse  ^self recurse`
fn recursion_program() -> Bytecode {
    let mut b = BytecodeBuilder::new();
    b.push_global("Object");
    b.method("recurse", 0, 0, |m| {
        m.push_self();
        m.send("recurse", 1);
        m.answer();
    });
    b.send("addMethod:", 2);
    b.drop();
    b.push_global("Object");
    b.send("basicNew", 1);
    b.send("recurse", 1);
    b.answer();
    b.into_bytecode()
}
