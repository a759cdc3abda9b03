//! The function side of the Marginalia template language.
//!
//! This crate provides:
//! - [`FunctionDescriptor`] - The contract every callable implements
//! - [`FunctionRegistry`] - Builtins plus per-library user functions, with
//!   conflict placeholders for disagreeing definitions
//! - [`compile_user_function`] - Turning stored definitions into descriptors
//! - [`builtins::all`] - The builtin library
//!
//! Functions re-enter the evaluator through the [`Formatter`] trait, which
//! `marginalia_formatter` implements.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builtins;
pub mod compiler;
pub mod contract;
pub mod registry;
pub mod support;

pub use compiler::{
    PROGRAM_PREFIX, TEMPLATE_PREFIX, UserFunctionDef, compile_user_function,
    compile_user_template_functions, load_user_template_functions, object_type_of,
    unload_user_template_functions,
};
pub use contract::{
    ArgCount, BuiltinFn, CallContext, Category, CompiledNative, Formatter, FunctionBody,
    FunctionDescriptor, ObjectType,
};
pub use registry::{FunctionRegistry, Snapshot, same_function};
