//! Recursion, variables and the evaluator's inline forms.

use marginalia_foundation::{Error, ErrorKind, Result, Value};
use tracing::{debug, info};

use super::{fixed, unbracket};
use crate::contract::{ArgCount, CallContext, Category, FunctionDescriptor};

pub(super) fn descriptors() -> Vec<FunctionDescriptor> {
    use ArgCount::{Exact, Variadic};
    use Category::{ListManipulation, Other, Recursion};

    vec![
        FunctionDescriptor::builtin(
            "template",
            Recursion,
            Exact(1),
            "template(x) -- evaluates x as a template in its own variable scope, so \
             variables are not shared with the caller. Use [[ for { and ]] for } in the \
             argument.",
            native_template,
        ),
        FunctionDescriptor::builtin(
            "eval",
            Recursion,
            Exact(1),
            "eval(string) -- evaluates the string as a program, passing the local \
             variables. Assignments made by the program are visible to the caller. Use \
             [[ for { and ]] for } in the argument.",
            native_eval,
        ),
        FunctionDescriptor::builtin(
            "assign",
            Other,
            Exact(2),
            "assign(id, value) -- assigns value to id, then returns value. id must be an \
             identifier, not an expression.",
            native_assign,
        ),
        FunctionDescriptor::builtin(
            "print",
            Other,
            Variadic,
            "print(a [, b]*) -- writes the arguments to the log at info level and \
             returns the empty string.",
            native_print,
        ),
        FunctionDescriptor::inline(
            "arguments",
            Other,
            Variadic,
            "arguments(id[=expression] [, id[=expression]]*) -- used in a stored template \
             to retrieve the arguments passed in the call. Each id becomes a local \
             variable holding the argument in the same position, or the default value \
             when the call supplies fewer arguments.",
        ),
        FunctionDescriptor::inline(
            "globals",
            Other,
            Variadic,
            "globals(id[=expression] [, id[=expression]]*) -- copies the named global \
             variables into local variables, using the default value for globals that \
             are not set.",
        ),
        FunctionDescriptor::inline(
            "set_globals",
            Other,
            Variadic,
            "set_globals(id[=expression] [, id[=expression]]*) -- sets global variables \
             from the local variable of the same name, or from the expression when one \
             is given.",
        ),
        FunctionDescriptor::inline(
            "list_count_field",
            ListManipulation,
            Exact(1),
            "list_count_field(lookup_name) -- returns the number of items in the \
             multi-valued field lookup_name without converting it to a string first. \
             Single-valued fields are an error.",
        ),
    ]
}

/// A sub-evaluation's error becomes its text, the way a top-level render
/// reports it. Runaway recursion still unwinds the whole evaluation.
fn recover(ctx: &CallContext<'_>, result: Result<String>) -> Result<Value> {
    match result {
        Ok(text) => Ok(Value::Text(text)),
        Err(err) if matches!(err.kind, ErrorKind::RecursionLimit(_)) => Err(err),
        Err(err) => {
            debug!(error = %err, "sub-template failed");
            Ok(Value::Text(format!(
                "{}: {err}",
                ctx.formatter.config().error_prefix
            )))
        }
    }
}

/// Recursion: template
fn native_template(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [template] = fixed::<1>("template", args)?;
    let result = ctx
        .formatter
        .render_template(&unbracket(template), ctx.metadata, ctx.kwargs);
    recover(ctx, result)
}

/// Recursion: eval
fn native_eval(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [template] = fixed::<1>("eval", args)?;
    let result = ctx.formatter.render_eval(&unbracket(template), ctx.locals);
    recover(ctx, result)
}

/// Other: assign
fn native_assign(ctx: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    let [target, value] = fixed::<2>("assign", args)?;
    if target.is_empty() {
        return Err(Error::invalid_argument("assign", "the target must be an identifier"));
    }
    ctx.locals.set(target.clone(), value.clone());
    Ok(Value::Text(value.clone()))
}

/// Other: print
fn native_print(_: &mut CallContext<'_>, args: &[String]) -> Result<Value> {
    info!(target: "marginalia::print", "{args:?}");
    Ok(Value::empty())
}

#[cfg(test)]
mod tests {
    use marginalia_foundation::{Error, ErrorKind, Kwargs, Locals, Metadata, Result};

    use crate::contract::Formatter;
    use crate::testing::{TestFormatter, builtin, call_in, run};

    #[test]
    fn template_renders_in_isolation() {
        let mut locals = Locals::new();
        locals.set("x", "outer");
        let out = call_in(
            &TestFormatter::default(),
            &builtin("template"),
            None,
            &mut locals,
            &["[[title]]"],
        );
        assert_eq!(out.unwrap(), "<{title}>");
        assert_eq!(locals.len(), 1);
    }

    #[test]
    fn eval_shares_the_caller_scope() {
        let mut locals = Locals::new();
        locals.set("greeting", "hello");
        let out = call_in(
            &TestFormatter::default(),
            &builtin("eval"),
            None,
            &mut locals,
            &["[[greeting]]"],
        );
        assert_eq!(out.unwrap(), "hello");
    }

    #[test]
    fn assign_sets_and_returns() {
        let mut locals = Locals::new();
        let out = call_in(
            &TestFormatter::default(),
            &builtin("assign"),
            None,
            &mut locals,
            &["x", "42"],
        );
        assert_eq!(out.unwrap(), "42");
        assert_eq!(locals.get("x"), Some("42"));
    }

    #[test]
    fn print_returns_nothing() {
        assert_eq!(run("print", &["a", "b"]).unwrap(), "");
    }

    /// Fails every sub-evaluation with the given error.
    #[derive(Debug, Default)]
    struct Failing {
        inner: TestFormatter,
        recursion: bool,
    }

    impl Failing {
        fn error(&self) -> Error {
            if self.recursion {
                Error::new(ErrorKind::RecursionLimit(32))
            } else {
                Error::new(ErrorKind::DivisionByZero)
            }
        }
    }

    impl Formatter for Failing {
        fn render_template(
            &self,
            _: &str,
            _: Option<&dyn Metadata>,
            _: &Kwargs,
        ) -> Result<String> {
            Err(self.error())
        }

        fn render_eval(&self, _: &str, _: &mut Locals) -> Result<String> {
            Err(self.error())
        }

        fn render_with_value(&self, template: &str, value: &str) -> Result<String> {
            self.inner.render_with_value(template, value)
        }

        fn run_compiled(
            &self,
            name: &str,
            function: &crate::contract::CompiledNative,
            args: &[String],
            metadata: Option<&dyn Metadata>,
        ) -> Result<marginalia_foundation::Value> {
            self.inner.run_compiled(name, function, args, metadata)
        }

        fn run_stored(
            &self,
            name: &str,
            kind: crate::contract::ObjectType,
            source: &str,
            args: &[String],
            metadata: Option<&dyn Metadata>,
        ) -> Result<marginalia_foundation::Value> {
            self.inner.run_stored(name, kind, source, args, metadata)
        }

        fn config(&self) -> &marginalia_foundation::FormatterConfig {
            self.inner.config()
        }
    }

    #[test]
    fn sub_evaluation_errors_become_text() {
        let formatter = Failing::default();
        let mut locals = Locals::new();
        let out = call_in(&formatter, &builtin("template"), None, &mut locals, &["{x}"]);
        assert_eq!(out.unwrap(), "TEMPLATE ERROR: division by zero");
        let out = call_in(&formatter, &builtin("eval"), None, &mut locals, &["{x}"]);
        assert_eq!(out.unwrap(), "TEMPLATE ERROR: division by zero");
    }

    #[test]
    fn recursion_limit_propagates() {
        let formatter = Failing {
            recursion: true,
            ..Failing::default()
        };
        let mut locals = Locals::new();
        let err = call_in(&formatter, &builtin("template"), None, &mut locals, &["{x}"])
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::RecursionLimit(32)));
    }

    #[test]
    fn inline_forms_refuse_direct_calls() {
        for name in ["arguments", "globals", "set_globals", "list_count_field"] {
            assert!(run(name, &["x"]).is_err(), "{name} ran outside the evaluator");
        }
    }
}
