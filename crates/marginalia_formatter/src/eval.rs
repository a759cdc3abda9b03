//! Tree-walking evaluation of parsed templates.
//!
//! An [`Evaluator`] runs one template or program against one variable scope.
//! Calls go through the function snapshot the enclosing render took; the
//! inline forms (`arguments`, `globals`, `set_globals`, `list_count_field`)
//! need the unevaluated argument expressions and are handled here instead of
//! by their descriptors.

use std::sync::Arc;

use marginalia_foundation::{
    Error, ErrorKind, FieldInfo, FieldValue, Kwargs, Locals, Metadata, Result, format_float,
};
use marginalia_functions::support::{patterns, text};
use marginalia_functions::{CallContext, Formatter, FunctionDescriptor, Snapshot};
use marginalia_language::{
    ArithOp, Block, CompareOp, Expr, FieldRef, FieldSpec, Program, Segment, Template,
};

use crate::formatter::TemplateFormatter;

/// Where `$name` and `{name}` find their values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FieldMode {
    /// The book's metadata, falling back to the raw arguments.
    Book,
    /// The variable scope, as `eval` and `render_with_value` use it.
    Variables,
}

pub(crate) struct Evaluator<'a> {
    formatter: &'a TemplateFormatter,
    functions: Arc<Snapshot>,
    metadata: Option<&'a dyn Metadata>,
    kwargs: &'a Kwargs,
    locals: &'a mut Locals,
    mode: FieldMode,
    /// Arguments of the stored function being run, read by `arguments()`.
    arguments: &'a [String],
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        formatter: &'a TemplateFormatter,
        metadata: Option<&'a dyn Metadata>,
        kwargs: &'a Kwargs,
        locals: &'a mut Locals,
        mode: FieldMode,
    ) -> Self {
        Self {
            functions: formatter.functions(),
            formatter,
            metadata,
            kwargs,
            locals,
            mode,
            arguments: &[],
        }
    }

    pub(crate) fn with_arguments(mut self, arguments: &'a [String]) -> Self {
        self.arguments = arguments;
        self
    }

    /// Evaluator for a `{field:'program'}` body: same book, its own scope.
    fn nested<'b>(&'b self, locals: &'b mut Locals) -> Evaluator<'b> {
        Evaluator {
            formatter: self.formatter,
            functions: Arc::clone(&self.functions),
            metadata: self.metadata,
            kwargs: self.kwargs,
            locals,
            mode: self.mode,
            arguments: &[],
        }
    }

    pub(crate) fn run(&mut self, template: &Template) -> Result<String> {
        match template {
            Template::Program(program) => self.program(program),
            Template::Segments(segments) => {
                let mut out = String::new();
                for segment in segments {
                    match segment {
                        Segment::Text(text) => out.push_str(text),
                        Segment::Field(field) => out.push_str(&self.segment(field)?),
                    }
                }
                Ok(out)
            }
        }
    }

    pub(crate) fn program(&mut self, program: &Program) -> Result<String> {
        self.block(program)
    }

    // =========================================================================
    // Template Mode
    // =========================================================================

    fn segment(&mut self, field: &FieldRef) -> Result<String> {
        let value = self.field(&field.name)?;
        match &field.spec {
            FieldSpec::Plain => Ok(value),
            FieldSpec::Format {
                format,
                prefix,
                suffix,
            } => {
                if value.is_empty() {
                    return Ok(value);
                }
                let formatted = if format.is_empty() {
                    value
                } else {
                    self.formatter.format_value(&value, format)?
                };
                Ok(decorate(formatted, prefix, suffix))
            }
            FieldSpec::Function {
                name,
                args,
                prefix,
                suffix,
            } => {
                let function = self.lookup(name)?;
                if function.is_inline() {
                    return Err(Error::invalid_argument(
                        name,
                        "can only be used in a program",
                    ));
                }
                let mut values = Vec::with_capacity(args.len() + 1);
                values.push(value);
                values.extend(args.iter().cloned());
                let result = self.apply(&function, &values)?;
                Ok(decorate(result, prefix, suffix))
            }
            FieldSpec::Program(program) => {
                let mut scope = Locals::with_value(value);
                self.nested(&mut scope).program(program)
            }
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    fn variable(&self, name: &str) -> Result<String> {
        self.locals
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| Error::new(ErrorKind::UnknownIdentifier(name.to_string())))
    }

    fn field(&self, name: &str) -> Result<String> {
        if self.mode == FieldMode::Variables {
            return self.variable(name);
        }
        let from_kwargs = |err: Error| self.kwargs.get(name).map(str::to_string).ok_or(err);
        match self.metadata {
            Some(metadata) => match self.formatter.field_value(name, metadata) {
                Err(err) if matches!(err.kind, ErrorKind::UnknownField(_)) => from_kwargs(err),
                other => other,
            },
            None => from_kwargs(Error::new(ErrorKind::UnknownField(name.to_string()))),
        }
    }

    /// `$$name`: the stored value without display formatting.
    fn raw_field(&self, name: &str) -> Result<String> {
        let (FieldMode::Book, Some(metadata)) = (self.mode, self.metadata) else {
            return self.field(name);
        };
        let key = name.trim().to_lowercase();
        match metadata.get(&key) {
            Some(FieldValue::List(items)) => {
                let separator = metadata
                    .field_info(&key)
                    .as_ref()
                    .map_or_else(|| ", ".to_string(), FieldInfo::display_separator);
                Ok(items.join(&separator))
            }
            Some(value) => Ok(value.render(", ")),
            None if metadata.all_field_keys().contains(&key) => Ok(String::new()),
            None => Err(Error::new(ErrorKind::UnknownField(name.to_string()))),
        }
    }

    fn lookup(&self, name: &str) -> Result<Arc<FunctionDescriptor>> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::UnknownFunction(name.to_string())))
    }

    // =========================================================================
    // Program Mode
    // =========================================================================

    fn block(&mut self, block: &Block) -> Result<String> {
        let mut last = String::new();
        for statement in &block.statements {
            last = self.eval(statement)?;
        }
        Ok(last)
    }

    fn eval(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Literal(text, _) => Ok(text.clone()),
            Expr::Variable(name, _) => self.variable(name),
            Expr::Field {
                name, raw: false, ..
            } => self.field(name),
            Expr::Field { name, raw: true, .. } => self.raw_field(name),
            Expr::Assign { name, value, .. } => {
                let value = self.eval(value)?;
                self.locals.set(name.clone(), value.clone());
                Ok(value)
            }
            Expr::Call { name, args, .. } => self.call(name, args),
            Expr::And(left, right, _) => Ok(flag(
                !self.eval(left)?.is_empty() && !self.eval(right)?.is_empty(),
            )),
            Expr::Or(left, right, _) => Ok(flag(
                !self.eval(left)?.is_empty() || !self.eval(right)?.is_empty(),
            )),
            Expr::Not(operand, _) => Ok(flag(self.eval(operand)?.is_empty())),
            Expr::Negate(operand, _) => {
                let value = self.eval(operand)?;
                Ok(render_number(-text::number("-", &value)?))
            }
            Expr::Compare {
                op, left, right, ..
            } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                compare(*op, &left, &right).map(flag)
            }
            Expr::Arith {
                op, left, right, ..
            } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                arithmetic(*op, &left, &right)
            }
            Expr::Matches { pattern, value, .. } => {
                let pattern = self.eval(pattern)?;
                let value = self.eval(value)?;
                patterns::is_match(&pattern, &value).map(flag)
            }
            Expr::If {
                branches,
                otherwise,
                ..
            } => {
                for branch in branches {
                    if !self.eval(&branch.condition)?.is_empty() {
                        return self.block(&branch.body);
                    }
                }
                match otherwise {
                    Some(block) => self.block(block),
                    None => Ok(String::new()),
                }
            }
            Expr::For {
                var,
                list,
                separator,
                body,
                ..
            } => {
                let list = self.eval(list)?;
                let separator = match separator {
                    Some(separator) => self.eval(separator)?,
                    None => ",".to_string(),
                };
                let mut last = String::new();
                for item in text::split_items(&list, &separator) {
                    self.locals.set(var.clone(), item);
                    last = self.block(body)?;
                }
                Ok(last)
            }
        }
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<String> {
        let function = self.lookup(name)?;
        if function.is_inline() {
            return self.inline(&function.name, args).map_err(|e| e.in_frame(name));
        }
        if function.is_builtin() && is_lazy(name, args.len()) {
            return self.lazy(name, args).map_err(|e| e.in_frame(name));
        }
        let values = args
            .iter()
            .enumerate()
            .map(|(position, arg)| match arg {
                Expr::Variable(target, _) if position == 0 && names_target(&function) => {
                    Ok(target.clone())
                }
                _ => self.eval(arg),
            })
            .collect::<Result<Vec<_>>>()?;
        self.apply(&function, &values)
    }

    fn apply(&mut self, function: &FunctionDescriptor, args: &[String]) -> Result<String> {
        let mut ctx = CallContext::new(self.formatter, self.kwargs, self.metadata, &mut *self.locals);
        function
            .eval_(&mut ctx, args)
            .map_err(|e| e.in_frame(&function.name))
    }

    /// Builtins whose unchosen arguments are never evaluated.
    fn lazy(&mut self, name: &str, args: &[Expr]) -> Result<String> {
        match name {
            "first_non_empty" => {
                for arg in args {
                    let value = self.eval(arg)?;
                    if !value.is_empty() {
                        return Ok(value);
                    }
                }
                Ok(String::new())
            }
            "switch" => {
                let Some((value, rest)) = args.split_first() else {
                    return Err(Error::internal("switch without a value"));
                };
                let value = self.eval(value)?;
                let Some((otherwise, pairs)) = rest.split_last() else {
                    return Err(Error::internal("switch without a default"));
                };
                for pair in pairs.chunks_exact(2) {
                    let pattern = self.eval(&pair[0])?;
                    if patterns::is_match(&pattern, &value)? {
                        return self.eval(&pair[1]);
                    }
                }
                self.eval(otherwise)
            }
            "switch_if" => {
                let Some((otherwise, pairs)) = args.split_last() else {
                    return Err(Error::internal("switch_if without a default"));
                };
                for pair in pairs.chunks_exact(2) {
                    if !self.eval(&pair[0])?.is_empty() {
                        return self.eval(&pair[1]);
                    }
                }
                self.eval(otherwise)
            }
            _ => Err(Error::internal(format!("{name} has no lazy form"))),
        }
    }

    fn inline(&mut self, name: &str, args: &[Expr]) -> Result<String> {
        match name {
            "arguments" => {
                for (position, arg) in args.iter().enumerate() {
                    let (var, default) = binding(name, arg)?;
                    let value = match (self.arguments.get(position), default) {
                        (Some(value), _) => value.clone(),
                        (None, Some(default)) => self.eval(default)?,
                        (None, None) => String::new(),
                    };
                    self.locals.set(var, value);
                }
                Ok(String::new())
            }
            "globals" => {
                for arg in args {
                    let (var, default) = binding(name, arg)?;
                    let value = match (self.formatter.global(var), default) {
                        (Some(value), _) => value,
                        (None, Some(default)) => self.eval(default)?,
                        (None, None) => String::new(),
                    };
                    self.locals.set(var, value);
                }
                Ok(String::new())
            }
            "set_globals" => {
                for arg in args {
                    let (var, expression) = binding(name, arg)?;
                    let value = match expression {
                        Some(expression) => self.eval(expression)?,
                        None => self.locals.get(var).unwrap_or_default().to_string(),
                    };
                    self.formatter.set_global(var, value);
                }
                Ok(String::new())
            }
            "list_count_field" => {
                let [field] = args else {
                    return Err(Error::arity_mismatch(name, 1, args.len()));
                };
                let field = self.eval(field)?;
                self.count_field(&field)
            }
            _ => Err(Error::internal(format!("{name} has no inline form"))),
        }
    }

    fn count_field(&self, field: &str) -> Result<String> {
        const NAME: &str = "list_count_field";
        let metadata = self
            .metadata
            .ok_or_else(|| Error::invalid_argument(NAME, "no book is available here"))?;
        let key = field.trim().to_lowercase();
        let info = metadata
            .field_info(&key)
            .ok_or_else(|| Error::new(ErrorKind::UnknownField(field.to_string())))?;
        if info.separator.is_none() {
            return Err(Error::invalid_argument(
                NAME,
                format!("field '{field}' is not a list"),
            ));
        }
        let count = metadata
            .get(&key)
            .and_then(|value| value.as_list().map(<[String]>::len))
            .unwrap_or(0);
        Ok(count.to_string())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn is_lazy(name: &str, count: usize) -> bool {
    match name {
        "first_non_empty" => true,
        "switch" => count >= 2 && count % 2 == 0,
        "switch_if" => count % 2 == 1,
        _ => false,
    }
}

/// True for builtins whose first argument is a variable name, not its value.
fn names_target(function: &FunctionDescriptor) -> bool {
    function.is_builtin() && function.name == "assign"
}

/// An inline form's `id` or `id = default` argument.
fn binding<'e>(function: &str, expr: &'e Expr) -> Result<(&'e str, Option<&'e Expr>)> {
    match expr {
        Expr::Variable(name, _) => Ok((name, None)),
        Expr::Assign { name, value, .. } => Ok((name, Some(value.as_ref()))),
        _ => Err(Error::invalid_argument(
            function,
            "arguments must be identifiers, optionally with a default",
        )),
    }
}

fn flag(value: bool) -> String {
    if value { "1".to_string() } else { String::new() }
}

fn decorate(value: String, prefix: &str, suffix: &str) -> String {
    if value.is_empty() {
        value
    } else {
        format!("{prefix}{value}{suffix}")
    }
}

fn compare(op: CompareOp, left: &str, right: &str) -> Result<bool> {
    let ordering = if op.is_numeric() {
        let l = text::number(op.symbol(), left)?;
        let r = text::number(op.symbol(), right)?;
        l.partial_cmp(&r)
            .ok_or_else(|| Error::type_coercion(op.symbol(), "nan", "a comparable number"))?
    } else {
        text::strcmp(left, right)
    };
    Ok(op.accepts(ordering))
}

fn arithmetic(op: ArithOp, left: &str, right: &str) -> Result<String> {
    let l = text::number(op.symbol(), left)?;
    let r = text::number(op.symbol(), right)?;
    let value = match op {
        ArithOp::Add => l + r,
        ArithOp::Sub => l - r,
        ArithOp::Mul => l * r,
        ArithOp::Div => {
            if r == 0.0 {
                return Err(Error::new(ErrorKind::DivisionByZero));
            }
            l / r
        }
    };
    Ok(render_number(value))
}

/// Operators render integral results without a fractional part.
#[allow(clippy::cast_possible_truncation)]
fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        format_float(value)
    }
}
