use crate::ast::{BinaryOp, Expr, LogicalOp, MemberKey, Program, Stmt, UnaryOp};
use crate::error::{JungError, Span};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::table::Table;
use crate::value::{FuncDef, Value};
use std::rc::Rc;

const MAX_CALL_DEPTH: usize = 200;
const MAX_IMPORTS: usize = 32;

/// Control-flow signal threaded through statement execution.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// An in-flight exception: either a `throw`n value (rendered to a string) or
/// a runtime error that may still be caught by an enclosing try.
#[derive(Debug, Clone)]
pub struct Exception {
    pub message: String,
    pub span: Span,
    thrown: bool,
}

impl Exception {
    pub fn runtime(span: Span, message: String) -> Self {
        Self {
            message,
            span,
            thrown: false,
        }
    }

    pub fn thrown(span: Span, message: String) -> Self {
        Self {
            message,
            span,
            thrown: true,
        }
    }

    /// The string a catch variable binds to: thrown values verbatim, runtime
    /// errors prefixed with their source line.
    pub fn catch_message(&self) -> String {
        if self.thrown {
            self.message.clone()
        } else {
            format!("[line {}] {}", self.span.line, self.message)
        }
    }

    pub fn into_error(self) -> JungError {
        if self.thrown {
            JungError::uncaught_exception(self.span, self.message)
        } else {
            JungError::runtime_error(self.span, self.message)
        }
    }
}

pub struct Interpreter {
    scopes: Vec<Table>,
    globals: Table,
    functions: Table,
    classes: Table,
    builtins: Table,
    current_instance: Option<Value>,
    call_depth: usize,
    imports: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let mut builtins = Table::new();
        crate::builtins::register(&mut builtins);

        Self {
            scopes: vec![Table::new()],
            globals: Table::new(),
            functions: Table::new(),
            classes: Table::new(),
            builtins,
            current_instance: None,
            call_depth: 0,
            imports: Vec::new(),
        }
    }

    /// Lex, parse, and execute a complete source string in this context.
    pub fn run_source(&mut self, source: &str) -> Result<(), JungError> {
        let mut lexer = Lexer::new(source.to_string());
        let tokens = lexer.scan_tokens()?;
        let program = Parser::new(tokens).parse()?;
        self.execute(&program).map_err(Exception::into_error)
    }

    pub fn execute(&mut self, program: &Program) -> Result<(), Exception> {
        for stmt in &program.statements {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                // A stray return/break/continue stops top-level execution.
                _ => break,
            }
        }
        Ok(())
    }

    /// Look a name up the way a variable reference would. Used by the REPL
    /// and tests to observe interpreter state.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.get_var(name)
    }

    // ---- scopes and variables ----

    fn push_scope(&mut self) {
        self.scopes.push(Table::new());
    }

    fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn get_var(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        self.globals.get(name).cloned()
    }

    /// Write through to the nearest scope that already defines the name, or
    /// define it in the current scope.
    fn set_var(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if scope.has(name) {
                scope.set(name, value);
                return;
            }
        }
        if self.globals.has(name) {
            self.globals.set(name, value);
            return;
        }
        self.def_var(name, value);
    }

    /// Define in the current scope unconditionally.
    fn def_var(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.set(name, value);
        }
    }

    // ---- statement execution ----

    fn exec_block(&mut self, body: &[Stmt]) -> Result<Flow, Exception> {
        for stmt in body {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run a block in a fresh scope, popping it again on every path out.
    fn exec_block_scoped(&mut self, body: &[Stmt]) -> Result<Flow, Exception> {
        self.push_scope();
        let result = self.exec_block(body);
        self.pop_scope();
        result
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, Exception> {
        match stmt {
            Stmt::Expression { expr, .. } => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Let { name, value, .. } => {
                let value = self.eval_expr(value)?;
                self.def_var(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, value, .. } => {
                let value = self.eval_expr(value)?;
                self.set_var(name, value);
                Ok(Flow::Normal)
            }
            Stmt::CompoundAssign {
                name,
                operator,
                value,
                span,
            } => {
                let current = self.get_var(name).ok_or_else(|| {
                    Exception::runtime(span.clone(), format!("undefined variable '{}'", name))
                })?;
                let rhs = self.eval_expr(value)?;
                let result = self.apply_compound(*operator, current, rhs, span)?;
                self.set_var(name, result);
                Ok(Flow::Normal)
            }
            Stmt::SetMember {
                target, key, value, ..
            } => {
                let container = self.eval_expr(target)?;
                let value = self.eval_expr(value)?;
                match key {
                    MemberKey::Field(field) => {
                        if let Value::Object(table) = &container {
                            table.borrow_mut().set(field, value);
                        }
                    }
                    MemberKey::Index(index_expr) => {
                        let index = self.eval_expr(index_expr)?;
                        write_indexed(&container, &index, value);
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::CompoundSetMember {
                target,
                key,
                operator,
                value,
                span,
            } => {
                let container = self.eval_expr(target)?;
                let rhs = self.eval_expr(value)?;
                match key {
                    MemberKey::Field(field) => {
                        let current = match &container {
                            Value::Object(table) => {
                                table.borrow().get(field).cloned().unwrap_or(Value::Null)
                            }
                            _ => Value::Null,
                        };
                        let result = self.apply_compound(*operator, current, rhs, span)?;
                        if let Value::Object(table) = &container {
                            table.borrow_mut().set(field, result);
                        }
                    }
                    MemberKey::Index(index_expr) => {
                        // The index expression evaluates once for the whole
                        // read-modify-write.
                        let index = self.eval_expr(index_expr)?;
                        let current = index_value(&container, &index);
                        let result = self.apply_compound(*operator, current, rhs, span)?;
                        write_indexed(&container, &index, result);
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Print { expr, .. } => {
                let value = self.eval_expr(expr)?;
                println!("{}", value);
                Ok(Flow::Normal)
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                if self.eval_expr(condition)?.is_truthy() {
                    self.exec_block_scoped(then_body)
                } else if let Some(else_body) = else_body {
                    self.exec_block_scoped(else_body)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                loop {
                    if !self.eval_expr(condition)?.is_truthy() {
                        break;
                    }
                    match self.exec_block_scoped(body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::ForIn {
                var,
                iterable,
                body,
                ..
            } => {
                let iterable = self.eval_expr(iterable)?;
                // Snapshot the iteration space so the body can mutate the
                // underlying aggregate without upsetting the loop.
                let items: Vec<Value> = match &iterable {
                    Value::Array(items) => items.borrow().clone(),
                    Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
                    Value::Object(table) => table
                        .borrow()
                        .iter()
                        .map(|(key, _)| Value::Str(key.clone()))
                        .collect(),
                    _ => Vec::new(),
                };

                for item in items {
                    self.push_scope();
                    self.def_var(var, item);
                    let result = self.exec_block(body);
                    self.pop_scope();
                    match result? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break { .. } => Ok(Flow::Break),
            Stmt::Continue { .. } => Ok(Flow::Continue),
            Stmt::FunctionDef { func, .. } => {
                self.functions
                    .set(&func.name, Value::Function(func.clone()));
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::ClassDef { name, methods, .. } => {
                let mut table = Table::new();
                for method in methods {
                    table.set(&method.name, Value::Function(method.clone()));
                }
                self.classes.set(name, Value::object(table));
                Ok(Flow::Normal)
            }
            Stmt::TryCatch {
                try_body,
                catch_var,
                catch_body,
                ..
            } => {
                let depth = self.scopes.len();
                match self.exec_block_scoped(try_body) {
                    Ok(flow) => Ok(flow),
                    Err(exception) => {
                        // The try's checkpoint is gone by the time the catch
                        // body runs, so a throw inside it unwinds to the next
                        // enclosing try.
                        self.scopes.truncate(depth);
                        self.push_scope();
                        if let Some(var) = catch_var {
                            self.def_var(var, Value::Str(exception.catch_message()));
                        }
                        let result = self.exec_block(catch_body);
                        self.pop_scope();
                        result
                    }
                }
            }
            Stmt::Throw { value, span } => {
                let value = self.eval_expr(value)?;
                Err(Exception::thrown(span.clone(), value.to_string()))
            }
            Stmt::Import { path, span } => {
                self.exec_import(path, span)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_import(&mut self, path: &str, span: &Span) -> Result<(), Exception> {
        if self.imports.iter().any(|p| p == path) {
            return Ok(());
        }
        if self.imports.len() >= MAX_IMPORTS {
            return Err(Exception::runtime(
                span.clone(),
                "too many imports".to_string(),
            ));
        }
        self.imports.push(path.to_string());

        let source = std::fs::read_to_string(path).map_err(|_| {
            Exception::runtime(span.clone(), format!("cannot open import file '{}'", path))
        })?;
        let tokens = Lexer::new(source)
            .scan_tokens()
            .map_err(|err| Exception::runtime(span.clone(), err.message))?;
        let program = Parser::new(tokens)
            .parse()
            .map_err(|err| Exception::runtime(span.clone(), err.message))?;
        self.execute(&program)
    }

    // ---- expression evaluation ----

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, Exception> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Variable { name, span } => {
                if let Some(value) = self.get_var(name) {
                    return Ok(value);
                }
                if let Some(value) = self.functions.get(name) {
                    return Ok(value.clone());
                }
                Err(Exception::runtime(
                    span.clone(),
                    format!("undefined variable '{}'", name),
                ))
            }
            Expr::This { .. } => Ok(self.current_instance.clone().unwrap_or(Value::Null)),
            Expr::Array { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expr(element)?);
                }
                Ok(Value::array(items))
            }
            Expr::ObjectLiteral { pairs, .. } => {
                let mut table = Table::new();
                for (key, value_expr) in pairs {
                    let value = self.eval_expr(value_expr)?;
                    table.set(key, value);
                }
                Ok(Value::object(table))
            }
            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => {
                // Short-circuit, yielding the deciding operand itself.
                let left = self.eval_expr(left)?;
                match operator {
                    LogicalOp::Or => {
                        if left.is_truthy() {
                            Ok(left)
                        } else {
                            self.eval_expr(right)
                        }
                    }
                    LogicalOp::And => {
                        if !left.is_truthy() {
                            Ok(left)
                        } else {
                            self.eval_expr(right)
                        }
                    }
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                binary_op(*operator, left, right, span)
            }
            Expr::Unary {
                operator,
                operand,
                span,
            } => {
                let operand = self.eval_expr(operand)?;
                match operator {
                    UnaryOp::Negate => match operand {
                        Value::Int(n) => Ok(match n.checked_neg() {
                            Some(v) => Value::Int(v),
                            None => Value::Double(-(n as f64)),
                        }),
                        Value::Double(n) => Ok(Value::Double(-n)),
                        other => Err(Exception::runtime(
                            span.clone(),
                            format!("cannot negate {}", other.type_name()),
                        )),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                }
            }
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                if self.eval_expr(condition)?.is_truthy() {
                    self.eval_expr(then_expr)
                } else {
                    self.eval_expr(else_expr)
                }
            }
            Expr::Interp { parts, .. } => {
                let mut out = String::new();
                for part in parts {
                    let value = self.eval_expr(part)?;
                    out.push_str(&value.to_string());
                }
                Ok(Value::Str(out))
            }
            Expr::Index { object, index, .. } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                Ok(index_value(&object, &index))
            }
            Expr::Member { object, field, .. } => {
                let object = self.eval_expr(object)?;
                if field == "length" {
                    match &object {
                        Value::Str(s) => return Ok(Value::Int(s.chars().count() as i64)),
                        Value::Array(items) => {
                            return Ok(Value::Int(items.borrow().len() as i64))
                        }
                        Value::Object(table) => {
                            return Ok(Value::Int(table.borrow().len() as i64))
                        }
                        _ => {}
                    }
                }
                match &object {
                    Value::Object(table) => {
                        Ok(table.borrow().get(field).cloned().unwrap_or(Value::Null))
                    }
                    _ => Ok(Value::Null),
                }
            }
            Expr::Call { name, args, span } => {
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg)?);
                }
                self.call_named(name, arg_values, span)
            }
            Expr::New {
                class_name,
                args,
                span,
            } => {
                let class_table = match self.classes.get(class_name) {
                    Some(Value::Object(table)) => table.clone(),
                    _ => {
                        return Err(Exception::runtime(
                            span.clone(),
                            format!("undefined class '{}'", class_name),
                        ))
                    }
                };

                let mut table = Table::new();
                table.set("__class__", Value::Str(class_name.clone()));
                let instance = Value::object(table);

                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg)?);
                }

                let ctor = {
                    let class = class_table.borrow();
                    match class.get("constructor").or_else(|| class.get("init")) {
                        Some(Value::Function(func)) => Some(func.clone()),
                        _ => None,
                    }
                };

                if let Some(ctor) = ctor {
                    let saved = self.current_instance.replace(instance.clone());
                    let result = self.call_function(&ctor, arg_values, span);
                    self.current_instance = saved;
                    result?;
                }

                Ok(instance)
            }
        }
    }

    // ---- call dispatch ----

    fn call_named(
        &mut self,
        name: &str,
        args: Vec<Value>,
        span: &Span,
    ) -> Result<Value, Exception> {
        // Class methods shadow builtin methods of the same name when the
        // receiver is an instance of a known class.
        if let Some(method_name) = name.strip_prefix("__method_") {
            if let Some(method) = self.find_class_method(args.first(), method_name) {
                let receiver = args[0].clone();
                let saved = self.current_instance.replace(receiver);
                let result = self.call_function(&method, args[1..].to_vec(), span);
                self.current_instance = saved;
                return result;
            }
        }

        // map/filter/reduce call back into user code, so they are evaluated
        // here rather than as plain builtins. Both argument orders work, and
        // the function may be given by name.
        match name {
            "map" if args.len() >= 2 => {
                if let Some((items, func)) = self.array_and_callable(&args[0], &args[1]) {
                    let mut mapped = Vec::with_capacity(items.len());
                    for item in items {
                        mapped.push(self.call_function(&func, vec![item], span)?);
                    }
                    return Ok(Value::array(mapped));
                }
            }
            "filter" if args.len() >= 2 => {
                if let Some((items, func)) = self.array_and_callable(&args[0], &args[1]) {
                    let mut kept = Vec::new();
                    for item in items {
                        let verdict = self.call_function(&func, vec![item.clone()], span)?;
                        if verdict.is_truthy() {
                            kept.push(item);
                        }
                    }
                    return Ok(Value::array(kept));
                }
            }
            "reduce" if args.len() >= 3 => {
                if let Some((items, func)) = self.array_and_callable(&args[0], &args[1]) {
                    let mut acc = args[2].clone();
                    for item in items {
                        acc = self.call_function(&func, vec![acc, item], span)?;
                    }
                    return Ok(acc);
                }
            }
            _ => {}
        }

        if let Some(Value::Builtin(native)) = self.builtins.get(name) {
            let native = *native;
            return native(&args).map_err(|msg| Exception::runtime(span.clone(), msg));
        }

        let func = match self.functions.get(name) {
            Some(Value::Function(func)) => Some(func.clone()),
            _ => None,
        };
        if let Some(func) = func {
            return self.call_function(&func, args, span);
        }

        // A variable may hold a function or builtin value.
        if let Some(value) = self.get_var(name) {
            match value {
                Value::Function(func) => return self.call_function(&func, args, span),
                Value::Builtin(native) => {
                    return native(&args).map_err(|msg| Exception::runtime(span.clone(), msg))
                }
                _ => {}
            }
        }

        Err(Exception::runtime(
            span.clone(),
            format!("undefined function '{}'", name),
        ))
    }

    fn find_class_method(
        &self,
        receiver: Option<&Value>,
        method_name: &str,
    ) -> Option<Rc<FuncDef>> {
        let instance = match receiver {
            Some(Value::Object(instance)) => instance,
            _ => return None,
        };
        let class_name = match instance.borrow().get("__class__") {
            Some(Value::Str(name)) => name.clone(),
            _ => return None,
        };
        match self.classes.get(&class_name) {
            Some(Value::Object(class_table)) => match class_table.borrow().get(method_name) {
                Some(Value::Function(func)) => Some(func.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    fn resolve_callable(&self, value: &Value) -> Option<Rc<FuncDef>> {
        match value {
            Value::Function(func) => Some(func.clone()),
            Value::Str(name) => match self.functions.get(name) {
                Some(Value::Function(func)) => Some(func.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Pick apart an (array, callable) pair in either order, snapshotting the
    /// array elements.
    fn array_and_callable(&self, a: &Value, b: &Value) -> Option<(Vec<Value>, Rc<FuncDef>)> {
        if let Value::Array(items) = a {
            self.resolve_callable(b)
                .map(|func| (items.borrow().clone(), func))
        } else if let Value::Array(items) = b {
            self.resolve_callable(a)
                .map(|func| (items.borrow().clone(), func))
        } else {
            None
        }
    }

    fn call_function(
        &mut self,
        func: &Rc<FuncDef>,
        args: Vec<Value>,
        span: &Span,
    ) -> Result<Value, Exception> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(Exception::runtime(
                span.clone(),
                format!("stack overflow (max {} call depth)", MAX_CALL_DEPTH),
            ));
        }
        self.call_depth += 1;
        self.push_scope();
        let result = self.call_body(func, args);
        self.pop_scope();
        self.call_depth -= 1;
        result
    }

    fn call_body(&mut self, func: &Rc<FuncDef>, args: Vec<Value>) -> Result<Value, Exception> {
        for (i, param) in func.params.iter().enumerate() {
            let value = if i < args.len() {
                args[i].clone()
            } else if let Some(default) = &param.default {
                // Defaults evaluate in the callee's fresh scope.
                self.eval_expr(default)?
            } else {
                Value::Null
            };
            self.def_var(&param.name, value);
        }

        match self.exec_block(&func.body)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    /// Compound assignment reuses the binary operator rules: numeric ops on
    /// numbers, `+=` also concatenating when a string is involved.
    fn apply_compound(
        &self,
        operator: BinaryOp,
        current: Value,
        rhs: Value,
        span: &Span,
    ) -> Result<Value, Exception> {
        binary_op(operator, current, rhs, span)
    }
}

// ---- operators ----

fn binary_op(operator: BinaryOp, left: Value, right: Value, span: &Span) -> Result<Value, Exception> {
    match operator {
        BinaryOp::Add => {
            // `+` concatenates when either side is a string, rendering the
            // other side.
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                return Ok(Value::Str(format!("{}{}", left, right)));
            }
            match (left, right) {
                // Integer arithmetic stays integral; overflow widens.
                (Value::Int(l), Value::Int(r)) => Ok(match l.checked_add(r) {
                    Some(v) => Value::Int(v),
                    None => Value::Double(l as f64 + r as f64),
                }),
                (Value::Double(l), Value::Double(r)) => Ok(Value::Double(l + r)),
                (Value::Int(l), Value::Double(r)) => Ok(Value::Double(l as f64 + r)),
                (Value::Double(l), Value::Int(r)) => Ok(Value::Double(l + r as f64)),
                (l, r) => Err(type_error("add", &l, &r, span)),
            }
        }
        BinaryOp::Subtract => match (left, right) {
            (Value::Int(l), Value::Int(r)) => Ok(match l.checked_sub(r) {
                Some(v) => Value::Int(v),
                None => Value::Double(l as f64 - r as f64),
            }),
            (Value::Double(l), Value::Double(r)) => Ok(Value::Double(l - r)),
            (Value::Int(l), Value::Double(r)) => Ok(Value::Double(l as f64 - r)),
            (Value::Double(l), Value::Int(r)) => Ok(Value::Double(l - r as f64)),
            (l, r) => Err(type_error("subtract", &l, &r, span)),
        },
        BinaryOp::Multiply => match (left, right) {
            (Value::Int(l), Value::Int(r)) => Ok(match l.checked_mul(r) {
                Some(v) => Value::Int(v),
                None => Value::Double(l as f64 * r as f64),
            }),
            (Value::Double(l), Value::Double(r)) => Ok(Value::Double(l * r)),
            (Value::Int(l), Value::Double(r)) => Ok(Value::Double(l as f64 * r)),
            (Value::Double(l), Value::Int(r)) => Ok(Value::Double(l * r as f64)),
            (l, r) => Err(type_error("multiply", &l, &r, span)),
        },
        BinaryOp::Divide => match (left, right) {
            // Dividing two integers truncates; a double on either side
            // gives the true IEEE-754 quotient.
            (Value::Int(l), Value::Int(r)) => {
                if r == 0 {
                    return Err(division_by_zero(span));
                }
                Ok(match l.checked_div(r) {
                    Some(v) => Value::Int(v),
                    None => Value::Double(l as f64 / r as f64),
                })
            }
            (Value::Double(l), Value::Double(r)) => {
                if r == 0.0 {
                    return Err(division_by_zero(span));
                }
                Ok(Value::Double(l / r))
            }
            (Value::Int(l), Value::Double(r)) => {
                if r == 0.0 {
                    return Err(division_by_zero(span));
                }
                Ok(Value::Double(l as f64 / r))
            }
            (Value::Double(l), Value::Int(r)) => {
                if r == 0 {
                    return Err(division_by_zero(span));
                }
                Ok(Value::Double(l / r as f64))
            }
            (l, r) => Err(type_error("divide", &l, &r, span)),
        },
        BinaryOp::Modulo => match (left, right) {
            (Value::Int(l), Value::Int(r)) => {
                if r == 0 {
                    return Err(Exception::runtime(
                        span.clone(),
                        "modulo by zero".to_string(),
                    ));
                }
                Ok(Value::Int(l.checked_rem(r).unwrap_or(0)))
            }
            (l, r) => match (l.as_number(), r.as_number()) {
                (Some(l), Some(r)) => {
                    if r == 0.0 {
                        return Err(Exception::runtime(
                            span.clone(),
                            "modulo by zero".to_string(),
                        ));
                    }
                    Ok(Value::Double(l % r))
                }
                _ => Err(type_error("take modulo of", &l, &r, span)),
            },
        },
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        BinaryOp::Less => compare(left, right, span, |l, r| l < r),
        BinaryOp::LessEqual => compare(left, right, span, |l, r| l <= r),
        BinaryOp::Greater => compare(left, right, span, |l, r| l > r),
        BinaryOp::GreaterEqual => compare(left, right, span, |l, r| l >= r),
    }
}

fn division_by_zero(span: &Span) -> Exception {
    Exception::runtime(span.clone(), "division by zero".to_string())
}

fn compare(
    left: Value,
    right: Value,
    span: &Span,
    op: fn(f64, f64) -> bool,
) -> Result<Value, Exception> {
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => Ok(Value::Bool(op(l, r))),
        _ => Err(type_error("compare", &left, &right, span)),
    }
}

fn type_error(verb: &str, left: &Value, right: &Value, span: &Span) -> Exception {
    Exception::runtime(
        span.clone(),
        format!(
            "cannot {} {} and {}",
            verb,
            left.type_name(),
            right.type_name()
        ),
    )
}

/// Indexed read. Arrays and strings take numeric indices (negative counts
/// from the end), objects take string keys; anything out of range or of the
/// wrong shape reads as null.
fn index_value(object: &Value, index: &Value) -> Value {
    match object {
        Value::Array(items) => match index.as_number() {
            Some(n) => {
                let items = items.borrow();
                match normalize_index(n, items.len()) {
                    Some(i) => items[i].clone(),
                    None => Value::Null,
                }
            }
            None => Value::Null,
        },
        Value::Object(table) => match index {
            Value::Str(key) => table.borrow().get(key).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        },
        Value::Str(s) => match index.as_number() {
            Some(n) => {
                let chars: Vec<char> = s.chars().collect();
                match normalize_index(n, chars.len()) {
                    Some(i) => Value::Str(chars[i].to_string()),
                    None => Value::Null,
                }
            }
            None => Value::Null,
        },
        _ => Value::Null,
    }
}

/// Indexed write. Objects take string keys; arrays take numeric indices with
/// negative-from-end semantics. Non-string object keys and out-of-range
/// array indices are silently ignored.
fn write_indexed(container: &Value, index: &Value, value: Value) {
    match container {
        Value::Object(table) => {
            if let Value::Str(key) = index {
                table.borrow_mut().set(key, value);
            }
        }
        Value::Array(items) => {
            if let Some(n) = index.as_number() {
                let mut items = items.borrow_mut();
                let len = items.len();
                if let Some(i) = normalize_index(n, len) {
                    items[i] = value;
                }
            }
        }
        _ => {}
    }
}

fn normalize_index(n: f64, len: usize) -> Option<usize> {
    let mut i = n as i64;
    if i < 0 {
        i += len as i64;
    }
    if i >= 0 && (i as usize) < len {
        Some(i as usize)
    } else {
        None
    }
}
