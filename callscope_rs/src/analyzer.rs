//! Per-module AST analysis: declared functions and call edges.
//!
//! The analyzer walks one parsed Python module and collects every declared
//! function/method as a fully-qualified name, plus (caller, callee) edges for
//! each call it can attribute from syntax alone. Resolution is deliberately
//! conservative: an edge is only emitted when the callee is a pure
//! name/attribute chain whose head is `self`/`cls`, an import alias, a class
//! defined in this module, or a free function defined in this module.

use std::collections::{HashMap, HashSet};

use rustpython_parser::{ast, parse, Mode, ParseError};

/// AST visitor building the static call graph of a single module.
pub struct StaticAnalyzer {
    module_name: String,
    imports: HashMap<String, String>,
    classes: HashSet<String>,
    local_functions: HashSet<String>,
    current_function: Option<String>,
    current_class: Option<String>,
    /// Declared functions, in discovery order.
    pub functions: Vec<String>,
    /// (caller, callee) pairs, in discovery order.
    pub edges: Vec<(String, String)>,
}

impl StaticAnalyzer {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            imports: HashMap::new(),
            classes: HashSet::new(),
            local_functions: HashSet::new(),
            current_function: None,
            current_class: None,
            functions: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Parse `source` and analyze the resulting module body.
    pub fn analyze(&mut self, source: &str, source_path: &str) -> Result<(), ParseError> {
        let module = parse(source, Mode::Module, source_path)?;
        if let ast::Mod::Module(module) = module {
            for stmt in &module.body {
                self.visit_stmt(stmt);
            }
        }
        Ok(())
    }

    fn visit_body(&mut self, body: &[ast::Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &ast::Stmt) {
        match stmt {
            ast::Stmt::Import(import) => {
                for alias in &import.names {
                    let module = alias.name.as_str();
                    let bound = match &alias.asname {
                        Some(asname) => asname.as_str().to_string(),
                        None => module.rsplit('.').next().unwrap_or(module).to_string(),
                    };
                    self.imports.insert(bound, module.to_string());
                }
            }
            ast::Stmt::ImportFrom(import) => self.visit_import_from(import),
            ast::Stmt::ClassDef(class_def) => {
                let name = class_def.name.as_str().to_string();
                self.classes.insert(name.clone());
                let prev_class = self.current_class.replace(name);
                self.visit_body(&class_def.body);
                self.current_class = prev_class;
            }
            ast::Stmt::FunctionDef(func_def) => {
                self.visit_function(func_def.name.as_str(), &func_def.body);
            }
            ast::Stmt::AsyncFunctionDef(func_def) => {
                self.visit_function(func_def.name.as_str(), &func_def.body);
            }
            other => self.walk_stmt(other),
        }
    }

    /// Resolve a from-import to absolute dotted targets.
    ///
    /// `from M import n as x` binds `x -> M.n`. A relative import at level L
    /// is rooted at the current module's package with `L - 1` trailing
    /// components dropped (clamped at the package root); `from . import n`
    /// binds against the package itself. Wildcards are ignored.
    fn visit_import_from(&mut self, import: &ast::StmtImportFrom) {
        let level = import.level.as_ref().map(|l| l.to_u32()).unwrap_or(0) as usize;

        let root = if level == 0 {
            import
                .module
                .as_ref()
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        } else {
            let mut base: Vec<&str> = self.module_name.split('.').collect();
            base.pop();
            if level > 1 {
                let trim = (level - 1).min(base.len());
                base.truncate(base.len() - trim);
            }
            match &import.module {
                Some(module) if base.is_empty() => module.as_str().to_string(),
                Some(module) => format!("{}.{}", base.join("."), module.as_str()),
                None => base.join("."),
            }
        };

        for alias in &import.names {
            if alias.name.as_str() == "*" {
                continue;
            }
            let name = alias.name.as_str();
            let bound = alias
                .asname
                .as_ref()
                .map(|a| a.as_str())
                .unwrap_or(name)
                .to_string();
            let full = if root.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", root, name)
            };
            self.imports.insert(bound, full);
        }
    }

    fn visit_function(&mut self, name: &str, body: &[ast::Stmt]) {
        let fqn = match &self.current_class {
            Some(class) => format!("{}.{}.{}", self.module_name, class, name),
            None => {
                self.local_functions.insert(name.to_string());
                format!("{}.{}", self.module_name, name)
            }
        };
        self.functions.push(fqn.clone());
        let prev_function = self.current_function.replace(fqn);
        self.visit_body(body);
        self.current_function = prev_function;
    }

    fn walk_stmt(&mut self, stmt: &ast::Stmt) {
        match stmt {
            ast::Stmt::Return(s) => {
                if let Some(value) = &s.value {
                    self.visit_expr(value);
                }
            }
            ast::Stmt::Delete(s) => {
                for target in &s.targets {
                    self.visit_expr(target);
                }
            }
            ast::Stmt::Assign(s) => {
                for target in &s.targets {
                    self.visit_expr(target);
                }
                self.visit_expr(&s.value);
            }
            ast::Stmt::AugAssign(s) => {
                self.visit_expr(&s.target);
                self.visit_expr(&s.value);
            }
            ast::Stmt::AnnAssign(s) => {
                self.visit_expr(&s.target);
                self.visit_expr(&s.annotation);
                if let Some(value) = &s.value {
                    self.visit_expr(value);
                }
            }
            ast::Stmt::For(s) => {
                self.visit_expr(&s.target);
                self.visit_expr(&s.iter);
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::AsyncFor(s) => {
                self.visit_expr(&s.target);
                self.visit_expr(&s.iter);
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::While(s) => {
                self.visit_expr(&s.test);
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::If(s) => {
                self.visit_expr(&s.test);
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::With(s) => {
                for item in &s.items {
                    self.visit_expr(&item.context_expr);
                    if let Some(vars) = &item.optional_vars {
                        self.visit_expr(vars);
                    }
                }
                self.visit_body(&s.body);
            }
            ast::Stmt::AsyncWith(s) => {
                for item in &s.items {
                    self.visit_expr(&item.context_expr);
                    if let Some(vars) = &item.optional_vars {
                        self.visit_expr(vars);
                    }
                }
                self.visit_body(&s.body);
            }
            ast::Stmt::Match(s) => {
                self.visit_expr(&s.subject);
                for case in &s.cases {
                    if let Some(guard) = &case.guard {
                        self.visit_expr(guard);
                    }
                    self.visit_body(&case.body);
                }
            }
            ast::Stmt::Raise(s) => {
                if let Some(exc) = &s.exc {
                    self.visit_expr(exc);
                }
                if let Some(cause) = &s.cause {
                    self.visit_expr(cause);
                }
            }
            ast::Stmt::Try(s) => {
                self.visit_body(&s.body);
                for handler in &s.handlers {
                    match handler {
                        ast::ExceptHandler::ExceptHandler(handler) => {
                            if let Some(type_) = &handler.type_ {
                                self.visit_expr(type_);
                            }
                            self.visit_body(&handler.body);
                        }
                    }
                }
                self.visit_body(&s.orelse);
                self.visit_body(&s.finalbody);
            }
            ast::Stmt::Assert(s) => {
                self.visit_expr(&s.test);
                if let Some(msg) = &s.msg {
                    self.visit_expr(msg);
                }
            }
            ast::Stmt::Expr(s) => self.visit_expr(&s.value),
            _ => {}
        }
    }

    fn visit_expr(&mut self, expr: &ast::Expr) {
        match expr {
            ast::Expr::Call(call) => {
                if let Some(caller) = self.current_function.clone() {
                    if let Some(callee) = self.resolve_call(call) {
                        self.edges.push((caller, callee));
                    }
                }
                self.visit_expr(&call.func);
                for arg in &call.args {
                    self.visit_expr(arg);
                }
                for keyword in &call.keywords {
                    self.visit_expr(&keyword.value);
                }
            }
            ast::Expr::BoolOp(e) => {
                for value in &e.values {
                    self.visit_expr(value);
                }
            }
            ast::Expr::NamedExpr(e) => {
                self.visit_expr(&e.target);
                self.visit_expr(&e.value);
            }
            ast::Expr::BinOp(e) => {
                self.visit_expr(&e.left);
                self.visit_expr(&e.right);
            }
            ast::Expr::UnaryOp(e) => self.visit_expr(&e.operand),
            ast::Expr::Lambda(e) => self.visit_expr(&e.body),
            ast::Expr::IfExp(e) => {
                self.visit_expr(&e.test);
                self.visit_expr(&e.body);
                self.visit_expr(&e.orelse);
            }
            ast::Expr::Dict(e) => {
                for key in e.keys.iter().flatten() {
                    self.visit_expr(key);
                }
                for value in &e.values {
                    self.visit_expr(value);
                }
            }
            ast::Expr::Set(e) => {
                for elt in &e.elts {
                    self.visit_expr(elt);
                }
            }
            ast::Expr::ListComp(e) => {
                self.visit_expr(&e.elt);
                self.visit_comprehensions(&e.generators);
            }
            ast::Expr::SetComp(e) => {
                self.visit_expr(&e.elt);
                self.visit_comprehensions(&e.generators);
            }
            ast::Expr::DictComp(e) => {
                self.visit_expr(&e.key);
                self.visit_expr(&e.value);
                self.visit_comprehensions(&e.generators);
            }
            ast::Expr::GeneratorExp(e) => {
                self.visit_expr(&e.elt);
                self.visit_comprehensions(&e.generators);
            }
            ast::Expr::Await(e) => self.visit_expr(&e.value),
            ast::Expr::Yield(e) => {
                if let Some(value) = &e.value {
                    self.visit_expr(value);
                }
            }
            ast::Expr::YieldFrom(e) => self.visit_expr(&e.value),
            ast::Expr::Compare(e) => {
                self.visit_expr(&e.left);
                for comparator in &e.comparators {
                    self.visit_expr(comparator);
                }
            }
            ast::Expr::FormattedValue(e) => {
                self.visit_expr(&e.value);
                if let Some(spec) = &e.format_spec {
                    self.visit_expr(spec);
                }
            }
            ast::Expr::JoinedStr(e) => {
                for value in &e.values {
                    self.visit_expr(value);
                }
            }
            ast::Expr::Attribute(e) => self.visit_expr(&e.value),
            ast::Expr::Subscript(e) => {
                self.visit_expr(&e.value);
                self.visit_expr(&e.slice);
            }
            ast::Expr::Starred(e) => self.visit_expr(&e.value),
            ast::Expr::List(e) => {
                for elt in &e.elts {
                    self.visit_expr(elt);
                }
            }
            ast::Expr::Tuple(e) => {
                for elt in &e.elts {
                    self.visit_expr(elt);
                }
            }
            ast::Expr::Slice(e) => {
                if let Some(lower) = &e.lower {
                    self.visit_expr(lower);
                }
                if let Some(upper) = &e.upper {
                    self.visit_expr(upper);
                }
                if let Some(step) = &e.step {
                    self.visit_expr(step);
                }
            }
            _ => {}
        }
    }

    fn visit_comprehensions(&mut self, generators: &[ast::Comprehension]) {
        for comp in generators {
            self.visit_expr(&comp.target);
            self.visit_expr(&comp.iter);
            for cond in &comp.ifs {
                self.visit_expr(cond);
            }
        }
    }

    /// Resolve the callee of a call expression to a fully-qualified name.
    fn resolve_call(&self, call: &ast::ExprCall) -> Option<String> {
        let dotted = dotted_name(&call.func)?;
        let mut parts: Vec<String> = dotted.split('.').map(str::to_string).collect();
        let head = parts.first()?.clone();

        if head == "self" || head == "cls" {
            if let Some(class) = &self.current_class {
                parts[0] = format!("{}.{}", self.module_name, class);
                return Some(parts.join("."));
            }
        }

        if let Some(target) = self.imports.get(&head) {
            parts[0] = target.clone();
            return Some(parts.join("."));
        }

        if self.classes.contains(&head) {
            // A bare call on a class is construction.
            if parts.len() == 1 {
                return Some(format!("{}.{}.__init__", self.module_name, head));
            }
            parts[0] = format!("{}.{}", self.module_name, head);
            return Some(parts.join("."));
        }

        if self.local_functions.contains(&head) {
            if parts.len() == 1 {
                return Some(format!("{}.{}", self.module_name, head));
            }
            return None;
        }

        None
    }
}

/// Flatten a pure name/attribute chain to a dotted string; anything else
/// (subscripts, calls, literals) yields `None`.
fn dotted_name(expr: &ast::Expr) -> Option<String> {
    match expr {
        ast::Expr::Name(name) => Some(name.id.as_str().to_string()),
        ast::Expr::Attribute(attr) => {
            let base = dotted_name(&attr.value)?;
            Some(format!("{}.{}", base, attr.attr.as_str()))
        }
        _ => None,
    }
}
