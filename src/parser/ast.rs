// Syntax tree definitions for the traced scripting language

use rustc_hash::FxHashSet;
use std::rc::Rc;

/// Identity of a code object (module body, function body or class body).
///
/// Assigned by the parser in definition order. Trace sinks use it to tell
/// code objects apart without comparing names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodeId(pub u32);

impl CodeId {
    /// The top-level module body
    pub const MODULE: CodeId = CodeId(0);
}

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg, // -x
    Pos, // +x
    Not, // not x
}

/// Short-circuiting boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison operators (chainable)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        }
    }
}

/// Literal constants
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
}

/// Expression nodes
#[derive(Debug, Clone)]
pub enum Expr {
    Name {
        id: Rc<str>,
        location: SourceLocation,
    },
    Constant {
        value: Constant,
        location: SourceLocation,
    },
    List {
        elts: Vec<Expr>,
        location: SourceLocation,
    },
    Tuple {
        elts: Vec<Expr>,
        location: SourceLocation,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        location: SourceLocation,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
        location: SourceLocation,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
        location: SourceLocation,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    Attribute {
        value: Box<Expr>,
        attr: Rc<str>,
        location: SourceLocation,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
        location: SourceLocation,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
        location: SourceLocation,
    },
}

impl Expr {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            Expr::Name { location, .. }
            | Expr::Constant { location, .. }
            | Expr::List { location, .. }
            | Expr::Tuple { location, .. }
            | Expr::BinOp { location, .. }
            | Expr::UnaryOp { location, .. }
            | Expr::BoolOp { location, .. }
            | Expr::Compare { location, .. }
            | Expr::Call { location, .. }
            | Expr::Attribute { location, .. }
            | Expr::Subscript { location, .. }
            | Expr::IfExp { location, .. } => location,
        }
    }

    /// Whether this expression may appear on the left of an assignment
    pub fn is_assignable(&self) -> bool {
        match self {
            Expr::Name { .. } | Expr::Attribute { .. } | Expr::Subscript { .. } => true,
            Expr::Tuple { elts, .. } | Expr::List { elts, .. } => {
                elts.iter().all(Expr::is_assignable)
            }
            _ => false,
        }
    }
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Rc<str>,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
    pub location: SourceLocation,
}

/// Names a function body binds, grouped by where they live.
#[derive(Debug, Clone, Default)]
pub struct ScopeInfo {
    /// Assigned in the body (and not declared global/nonlocal), plus parameters
    pub locals: FxHashSet<Rc<str>>,
    pub globals: FxHashSet<Rc<str>>,
    pub nonlocals: FxHashSet<Rc<str>>,
}

/// `def` / `async def`
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: Rc<str>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub returns: Option<Expr>,
    pub code: CodeId,
    pub scope: ScopeInfo,
    pub location: SourceLocation,
    /// Last source line belonging to the definition
    pub end_line: usize,
}

/// `class Name(bases): body`
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: Rc<str>,
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub code: CodeId,
    pub location: SourceLocation,
    pub end_line: usize,
}

/// `except [type [as name]]: body`
#[derive(Debug, Clone)]
pub struct ExceptHandler {
    pub kind: Option<Expr>,
    pub name: Option<Rc<str>>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// One `context [as target]` item of a `with` statement
#[derive(Debug, Clone)]
pub struct WithItem {
    pub context: Expr,
    pub alias: Option<Expr>,
}

/// `name [as asname]` in an import statement
#[derive(Debug, Clone)]
pub struct Alias {
    pub name: Rc<str>,
    pub asname: Option<Rc<str>>,
    pub location: SourceLocation,
}

/// Statement nodes
#[derive(Debug, Clone)]
pub enum Stmt {
    FunctionDef(Rc<FunctionDef>),
    AsyncFunctionDef(Rc<FunctionDef>),
    ClassDef(Rc<ClassDef>),
    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },
    Delete {
        targets: Vec<Expr>,
        location: SourceLocation,
    },
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        location: SourceLocation,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
        location: SourceLocation,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
        location: SourceLocation,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        location: SourceLocation,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        location: SourceLocation,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        location: SourceLocation,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
        location: SourceLocation,
    },
    Raise {
        exc: Option<Expr>,
        location: SourceLocation,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
        location: SourceLocation,
    },
    Import {
        names: Vec<Alias>,
        location: SourceLocation,
    },
    ImportFrom {
        module: Rc<str>,
        names: Vec<Alias>,
        location: SourceLocation,
    },
    Global {
        names: Vec<Rc<str>>,
        location: SourceLocation,
    },
    Nonlocal {
        names: Vec<Rc<str>>,
        location: SourceLocation,
    },
    Expr {
        value: Expr,
        location: SourceLocation,
    },
    Pass {
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
}

impl Stmt {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            Stmt::FunctionDef(def) | Stmt::AsyncFunctionDef(def) => &def.location,
            Stmt::ClassDef(def) => &def.location,
            Stmt::Return { location, .. }
            | Stmt::Delete { location, .. }
            | Stmt::Assign { location, .. }
            | Stmt::AugAssign { location, .. }
            | Stmt::AnnAssign { location, .. }
            | Stmt::For { location, .. }
            | Stmt::While { location, .. }
            | Stmt::If { location, .. }
            | Stmt::With { location, .. }
            | Stmt::Try { location, .. }
            | Stmt::Raise { location, .. }
            | Stmt::Assert { location, .. }
            | Stmt::Import { location, .. }
            | Stmt::ImportFrom { location, .. }
            | Stmt::Global { location, .. }
            | Stmt::Nonlocal { location, .. }
            | Stmt::Expr { location, .. }
            | Stmt::Pass { location }
            | Stmt::Break { location }
            | Stmt::Continue { location } => location,
        }
    }

    /// The string constant if this is a bare string-literal statement
    pub fn as_docstring(&self) -> Option<&str> {
        match self {
            Stmt::Expr {
                value:
                    Expr::Constant {
                        value: Constant::Str(s),
                        ..
                    },
                ..
            } => Some(s),
            _ => None,
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new() -> Self {
        Module::default()
    }
}

/// A borrowed view of any syntax-tree node, used for generic traversal.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Module(&'a Module),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
    ExceptHandler(&'a ExceptHandler),
    Param(&'a Param),
    WithItem(&'a WithItem),
    Alias(&'a Alias),
}

impl<'a> Node<'a> {
    /// Direct children in source order.
    pub fn children(self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        match self {
            Node::Module(module) => push_stmts(&mut out, &module.body),
            Node::Stmt(stmt) => stmt_children(stmt, &mut out),
            Node::Expr(expr) => expr_children(expr, &mut out),
            Node::ExceptHandler(handler) => {
                if let Some(kind) = &handler.kind {
                    out.push(Node::Expr(kind));
                }
                push_stmts(&mut out, &handler.body);
            }
            Node::Param(param) => {
                if let Some(annotation) = &param.annotation {
                    out.push(Node::Expr(annotation));
                }
                if let Some(default) = &param.default {
                    out.push(Node::Expr(default));
                }
            }
            Node::WithItem(item) => {
                out.push(Node::Expr(&item.context));
                if let Some(alias) = &item.alias {
                    out.push(Node::Expr(alias));
                }
            }
            Node::Alias(_) => {}
        }
        out
    }
}

fn push_stmts<'a>(out: &mut Vec<Node<'a>>, stmts: &'a [Stmt]) {
    out.extend(stmts.iter().map(Node::Stmt));
}

fn push_exprs<'a>(out: &mut Vec<Node<'a>>, exprs: &'a [Expr]) {
    out.extend(exprs.iter().map(Node::Expr));
}

fn stmt_children<'a>(stmt: &'a Stmt, out: &mut Vec<Node<'a>>) {
    match stmt {
        Stmt::FunctionDef(def) | Stmt::AsyncFunctionDef(def) => {
            push_exprs(out, &def.decorators);
            out.extend(def.params.iter().map(Node::Param));
            if let Some(returns) = &def.returns {
                out.push(Node::Expr(returns));
            }
            push_stmts(out, &def.body);
        }
        Stmt::ClassDef(def) => {
            push_exprs(out, &def.decorators);
            push_exprs(out, &def.bases);
            push_stmts(out, &def.body);
        }
        Stmt::Return { value, .. } => out.extend(value.iter().map(Node::Expr)),
        Stmt::Delete { targets, .. } => push_exprs(out, targets),
        Stmt::Assign { targets, value, .. } => {
            push_exprs(out, targets);
            out.push(Node::Expr(value));
        }
        Stmt::AugAssign { target, value, .. } => {
            out.push(Node::Expr(target));
            out.push(Node::Expr(value));
        }
        Stmt::AnnAssign {
            target,
            annotation,
            value,
            ..
        } => {
            out.push(Node::Expr(target));
            out.push(Node::Expr(annotation));
            out.extend(value.iter().map(Node::Expr));
        }
        Stmt::For {
            target,
            iter,
            body,
            orelse,
            ..
        } => {
            out.push(Node::Expr(target));
            out.push(Node::Expr(iter));
            push_stmts(out, body);
            push_stmts(out, orelse);
        }
        Stmt::While {
            test, body, orelse, ..
        }
        | Stmt::If {
            test, body, orelse, ..
        } => {
            out.push(Node::Expr(test));
            push_stmts(out, body);
            push_stmts(out, orelse);
        }
        Stmt::With { items, body, .. } => {
            out.extend(items.iter().map(Node::WithItem));
            push_stmts(out, body);
        }
        Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        } => {
            push_stmts(out, body);
            out.extend(handlers.iter().map(Node::ExceptHandler));
            push_stmts(out, orelse);
            push_stmts(out, finalbody);
        }
        Stmt::Raise { exc, .. } => out.extend(exc.iter().map(Node::Expr)),
        Stmt::Assert { test, msg, .. } => {
            out.push(Node::Expr(test));
            out.extend(msg.iter().map(Node::Expr));
        }
        Stmt::Import { names, .. } | Stmt::ImportFrom { names, .. } => {
            out.extend(names.iter().map(Node::Alias));
        }
        Stmt::Expr { value, .. } => out.push(Node::Expr(value)),
        Stmt::Global { .. }
        | Stmt::Nonlocal { .. }
        | Stmt::Pass { .. }
        | Stmt::Break { .. }
        | Stmt::Continue { .. } => {}
    }
}

fn expr_children<'a>(expr: &'a Expr, out: &mut Vec<Node<'a>>) {
    match expr {
        Expr::Name { .. } | Expr::Constant { .. } => {}
        Expr::List { elts, .. } | Expr::Tuple { elts, .. } => push_exprs(out, elts),
        Expr::BinOp { left, right, .. } => {
            out.push(Node::Expr(left));
            out.push(Node::Expr(right));
        }
        Expr::UnaryOp { operand, .. } => out.push(Node::Expr(operand)),
        Expr::BoolOp { values, .. } => push_exprs(out, values),
        Expr::Compare {
            left, comparators, ..
        } => {
            out.push(Node::Expr(left));
            push_exprs(out, comparators);
        }
        Expr::Call { func, args, .. } => {
            out.push(Node::Expr(func));
            push_exprs(out, args);
        }
        Expr::Attribute { value, .. } => out.push(Node::Expr(value)),
        Expr::Subscript { value, index, .. } => {
            out.push(Node::Expr(value));
            out.push(Node::Expr(index));
        }
        Expr::IfExp {
            test, body, orelse, ..
        } => {
            out.push(Node::Expr(test));
            out.push(Node::Expr(body));
            out.push(Node::Expr(orelse));
        }
    }
}
