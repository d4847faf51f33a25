//! Source expressions as the conversion core sees them.
//!
//! This is not a syntax tree. It carries only what classification and
//! inference need: the type of already-bound expressions, and the full shape
//! of the "untyped" forms (lambdas, method groups, literals, tuple literals,
//! conditional and switch expressions) whose conversions depend on the target.
//!
//! Every node has a stable [`ExprId`], which keys the per-expression delegate
//! inference cache.

use coerce_common::interner::Atom;
use std::sync::Arc;

use crate::method::MethodId;
use crate::types::{RefKind, TypeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Clone, Debug)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    /// An already-bound expression of known type. `constant` holds the value
    /// of integral constant expressions.
    Typed { ty: TypeId, constant: Option<i128> },
    /// A reference to an enclosing lambda's parameter.
    Parameter(Atom),
    NullLiteral,
    /// `default` without a type.
    DefaultLiteral,
    Lambda(Arc<LambdaExpr>),
    MethodGroup(Arc<MethodGroupExpr>),
    /// `stackalloc T[n]`
    StackAlloc { element: TypeId },
    TupleLiteral(Vec<TupleArg>),
    /// `$"..."`
    InterpolatedString,
    /// `throw e` in expression position.
    Throw,
    Conditional {
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    Switch { arms: Vec<Expr> },
    /// Target-typed `new(...)`.
    TargetTypedNew { args: Vec<Expr> },
    /// Call through a method group, e.g. `M(x, y)`.
    Invocation {
        group: Arc<MethodGroupExpr>,
        args: Vec<Argument>,
    },
    /// `new[] { ... }`
    ImplicitArray { elements: Vec<Expr> },
}

#[derive(Clone, Debug)]
pub struct TupleArg {
    pub name: Option<Atom>,
    pub expr: Expr,
}

/// An argument at a call site.
#[derive(Clone, Debug)]
pub struct Argument {
    pub expr: Expr,
    pub ref_kind: RefKind,
}

impl Argument {
    pub fn value(expr: Expr) -> Self {
        Self {
            expr,
            ref_kind: RefKind::None,
        }
    }

    pub fn by_ref(expr: Expr, ref_kind: RefKind) -> Self {
        Self { expr, ref_kind }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionFlavor {
    Lambda,
    /// `delegate (...) { ... }`
    AnonymousMethod,
}

#[derive(Clone, Debug)]
pub struct LambdaParam {
    pub name: Atom,
    /// `None` for implicitly typed parameters.
    pub ty: Option<TypeId>,
    pub ref_kind: RefKind,
    pub is_params: bool,
}

#[derive(Clone, Debug)]
pub enum LambdaBody {
    Expression(Box<Expr>),
    Block {
        /// One entry per `return` statement; `None` for `return;`.
        returns: Vec<Option<Expr>>,
    },
}

#[derive(Clone, Debug)]
pub struct LambdaExpr {
    pub flavor: FunctionFlavor,
    pub params: Vec<LambdaParam>,
    pub return_type: Option<TypeId>,
    pub return_ref: RefKind,
    pub body: LambdaBody,
}

impl LambdaParam {
    pub fn explicit(name: Atom, ty: TypeId) -> Self {
        Self {
            name,
            ty: Some(ty),
            ref_kind: RefKind::None,
            is_params: false,
        }
    }

    pub fn implicit(name: Atom) -> Self {
        Self {
            name,
            ty: None,
            ref_kind: RefKind::None,
            is_params: false,
        }
    }

    pub fn with_ref_kind(mut self, ref_kind: RefKind) -> Self {
        self.ref_kind = ref_kind;
        self
    }

    pub fn with_params(mut self) -> Self {
        self.is_params = true;
        self
    }
}

impl LambdaExpr {
    /// `(params) => body`
    pub fn expression_bodied(params: Vec<LambdaParam>, body: Expr) -> Self {
        Self {
            flavor: FunctionFlavor::Lambda,
            params,
            return_type: None,
            return_ref: RefKind::None,
            body: LambdaBody::Expression(Box::new(body)),
        }
    }

    /// `(params) => { ... }` with the given `return` statements.
    pub fn block(params: Vec<LambdaParam>, returns: Vec<Option<Expr>>) -> Self {
        Self {
            flavor: FunctionFlavor::Lambda,
            params,
            return_type: None,
            return_ref: RefKind::None,
            body: LambdaBody::Block { returns },
        }
    }

    /// `delegate (params) { ... }`
    pub fn anonymous_method(params: Vec<LambdaParam>, returns: Vec<Option<Expr>>) -> Self {
        Self {
            flavor: FunctionFlavor::AnonymousMethod,
            ..Self::block(params, returns)
        }
    }

    pub fn with_return_type(mut self, ty: TypeId) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_return_ref(mut self, ref_kind: RefKind) -> Self {
        self.return_ref = ref_kind;
        self
    }

    pub fn has_implicit_params(&self) -> bool {
        self.params.iter().any(|p| p.ty.is_none())
    }

    pub fn is_statement_body(&self) -> bool {
        matches!(self.body, LambdaBody::Block { .. })
    }
}

/// How a method group was accessed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Receiver {
    /// Simple name `M`: instance and static members are both in scope.
    None,
    /// `Type.M`: static members only.
    Type(TypeId),
    /// `value.M`: instance members, then extension methods on the value.
    Value(TypeId),
}

#[derive(Clone, Debug)]
pub struct MethodGroupExpr {
    pub name: Atom,
    pub receiver: Receiver,
    /// Member candidates gathered by name lookup.
    pub candidates: Vec<MethodId>,
    /// Extension method candidates grouped by scope, nearest scope first.
    pub extension_scopes: Vec<Vec<MethodId>>,
    /// Explicit type arguments (`M<int>`).
    pub type_args: Vec<TypeId>,
}

impl MethodGroupExpr {
    pub fn new(name: Atom, candidates: Vec<MethodId>) -> Self {
        Self {
            name,
            receiver: Receiver::None,
            candidates,
            extension_scopes: Vec::new(),
            type_args: Vec::new(),
        }
    }

    pub fn with_receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = receiver;
        self
    }

    /// Append an extension method scope, farther than every scope added so
    /// far.
    pub fn with_extension_scope(mut self, methods: Vec<MethodId>) -> Self {
        self.extension_scopes.push(methods);
        self
    }

    pub fn with_type_args(mut self, type_args: Vec<TypeId>) -> Self {
        self.type_args = type_args;
        self
    }
}

impl Expr {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, ExprKind::Lambda(_) | ExprKind::MethodGroup(_))
    }

    pub fn as_lambda(&self) -> Option<&LambdaExpr> {
        match &self.kind {
            ExprKind::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    pub fn as_method_group(&self) -> Option<&MethodGroupExpr> {
        match &self.kind {
            ExprKind::MethodGroup(group) => Some(group),
            _ => None,
        }
    }

    pub fn constant_value(&self) -> Option<i128> {
        match self.kind {
            ExprKind::Typed { constant, .. } => constant,
            _ => None,
        }
    }
}
