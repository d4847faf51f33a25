//! The analysis session.
//!
//! A [`Compilation`] owns every store the conversion core reads (types,
//! definitions, methods, well-known types), the synthesized delegate cache and
//! the per-expression delegate inference cache. It is `Send + Sync`: worker
//! threads share one `&Compilation` and classify concurrently.
//!
//! Besides accessors it offers the declaration and expression factories used
//! by callers (and tests) to describe the program being analyzed.

use coerce_common::interner::Atom;
use coerce_common::{AnalysisOptions, LanguageVersion};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

use crate::conversion::ConversionClassifier;
use crate::def::{DefFlags, DefId, DefKind, DefinitionInfo, DefinitionStore};
use crate::delegate::infer::{DelegateInferenceError, InferredDelegateType};
use crate::delegate::synthesized::SynthesizedDelegateCache;
use crate::expr::{
    Argument, Expr, ExprId, ExprKind, LambdaExpr, MethodGroupExpr, TupleArg,
};
use crate::intern::TypeInterner;
use crate::method::{MethodFlags, MethodId, MethodInfo, MethodKind, MethodStore, ParamInfo};
use crate::types::{RefKind, TypeId, TypeParamId, Variance};
use crate::well_known::WellKnownTypes;

pub(crate) type DelegateInferenceResult = Result<InferredDelegateType, DelegateInferenceError>;

pub struct Compilation {
    types: TypeInterner,
    defs: DefinitionStore,
    methods: MethodStore,
    well_known: WellKnownTypes,
    synthesized: SynthesizedDelegateCache,
    delegate_inference: DashMap<(ExprId, LanguageVersion), DelegateInferenceResult, FxBuildHasher>,
    options: AnalysisOptions,
    next_expr: AtomicU32,
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new(AnalysisOptions::default())
    }
}

impl Compilation {
    pub fn new(options: AnalysisOptions) -> Self {
        let types = TypeInterner::new();
        let defs = DefinitionStore::new();
        let methods = MethodStore::new();
        let well_known = WellKnownTypes::register(&types, &defs, &methods);
        debug!(
            language_version = %options.language_version,
            definitions = defs.len(),
            "Compilation::new"
        );
        Self {
            types,
            defs,
            methods,
            well_known,
            synthesized: SynthesizedDelegateCache::new(),
            delegate_inference: DashMap::with_hasher(FxBuildHasher),
            options,
            next_expr: AtomicU32::new(1),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline]
    pub fn types(&self) -> &TypeInterner {
        &self.types
    }

    #[inline]
    pub fn defs(&self) -> &DefinitionStore {
        &self.defs
    }

    #[inline]
    pub fn methods(&self) -> &MethodStore {
        &self.methods
    }

    #[inline]
    pub fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    #[inline]
    pub fn synthesized(&self) -> &SynthesizedDelegateCache {
        &self.synthesized
    }

    #[inline]
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// A classifier for the configured language version.
    pub fn classifier(&self) -> ConversionClassifier<'_> {
        ConversionClassifier::new(self)
    }

    pub fn intern(&self, text: &str) -> Atom {
        self.types.intern_string(text)
    }

    pub fn name_of(&self, atom: Atom) -> Arc<str> {
        self.types.resolve_atom(atom)
    }

    // -------------------------------------------------------------------------
    // Delegate inference cache
    // -------------------------------------------------------------------------

    pub(crate) fn cached_delegate_inference(
        &self,
        expr: ExprId,
        version: LanguageVersion,
    ) -> Option<DelegateInferenceResult> {
        self.delegate_inference
            .get(&(expr, version))
            .map(|entry| entry.value().clone())
    }

    /// Publish a result; if another thread got there first, its result wins.
    pub(crate) fn cache_delegate_inference(
        &self,
        expr: ExprId,
        version: LanguageVersion,
        result: DelegateInferenceResult,
    ) -> DelegateInferenceResult {
        self.delegate_inference
            .entry((expr, version))
            .or_insert(result)
            .value()
            .clone()
    }

    pub fn delegate_inference_cache_len(&self) -> usize {
        self.delegate_inference.len()
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    /// Registers a definition. Cached delegate inference results are
    /// dropped, since a new named delegate may now match.
    pub fn declare(&self, info: DefinitionInfo) -> DefId {
        let def = self.defs.register(info);
        self.delegate_inference.clear();
        def
    }

    pub fn declare_class(&self, name: &str, base: Option<TypeId>, interfaces: Vec<TypeId>) -> DefId {
        let mut info =
            DefinitionInfo::new(DefKind::Class, self.intern(name)).with_interfaces(interfaces);
        if let Some(base) = base {
            info = info.with_base(base);
        }
        self.declare(info)
    }

    pub fn declare_struct(&self, name: &str, interfaces: Vec<TypeId>) -> DefId {
        self.declare(DefinitionInfo::new(DefKind::Struct, self.intern(name)).with_interfaces(interfaces))
    }

    pub fn declare_ref_struct(&self, name: &str) -> DefId {
        self.declare(
            DefinitionInfo::new(DefKind::Struct, self.intern(name)).with_flags(DefFlags::REF_LIKE),
        )
    }

    pub fn declare_interface(&self, name: &str, bases: Vec<TypeId>) -> DefId {
        self.declare(DefinitionInfo::new(DefKind::Interface, self.intern(name)).with_interfaces(bases))
    }

    pub fn declare_enum(&self, name: &str, underlying: TypeId) -> DefId {
        let mut info = DefinitionInfo::new(DefKind::Enum, self.intern(name));
        info.enum_underlying = Some(underlying);
        self.declare(info)
    }

    /// A non-generic delegate with a by-value return.
    pub fn declare_delegate(&self, name: &str, params: Vec<ParamInfo>, return_type: TypeId) -> DefId {
        self.declare_delegate_with(name, Vec::new(), params, return_type, RefKind::None)
    }

    /// A delegate with type parameters and an explicit return ref-kind.
    pub fn declare_delegate_with(
        &self,
        name: &str,
        type_params: Vec<TypeParamId>,
        params: Vec<ParamInfo>,
        return_type: TypeId,
        return_ref: RefKind,
    ) -> DefId {
        let def = self.defs.register(
            DefinitionInfo::new(DefKind::Delegate, self.intern(name))
                .with_type_params(type_params)
                .with_base(TypeId::MULTICAST_DELEGATE)
                .with_flags(DefFlags::SEALED),
        );
        let invoke = self.methods.register(
            MethodInfo::new(self.intern("Invoke"), params, return_type)
                .with_kind(MethodKind::DelegateInvoke)
                .with_containing(def)
                .with_return_ref(return_ref),
        );
        self.defs.update(def, |info| info.invoke = Some(invoke));
        self.delegate_inference.clear();
        def
    }

    pub fn declare_method(&self, info: MethodInfo) -> MethodId {
        self.methods.register(info)
    }

    /// `public static implicit|explicit operator to(from value)` on `def`.
    pub fn add_conversion_operator(&self, def: DefId, implicit: bool, from: TypeId, to: TypeId) -> MethodId {
        let (kind, name) = if implicit {
            (MethodKind::ImplicitConversion, "op_Implicit")
        } else {
            (MethodKind::ExplicitConversion, "op_Explicit")
        };
        let operator = self.methods.register(
            MethodInfo::new(self.intern(name), vec![self.param("value", from)], to)
                .with_kind(kind)
                .with_containing(def)
                .with_flags(MethodFlags::STATIC),
        );
        self.defs.update(def, |info| info.conversion_operators.push(operator));
        operator
    }

    /// `public void Deconstruct(out T1 a, out T2 b, ...)` on `def`.
    pub fn add_deconstructor(&self, def: DefId, outputs: &[TypeId]) -> MethodId {
        let params = outputs
            .iter()
            .enumerate()
            .map(|(i, &ty)| self.param(&format!("item{}", i + 1), ty).with_ref_kind(RefKind::Out))
            .collect();
        let method = self.methods.register(
            MethodInfo::new(self.intern("Deconstruct"), params, TypeId::VOID).with_containing(def),
        );
        self.defs.update(def, |info| info.deconstructors.push(method));
        method
    }

    pub fn param(&self, name: &str, ty: TypeId) -> ParamInfo {
        ParamInfo::new(self.intern(name), ty)
    }

    pub fn type_param(&self, name: &str) -> TypeParamId {
        self.types.fresh_type_param(name, Variance::Invariant)
    }

    /// The type of a non-generic definition.
    pub fn named(&self, def: DefId) -> TypeId {
        self.types.named(def, [])
    }

    pub fn named_with(&self, def: DefId, args: &[TypeId]) -> TypeId {
        self.types.named(def, args.iter().copied())
    }

    /// `Func<args.., result>`; `None` past the largest arity.
    pub fn func_of(&self, params: &[TypeId], result: TypeId) -> Option<TypeId> {
        let def = *self.well_known.func.get(params.len())?;
        Some(self.types.named(def, params.iter().copied().chain([result])))
    }

    /// `Action<args..>`; `None` past the largest arity.
    pub fn action_of(&self, params: &[TypeId]) -> Option<TypeId> {
        let def = *self.well_known.action.get(params.len())?;
        Some(self.types.named(def, params.iter().copied()))
    }

    pub fn expression_of(&self, delegate: TypeId) -> TypeId {
        self.types.named(self.well_known.expression, [delegate])
    }

    pub fn span_of(&self, element: TypeId) -> TypeId {
        self.types.named(self.well_known.span, [element])
    }

    pub fn read_only_span_of(&self, element: TypeId) -> TypeId {
        self.types.named(self.well_known.read_only_span, [element])
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    pub fn next_expr_id(&self) -> ExprId {
        ExprId(self.next_expr.fetch_add(1, Ordering::Relaxed))
    }

    pub fn expr(&self, kind: ExprKind) -> Expr {
        Expr {
            id: self.next_expr_id(),
            kind,
        }
    }

    pub fn typed(&self, ty: TypeId) -> Expr {
        self.expr(ExprKind::Typed { ty, constant: None })
    }

    /// An integral constant of type `ty`.
    pub fn constant(&self, ty: TypeId, value: i128) -> Expr {
        self.expr(ExprKind::Typed {
            ty,
            constant: Some(value),
        })
    }

    pub fn parameter(&self, name: &str) -> Expr {
        self.expr(ExprKind::Parameter(self.intern(name)))
    }

    pub fn null_literal(&self) -> Expr {
        self.expr(ExprKind::NullLiteral)
    }

    pub fn default_literal(&self) -> Expr {
        self.expr(ExprKind::DefaultLiteral)
    }

    pub fn lambda(&self, lambda: LambdaExpr) -> Expr {
        self.expr(ExprKind::Lambda(Arc::new(lambda)))
    }

    pub fn method_group(&self, group: MethodGroupExpr) -> Expr {
        self.expr(ExprKind::MethodGroup(Arc::new(group)))
    }

    pub fn stackalloc(&self, element: TypeId) -> Expr {
        self.expr(ExprKind::StackAlloc { element })
    }

    pub fn tuple_literal(&self, elements: Vec<TupleArg>) -> Expr {
        self.expr(ExprKind::TupleLiteral(elements))
    }

    /// An unnamed tuple literal.
    pub fn tuple_of_exprs(&self, elements: Vec<Expr>) -> Expr {
        self.tuple_literal(
            elements
                .into_iter()
                .map(|expr| TupleArg { name: None, expr })
                .collect(),
        )
    }

    pub fn interpolated_string(&self) -> Expr {
        self.expr(ExprKind::InterpolatedString)
    }

    pub fn throw_expr(&self) -> Expr {
        self.expr(ExprKind::Throw)
    }

    pub fn conditional(&self, when_true: Expr, when_false: Expr) -> Expr {
        self.expr(ExprKind::Conditional {
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        })
    }

    pub fn switch(&self, arms: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Switch { arms })
    }

    pub fn target_typed_new(&self, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::TargetTypedNew { args })
    }

    pub fn invocation(&self, group: MethodGroupExpr, args: Vec<Argument>) -> Expr {
        self.expr(ExprKind::Invocation {
            group: Arc::new(group),
            args,
        })
    }

    pub fn implicit_array(&self, elements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::ImplicitArray { elements })
    }
}

#[cfg(test)]
#[path = "../tests/compilation_tests.rs"]
mod tests;
