//! Well-known library types registered with every compilation.
//!
//! - `Action`, `Action<T1..T16>` and `Func<TResult>`, `Func<T1..T16, TResult>`
//! - `Expression<TDelegate>` (derives from `LambdaExpression`)
//! - `Span<T>`, `ReadOnlySpan<T>` (ref-like), with the implicit
//!   `Span<T>` to `ReadOnlySpan<T>` operator
//! - `IEnumerable<out T>`, `IList<T>`, `IReadOnlyList<out T>`

use coerce_common::limits::MAX_FUNC_ARITY;

use crate::def::{DefFlags, DefId, DefKind, DefinitionInfo, DefinitionStore};
use crate::intern::TypeInterner;
use crate::method::{MethodFlags, MethodInfo, MethodKind, MethodStore, ParamInfo};
use crate::types::{TypeId, TypeParamId, Variance};

#[derive(Clone, Debug)]
pub struct WellKnownTypes {
    /// `action[n]` takes `n` parameters.
    pub action: Vec<DefId>,
    /// `func[n]` takes `n` parameters plus a result type parameter.
    pub func: Vec<DefId>,
    pub expression: DefId,
    pub span: DefId,
    pub read_only_span: DefId,
    pub ienumerable: DefId,
    pub ilist: DefId,
    pub ireadonly_list: DefId,
}

impl WellKnownTypes {
    pub fn register(
        types: &TypeInterner,
        defs: &DefinitionStore,
        methods: &MethodStore,
    ) -> Self {
        let mut action = Vec::with_capacity(MAX_FUNC_ARITY + 1);
        let mut func = Vec::with_capacity(MAX_FUNC_ARITY + 1);
        for arity in 0..=MAX_FUNC_ARITY {
            action.push(register_delegate_family(types, defs, methods, "Action", arity, false));
            func.push(register_delegate_family(types, defs, methods, "Func", arity, true));
        }

        let expression_param = types.fresh_type_param("TDelegate", Variance::Invariant);
        let expression = defs.register(
            DefinitionInfo::new(DefKind::Class, types.intern_string("Expression"))
                .with_type_params(vec![expression_param])
                .with_base(TypeId::LAMBDA_EXPRESSION)
                .with_flags(DefFlags::SEALED),
        );

        let span = register_generic(types, defs, "Span", DefKind::Struct, Variance::Invariant);
        let read_only_span =
            register_generic(types, defs, "ReadOnlySpan", DefKind::Struct, Variance::Invariant);
        for def in [span, read_only_span] {
            defs.update(def, |info| info.flags |= DefFlags::REF_LIKE);
        }
        register_span_widening(types, defs, methods, span, read_only_span);

        let ienumerable =
            register_generic(types, defs, "IEnumerable", DefKind::Interface, Variance::Out);

        let ilist_param = types.fresh_type_param("T", Variance::Invariant);
        let ilist_enumerable = types.named(ienumerable, [types.type_param(ilist_param)]);
        let ilist = defs.register(
            DefinitionInfo::new(DefKind::Interface, types.intern_string("IList"))
                .with_type_params(vec![ilist_param])
                .with_interfaces(vec![ilist_enumerable]),
        );

        let readonly_param = types.fresh_type_param("T", Variance::Out);
        let readonly_enumerable = types.named(ienumerable, [types.type_param(readonly_param)]);
        let ireadonly_list = defs.register(
            DefinitionInfo::new(DefKind::Interface, types.intern_string("IReadOnlyList"))
                .with_type_params(vec![readonly_param])
                .with_interfaces(vec![readonly_enumerable]),
        );

        Self {
            action,
            func,
            expression,
            span,
            read_only_span,
            ienumerable,
            ilist,
            ireadonly_list,
        }
    }

    /// Parameter count if `def` is one of the `Action` family.
    pub fn action_arity(&self, def: DefId) -> Option<usize> {
        self.action.iter().position(|&d| d == def)
    }

    /// Parameter count (excluding the result) if `def` is one of the `Func`
    /// family.
    pub fn func_arity(&self, def: DefId) -> Option<usize> {
        self.func.iter().position(|&d| d == def)
    }

    pub fn is_action_or_func(&self, def: DefId) -> bool {
        self.action_arity(def).is_some() || self.func_arity(def).is_some()
    }

    /// Interfaces every single-dimensional array `T[]` implements, as
    /// definitions instantiated with the element type.
    pub fn array_interfaces(&self) -> [DefId; 3] {
        [self.ilist, self.ireadonly_list, self.ienumerable]
    }
}

fn register_generic(
    types: &TypeInterner,
    defs: &DefinitionStore,
    name: &str,
    kind: DefKind,
    variance: Variance,
) -> DefId {
    let param = types.fresh_type_param("T", variance);
    defs.register(DefinitionInfo::new(kind, types.intern_string(name)).with_type_params(vec![param]))
}

/// `public static implicit operator ReadOnlySpan<T>(Span<T> span)`
fn register_span_widening(
    types: &TypeInterner,
    defs: &DefinitionStore,
    methods: &MethodStore,
    span: DefId,
    read_only_span: DefId,
) {
    let Some(param) = defs.get(span).and_then(|info| info.type_params.first().copied()) else {
        return;
    };
    let element = types.type_param(param);
    let operator = methods.register(
        MethodInfo::new(
            types.intern_string("op_Implicit"),
            vec![ParamInfo::new(
                types.intern_string("span"),
                types.named(span, [element]),
            )],
            types.named(read_only_span, [element]),
        )
        .with_kind(MethodKind::ImplicitConversion)
        .with_containing(span)
        .with_flags(MethodFlags::STATIC),
    );
    defs.update(span, |info| info.conversion_operators.push(operator));
}

/// Register `Action<T1..Tn>` or `Func<T1..Tn, TResult>` with its `Invoke`.
fn register_delegate_family(
    types: &TypeInterner,
    defs: &DefinitionStore,
    methods: &MethodStore,
    name: &str,
    arity: usize,
    has_result: bool,
) -> DefId {
    let mut params: Vec<TypeParamId> = (1..=arity)
        .map(|i| {
            let param_name = if arity == 1 { "T".to_string() } else { format!("T{i}") };
            types.fresh_type_param(&param_name, Variance::In)
        })
        .collect();
    let result = has_result.then(|| types.fresh_type_param("TResult", Variance::Out));
    if let Some(result) = result {
        params.push(result);
    }

    let def = defs.register(
        DefinitionInfo::new(DefKind::Delegate, types.intern_string(name))
            .with_type_params(params.clone())
            .with_base(TypeId::MULTICAST_DELEGATE)
            .with_flags(DefFlags::SEALED),
    );

    let invoke_params = params
        .iter()
        .take(arity)
        .enumerate()
        .map(|(i, &p)| {
            ParamInfo::new(
                types.intern_string(&format!("arg{}", i + 1)),
                types.type_param(p),
            )
        })
        .collect();
    let return_type = result.map_or(TypeId::VOID, |r| types.type_param(r));
    let invoke = methods.register(
        MethodInfo::new(types.intern_string("Invoke"), invoke_params, return_type)
            .with_kind(MethodKind::DelegateInvoke)
            .with_containing(def),
    );
    defs.update(def, |info| info.invoke = Some(invoke));
    def
}
