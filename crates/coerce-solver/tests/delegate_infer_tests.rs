use super::*;
use coerce_common::LanguageVersion;
use coerce_common::diagnostics::diagnostic_codes;

use crate::compilation::Compilation;
use crate::expr::LambdaParam;
use crate::fixture::{
    generic_method, group, implicit_lambda, instance_method, static_method, typed_lambda, void_block_lambda,
};
use crate::method::CustomModifier;

fn infer(comp: &Compilation, expr: &Expr) -> Result<InferredDelegateType, DelegateInferenceError> {
    comp.classifier().infer_delegate_type(expr)
}

fn func(comp: &Compilation, params: &[TypeId], ret: TypeId) -> TypeId {
    let Some(ty) = comp.func_of(params, ret) else {
        panic!("Func of arity {} must exist", params.len());
    };
    ty
}

fn ref_identity_lambda(comp: &Compilation) -> Expr {
    let x = comp.intern("x");
    comp.lambda(LambdaExpr::expression_bodied(
        vec![LambdaParam::explicit(x, TypeId::INT).with_ref_kind(RefKind::Ref)],
        comp.parameter("x"),
    ))
}

// =============================================================================
// Lambdas
// =============================================================================

#[test]
fn test_typed_lambda_infers_func() {
    let comp = Compilation::default();
    let lambda = typed_lambda(&comp, &[("x", TypeId::INT)], comp.parameter("x"));
    let Ok(inferred) = infer(&comp, &lambda) else {
        panic!("(int x) => x has a natural type");
    };
    assert_eq!(inferred.ty, func(&comp, &[TypeId::INT], TypeId::INT));
    assert_eq!(inferred.source, DelegateSource::WellKnown(comp.well_known().func[1]));
    assert!(!inferred.is_synthesized());
    assert_eq!(inferred.signature.return_type, TypeId::INT);
}

#[test]
fn test_implicit_parameters_have_no_natural_type() {
    let comp = Compilation::default();
    let lambda = implicit_lambda(&comp, &["x"], comp.parameter("x"));
    let error = infer(&comp, &lambda).err();
    assert_eq!(error, Some(DelegateInferenceError::ImplicitlyTypedParameters));
    assert_eq!(
        error.map(|e| e.diagnostic().code),
        Some(diagnostic_codes::DELEGATE_TYPE_COULD_NOT_BE_INFERRED)
    );
}

#[test]
fn test_inference_needs_language_support() {
    let comp = Compilation::default();
    let lambda = typed_lambda(&comp, &[("x", TypeId::INT)], comp.parameter("x"));
    let old = comp.classifier().with_language_version(LanguageVersion::V9);
    assert_eq!(
        old.infer_delegate_type(&lambda).err(),
        Some(DelegateInferenceError::FeatureNotAvailable)
    );
    assert!(infer(&comp, &lambda).is_ok());
}

#[test]
fn test_non_functions_are_rejected() {
    let comp = Compilation::default();
    assert_eq!(
        infer(&comp, &comp.typed(TypeId::INT)).err(),
        Some(DelegateInferenceError::NotAFunction)
    );
}

#[test]
fn test_void_block_infers_action() {
    let comp = Compilation::default();
    let lambda = void_block_lambda(&comp, &[("x", TypeId::INT)]);
    let Ok(inferred) = infer(&comp, &lambda) else {
        panic!("(int x) => {{ }} has a natural type");
    };
    assert_eq!(comp.action_of(&[TypeId::INT]), Some(inferred.ty));
    assert_eq!(inferred.source, DelegateSource::WellKnown(comp.well_known().action[1]));
    assert!(inferred.signature.returns_void());
}

#[test]
fn test_return_type_not_inferable() {
    let comp = Compilation::default();
    let mixed = comp.lambda(LambdaExpr::block(
        Vec::new(),
        vec![None, Some(comp.constant(TypeId::INT, 1))],
    ));
    assert_eq!(
        infer(&comp, &mixed).err(),
        Some(DelegateInferenceError::CannotInferReturnType)
    );

    let throws = typed_lambda(&comp, &[], comp.throw_expr());
    assert_eq!(
        infer(&comp, &throws).err(),
        Some(DelegateInferenceError::CannotInferReturnType)
    );

    let untyped = typed_lambda(&comp, &[], comp.null_literal());
    assert!(infer(&comp, &untyped).is_err());
}

#[test]
fn test_block_returns_use_best_common_type() {
    let comp = Compilation::default();
    let lambda = comp.lambda(LambdaExpr::block(
        Vec::new(),
        vec![Some(comp.constant(TypeId::INT, 1)), Some(comp.typed(TypeId::LONG))],
    ));
    let Ok(inferred) = infer(&comp, &lambda) else {
        panic!("int and long have a best common type");
    };
    assert_eq!(inferred.ty, func(&comp, &[], TypeId::LONG));
}

#[test]
fn test_explicit_return_type() {
    let comp = Compilation::default();
    let lambda = comp.lambda(
        LambdaExpr::expression_bodied(Vec::new(), comp.constant(TypeId::INT, 1)).with_return_type(TypeId::OBJECT),
    );
    let Ok(inferred) = infer(&comp, &lambda) else {
        panic!("object () => 1 has a natural type");
    };
    assert_eq!(inferred.ty, func(&comp, &[], TypeId::OBJECT));
}

// =============================================================================
// Delegate selection
// =============================================================================

#[test]
fn test_ref_parameter_synthesizes_and_reuses() {
    let comp = Compilation::default();
    let Ok(first) = infer(&comp, &ref_identity_lambda(&comp)) else {
        panic!("(ref int x) => x has a natural type");
    };
    let Ok(second) = infer(&comp, &ref_identity_lambda(&comp)) else {
        panic!("(ref int x) => x has a natural type");
    };
    assert!(first.is_synthesized());
    assert_eq!(first.ty, second.ty);
    assert_eq!(first.source, second.source);
    assert_eq!(comp.synthesized().len(), 1);
    assert_eq!(first.signature.params[0].ref_kind, RefKind::Ref);
}

#[test]
fn test_matching_named_delegate_is_reused() {
    let comp = Compilation::default();
    let ref_fn = comp.declare_delegate_with(
        "RefFn",
        Vec::new(),
        vec![comp.param("x", TypeId::INT).with_ref_kind(RefKind::Ref)],
        TypeId::INT,
        RefKind::None,
    );
    let Ok(inferred) = infer(&comp, &ref_identity_lambda(&comp)) else {
        panic!("(ref int x) => x has a natural type");
    };
    assert_eq!(inferred.source, DelegateSource::Named(ref_fn));
    assert_eq!(inferred.ty, comp.named(ref_fn));
    assert!(comp.synthesized().is_empty());
}

#[test]
fn test_private_named_delegate_is_skipped() {
    let comp = Compilation::default();
    let hidden = comp.declare_delegate_with(
        "Hidden",
        Vec::new(),
        vec![comp.param("x", TypeId::INT).with_ref_kind(RefKind::Ref)],
        TypeId::INT,
        RefKind::None,
    );
    comp.defs()
        .update(hidden, |info| info.accessibility = Accessibility::Private);
    let Ok(inferred) = infer(&comp, &ref_identity_lambda(&comp)) else {
        panic!("(ref int x) => x has a natural type");
    };
    assert!(inferred.is_synthesized());
}

#[test]
fn test_plain_signature_prefers_func_over_named() {
    let comp = Compilation::default();
    comp.declare_delegate("Unary", vec![comp.param("x", TypeId::INT)], TypeId::INT);
    let lambda = typed_lambda(&comp, &[("x", TypeId::INT)], comp.parameter("x"));
    let Ok(inferred) = infer(&comp, &lambda) else {
        panic!("(int x) => x has a natural type");
    };
    assert!(matches!(inferred.source, DelegateSource::WellKnown(_)));
}

#[test]
fn test_pointer_parameter_cannot_be_synthesized() {
    let comp = Compilation::default();
    let pointer = comp.types().pointer(TypeId::INT);
    let lambda = void_block_lambda(&comp, &[("p", pointer)]);
    assert_eq!(
        infer(&comp, &lambda).err(),
        Some(DelegateInferenceError::UnsupportedSignature(SynthesisError::PointerType(pointer)))
    );
}

// =============================================================================
// Method groups
// =============================================================================

#[test]
fn test_single_method_infers_action() {
    let comp = Compilation::default();
    let m = static_method(&comp, "M", &[], TypeId::VOID);
    let Ok(inferred) = infer(&comp, &group(&comp, "M", vec![m])) else {
        panic!("M has a natural type");
    };
    assert_eq!(inferred.source, DelegateSource::WellKnown(comp.well_known().action[0]));
}

#[test]
fn test_overloads_with_different_signatures_are_ambiguous() {
    let comp = Compilation::default();
    let by_int = static_method(&comp, "M", &[TypeId::INT], TypeId::VOID);
    let by_string = static_method(&comp, "M", &[TypeId::STRING], TypeId::VOID);
    let error = infer(&comp, &group(&comp, "M", vec![by_int, by_string])).err();
    assert_eq!(
        error,
        Some(DelegateInferenceError::AmbiguousMethodGroup {
            candidates: vec![by_int, by_string]
        })
    );
    assert_eq!(error.map(|e| e.diagnostic().code), Some(diagnostic_codes::AMBIGUOUS_CALL));
}

#[test]
fn test_generic_method_needs_type_arguments() {
    let comp = Compilation::default();
    let (echo, _) = generic_method(&comp, "Echo", |t| (vec![t], t));
    assert_eq!(
        infer(&comp, &group(&comp, "Echo", vec![echo])).err(),
        Some(DelegateInferenceError::OpenGenericMethod(echo))
    );

    let closed = comp.method_group(MethodGroupExpr::new(comp.intern("Echo"), vec![echo]).with_type_args(vec![TypeId::INT]));
    let Ok(inferred) = infer(&comp, &closed) else {
        panic!("Echo<int> has a natural type");
    };
    assert_eq!(inferred.ty, func(&comp, &[TypeId::INT], TypeId::INT));
}

#[test]
fn test_extension_method_drops_receiver() {
    let comp = Compilation::default();
    let repeat = comp.declare_method(
        MethodInfo::new(
            comp.intern("Repeat"),
            vec![comp.param("self", TypeId::STRING), comp.param("count", TypeId::INT)],
            TypeId::STRING,
        )
        .with_flags(MethodFlags::STATIC | MethodFlags::EXTENSION),
    );
    let expr = comp.method_group(
        MethodGroupExpr::new(comp.intern("Repeat"), Vec::new())
            .with_receiver(Receiver::Value(TypeId::STRING))
            .with_extension_scope(vec![repeat]),
    );
    let Ok(inferred) = infer(&comp, &expr) else {
        panic!("text.Repeat has a natural type");
    };
    assert_eq!(inferred.ty, func(&comp, &[TypeId::INT], TypeId::STRING));

    let on_int = comp.method_group(
        MethodGroupExpr::new(comp.intern("Repeat"), Vec::new())
            .with_receiver(Receiver::Value(TypeId::INT))
            .with_extension_scope(vec![repeat]),
    );
    assert_eq!(infer(&comp, &on_int).err(), Some(DelegateInferenceError::NoCandidates));
}

#[test]
fn test_receiver_filters_members() {
    let comp = Compilation::default();
    let owner = comp.named(comp.declare_class("Owner", None, Vec::new()));
    let instance = instance_method(&comp, "Run", &[], TypeId::VOID);
    let through_type = comp.method_group(
        MethodGroupExpr::new(comp.intern("Run"), vec![instance]).with_receiver(Receiver::Type(owner)),
    );
    assert_eq!(
        infer(&comp, &through_type).err(),
        Some(DelegateInferenceError::NoCandidates)
    );

    let private = comp.declare_method(
        MethodInfo::new(comp.intern("Hidden"), Vec::new(), TypeId::VOID)
            .with_flags(MethodFlags::STATIC)
            .with_accessibility(Accessibility::Private),
    );
    let qualified = comp.method_group(
        MethodGroupExpr::new(comp.intern("Hidden"), vec![private]).with_receiver(Receiver::Type(owner)),
    );
    assert!(infer(&comp, &qualified).is_err());
    assert!(infer(&comp, &group(&comp, "Hidden", vec![private])).is_ok());
}

#[test]
fn test_unmanaged_callers_only_method() {
    let comp = Compilation::default();
    let callback = comp.declare_method(
        MethodInfo::new(comp.intern("Callback"), Vec::new(), TypeId::VOID)
            .with_flags(MethodFlags::STATIC | MethodFlags::UNMANAGED_CALLERS_ONLY),
    );
    let error = infer(&comp, &group(&comp, "Callback", vec![callback])).err();
    assert_eq!(error, Some(DelegateInferenceError::UnmanagedCallersOnly(callback)));
    assert_eq!(
        error.map(|e| e.diagnostic().code),
        Some(diagnostic_codes::UNMANAGED_CALLERS_ONLY_TO_DELEGATE)
    );
}

#[test]
fn test_unsupported_required_modifier() {
    let comp = Compilation::default();
    let modifier = comp.intern("Vendor.Unknown");
    let method = comp.declare_method(
        MethodInfo::new(comp.intern("Odd"), Vec::new(), TypeId::INT)
            .with_flags(MethodFlags::STATIC)
            .with_return_modifier(CustomModifier {
                modifier,
                is_optional: false,
            }),
    );
    let error = infer(&comp, &group(&comp, "Odd", vec![method])).err();
    assert_eq!(error, Some(DelegateInferenceError::UnsupportedModifier { method, modifier }));
    assert_eq!(
        error.map(|e| e.diagnostic().code),
        Some(diagnostic_codes::NOT_SUPPORTED_BY_LANGUAGE)
    );
}

// =============================================================================
// Caching and messages
// =============================================================================

#[test]
fn test_results_are_cached_per_version() {
    let comp = Compilation::default();
    let lambda = typed_lambda(&comp, &[("x", TypeId::INT)], comp.parameter("x"));
    let first = infer(&comp, &lambda);
    let second = infer(&comp, &lambda);
    assert_eq!(first, second);
    assert_eq!(comp.delegate_inference_cache_len(), 1);

    let older = comp.classifier().with_language_version(LanguageVersion::V11);
    assert_eq!(older.infer_delegate_type(&lambda), first);
    assert_eq!(comp.delegate_inference_cache_len(), 2);
}

#[test]
fn test_declaring_a_delegate_drops_cached_results() {
    let comp = Compilation::default();
    let lambda = ref_identity_lambda(&comp);
    let Ok(before) = infer(&comp, &lambda) else {
        panic!("(ref int x) => x has a natural type");
    };
    assert!(before.is_synthesized());
    assert_eq!(comp.delegate_inference_cache_len(), 1);

    let ref_fn = comp.declare_delegate(
        "RefFn",
        vec![comp.param("x", TypeId::INT).with_ref_kind(RefKind::Ref)],
        TypeId::INT,
    );
    assert_eq!(comp.delegate_inference_cache_len(), 0);
    let Ok(after) = infer(&comp, &lambda) else {
        panic!("(ref int x) => x has a natural type");
    };
    assert_eq!(after.source, DelegateSource::Named(ref_fn));
}

#[test]
fn test_error_messages() {
    let ambiguous = DelegateInferenceError::AmbiguousMethodGroup {
        candidates: vec![MethodId(1), MethodId(2)],
    };
    assert_eq!(
        ambiguous.to_string(),
        "method group has 2 candidates with different signatures"
    );
    assert_eq!(
        DelegateInferenceError::ImplicitlyTypedParameters.to_string(),
        "lambda has implicitly typed parameters"
    );
    assert_eq!(
        DelegateInferenceError::OpenGenericMethod(MethodId(7)).to_string(),
        "type arguments of method 7 cannot be determined"
    );
}
