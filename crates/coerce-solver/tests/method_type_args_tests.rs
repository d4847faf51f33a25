use super::*;
use coerce_common::LanguageVersion;
use coerce_common::diagnostics::diagnostic_codes;

use crate::fixture::{compilation, generic_method, group, implicit_lambda, static_method, typed_lambda, zoo};
use crate::method::MethodFlags;

fn infer(comp: &Compilation, method: MethodId, args: Vec<Expr>) -> Result<TypeArgs, InferenceError> {
    let args: Vec<Argument> = args.into_iter().map(Argument::value).collect();
    comp.classifier()
        .infer_method_type_args(method, &args, &CancellationToken::new())
}

fn func(comp: &Compilation, params: &[TypeId], ret: TypeId) -> TypeId {
    let Some(ty) = comp.func_of(params, ret) else {
        panic!("Func of arity {} must exist", params.len());
    };
    ty
}

// =============================================================================
// Bounds from typed arguments
// =============================================================================

#[test]
fn test_lower_bounds_pick_the_wider_type() {
    let comp = Compilation::default();
    let (pair, _) = generic_method(&comp, "Pair", |t| (vec![t, t], TypeId::VOID));
    let inferred = infer(&comp, pair, vec![comp.constant(TypeId::INT, 1), comp.typed(TypeId::LONG)]);
    assert_eq!(inferred.map(|args| args.to_vec()), Ok(vec![TypeId::LONG]));
}

#[test]
fn test_unrelated_lower_bounds_conflict() {
    let comp = Compilation::default();
    let (pair, tp) = generic_method(&comp, "Pair", |t| (vec![t, t], TypeId::VOID));
    let error = infer(&comp, pair, vec![comp.typed(TypeId::INT), comp.typed(TypeId::STRING)]).err();
    assert_eq!(
        error,
        Some(InferenceError::NoUniqueCandidate {
            param: tp,
            candidates: vec![TypeId::INT, TypeId::STRING],
        })
    );
    assert_eq!(
        error.map(|e| e.diagnostic().code),
        Some(diagnostic_codes::TYPE_ARGUMENTS_CANNOT_BE_INFERRED)
    );
}

#[test]
fn test_base_class_bound_from_siblings_fails() {
    let comp = Compilation::default();
    let z = zoo(&comp);
    let (pair, _) = generic_method(&comp, "Pair", |t| (vec![t, t], TypeId::VOID));
    assert!(infer(&comp, pair, vec![comp.typed(z.dog), comp.typed(z.cat)]).is_err());
    assert_eq!(
        infer(&comp, pair, vec![comp.typed(z.dog), comp.typed(z.animal)]).map(|args| args.to_vec()),
        Ok(vec![z.animal])
    );
}

#[test]
fn test_ref_argument_gives_exact_bound() {
    let comp = Compilation::default();
    let tp = comp.type_param("T");
    let t = comp.types().type_param(tp);
    let method = comp.declare_method(
        MethodInfo::new(
            comp.intern("Swap"),
            vec![comp.param("slot", t).with_ref_kind(RefKind::Ref), comp.param("value", t)],
            TypeId::VOID,
        )
        .with_type_params(vec![tp])
        .with_flags(MethodFlags::STATIC),
    );
    let args = [
        Argument::by_ref(comp.typed(TypeId::INT), RefKind::Ref),
        Argument::value(comp.typed(TypeId::SHORT)),
    ];
    let inferred = comp
        .classifier()
        .infer_method_type_args(method, &args, &CancellationToken::new());
    assert_eq!(inferred.map(|args| args.to_vec()), Ok(vec![TypeId::INT]));

    let conflicting = [
        Argument::by_ref(comp.typed(TypeId::INT), RefKind::Ref),
        Argument::value(comp.typed(TypeId::LONG)),
    ];
    assert!(matches!(
        comp.classifier()
            .infer_method_type_args(method, &conflicting, &CancellationToken::new()),
        Err(InferenceError::NoUniqueCandidate { .. })
    ));
}

#[test]
fn test_array_elements() {
    let comp = Compilation::default();
    let z = zoo(&comp);
    let types = comp.types();
    let (first, _) = generic_method(&comp, "First", |t| (vec![types.sz_array(t)], t));
    assert_eq!(
        infer(&comp, first, vec![comp.typed(types.sz_array(TypeId::INT))]).map(|args| args.to_vec()),
        Ok(vec![TypeId::INT])
    );

    let enumerable = comp.well_known().ienumerable;
    let (walk, _) = generic_method(&comp, "Walk", |t| (vec![types.named(enumerable, [t])], TypeId::VOID));
    assert_eq!(
        infer(&comp, walk, vec![comp.typed(types.sz_array(z.dog))]).map(|args| args.to_vec()),
        Ok(vec![z.dog])
    );
}

#[test]
fn test_tuple_literal_without_natural_type() {
    let comp = Compilation::default();
    let types = comp.types();
    let (take, _) = generic_method(&comp, "Take", |t| (vec![types.tuple_of(&[t, TypeId::STRING])], t));
    let literal = comp.tuple_of_exprs(vec![comp.constant(TypeId::INT, 1), comp.null_literal()]);
    assert_eq!(
        infer(&comp, take, vec![literal]).map(|args| args.to_vec()),
        Ok(vec![TypeId::INT])
    );
}

#[test]
fn test_params_array_expanded_form() {
    let comp = Compilation::default();
    let tp = comp.type_param("T");
    let t = comp.types().type_param(tp);
    let method = comp.declare_method(
        MethodInfo::new(
            comp.intern("Of"),
            vec![comp.param("items", comp.types().sz_array(t)).with_params()],
            TypeId::VOID,
        )
        .with_type_params(vec![tp])
        .with_flags(MethodFlags::STATIC),
    );
    assert_eq!(
        infer(&comp, method, vec![comp.constant(TypeId::INT, 1), comp.typed(TypeId::LONG)]).map(|a| a.to_vec()),
        Ok(vec![TypeId::LONG])
    );
    assert_eq!(
        infer(&comp, method, vec![comp.typed(comp.types().sz_array(TypeId::CHAR))]).map(|a| a.to_vec()),
        Ok(vec![TypeId::CHAR])
    );
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_lambda_return_type_flows_into_func() {
    let comp = Compilation::default();
    let (run, _) = generic_method(&comp, "Run", |t| (vec![func(&comp, &[], t)], t));
    let lambda = typed_lambda(&comp, &[], comp.constant(TypeId::INT, 1));
    assert_eq!(infer(&comp, run, vec![lambda]).map(|a| a.to_vec()), Ok(vec![TypeId::INT]));
}

#[test]
fn test_expression_tree_parameter_uses_its_delegate() {
    let comp = Compilation::default();
    let (quote, _) = generic_method(&comp, "Quote", |t| {
        (vec![comp.expression_of(func(&comp, &[], t))], TypeId::VOID)
    });
    let lambda = typed_lambda(&comp, &[], comp.typed(TypeId::STRING));
    assert_eq!(
        infer(&comp, quote, vec![lambda]).map(|a| a.to_vec()),
        Ok(vec![TypeId::STRING])
    );
}

#[test]
fn test_implicit_lambda_waits_for_input_types() {
    let comp = Compilation::default();
    let (apply, _) = generic_method(&comp, "Apply", |t| (vec![t, func(&comp, &[t], t)], t));
    let lambda = implicit_lambda(&comp, &["x"], comp.parameter("x"));
    assert_eq!(
        infer(&comp, apply, vec![comp.typed(TypeId::INT), lambda]).map(|a| a.to_vec()),
        Ok(vec![TypeId::INT])
    );
}

#[test]
fn test_method_group_return_type_flows_into_func() {
    let comp = Compilation::default();
    let show = static_method(&comp, "Show", &[TypeId::INT], TypeId::STRING);
    let (map, _) = generic_method(&comp, "Map", |t| (vec![func(&comp, &[TypeId::INT], t)], t));
    assert_eq!(
        infer(&comp, map, vec![group(&comp, "Show", vec![show])]).map(|a| a.to_vec()),
        Ok(vec![TypeId::STRING])
    );
}

#[test]
fn test_differing_function_types_never_agree() {
    let modern = compilation(LanguageVersion::V10);
    let (pair, tp) = generic_method(&modern, "Pair", |t| (vec![t, t], TypeId::VOID));
    let args = vec![
        typed_lambda(&modern, &[("x", TypeId::INT)], modern.parameter("x")),
        typed_lambda(&modern, &[("s", TypeId::STRING)], modern.parameter("s")),
    ];
    let Err(InferenceError::NoUniqueCandidate { param, candidates }) = infer(&modern, pair, args) else {
        panic!("Func<int, int> and Func<string, string> conflict");
    };
    assert_eq!(param, tp);
    assert_eq!(candidates.len(), 2);

    let legacy = compilation(LanguageVersion::V9);
    let (pair, tp) = generic_method(&legacy, "Pair", |t| (vec![t, t], TypeId::VOID));
    let args = vec![
        typed_lambda(&legacy, &[("x", TypeId::INT)], legacy.parameter("x")),
        typed_lambda(&legacy, &[("s", TypeId::STRING)], legacy.parameter("s")),
    ];
    assert_eq!(
        infer(&legacy, pair, args),
        Err(InferenceError::CannotInfer {
            method: pair,
            unfixed: vec![tp],
        })
    );
}

/// `Pair(((int a, int) x) => x, ((int b, int) y) => y)`
#[test]
fn test_function_types_differing_by_tuple_names_never_agree() {
    let comp = Compilation::default();
    let (pair, tp) = generic_method(&comp, "Pair", |t| (vec![t, t], TypeId::VOID));
    let named = |name: &str| {
        comp.types().tuple([
            crate::types::TupleElement {
                ty: TypeId::INT,
                name: Some(comp.intern(name)),
            },
            crate::types::TupleElement::unnamed(TypeId::INT),
        ])
    };
    let args = vec![
        typed_lambda(&comp, &[("x", named("a"))], comp.parameter("x")),
        typed_lambda(&comp, &[("y", named("b"))], comp.parameter("y")),
    ];
    let Err(InferenceError::NoUniqueCandidate { param, candidates }) = infer(&comp, pair, args) else {
        panic!("tuple element names make the two function types differ");
    };
    assert_eq!(param, tp);
    assert_eq!(candidates.len(), 2);
}

#[test]
fn test_same_function_type_is_inferred() {
    let comp = Compilation::default();
    let (pair, _) = generic_method(&comp, "Pair", |t| (vec![t, t], TypeId::VOID));
    let args = vec![
        typed_lambda(&comp, &[("x", TypeId::INT)], comp.parameter("x")),
        typed_lambda(&comp, &[("y", TypeId::INT)], comp.parameter("y")),
    ];
    assert_eq!(
        infer(&comp, pair, args).map(|a| a.to_vec()),
        Ok(vec![func(&comp, &[TypeId::INT], TypeId::INT)])
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_non_generic_method_has_no_type_arguments() {
    let comp = Compilation::default();
    let plain = static_method(&comp, "Plain", &[TypeId::INT], TypeId::VOID);
    assert_eq!(infer(&comp, plain, vec![comp.typed(TypeId::INT)]), Ok(TypeArgs::new()));
}

#[test]
fn test_unknown_method_and_argument_count() {
    let comp = Compilation::default();
    assert_eq!(
        infer(&comp, MethodId(999), Vec::new()),
        Err(InferenceError::UnknownMethod(MethodId(999)))
    );

    let (echo, _) = generic_method(&comp, "Echo", |t| (vec![t], t));
    let error = infer(&comp, echo, vec![comp.typed(TypeId::INT), comp.typed(TypeId::INT)]).err();
    assert_eq!(
        error,
        Some(InferenceError::ArgumentCountMismatch {
            expected: 1,
            actual: 2
        })
    );
    assert_eq!(error.map(|e| e.outcome()), Some("argument_count_mismatch"));
}

#[test]
fn test_parameter_without_bounds_cannot_be_inferred() {
    let comp = Compilation::default();
    let (make, tp) = generic_method(&comp, "Make", |t| (vec![TypeId::INT], t));
    let error = infer(&comp, make, vec![comp.constant(TypeId::INT, 3)]).err();
    assert_eq!(
        error,
        Some(InferenceError::CannotInfer {
            method: make,
            unfixed: vec![tp],
        })
    );
    assert_eq!(
        error.map(|e| e.to_string()),
        Some(format!("type arguments of method {} cannot be inferred (1 unfixed)", make.0))
    );
}

#[test]
fn test_cancelled_inference() {
    let comp = Compilation::default();
    let (echo, _) = generic_method(&comp, "Echo", |t| (vec![t], t));
    let token = CancellationToken::new();
    token.cancel();
    let args = [Argument::value(comp.typed(TypeId::INT))];
    let error = comp.classifier().infer_method_type_args(echo, &args, &token).err();
    assert_eq!(error, Some(InferenceError::Cancelled));
    assert_eq!(error.as_ref().map(InferenceError::outcome), Some("cancelled"));
    assert_eq!(
        error.map(|e| e.diagnostic().code),
        Some(diagnostic_codes::OPERATION_CANCELLED)
    );
}
