use super::*;
use coerce_common::LanguageVersion;
use coerce_common::diagnostics::diagnostic_codes;

use crate::compilation::Compilation;
use crate::def::DefFlags;
use crate::fixture::{compilation, generic_method, group, implicit_lambda, static_method, typed_lambda, unsafe_compilation, zoo};
use crate::method::MethodInfo;

fn classify(comp: &Compilation, expr: &Expr, target: TypeId) -> Conversion {
    let mut diagnostics = UseSiteDiagnostics::new();
    let conversion = comp.classifier().classify_implicit(expr, target, &mut diagnostics);
    assert!(diagnostics.is_empty(), "unexpected use-site diagnostics for {conversion}");
    conversion
}

fn kind(comp: &Compilation, expr: &Expr, target: TypeId) -> ConversionKind {
    classify(comp, expr, target).kind()
}

fn func(comp: &Compilation, params: &[TypeId], ret: TypeId) -> TypeId {
    let Some(ty) = comp.func_of(params, ret) else {
        panic!("Func of arity {} must exist", params.len());
    };
    ty
}

// =============================================================================
// Constants and literals
// =============================================================================

#[test]
fn test_integral_constants_narrow_when_in_range() {
    let comp = Compilation::default();
    assert_eq!(kind(&comp, &comp.constant(TypeId::INT, 200), TypeId::BYTE), ConversionKind::ImplicitConstant);
    assert_eq!(kind(&comp, &comp.constant(TypeId::INT, 1), TypeId::LONG), ConversionKind::ImplicitNumeric);
    assert!(!classify(&comp, &comp.constant(TypeId::INT, 300), TypeId::BYTE).exists());
    assert!(!classify(&comp, &comp.constant(TypeId::INT, -1), TypeId::UINT).exists());
    assert!(!classify(&comp, &comp.typed(TypeId::INT), TypeId::BYTE).exists());

    let byte_opt = comp.types().nullable(TypeId::BYTE);
    assert_eq!(
        classify(&comp, &comp.constant(TypeId::INT, 5), byte_opt).to_string(),
        "ImplicitNullable(ImplicitConstant)"
    );
}

#[test]
fn test_literal_zero_converts_to_enums() {
    let comp = Compilation::default();
    let color = comp.named(comp.declare_enum("Color", TypeId::INT));
    assert_eq!(kind(&comp, &comp.constant(TypeId::INT, 0), color), ConversionKind::ImplicitEnumeration);
    assert!(!classify(&comp, &comp.typed(TypeId::INT), color).exists());
}

#[test]
fn test_null_literal() {
    let comp = Compilation::default();
    let null = comp.null_literal();
    assert_eq!(kind(&comp, &null, TypeId::STRING), ConversionKind::NullLiteral);
    assert_eq!(kind(&comp, &null, comp.types().nullable(TypeId::INT)), ConversionKind::NullLiteral);
    assert!(!classify(&comp, &null, TypeId::INT).exists());
    assert!(!classify(&comp, &null, comp.types().pointer(TypeId::INT)).exists());

    let unsafe_comp = unsafe_compilation();
    let pointer = unsafe_comp.types().pointer(TypeId::INT);
    assert_eq!(
        kind(&unsafe_comp, &unsafe_comp.null_literal(), pointer),
        ConversionKind::ImplicitNullToPointer
    );
}

#[test]
fn test_default_literal_and_throw() {
    let modern = Compilation::default();
    assert_eq!(kind(&modern, &modern.default_literal(), TypeId::INT), ConversionKind::DefaultLiteral);
    assert_eq!(kind(&modern, &modern.throw_expr(), TypeId::INT), ConversionKind::ImplicitThrow);

    let legacy = compilation(LanguageVersion::V7);
    assert!(!classify(&legacy, &legacy.default_literal(), TypeId::INT).exists());
    let point_release = compilation(LanguageVersion::V7_1);
    assert_eq!(
        kind(&point_release, &point_release.default_literal(), TypeId::INT),
        ConversionKind::DefaultLiteral
    );
}

// =============================================================================
// Lambdas
// =============================================================================

#[test]
fn test_lambda_to_delegate() {
    let comp = Compilation::default();
    let identity = typed_lambda(&comp, &[("x", TypeId::INT)], comp.parameter("x"));
    assert_eq!(
        kind(&comp, &identity, func(&comp, &[TypeId::INT], TypeId::LONG)),
        ConversionKind::AnonymousFunction
    );
    assert!(!classify(&comp, &identity, func(&comp, &[TypeId::STRING], TypeId::INT)).exists());
    assert!(!classify(&comp, &identity, func(&comp, &[TypeId::INT], TypeId::STRING)).exists());

    let implicit = implicit_lambda(&comp, &["x"], comp.parameter("x"));
    assert_eq!(
        kind(&comp, &implicit, func(&comp, &[TypeId::STRING], TypeId::OBJECT)),
        ConversionKind::AnonymousFunction
    );
}

#[test]
fn test_void_delegates_need_statement_bodies() {
    let comp = Compilation::default();
    let Some(action_of_int) = comp.action_of(&[TypeId::INT]) else {
        panic!("Action<int> must exist");
    };
    let Some(action) = comp.action_of(&[]) else {
        panic!("Action must exist");
    };
    let value = typed_lambda(&comp, &[("x", TypeId::INT)], comp.parameter("x"));
    assert!(!classify(&comp, &value, action_of_int).exists());

    let run = static_method(&comp, "Run", &[], TypeId::INT);
    let call = comp.invocation(MethodGroupExpr::new(comp.intern("Run"), vec![run]), Vec::new());
    let calls = typed_lambda(&comp, &[], call);
    assert_eq!(kind(&comp, &calls, action), ConversionKind::AnonymousFunction);

    let empty_block = comp.lambda(LambdaExpr::block(Vec::new(), Vec::new()));
    assert_eq!(kind(&comp, &empty_block, action), ConversionKind::AnonymousFunction);
    assert!(!classify(&comp, &empty_block, func(&comp, &[], TypeId::INT)).exists());
}

#[test]
fn test_expression_tree_restrictions() {
    let comp = Compilation::default();
    let classifier = comp.classifier();
    let tree = comp.expression_of(func(&comp, &[], TypeId::INT));

    let bodied = typed_lambda(&comp, &[], comp.constant(TypeId::INT, 1));
    assert_eq!(kind(&comp, &bodied, tree), ConversionKind::AnonymousFunction);

    let mut diagnostics = UseSiteDiagnostics::new();
    let block = comp.lambda(LambdaExpr::block(Vec::new(), vec![Some(comp.constant(TypeId::INT, 1))]));
    let conversion = classifier.classify_implicit(&block, tree, &mut diagnostics);
    assert_eq!(conversion.kind(), ConversionKind::AnonymousFunction);
    assert!(diagnostics.has_code(diagnostic_codes::STATEMENT_LAMBDA_TO_EXPRESSION_TREE));

    let mut diagnostics = UseSiteDiagnostics::new();
    let anonymous = comp.lambda(LambdaExpr::anonymous_method(
        Vec::new(),
        vec![Some(comp.constant(TypeId::INT, 1))],
    ));
    assert!(!classifier.classify_implicit(&anonymous, tree, &mut diagnostics).exists());
    assert!(diagnostics.has_code(diagnostic_codes::ANONYMOUS_METHOD_TO_EXPRESSION_TREE));
}

#[test]
fn test_lambda_function_type_conversions() {
    let modern = Compilation::default();
    let lambda = typed_lambda(&modern, &[("x", TypeId::INT)], modern.parameter("x"));
    assert_eq!(kind(&modern, &lambda, TypeId::OBJECT), ConversionKind::FunctionType);
    assert_eq!(kind(&modern, &lambda, TypeId::DELEGATE), ConversionKind::FunctionType);
    assert_eq!(kind(&modern, &lambda, TypeId::LAMBDA_EXPRESSION), ConversionKind::FunctionType);
    let implicit = implicit_lambda(&modern, &["x"], modern.parameter("x"));
    assert!(!classify(&modern, &implicit, TypeId::DELEGATE).exists());

    let legacy = compilation(LanguageVersion::V9);
    let lambda = typed_lambda(&legacy, &[("x", TypeId::INT)], legacy.parameter("x"));
    assert!(!classify(&legacy, &lambda, TypeId::OBJECT).exists());
}

// =============================================================================
// Method groups
// =============================================================================

#[test]
fn test_method_group_to_delegate() {
    let comp = Compilation::default();
    let show = static_method(&comp, "Show", &[TypeId::OBJECT], TypeId::STRING);
    let shows = group(&comp, "Show", vec![show]);

    let variant = classify(&comp, &shows, func(&comp, &[TypeId::STRING], TypeId::OBJECT));
    assert_eq!(variant.kind(), ConversionKind::MethodGroup);
    assert_eq!(variant.method(), Some(show));
    assert!(!variant.is_extension_method());

    assert!(!classify(&comp, &shows, func(&comp, &[TypeId::INT], TypeId::STRING)).exists());
    let tree = comp.expression_of(func(&comp, &[TypeId::OBJECT], TypeId::STRING));
    assert!(!classify(&comp, &shows, tree).exists());
}

#[test]
fn test_method_group_function_type() {
    let modern = Compilation::default();
    let m = static_method(&modern, "M", &[], TypeId::VOID);
    assert_eq!(kind(&modern, &group(&modern, "M", vec![m]), TypeId::OBJECT), ConversionKind::FunctionType);

    let legacy = compilation(LanguageVersion::V9);
    let m = static_method(&legacy, "M", &[], TypeId::VOID);
    assert!(!classify(&legacy, &group(&legacy, "M", vec![m]), TypeId::OBJECT).exists());
}

#[test]
fn test_unmanaged_callers_only_group_reports_use_site_error() {
    let comp = Compilation::default();
    let native = comp.declare_method(
        MethodInfo::new(comp.intern("Native"), Vec::new(), TypeId::VOID)
            .with_flags(MethodFlags::STATIC | MethodFlags::UNMANAGED_CALLERS_ONLY),
    );
    let Some(action) = comp.action_of(&[]) else {
        panic!("Action must exist");
    };
    let mut diagnostics = UseSiteDiagnostics::new();
    let conversion = comp
        .classifier()
        .classify_implicit(&group(&comp, "Native", vec![native]), action, &mut diagnostics);
    assert!(!conversion.exists());
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.has_code(diagnostic_codes::UNMANAGED_CALLERS_ONLY_TO_DELEGATE));
}

// =============================================================================
// stackalloc and interpolated strings
// =============================================================================

#[test]
fn test_stackalloc_targets() {
    let unsafe_comp = unsafe_compilation();
    let pointer = unsafe_comp.types().pointer(TypeId::INT);
    assert_eq!(
        classify(&unsafe_comp, &unsafe_comp.stackalloc(TypeId::INT), pointer).to_string(),
        "StackAllocToPointerType(Identity)"
    );
    assert!(!classify(&unsafe_comp, &unsafe_comp.stackalloc(TypeId::LONG), pointer).exists());

    let comp = Compilation::default();
    let span = comp.span_of(TypeId::INT);
    assert_eq!(
        classify(&comp, &comp.stackalloc(TypeId::INT), span).to_string(),
        "StackAllocToSpanType(Identity)"
    );
    assert!(!classify(&comp, &comp.stackalloc(TypeId::INT), comp.types().pointer(TypeId::INT)).exists());

    let legacy = compilation(LanguageVersion::V7_1);
    let span = legacy.span_of(TypeId::INT);
    assert!(!classify(&legacy, &legacy.stackalloc(TypeId::INT), span).exists());
}

#[test]
fn test_interpolated_strings() {
    let comp = Compilation::default();
    let text = comp.interpolated_string();
    assert_eq!(kind(&comp, &text, TypeId::STRING), ConversionKind::Identity);
    assert_eq!(kind(&comp, &text, TypeId::OBJECT), ConversionKind::ImplicitReference);
    assert_eq!(kind(&comp, &text, TypeId::FORMATTABLE_STRING), ConversionKind::InterpolatedString);
    assert!(!classify(&comp, &text, TypeId::INT).exists());
}

#[test]
fn test_interpolated_string_handlers_need_language_support() {
    let shape = |comp: &Compilation| {
        let def = comp.declare_struct("LogHandler", Vec::new());
        comp.defs()
            .update(def, |info| info.flags |= DefFlags::INTERPOLATED_STRING_HANDLER);
        classify(comp, &comp.interpolated_string(), comp.named(def))
    };
    assert_eq!(
        shape(&compilation(LanguageVersion::V10)).kind(),
        ConversionKind::InterpolatedStringHandler
    );
    assert!(!shape(&compilation(LanguageVersion::V9)).exists());
}

// =============================================================================
// Tuples, conditional and switch
// =============================================================================

#[test]
fn test_tuple_literal_lifts_to_nullable_tuple() {
    let comp = Compilation::default();
    let types = comp.types();
    let literal = comp.tuple_of_exprs(vec![comp.constant(TypeId::INT, 1), comp.null_literal()]);
    let target = types.nullable(types.tuple_of(&[TypeId::INT, TypeId::STRING]));
    assert_eq!(
        classify(&comp, &literal, target).to_string(),
        "ImplicitNullable(ImplicitTupleLiteral(Identity, NullLiteral))"
    );
}

#[test]
fn test_conditional_uses_natural_type_first() {
    let comp = Compilation::default();
    let conditional = comp.conditional(comp.constant(TypeId::INT, 1), comp.typed(TypeId::LONG));
    assert_eq!(comp.classifier().natural_type(&conditional), Some(TypeId::LONG));
    assert_eq!(kind(&comp, &conditional, TypeId::LONG), ConversionKind::Identity);
    assert_eq!(kind(&comp, &conditional, TypeId::DOUBLE), ConversionKind::ImplicitNumeric);
}

#[test]
fn test_target_typed_conditional() {
    let modern = compilation(LanguageVersion::V9);
    let both_null = modern.conditional(modern.null_literal(), modern.null_literal());
    assert_eq!(
        classify(&modern, &both_null, TypeId::STRING).to_string(),
        "ConditionalExpression(NullLiteral, NullLiteral)"
    );

    let legacy = compilation(LanguageVersion::V8);
    let both_null = legacy.conditional(legacy.null_literal(), legacy.null_literal());
    assert!(!classify(&legacy, &both_null, TypeId::STRING).exists());
}

#[test]
fn test_switch_expressions() {
    let comp = compilation(LanguageVersion::V8);
    let arms = comp.switch(vec![comp.null_literal(), comp.typed(TypeId::STRING)]);
    assert_eq!(kind(&comp, &arms, TypeId::OBJECT), ConversionKind::ImplicitReference);
    let nulls = comp.switch(vec![comp.null_literal(), comp.null_literal()]);
    assert_eq!(
        classify(&comp, &nulls, TypeId::STRING).to_string(),
        "SwitchExpression(NullLiteral, NullLiteral)"
    );

    let legacy = compilation(LanguageVersion::V7_3);
    let arms = legacy.switch(vec![legacy.null_literal(), legacy.typed(TypeId::STRING)]);
    assert!(!classify(&legacy, &arms, TypeId::OBJECT).exists());
    assert_eq!(legacy.classifier().natural_type(&arms), None);
}

#[test]
fn test_target_typed_new() {
    let comp = compilation(LanguageVersion::V9);
    let z = zoo(&comp);
    let new = comp.target_typed_new(Vec::new());
    assert_eq!(kind(&comp, &new, z.dog), ConversionKind::ObjectCreation);
    assert_eq!(kind(&comp, &new, TypeId::INT), ConversionKind::ObjectCreation);
    assert!(!classify(&comp, &new, z.pet).exists());

    let legacy = compilation(LanguageVersion::V8);
    let dog = legacy.named(legacy.declare_class("Dog", None, Vec::new()));
    assert!(!classify(&legacy, &legacy.target_typed_new(Vec::new()), dog).exists());
}

// =============================================================================
// Invocations and implicit arrays
// =============================================================================

#[test]
fn test_invocation_converts_through_return_type() {
    let comp = Compilation::default();
    let parse = static_method(&comp, "Parse", &[TypeId::STRING], TypeId::INT);
    let call = comp.invocation(
        MethodGroupExpr::new(comp.intern("Parse"), vec![parse]),
        vec![Argument::value(comp.typed(TypeId::STRING))],
    );
    assert_eq!(comp.classifier().natural_type(&call), Some(TypeId::INT));
    assert_eq!(kind(&comp, &call, TypeId::LONG), ConversionKind::ImplicitNumeric);

    let (echo, _) = generic_method(&comp, "Echo", |t| (vec![t], t));
    let nested = comp.invocation(
        MethodGroupExpr::new(comp.intern("Echo"), vec![echo]),
        vec![Argument::value(call)],
    );
    assert_eq!(comp.classifier().natural_type(&nested), Some(TypeId::INT));

    let unresolved = comp.invocation(
        MethodGroupExpr::new(comp.intern("Parse"), vec![parse]),
        vec![Argument::value(comp.typed(TypeId::BOOL))],
    );
    assert_eq!(comp.classifier().natural_type(&unresolved), None);
    assert!(!classify(&comp, &unresolved, TypeId::INT).exists());
}

#[test]
fn test_implicit_array_uses_best_common_element_type() {
    let comp = Compilation::default();
    let array = comp.implicit_array(vec![comp.constant(TypeId::INT, 1), comp.typed(TypeId::LONG)]);
    let longs = comp.types().sz_array(TypeId::LONG);
    assert_eq!(comp.classifier().natural_type(&array), Some(longs));
    assert_eq!(kind(&comp, &array, longs), ConversionKind::Identity);
    assert_eq!(kind(&comp, &array, TypeId::OBJECT), ConversionKind::ImplicitReference);

    let mixed = comp.implicit_array(vec![comp.typed(TypeId::INT), comp.typed(TypeId::STRING)]);
    assert_eq!(comp.classifier().natural_type(&mixed), None);
}
