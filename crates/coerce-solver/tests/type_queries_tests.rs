use super::*;
use crate::fixture::zoo;
use crate::types::{RefKind, Variance};

#[test]
fn test_reference_and_value_types() {
    let comp = Compilation::default();
    let z = zoo(&comp);
    let point = comp.named(comp.declare_struct("Point", Vec::new()));
    let color = comp.named(comp.declare_enum("Color", TypeId::BYTE));
    let types = comp.types();

    for ty in [TypeId::STRING, TypeId::OBJECT, TypeId::DYNAMIC, z.dog, z.pet, types.sz_array(TypeId::INT)] {
        assert!(is_reference_type(&comp, ty), "{} is a reference type", ty.0);
        assert!(!is_value_type(&comp, ty));
    }
    for ty in [TypeId::INT, TypeId::DECIMAL, point, color, types.nullable(TypeId::INT), types.tuple_of(&[TypeId::INT, TypeId::STRING])] {
        assert!(is_value_type(&comp, ty), "{} is a value type", ty.0);
        assert!(!is_reference_type(&comp, ty));
    }
    assert!(!is_reference_type(&comp, TypeId::VOID));
    assert!(!is_value_type(&comp, TypeId::VOID));
    assert!(!is_reference_type(&comp, types.pointer(TypeId::INT)));
    assert!(is_non_nullable_value_type(&comp, TypeId::INT));
    assert!(!is_non_nullable_value_type(&comp, types.nullable(TypeId::INT)));
}

#[test]
fn test_type_parameter_constraints_decide_kind() {
    let comp = Compilation::default();
    let z = zoo(&comp);
    let types = comp.types();
    let unconstrained = comp.type_param("T");
    let class_constrained = comp.type_param("U");
    let struct_constrained = comp.type_param("V");
    let base_constrained = comp.type_param("W");
    types.set_constraints(class_constrained, ConstraintFlags::REFERENCE_TYPE, Vec::new());
    types.set_constraints(struct_constrained, ConstraintFlags::VALUE_TYPE, Vec::new());
    types.set_constraints(base_constrained, ConstraintFlags::empty(), vec![z.animal]);

    let t = types.type_param(unconstrained);
    assert!(is_type_parameter(&comp, t));
    assert!(!is_reference_type(&comp, t));
    assert!(!is_value_type(&comp, t));
    assert!(is_reference_type(&comp, types.type_param(class_constrained)));
    assert!(is_value_type(&comp, types.type_param(struct_constrained)));
    assert!(is_reference_type(&comp, types.type_param(base_constrained)));

    let info = type_param_info(&comp, t).map(|info| info.variance);
    assert_eq!(info, Some(Variance::Invariant));
}

#[test]
fn test_interface_constraint_does_not_make_reference_type() {
    let comp = Compilation::default();
    let z = zoo(&comp);
    let tp = comp.type_param("T");
    comp.types().set_constraints(tp, ConstraintFlags::empty(), vec![z.pet]);
    assert!(!is_reference_type(&comp, comp.types().type_param(tp)));
}

#[test]
fn test_structural_accessors() {
    let comp = Compilation::default();
    let types = comp.types();
    let nullable = types.nullable(TypeId::LONG);
    assert_eq!(nullable_underlying(&comp, nullable), Some(TypeId::LONG));
    assert_eq!(strip_nullable(&comp, nullable), TypeId::LONG);
    assert_eq!(strip_nullable(&comp, TypeId::LONG), TypeId::LONG);

    let matrix = types.array(TypeId::DOUBLE, 2);
    assert_eq!(array_info(&comp, matrix), Some((TypeId::DOUBLE, 2)));
    assert_eq!(array_info(&comp, TypeId::DOUBLE), None);

    let pointer = types.pointer(TypeId::BYTE);
    assert_eq!(pointee(&comp, pointer), Some(TypeId::BYTE));
    assert!(is_pointer_like(&comp, pointer));
    let fn_ptr = types.function_pointer(Vec::new(), TypeId::VOID, RefKind::None);
    assert!(is_pointer_like(&comp, fn_ptr));
    assert_eq!(pointee(&comp, fn_ptr), None);

    let pair = types.tuple_of(&[TypeId::INT, TypeId::BOOL]);
    let elements = tuple_elements(&comp, pair).map(|e| e.iter().map(|x| x.ty).collect::<Vec<_>>());
    assert_eq!(elements, Some(vec![TypeId::INT, TypeId::BOOL]));
}

#[test]
fn test_enum_underlying_defaults_to_int() {
    let comp = Compilation::default();
    let small = comp.named(comp.declare_enum("Small", TypeId::BYTE));
    assert!(is_enum(&comp, small));
    assert_eq!(enum_underlying(&comp, small), Some(TypeId::BYTE));
    assert_eq!(enum_underlying(&comp, TypeId::INT), None);
    assert!(!is_enum(&comp, TypeId::ENUM));
}

#[test]
fn test_delegates_and_expression_trees() {
    let comp = Compilation::default();
    let Some(func) = comp.func_of(&[TypeId::INT], TypeId::BOOL) else {
        panic!("Func<int, bool> must exist");
    };
    assert!(is_delegate_type(&comp, func));
    assert!(!is_delegate_type(&comp, TypeId::DELEGATE));
    assert!(!is_delegate_type(&comp, TypeId::MULTICAST_DELEGATE));

    let tree = comp.expression_of(func);
    assert_eq!(expression_tree_delegate(&comp, tree), Some(func));
    assert_eq!(expression_tree_delegate(&comp, func), None);
    assert!(!is_delegate_type(&comp, tree));
}

#[test]
fn test_spans_are_ref_like() {
    let comp = Compilation::default();
    let span = comp.span_of(TypeId::CHAR);
    let read_only = comp.read_only_span_of(TypeId::CHAR);
    assert_eq!(span_element(&comp, span), Some(TypeId::CHAR));
    assert_eq!(span_element(&comp, read_only), Some(TypeId::CHAR));
    assert!(is_ref_like(&comp, span));
    assert!(!can_be_type_argument(&comp, span));

    let custom = comp.named(comp.declare_ref_struct("Buffer"));
    assert!(is_ref_like(&comp, custom));
    assert_eq!(span_element(&comp, custom), None);
}

#[test]
fn test_type_argument_eligibility() {
    let comp = Compilation::default();
    assert!(can_be_type_argument(&comp, TypeId::INT));
    assert!(can_be_type_argument(&comp, TypeId::STRING));
    assert!(!can_be_type_argument(&comp, TypeId::VOID));
    assert!(!can_be_type_argument(&comp, comp.types().pointer(TypeId::INT)));
}

#[test]
fn test_interpolated_string_handler_flag() {
    let comp = Compilation::default();
    let handler = comp.declare(
        DefinitionInfo::new(DefKind::Struct, comp.intern("Handler"))
            .with_flags(DefFlags::INTERPOLATED_STRING_HANDLER),
    );
    assert!(is_interpolated_string_handler(&comp, comp.named(handler)));
    assert!(!is_interpolated_string_handler(&comp, TypeId::STRING));
}

#[test]
fn test_numeric_kind_tracks_native_integers() {
    let comp = Compilation::default();
    assert_eq!(numeric_kind(&comp, LanguageVersion::V11, TypeId::INTPTR), Some(IntrinsicKind::NInt));
    assert_eq!(numeric_kind(&comp, LanguageVersion::V10, TypeId::INTPTR), None);
    assert_eq!(numeric_kind(&comp, LanguageVersion::V10, TypeId::NINT), Some(IntrinsicKind::NInt));
    assert_eq!(numeric_kind(&comp, LanguageVersion::V7, TypeId::BOOL), None);
    assert!(intptr_is_numeric(&comp, LanguageVersion::V12));
    assert!(!intptr_is_numeric(&comp, LanguageVersion::V9));
}

#[test]
fn test_target_typed_new_support() {
    let comp = Compilation::default();
    let z = zoo(&comp);
    let point = comp.named(comp.declare_struct("Point", Vec::new()));
    let shape = comp.declare(
        DefinitionInfo::new(DefKind::Class, comp.intern("Shape")).with_flags(DefFlags::ABSTRACT),
    );
    let color = comp.named(comp.declare_enum("Color", TypeId::INT));

    assert!(supports_target_typed_new(&comp, z.dog));
    assert!(supports_target_typed_new(&comp, point));
    assert!(supports_target_typed_new(&comp, comp.types().nullable(point)));
    assert!(supports_target_typed_new(&comp, TypeId::INT));
    assert!(supports_target_typed_new(&comp, TypeId::OBJECT));
    assert!(!supports_target_typed_new(&comp, comp.named(shape)));
    assert!(!supports_target_typed_new(&comp, z.pet));
    assert!(!supports_target_typed_new(&comp, color));
    assert!(!supports_target_typed_new(&comp, TypeId::STRING));

    let tp = comp.type_param("T");
    assert!(!supports_target_typed_new(&comp, comp.types().type_param(tp)));
    comp.types().set_constraints(tp, ConstraintFlags::CONSTRUCTOR, Vec::new());
    assert!(supports_target_typed_new(&comp, comp.types().type_param(tp)));
}

#[test]
fn test_named_type_resolution() {
    let comp = Compilation::default();
    let z = zoo(&comp);
    let Some(named) = named_type(&comp, z.cat) else {
        panic!("Cat is a named type");
    };
    assert_eq!(named.def, z.cat_def);
    assert!(named.args.is_empty());
    assert!(named.info.flags.contains(DefFlags::SEALED));
    assert_eq!(def_kind(&comp, z.pet), Some(DefKind::Interface));
    assert_eq!(def_kind(&comp, TypeId::INT), None);
    assert!(is_interface(&comp, TypeId::IFORMATTABLE));
    assert_eq!(intrinsic_kind(TypeId::INT), Some(IntrinsicKind::Int));
}
