use super::*;
use crate::def::DefId;
use crate::types::{RefKind, Variance};

fn setup() -> (TypeInterner, TypeParamId, TypeId) {
    let types = TypeInterner::new();
    let t = types.fresh_type_param("T", Variance::Invariant);
    let t_ty = types.type_param(t);
    (types, t, t_ty)
}

#[test]
fn test_substitutes_through_nested_shapes() {
    let (types, t, t_ty) = setup();
    let mut subst = TypeSubstitution::new();
    subst.insert(t, TypeId::INT);

    let list_of_t_array = types.named(DefId(3), [types.sz_array(t_ty)]);
    let expected = types.named(DefId(3), [types.sz_array(TypeId::INT)]);
    assert_eq!(instantiate_type(&types, list_of_t_array, &subst), expected);

    let tuple = types.tuple_of(&[t_ty, TypeId::STRING]);
    assert_eq!(
        instantiate_type(&types, tuple, &subst),
        types.tuple_of(&[TypeId::INT, TypeId::STRING])
    );
    assert_eq!(
        instantiate_type(&types, types.nullable(t_ty), &subst),
        types.nullable(TypeId::INT)
    );
}

#[test]
fn test_function_pointer_keeps_ref_kinds() {
    let (types, t, t_ty) = setup();
    let subst = TypeSubstitution::from_args(&[t], &[TypeId::LONG]);
    let fp = types.function_pointer(
        [FunctionPointerParam { ty: t_ty, ref_kind: RefKind::Out }],
        t_ty,
        RefKind::Ref,
    );
    let expected = types.function_pointer(
        [FunctionPointerParam { ty: TypeId::LONG, ref_kind: RefKind::Out }],
        TypeId::LONG,
        RefKind::Ref,
    );
    assert_eq!(instantiate_type(&types, fp, &subst), expected);
}

#[test]
fn test_unmentioned_types_keep_their_id() {
    let (types, t, _) = setup();
    let subst = TypeSubstitution::from_args(&[t], &[TypeId::INT]);
    let array = types.sz_array(TypeId::STRING);
    assert_eq!(instantiate_type(&types, array, &subst), array);
    assert_eq!(instantiate_type(&types, TypeId::OBJECT, &subst), TypeId::OBJECT);
}

#[test]
fn test_unbound_parameters_are_left_alone() {
    let (types, _, t_ty) = setup();
    let u = types.fresh_type_param("U", Variance::Invariant);
    let subst = TypeSubstitution::from_args(&[u], &[TypeId::INT]);
    assert_eq!(instantiate_type(&types, t_ty, &subst), t_ty);
}

#[test]
fn test_from_args_ignores_extra_entries() {
    let (types, t, _) = setup();
    let u = types.fresh_type_param("U", Variance::Invariant);
    let subst = TypeSubstitution::from_args(&[t, u], &[TypeId::INT]);
    assert_eq!(subst.len(), 1);
    assert_eq!(subst.get(t), Some(TypeId::INT));
    assert_eq!(subst.get(u), None);
    assert!(TypeSubstitution::new().is_empty());
}

#[test]
fn test_mentions_any() {
    let (types, t, t_ty) = setup();
    let u = types.fresh_type_param("U", Variance::Invariant);
    let nested = types.tuple_of(&[TypeId::INT, types.pointer(types.sz_array(t_ty))]);
    assert!(mentions_any(&types, nested, &[t]));
    assert!(!mentions_any(&types, nested, &[u]));
    assert!(!mentions_any(&types, nested, &[]));
    assert!(!mentions_any(&types, TypeId::INT, &[t]));
}
