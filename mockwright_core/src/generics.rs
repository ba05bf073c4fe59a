//! Generic-parameter normalization for impl blocks and factory signatures.

use crate::ir::{TypeKind, TypeParam, Variance};
use crate::types::{Bound, TypeRef};

/// Copy of `params` with variance and defaults stripped; names, bounds and order are kept.
pub fn normalize(params: &[TypeParam]) -> Vec<TypeParam> {
    params
        .iter()
        .map(|p| TypeParam { name: p.name.clone(), bounds: p.bounds.clone(), variance: Variance::Invariant, default: None })
        .collect()
}

/// `name<T, U>` using the parameter names in declaration order.
pub fn parameterized(name: &str, params: &[TypeParam]) -> TypeRef {
    TypeRef::generic(name, params.iter().map(TypeParam::as_type).collect())
}

/// Type carried by the witness argument of `mock`, `any` and `spy`.
///
/// Interfaces are witnessed as `dyn Source<T>`; classes as `Source<T>`.
pub fn witness_type(kind: TypeKind, source_name: &str, params: &[TypeParam]) -> TypeRef {
    let source = parameterized(source_name, params);
    match (kind, source) {
        (TypeKind::Interface, TypeRef::Path(path)) => TypeRef::TraitObject(vec![Bound::Trait(path)]),
        (_, source) => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PathRef;

    fn params() -> Vec<TypeParam> {
        let mut t = TypeParam::new("T").with_bound(Bound::Trait(PathRef::ident("Clone")));
        t.variance = Variance::Covariant;
        t.default = Some(TypeRef::named("u8"));
        let mut u = TypeParam::new("U");
        u.variance = Variance::Contravariant;
        vec![t, u]
    }

    #[test]
    fn strips_variance_and_defaults_on_a_copy() {
        let original = params();
        let normalized = normalize(&original);
        assert_eq!(normalized.len(), 2);
        assert!(normalized.iter().all(|p| p.variance == Variance::Invariant && p.default.is_none()));
        assert_eq!(normalized[0].name, "T");
        assert_eq!(normalized[0].bounds, original[0].bounds);
        assert_eq!(original[0].variance, Variance::Covariant);
        assert!(original[0].default.is_some());
    }

    #[test]
    fn witness_types() {
        let p = normalize(&params());
        assert_eq!(witness_type(TypeKind::Interface, "Repo", &p).to_string(), "dyn Repo<T, U>");
        assert_eq!(witness_type(TypeKind::Class, "Cache", &p).to_string(), "Cache<T, U>");
        assert_eq!(witness_type(TypeKind::Class, "Plain", &[]).to_string(), "Plain");
    }
}
