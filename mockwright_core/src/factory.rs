//! Factory synthesis: `mock`, `spy`, `spy_on` and `any` on the generated type.

use crate::generics;
use crate::ir::{ProcessableType, Provenance, TypeKind, TypeParam, Visibility};
use crate::types::{Bound, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryKind {
    Mock,
    Spy,
    SpyOn,
    /// Same construction as `Mock`; reads better when the value is irrelevant to the test.
    Any,
}

impl FactoryKind {
    pub fn name(self) -> &'static str {
        match self {
            FactoryKind::Mock => "mock",
            FactoryKind::Spy => "spy",
            FactoryKind::SpyOn => "spy_on",
            FactoryKind::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Factory {
    pub kind: FactoryKind,
    pub visibility: Visibility,
    /// Normalized (variance- and default-free) parameters of the generated type.
    pub type_params: Vec<TypeParam>,
    /// Type carried by the unused witness argument, if the factory takes one.
    pub witness: Option<TypeRef>,
    /// Type of the `on` argument for spying factories.
    pub spy_param: Option<TypeRef>,
    pub returns: TypeRef,
    pub stubs_unit_by_default: bool,
    pub provenance: Vec<Provenance>,
}

impl Factory {
    pub fn name(&self) -> &'static str { self.kind.name() }

    pub fn is_spy(&self) -> bool { self.spy_param.is_some() }
}

/// Type accepted by the `on` parameter: `impl Source<T> + 'static` for interfaces, the source type for classes.
pub fn spy_param_type(kind: TypeKind, source: &TypeRef) -> TypeRef {
    match (kind, source) {
        (TypeKind::Interface, TypeRef::Path(path)) => {
            TypeRef::ImplTrait(vec![Bound::Trait(path.clone()), Bound::Lifetime("static".to_string())])
        }
        _ => source.clone(),
    }
}

/// The four factories in emission order.
pub fn synthesize(ty: &ProcessableType, visibility: &Visibility) -> Vec<Factory> {
    let type_params = generics::normalize(&ty.type_params);
    let witness = generics::witness_type(ty.kind, &ty.source_name, &type_params);
    let source = generics::parameterized(&ty.source_name, &type_params);
    let spy_param = spy_param_type(ty.kind, &source);
    let returns = generics::parameterized(&ty.generated_name, &type_params);

    [FactoryKind::Mock, FactoryKind::Spy, FactoryKind::SpyOn, FactoryKind::Any]
        .into_iter()
        .map(|kind| Factory {
            kind,
            visibility: visibility.clone(),
            type_params: type_params.clone(),
            witness: (kind != FactoryKind::SpyOn).then(|| witness.clone()),
            spy_param: matches!(kind, FactoryKind::Spy | FactoryKind::SpyOn).then(|| spy_param.clone()),
            returns: returns.clone(),
            stubs_unit_by_default: ty.configuration.stubs_unit_by_default,
            provenance: ty.provenance.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::ir::Variance;

    fn repo() -> ProcessableType {
        let mut t = TypeParam::new("T");
        t.variance = Variance::Covariant;
        ProcessableType::new(TypeKind::Interface, "Repo", Configuration::default())
            .with_type_param(t)
            .with_provenance("src/repo.rs:3")
    }

    #[test]
    fn factory_shapes() {
        let factories = synthesize(&repo(), &Visibility::Crate);
        let names: Vec<_> = factories.iter().map(Factory::name).collect();
        assert_eq!(names, vec!["mock", "spy", "spy_on", "any"]);

        let mock = &factories[0];
        assert_eq!(mock.witness.as_ref().map(ToString::to_string).as_deref(), Some("dyn Repo<T>"));
        assert!(mock.spy_param.is_none());
        assert_eq!(mock.returns.to_string(), "RepoMock<T>");
        assert_eq!(mock.visibility, Visibility::Crate);
        assert!(mock.type_params.iter().all(|p| p.variance == Variance::Invariant));

        let spy = &factories[1];
        assert_eq!(spy.spy_param.as_ref().map(ToString::to_string).as_deref(), Some("impl Repo<T> + 'static"));
        assert!(spy.witness.is_some());

        let spy_on = &factories[2];
        assert!(spy_on.witness.is_none());
        assert!(spy_on.is_spy());

        assert!(factories.iter().all(|f| f.provenance.len() == 1));
    }

    #[test]
    fn class_spies_take_the_source_value() {
        let t = ProcessableType::new(TypeKind::Class, "Cache", Configuration::default());
        let factories = synthesize(&t, &Visibility::Public);
        assert_eq!(factories[2].spy_param.as_ref().map(ToString::to_string).as_deref(), Some("Cache"));
        assert_eq!(factories[0].witness.as_ref().map(ToString::to_string).as_deref(), Some("Cache"));
    }
}
