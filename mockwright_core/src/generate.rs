//! The synthesis pipeline: type-shape model in, generated-implementation model out.

use crate::annotations;
use crate::ctor::{self, Catalog, SynthesizedArg};
use crate::error::{Diagnostic, GenerateError};
use crate::factory::{self, Factory};
use crate::filter;
use crate::generics;
use crate::ir::{Annotation, MemberSpec, ProcessableType, Provenance, TypeKind, TypeParam, Visibility};
use crate::members::{self, SynthesizedMember};
use crate::types::TypeRef;

#[derive(Debug, Clone, PartialEq)]
pub enum Supertype {
    /// Interface kind: the mock implements the trait.
    Implements(TypeRef),
    /// Class kind: the mock wraps a base built through `constructor(args)`.
    Extends { base: TypeRef, constructor: String, args: Vec<SynthesizedArg> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockModel {
    pub name: String,
    pub source_name: String,
    pub kind: TypeKind,
    pub visibility: Visibility,
    /// Parameters as declared; only the struct declaration uses them.
    pub type_params: Vec<TypeParam>,
    /// Normalized parameters for impl blocks and factory signatures.
    pub impl_params: Vec<TypeParam>,
    pub supertype: Supertype,
    pub members: Vec<SynthesizedMember>,
    /// Required interface members removed by exclusion. They only satisfy the trait and panic when called.
    pub excluded_required: Vec<SynthesizedMember>,
    pub factories: Vec<Factory>,
    pub annotations: Vec<Annotation>,
    pub docs: Option<String>,
    pub provenance: Vec<Provenance>,
    pub runtime_path: String,
    pub stubs_unit_by_default: bool,
}

impl MockModel {
    /// `NameMock<T..>` with normalized parameters.
    pub fn self_type(&self) -> TypeRef { generics::parameterized(&self.name, &self.impl_params) }

    /// `Source<T..>` with normalized parameters.
    pub fn source_type(&self) -> TypeRef { generics::parameterized(&self.source_name, &self.impl_params) }

    pub fn is_class(&self) -> bool { self.kind == TypeKind::Class }

    pub fn constructor_args(&self) -> &[SynthesizedArg] {
        match &self.supertype {
            Supertype::Extends { args, .. } => args,
            Supertype::Implements(_) => &[],
        }
    }

    pub fn requires_dispatch(&self) -> bool { self.constructor_args().iter().any(SynthesizedArg::requires_dispatch) }
}

/// A generated model plus the non-fatal diagnostics raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub model: MockModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Generates the model for one type. Pure: the same inputs always give the same model.
pub fn generate(ty: &ProcessableType, catalog: &Catalog) -> Result<Generation, GenerateError> {
    crate::gen_log!(debug, "generating `{}` for `{}` ({:?})", ty.generated_name, ty.source_name, ty.kind);
    check_naming(ty, catalog)?;

    let config = &ty.configuration;
    let diagnostics = filter::check_exclusions(&ty.source_name, &ty.members, config);
    let retained = filter::filter(&ty.source_name, &ty.members, config);
    let members = members::synthesize(ty, &retained)?;

    let excluded_required = if ty.is_interface() {
        let required: Vec<&MemberSpec> = ty
            .members
            .iter()
            .filter(|m| m.is_abstract() && !filter::retains(&ty.source_name, m, config))
            .collect();
        members::scaffold(ty, &required)?
    } else {
        Vec::new()
    };

    let impl_params = generics::normalize(&ty.type_params);
    let supertype = match ty.kind {
        TypeKind::Interface => Supertype::Implements(generics::parameterized(&ty.source_name, &impl_params)),
        TypeKind::Class => {
            let Some(constructor) = ty.constructor.as_ref() else {
                return Err(GenerateError::shape(
                    &ty.source_name,
                    &config.constructor,
                    format!("no constructor `{}` returning `Self` was found", config.constructor),
                ));
            };
            Supertype::Extends {
                base: generics::parameterized(&ty.source_name, &impl_params),
                constructor: constructor.name.clone(),
                args: ctor::synthesize(ty, catalog)?,
            }
        }
    };

    let factories = factory::synthesize(ty, &ty.visibility);

    let mut annotations = Vec::new();
    annotations::propagate(&mut annotations, &ty.annotations, &config.propagated_annotations);
    let mut docs = None;
    annotations::propagate_docs(&mut docs, ty.docs.as_deref());

    let model = MockModel {
        name: ty.generated_name.clone(),
        source_name: ty.source_name.clone(),
        kind: ty.kind,
        visibility: ty.visibility.clone(),
        type_params: ty.type_params.clone(),
        impl_params,
        supertype,
        members,
        excluded_required,
        factories,
        annotations,
        docs,
        provenance: ty.provenance.clone(),
        runtime_path: config.runtime_path.clone(),
        stubs_unit_by_default: config.stubs_unit_by_default,
    };
    crate::gen_log!(
        debug,
        "generated `{}`: {} members, {} diagnostics",
        model.name,
        model.members.len(),
        diagnostics.len()
    );
    Ok(Generation { model, diagnostics })
}

fn check_naming(ty: &ProcessableType, catalog: &Catalog) -> Result<(), GenerateError> {
    if ty.generated_name == ty.source_name {
        return Err(GenerateError::naming(&ty.source_name, &ty.generated_name, "is the same as the source type"));
    }
    if let Some(other) = catalog.collision(&ty.source_name, &ty.generated_name) {
        return Err(GenerateError::naming(&ty.source_name, &ty.generated_name, format!("collides with `{other}`")));
    }
    Ok(())
}

/// Generates every type independently. A failing type does not affect the others.
///
/// With `workers > 1` the batch is split across scoped threads; results keep input order.
pub fn generate_batch(types: &[ProcessableType], catalog: &Catalog, workers: usize) -> Vec<Result<Generation, GenerateError>> {
    if workers <= 1 || types.len() <= 1 {
        return types.iter().map(|t| generate(t, catalog)).collect();
    }
    let chunk = types.len().div_ceil(workers);
    std::thread::scope(|scope| {
        let handles: Vec<_> = types
            .chunks(chunk)
            .map(|part| scope.spawn(move || part.iter().map(|t| generate(t, catalog)).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    })
}
