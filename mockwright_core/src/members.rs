//! Member synthesis: one dispatch-backed override per retained property or function.
//!
//! Properties come from non-Rust declaration sources; the `#[mockable]` front end only
//! produces functions.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::GenerateError;
use crate::ir::{FunctionSpec, MemberSpec, Param, ProcessableType, PropertySpec, Receiver, TypeKind, Visibility};
use crate::types::TypeRef;

/// Names of the generated factory functions; class-kind members may not reuse them.
pub const FACTORY_NAMES: [&str; 4] = ["mock", "any", "spy", "spy_on"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberOrigin {
    Function,
    Getter,
    Setter,
}

/// Uniform member identity: owner, name and rendered parameter/return signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberIdentity {
    pub owner: String,
    pub name: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedMember {
    pub id: MemberIdentity,
    /// Associated constant on the mock holding the runtime `MemberId`.
    pub const_name: String,
    pub method: String,
    pub receiver: Receiver,
    pub params: Vec<Param>,
    pub output: TypeRef,
    pub lifetimes: Vec<String>,
    pub returns_unit: bool,
    pub is_unsafe: bool,
    pub vis: Visibility,
    pub origin: MemberOrigin,
}

/// `(&str, u8) -> String`; unit returns are omitted.
pub fn signature(params: &[Param], output: &TypeRef) -> String {
    let mut sig = String::from("(");
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            sig.push_str(", ");
        }
        let _ = write!(sig, "{}", p.ty);
    }
    sig.push(')');
    if !output.is_unit() {
        let _ = write!(sig, " -> {output}");
    }
    sig
}

pub fn const_name(method: &str) -> String { method.trim_start_matches("r#").to_uppercase() }

/// Synthesizes the retained members in order. Every signature is wired exactly once.
pub fn synthesize(ty: &ProcessableType, retained: &[&MemberSpec]) -> Result<Vec<SynthesizedMember>, GenerateError> {
    let mut out = Vec::with_capacity(retained.len());
    for member in retained {
        match member {
            MemberSpec::Function(f) => out.push(function(ty, f, true)?),
            MemberSpec::Property(p) => out.extend(property(ty, p, true)?),
        }
    }
    check_names(ty, &out)?;
    Ok(out)
}

/// Signatures for required members removed by exclusion. They are never dispatched, so the
/// receiver and return-type checks are skipped. Recorded restrictions and `Self` in an interface
/// signature still fail: both leave the trait unusable as `dyn`, which the spy holder needs.
pub fn scaffold(ty: &ProcessableType, excluded: &[&MemberSpec]) -> Result<Vec<SynthesizedMember>, GenerateError> {
    let mut out = Vec::with_capacity(excluded.len());
    for member in excluded {
        match member {
            MemberSpec::Function(f) => out.push(function(ty, f, false)?),
            MemberSpec::Property(p) => out.extend(property(ty, p, false)?),
        }
    }
    Ok(out)
}

fn check_names(ty: &ProcessableType, members: &[SynthesizedMember]) -> Result<(), GenerateError> {
    let mut seen: BTreeMap<&str, &SynthesizedMember> = BTreeMap::new();
    for m in members {
        if let Some(prev) = seen.insert(m.const_name.as_str(), m) {
            let reason = if prev.method == m.method {
                format!("declares `{}` more than once", m.method)
            } else {
                format!("cannot hold both `{}` and `{}`", prev.method, m.method)
            };
            return Err(GenerateError::naming(&ty.source_name, &ty.generated_name, reason));
        }
        if ty.kind == TypeKind::Class && FACTORY_NAMES.contains(&m.method.as_str()) {
            return Err(GenerateError::naming(
                &ty.source_name,
                &ty.generated_name,
                format!("would define `{}` both as a member and as a factory", m.method),
            ));
        }
    }
    Ok(())
}

/// `checked` applies the dispatch requirements; scaffolding skips them.
fn function(ty: &ProcessableType, f: &FunctionSpec, checked: bool) -> Result<SynthesizedMember, GenerateError> {
    if let Some(reason) = &f.restriction {
        return Err(GenerateError::unsupported(&ty.source_name, &f.name, reason.clone()));
    }
    let (params, output) = resolve_self(ty, &f.name, &f.params, &f.output)?;
    if checked {
        if ty.kind == TypeKind::Interface && f.receiver == Receiver::Value {
            return Err(GenerateError::unsupported(&ty.source_name, &f.name, "takes `self` by value, which a boxed spy cannot forward"));
        }
        check_output(ty, &f.name, &output)?;
    }
    Ok(SynthesizedMember {
        id: MemberIdentity { owner: f.owner.name.clone(), name: f.name.clone(), signature: signature(&params, &output) },
        const_name: const_name(&f.name),
        method: f.name.clone(),
        receiver: f.receiver,
        returns_unit: output.is_unit(),
        params,
        output,
        lifetimes: f.lifetimes.clone(),
        is_unsafe: f.is_unsafe,
        vis: f.vis.clone(),
        origin: MemberOrigin::Function,
    })
}

fn property(ty: &ProcessableType, p: &PropertySpec, checked: bool) -> Result<Vec<SynthesizedMember>, GenerateError> {
    let (_, value_ty) = resolve_self(ty, &p.name, &[], &p.ty)?;
    if checked {
        check_output(ty, &p.name, &value_ty)?;
    }
    let getter = SynthesizedMember {
        id: MemberIdentity { owner: p.owner.name.clone(), name: p.name.clone(), signature: signature(&[], &value_ty) },
        const_name: const_name(&p.name),
        method: p.name.clone(),
        receiver: Receiver::Ref,
        params: Vec::new(),
        returns_unit: value_ty.is_unit(),
        output: value_ty.clone(),
        lifetimes: Vec::new(),
        is_unsafe: false,
        vis: p.vis.clone(),
        origin: MemberOrigin::Getter,
    };
    if !p.mutable {
        return Ok(vec![getter]);
    }
    let setter_name = format!("set_{}", p.name.trim_start_matches("r#"));
    let params = vec![Param::new("value", value_ty)];
    let setter = SynthesizedMember {
        id: MemberIdentity { owner: p.owner.name.clone(), name: setter_name.clone(), signature: signature(&params, &TypeRef::Unit) },
        const_name: const_name(&setter_name),
        method: setter_name,
        receiver: Receiver::RefMut,
        params,
        output: TypeRef::Unit,
        lifetimes: Vec::new(),
        returns_unit: true,
        is_unsafe: false,
        vis: p.vis.clone(),
        origin: MemberOrigin::Setter,
    };
    Ok(vec![getter, setter])
}

/// Interfaces cannot name `Self` in mocked signatures; classes resolve it to the source type.
fn resolve_self(
    ty: &ProcessableType,
    item: &str,
    params: &[Param],
    output: &TypeRef,
) -> Result<(Vec<Param>, TypeRef), GenerateError> {
    let mentions = params.iter().any(|p| p.ty.mentions_self()) || output.mentions_self();
    if !mentions {
        return Ok((params.to_vec(), output.clone()));
    }
    if ty.kind == TypeKind::Interface {
        return Err(GenerateError::unsupported(&ty.source_name, item, "mentions `Self`, which differs between the mock and a spied instance"));
    }
    let source = ty.source_type();
    let params = params.iter().map(|p| Param::new(p.name.clone(), p.ty.replace_self(&source))).collect();
    Ok((params, output.replace_self(&source)))
}

fn check_output(ty: &ProcessableType, item: &str, output: &TypeRef) -> Result<(), GenerateError> {
    if matches!(output, TypeRef::Never) {
        Err(GenerateError::unsupported(&ty.source_name, item, "never returns, so no stubbed value can be replayed"))
    } else if output.is_static() {
        Ok(())
    } else {
        Err(GenerateError::unsupported(
            &ty.source_name,
            item,
            format!("returns `{output}`, but stubbed values must be `'static`"),
        ))
    }
}
