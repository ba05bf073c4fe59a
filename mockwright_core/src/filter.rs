//! Member filter: decides which declared members the mock overrides.

use crate::config::Configuration;
use crate::error::Diagnostic;
use crate::ir::MemberSpec;

/// Order-preserving filter.
///
/// A member is dropped when its `(owner, name)` is listed in `excluded_members`, or when
/// `exclude_default_members` is on and the member is provided (non-abstract) by an owner
/// living in a platform namespace. Abstract platform members are always kept.
pub fn filter<'a>(source_name: &str, members: &'a [MemberSpec], config: &Configuration) -> Vec<&'a MemberSpec> {
    members.iter().filter(|m| retains(source_name, m, config)).collect()
}

pub fn retains(source_name: &str, member: &MemberSpec, config: &Configuration) -> bool {
    if config.is_excluded(source_name, member.owner(), member.name()) {
        crate::gen_log!(trace, "{}: `{}` excluded by configuration", source_name, member.name());
        return false;
    }
    if config.exclude_default_members && !member.is_abstract() && config.is_platform(member.owner()) {
        crate::gen_log!(trace, "{}: provided platform member `{}` skipped", source_name, member.name());
        return false;
    }
    true
}

/// Exclusion entries that name no declared member. Each entry is reported once and ignored.
pub fn check_exclusions(source_name: &str, members: &[MemberSpec], config: &Configuration) -> Vec<Diagnostic> {
    config
        .excluded_members
        .iter()
        .filter(|entry| !members.iter().any(|m| entry.matches(source_name, m.owner(), m.name())))
        .map(|entry| Diagnostic::UnknownExclusion { type_name: source_name.to_string(), entry: entry.to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GlobalConfig, TypeOverrides};
    use crate::ir::{FunctionSpec, MemberRef, OwnerRef};

    fn members() -> Vec<MemberSpec> {
        let own = OwnerRef::new("", "Widget");
        let debug = OwnerRef::new("std", "Debug");
        vec![
            MemberSpec::Function(FunctionSpec::new(own.clone(), "paint")),
            MemberSpec::Function(FunctionSpec::new(own.clone(), "size").provided()),
            MemberSpec::Function(FunctionSpec::new(debug.clone(), "fmt").provided()),
            MemberSpec::Function(FunctionSpec::new(debug, "required")),
        ]
    }

    fn config(excluded: &[MemberRef], exclude_default: bool) -> Configuration {
        Configuration::resolve(
            &GlobalConfig::default(),
            &TypeOverrides {
                excluded_members: Some(excluded.iter().cloned().collect()),
                exclude_default_members: Some(exclude_default),
                ..TypeOverrides::default()
            },
        )
    }

    fn names<'a>(kept: &[&'a MemberSpec]) -> Vec<&'a str> { kept.iter().map(|m| m.name()).collect() }

    #[test]
    fn default_members_dropped_but_abstract_kept() {
        let all = members();
        let kept = filter("Widget", &all, &config(&[], true));
        assert_eq!(names(&kept), vec!["paint", "size", "required"]);
    }

    #[test]
    fn default_members_kept_when_disabled() {
        let all = members();
        assert_eq!(filter("Widget", &all, &config(&[], false)).len(), 4);
    }

    #[test]
    fn excluded_members_never_appear() {
        let all = members();
        let kept = filter("Widget", &all, &config(&[MemberRef::new(None, "paint"), MemberRef::new(Some("Debug"), "required")], true));
        assert_eq!(names(&kept), vec!["size"]);
    }

    #[test]
    fn filtering_everything_succeeds() {
        let all = members();
        let everything: Vec<MemberRef> = vec![
            MemberRef::new(None, "paint"),
            MemberRef::new(None, "size"),
            MemberRef::new(Some("Debug"), "required"),
        ];
        assert!(filter("Widget", &all, &config(&everything, true)).is_empty());
    }

    #[test]
    fn unknown_exclusions_are_reported() {
        let all = members();
        let diags = check_exclusions("Widget", &all, &config(&[MemberRef::new(None, "nope"), MemberRef::new(None, "paint")], true));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].entry(), "nope");
    }
}
