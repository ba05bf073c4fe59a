//! Configuration resolution: per-type overrides on top of global defaults.

use std::collections::BTreeSet;

use crate::ir::{MemberRef, OwnerRef};

/// Workspace-wide defaults. Absence of any per-type setting means these apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    pub stubs_unit_by_default: bool,
    pub exclude_default_members: bool,
    /// Top-level namespaces whose provided members are dropped by `exclude_default_members`.
    pub platform_namespaces: BTreeSet<String>,
    pub excluded_members: BTreeSet<MemberRef>,
    /// Suffix appended to the source name to form the generated name.
    pub mock_suffix: String,
    /// Constructor used to build the base instance of class-kind types.
    pub constructor: String,
    /// Path under which generated code reaches the dispatch runtime.
    pub runtime_path: String,
    /// Declaration attributes carried onto the generated type.
    pub propagated_annotations: BTreeSet<String>,
    /// Interface names outside the current batch that have a generated mock.
    pub auto_mock: BTreeSet<String>,
    /// Type names constructible through `Default::default()`.
    pub default_constructible: BTreeSet<String>,
}

fn set(items: &[&str]) -> BTreeSet<String> { items.iter().map(|s| s.to_string()).collect() }

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            stubs_unit_by_default: true,
            exclude_default_members: true,
            platform_namespaces: set(&["core", "std", "alloc"]),
            excluded_members: BTreeSet::new(),
            mock_suffix: "Mock".to_string(),
            constructor: "new".to_string(),
            runtime_path: "::mockwright".to_string(),
            propagated_annotations: set(&["cfg", "cfg_attr", "deprecated", "allow", "expect", "warn", "deny", "forbid"]),
            auto_mock: BTreeSet::new(),
            default_constructible: BTreeSet::new(),
        }
    }
}

/// Per-type settings. `None` inherits the global value; `Some` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeOverrides {
    pub generated_name: Option<String>,
    pub stubs_unit_by_default: Option<bool>,
    pub exclude_default_members: Option<bool>,
    pub platform_namespaces: Option<BTreeSet<String>>,
    pub excluded_members: Option<BTreeSet<MemberRef>>,
    pub constructor: Option<String>,
    pub runtime_path: Option<String>,
    pub auto_mock: Option<BTreeSet<String>>,
    pub default_constructible: Option<BTreeSet<String>>,
}

/// Effective configuration of one processable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub stubs_unit_by_default: bool,
    pub exclude_default_members: bool,
    pub platform_namespaces: BTreeSet<String>,
    pub excluded_members: BTreeSet<MemberRef>,
    pub generated_name: Option<String>,
    pub mock_suffix: String,
    pub constructor: String,
    pub runtime_path: String,
    pub propagated_annotations: BTreeSet<String>,
    pub auto_mock: BTreeSet<String>,
    pub default_constructible: BTreeSet<String>,
}

impl Configuration {
    pub fn resolve(global: &GlobalConfig, overrides: &TypeOverrides) -> Self {
        Self {
            stubs_unit_by_default: overrides.stubs_unit_by_default.unwrap_or(global.stubs_unit_by_default),
            exclude_default_members: overrides.exclude_default_members.unwrap_or(global.exclude_default_members),
            platform_namespaces: overrides.platform_namespaces.clone().unwrap_or_else(|| global.platform_namespaces.clone()),
            excluded_members: overrides.excluded_members.clone().unwrap_or_else(|| global.excluded_members.clone()),
            generated_name: overrides.generated_name.clone(),
            mock_suffix: global.mock_suffix.clone(),
            constructor: overrides.constructor.clone().unwrap_or_else(|| global.constructor.clone()),
            runtime_path: overrides.runtime_path.clone().unwrap_or_else(|| global.runtime_path.clone()),
            propagated_annotations: global.propagated_annotations.clone(),
            auto_mock: overrides.auto_mock.clone().unwrap_or_else(|| global.auto_mock.clone()),
            default_constructible: overrides.default_constructible.clone().unwrap_or_else(|| global.default_constructible.clone()),
        }
    }

    pub fn generated_name_for(&self, source_name: &str) -> String {
        self.generated_name.clone().unwrap_or_else(|| format!("{source_name}{}", self.mock_suffix))
    }

    pub fn is_excluded(&self, source_name: &str, owner: &OwnerRef, name: &str) -> bool {
        self.excluded_members.iter().any(|r| r.matches(source_name, owner, name))
    }

    pub fn is_platform(&self, owner: &OwnerRef) -> bool { self.platform_namespaces.contains(&owner.namespace) }
}

impl Default for Configuration {
    fn default() -> Self { Self::resolve(&GlobalConfig::default(), &TypeOverrides::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_overrides_inherit_globals() {
        let global = GlobalConfig { stubs_unit_by_default: false, ..GlobalConfig::default() };
        let cfg = Configuration::resolve(&global, &TypeOverrides::default());
        assert!(!cfg.stubs_unit_by_default);
        assert!(cfg.exclude_default_members);
        assert_eq!(cfg.constructor, "new");
        assert_eq!(cfg.generated_name_for("Widget"), "WidgetMock");
    }

    #[test]
    fn overrides_win() {
        let mut global = GlobalConfig::default();
        global.excluded_members.insert(MemberRef::new(None, "paint"));
        let overrides = TypeOverrides {
            stubs_unit_by_default: Some(false),
            excluded_members: Some([MemberRef::new(None, "size")].into_iter().collect()),
            generated_name: Some("FakeWidget".into()),
            ..TypeOverrides::default()
        };
        let cfg = Configuration::resolve(&global, &overrides);
        assert!(!cfg.stubs_unit_by_default);
        let own = OwnerRef::new("", "Widget");
        assert!(cfg.is_excluded("Widget", &own, "size"));
        assert!(!cfg.is_excluded("Widget", &own, "paint"));
        assert_eq!(cfg.generated_name_for("Widget"), "FakeWidget");
    }

    #[test]
    fn platform_namespaces_are_configurable() {
        let cfg = Configuration::default();
        assert!(cfg.is_platform(&OwnerRef::new("std", "Debug")));
        assert!(!cfg.is_platform(&OwnerRef::new("", "Widget")));
        let custom = Configuration::resolve(
            &GlobalConfig::default(),
            &TypeOverrides { platform_namespaces: Some(["serde".to_string()].into_iter().collect()), ..TypeOverrides::default() },
        );
        assert!(custom.is_platform(&OwnerRef::new("serde", "Serialize")));
        assert!(!custom.is_platform(&OwnerRef::new("std", "Debug")));
    }
}
