//! Carries declaration annotations and docs onto the generated type.
//!
//! Both operations are additive and idempotent: applying them twice yields the same result.

use std::collections::BTreeSet;

use crate::ir::Annotation;

/// Appends the allowed `source` annotations missing from `target`, keeping source order.
pub fn propagate(target: &mut Vec<Annotation>, source: &[Annotation], allowed: &BTreeSet<String>) {
    for annotation in source {
        if allowed.contains(&annotation.name) && !target.contains(annotation) {
            target.push(annotation.clone());
        }
    }
}

/// Appends the trimmed `source` doc text unless `target` already contains it.
pub fn propagate_docs(target: &mut Option<String>, source: Option<&str>) {
    let Some(doc) = source.map(str::trim).filter(|d| !d.is_empty()) else { return };
    match target {
        Some(existing) if existing.contains(doc) => {}
        Some(existing) => {
            existing.push_str("\n\n");
            existing.push_str(doc);
        }
        None => *target = Some(doc.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> BTreeSet<String> { ["cfg", "deprecated"].iter().map(|s| s.to_string()).collect() }

    #[test]
    fn propagation_is_additive_and_idempotent() {
        let source = vec![
            Annotation::new("cfg", "cfg(test)"),
            Annotation::new("derive", "derive(Debug)"),
            Annotation::new("deprecated", "deprecated"),
        ];
        let mut target = vec![Annotation::new("allow", "allow(dead_code)")];
        propagate(&mut target, &source, &allowed());
        let once = target.clone();
        propagate(&mut target, &source, &allowed());
        assert_eq!(target, once);
        let names: Vec<_> = target.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["allow", "cfg", "deprecated"]);
    }

    #[test]
    fn docs_are_trimmed_and_not_repeated() {
        let mut docs = None;
        propagate_docs(&mut docs, Some("  Greets people.\n"));
        propagate_docs(&mut docs, Some("Greets people."));
        assert_eq!(docs.as_deref(), Some("Greets people."));
        propagate_docs(&mut docs, Some("   "));
        assert_eq!(docs.as_deref(), Some("Greets people."));
    }
}
