use super::ConditionEvaluator;
use crate::Result;
use crate::schema::{PropertyDefinition, ReducedProperty};
use ohno::app_err;

/// Resolve a property's conditions into a plain leaf, folder or disabled marker.
///
/// Branches are applied outermost first, each overlaying the fields it sets. If a
/// condition needs context that is not available the property is disabled for this
/// cycle. Reducing a definition without conditions returns it unchanged.
///
/// # Errors
///
/// Returns an error if the selected branch leaves fields that describe neither a leaf
/// nor a folder.
pub fn reduce(definition: &PropertyDefinition, evaluator: &ConditionEvaluator<'_>) -> Result<ReducedProperty> {
    let conditional = match definition {
        PropertyDefinition::Leaf(leaf) => return Ok(ReducedProperty::Leaf(leaf.clone())),
        PropertyDefinition::Folder => return Ok(ReducedProperty::Folder),
        PropertyDefinition::Disabled => return Ok(ReducedProperty::Disabled),
        PropertyDefinition::Conditional(conditional) => conditional,
    };

    let mut fields = conditional.base.clone();
    let mut branch = Some(&conditional.branch);

    while let Some(current) = branch {
        let patch = match evaluator.evaluate(&current.predicate) {
            Some(true) => &current.then,
            Some(false) => &current.otherwise,
            None => return Ok(ReducedProperty::Disabled),
        };

        fields.merge(&patch.fields);
        branch = patch.branch.as_deref();
    }

    fields.classify().map_err(|e| app_err!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::CollectionContext;
    use crate::schema::TransformStep;

    fn definition(json: &str) -> PropertyDefinition {
        serde_json::from_str(json).unwrap()
    }

    const ASM_STATE: &str = r#"{
        "key": "asmState::entries",
        "normalization": ["firstEntry"],
        "if": {"isModuleProvisioned": "asm"},
        "then": {
            "if": {"deviceVersionGreaterOrEqual": "14.1"},
            "then": {"key": "asmStateNew::entries"}
        },
        "else": {"disabled": true}
    }"#;

    #[test]
    fn test_selects_then_branch() {
        let context = CollectionContext::default().with_module("asm", "nominal").with_version("15.1.0");
        let evaluator = ConditionEvaluator::new(&context);

        let ReducedProperty::Leaf(leaf) = reduce(&definition(ASM_STATE), &evaluator).unwrap() else {
            panic!("expected a leaf");
        };
        assert_eq!(leaf.key.to_string(), "asmStateNew::entries");
        assert_eq!(leaf.normalization, vec![TransformStep::FirstEntry]);
    }

    #[test]
    fn test_nested_else_keeps_base_fields() {
        let context = CollectionContext::default().with_module("asm", "nominal").with_version("13.1.0");
        let evaluator = ConditionEvaluator::new(&context);

        let ReducedProperty::Leaf(leaf) = reduce(&definition(ASM_STATE), &evaluator).unwrap() else {
            panic!("expected a leaf");
        };
        assert_eq!(leaf.key.to_string(), "asmState::entries");
    }

    #[test]
    fn test_selects_else_branch() {
        let context = CollectionContext::default().with_module("asm", "none").with_version("15.1.0");
        let evaluator = ConditionEvaluator::new(&context);

        assert_eq!(reduce(&definition(ASM_STATE), &evaluator).unwrap(), ReducedProperty::Disabled);
    }

    #[test]
    fn test_missing_context_disables() {
        let context = CollectionContext::default();
        let evaluator = ConditionEvaluator::new(&context);

        assert_eq!(reduce(&definition(ASM_STATE), &evaluator).unwrap(), ReducedProperty::Disabled);
    }

    #[test]
    fn test_reduce_is_idempotent() {
        let context = CollectionContext::default().with_module("asm", "nominal").with_version("15.1.0");
        let evaluator = ConditionEvaluator::new(&context);

        for json in [ASM_STATE, r#"{"key": "/mgmt/tm/sys"}"#, r#"{"structure": {"folder": true}}"#] {
            let once = reduce(&definition(json), &evaluator).unwrap();
            let twice = reduce(&PropertyDefinition::from(once.clone()), &evaluator).unwrap();
            assert_eq!(once, twice);
        }
    }
}
