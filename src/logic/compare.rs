use crate::model::{ChangeCandidate, ChangeKind, DocNode};
use log::warn;

/// Versions being compared, threaded through so every candidate carries its
/// provenance.
#[derive(Debug, Clone)]
pub struct CompareContext<'a> {
    pub service_name: &'a str,
    pub old_version: &'a str,
    pub new_version: &'a str,
}

/// Pure structural comparison of two descriptor documents. No I/O, no
/// state; candidates come out in document iteration order, endpoint changes
/// before schema changes.
pub struct Comparator;

/// Fixed verb order for the method pass. Verbs absent from the old document
/// are never considered; added methods are not breaking.
const METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];

impl Comparator {
    pub fn compare(ctx: &CompareContext, old: &DocNode, new: &DocNode) -> Vec<ChangeCandidate> {
        let mut changes = Self::compare_paths(ctx, old, new);
        changes.extend(Self::compare_schemas(ctx, old, new));
        changes
    }

    fn candidate(
        ctx: &CompareContext,
        kind: ChangeKind,
        path: String,
        description: String,
    ) -> ChangeCandidate {
        ChangeCandidate {
            service_name: ctx.service_name.to_string(),
            kind,
            path,
            description,
            old_version: ctx.old_version.to_string(),
            new_version: ctx.new_version.to_string(),
        }
    }

    fn compare_paths(ctx: &CompareContext, old: &DocNode, new: &DocNode) -> Vec<ChangeCandidate> {
        let mut changes = Vec::new();

        let old_paths = old.field("paths");
        let new_paths = new.field("paths");
        if old_paths.is_missing() || new_paths.is_missing() {
            return changes;
        }

        for (path, old_endpoint) in old_paths.entries() {
            if !new_paths.has(path) {
                warn!("BREAKING: Endpoint removed: {path}");
                changes.push(Self::candidate(
                    ctx,
                    ChangeKind::EndpointRemoved,
                    path.clone(),
                    format!("Endpoint '{path}' was removed"),
                ));
            } else {
                changes.extend(Self::compare_methods(
                    ctx,
                    path,
                    old_endpoint,
                    new_paths.field(path),
                ));
            }
        }

        changes
    }

    fn compare_methods(
        ctx: &CompareContext,
        path: &str,
        old_endpoint: &DocNode,
        new_endpoint: &DocNode,
    ) -> Vec<ChangeCandidate> {
        let mut changes = Vec::new();

        for method in METHODS {
            if old_endpoint.has(method) && !new_endpoint.has(method) {
                let verb = method.to_uppercase();
                warn!("BREAKING: Method removed: {verb} {path}");
                changes.push(Self::candidate(
                    ctx,
                    ChangeKind::MethodRemoved,
                    path.to_string(),
                    format!("HTTP method '{verb}' removed from '{path}'"),
                ));
            }
        }

        changes
    }

    fn compare_schemas(ctx: &CompareContext, old: &DocNode, new: &DocNode) -> Vec<ChangeCandidate> {
        let mut changes = Vec::new();

        let old_schemas = old.field("components").field("schemas");
        let new_schemas = new.field("components").field("schemas");
        if old_schemas.is_missing() || new_schemas.is_missing() {
            return changes;
        }

        for (schema_name, old_schema) in old_schemas.entries() {
            if !new_schemas.has(schema_name) {
                warn!("BREAKING: Schema removed: {schema_name}");
                changes.push(Self::candidate(
                    ctx,
                    ChangeKind::SchemaRemoved,
                    format!("/components/schemas/{schema_name}"),
                    format!("Schema '{schema_name}' was removed"),
                ));
            } else {
                changes.extend(Self::compare_schema_properties(
                    ctx,
                    schema_name,
                    old_schema,
                    new_schemas.field(schema_name),
                ));
            }
        }

        changes
    }

    fn compare_schema_properties(
        ctx: &CompareContext,
        schema_name: &str,
        old_schema: &DocNode,
        new_schema: &DocNode,
    ) -> Vec<ChangeCandidate> {
        let mut changes = Vec::new();

        let old_properties = old_schema.field("properties");
        // Cannot detect removal from an empty base.
        if old_properties.is_missing() {
            return changes;
        }
        let new_properties = new_schema.field("properties");

        for (property, old_property) in old_properties.entries() {
            if !new_properties.has(property) {
                warn!("BREAKING: Field removed: {schema_name}.{property}");
                changes.push(Self::candidate(
                    ctx,
                    ChangeKind::FieldRemoved,
                    format!("/components/schemas/{schema_name}"),
                    format!("Field '{property}' removed from '{schema_name}' schema"),
                ));
            } else {
                // Only the top-level type discriminator; nested structural
                // differences are out of scope.
                let old_type = old_property.field("type").text_or_empty();
                let new_type = new_properties
                    .field(property)
                    .field("type")
                    .text_or_empty();

                if !old_type.is_empty() && !new_type.is_empty() && old_type != new_type {
                    warn!(
                        "BREAKING: Type changed: {schema_name}.{property} from {old_type} to {new_type}"
                    );
                    changes.push(Self::candidate(
                        ctx,
                        ChangeKind::TypeChanged,
                        format!("/components/schemas/{schema_name}"),
                        format!(
                            "Field '{property}' type changed from '{old_type}' to '{new_type}' in '{schema_name}' schema"
                        ),
                    ));
                }
            }
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CompareContext<'static> {
        CompareContext {
            service_name: "widget-service",
            old_version: "v1",
            new_version: "v2",
        }
    }

    fn doc(text: &str) -> DocNode {
        DocNode::parse(text).unwrap()
    }

    #[test]
    fn identical_documents_yield_no_changes() {
        let text = r#"{
            "paths": {"/widgets": {"get": {}, "delete": {}}},
            "components": {"schemas": {"Widget": {"properties": {"id": {"type": "string"}}}}}
        }"#;
        let changes = Comparator::compare(&ctx(), &doc(text), &doc(text));
        assert!(changes.is_empty());
    }

    #[test]
    fn comparison_is_deterministic() {
        let old = doc(
            r#"{
            "paths": {"/widgets": {"get": {}}, "/gadgets": {"post": {}}},
            "components": {"schemas": {"Widget": {"properties": {"id": {"type": "string"}, "price": {"type": "number"}}}}}
        }"#,
        );
        let new = doc(r#"{"paths": {}, "components": {"schemas": {}}}"#);

        let first = Comparator::compare(&ctx(), &old, &new);
        let second = Comparator::compare(&ctx(), &old, &new);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn additions_are_never_breaking() {
        let old = doc(
            r#"{
            "paths": {"/widgets": {"get": {}}},
            "components": {"schemas": {"Widget": {"properties": {"id": {"type": "string"}}}}}
        }"#,
        );
        let new = doc(
            r#"{
            "paths": {"/widgets": {"get": {}, "post": {}}, "/gadgets": {"get": {}}},
            "components": {"schemas": {
                "Widget": {"properties": {"id": {"type": "string"}, "name": {"type": "string"}}},
                "Gadget": {"properties": {"id": {"type": "string"}}}
            }}
        }"#,
        );
        assert!(Comparator::compare(&ctx(), &old, &new).is_empty());
    }

    #[test]
    fn removed_endpoint_emits_one_change_without_method_noise() {
        let old = doc(r#"{"paths": {"/widgets": {"get": {}}}}"#);
        let new = doc(r#"{"paths": {}}"#);

        let changes = Comparator::compare(&ctx(), &old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::EndpointRemoved);
        assert_eq!(changes[0].path, "/widgets");
        assert_eq!(changes[0].description, "Endpoint '/widgets' was removed");
        assert_eq!(changes[0].old_version, "v1");
        assert_eq!(changes[0].new_version, "v2");
    }

    #[test]
    fn removed_method_names_the_verb() {
        let old = doc(r#"{"paths": {"/widgets": {"get": {}, "delete": {}}}}"#);
        let new = doc(r#"{"paths": {"/widgets": {"get": {}}}}"#);

        let changes = Comparator::compare(&ctx(), &old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::MethodRemoved);
        assert_eq!(changes[0].path, "/widgets");
        assert_eq!(
            changes[0].description,
            "HTTP method 'DELETE' removed from '/widgets'"
        );
    }

    #[test]
    fn field_removal_and_type_change_coexist() {
        let old = doc(
            r#"{"components": {"schemas": {"Widget": {"properties": {
                "id": {"type": "string"},
                "price": {"type": "number"}
            }}}}}"#,
        );
        let new = doc(
            r#"{"components": {"schemas": {"Widget": {"properties": {
                "id": {"type": "integer"}
            }}}}}"#,
        );

        let changes = Comparator::compare(&ctx(), &old, &new);
        assert_eq!(changes.len(), 2);

        let type_change = changes
            .iter()
            .find(|c| c.kind == ChangeKind::TypeChanged)
            .unwrap();
        assert_eq!(
            type_change.description,
            "Field 'id' type changed from 'string' to 'integer' in 'Widget' schema"
        );
        assert_eq!(type_change.path, "/components/schemas/Widget");

        let removal = changes
            .iter()
            .find(|c| c.kind == ChangeKind::FieldRemoved)
            .unwrap();
        assert_eq!(
            removal.description,
            "Field 'price' removed from 'Widget' schema"
        );
    }

    #[test]
    fn removed_schema_uses_component_locator() {
        let old = doc(r#"{"components": {"schemas": {"Widget": {"properties": {}}}}}"#);
        let new = doc(r#"{"components": {"schemas": {}}}"#);

        let changes = Comparator::compare(&ctx(), &old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::SchemaRemoved);
        assert_eq!(changes[0].path, "/components/schemas/Widget");
    }

    #[test]
    fn missing_old_properties_short_circuits() {
        let old = doc(r#"{"components": {"schemas": {"Widget": {}}}}"#);
        let new = doc(r#"{"components": {"schemas": {"Widget": {"properties": {}}}}}"#);
        assert!(Comparator::compare(&ctx(), &old, &new).is_empty());
    }

    #[test]
    fn untyped_properties_do_not_report_type_changes() {
        let old = doc(
            r#"{"components": {"schemas": {"Widget": {"properties": {"id": {"type": "string"}}}}}}"#,
        );
        let new = doc(r#"{"components": {"schemas": {"Widget": {"properties": {"id": {}}}}}}"#);
        assert!(Comparator::compare(&ctx(), &old, &new).is_empty());
    }

    #[test]
    fn endpoint_changes_precede_schema_changes() {
        let old = doc(
            r#"{
            "paths": {"/widgets": {"get": {}}},
            "components": {"schemas": {"Widget": {"properties": {}}}}
        }"#,
        );
        let new = doc(r#"{"paths": {}, "components": {"schemas": {}}}"#);

        let changes = Comparator::compare(&ctx(), &old, &new);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeKind::EndpointRemoved);
        assert_eq!(changes[1].kind, ChangeKind::SchemaRemoved);
    }

    #[test]
    fn missing_paths_section_yields_no_endpoint_changes() {
        let old = doc(r#"{"paths": {"/widgets": {"get": {}}}}"#);
        let new = doc(r#"{}"#);
        // The new document has no paths node at all; the endpoint pass
        // cannot compare and emits nothing.
        assert!(Comparator::compare(&ctx(), &old, &new).is_empty());
    }
}
