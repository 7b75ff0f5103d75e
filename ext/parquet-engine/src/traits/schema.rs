use crate::{Schema, SchemaNode};

/// Trait for schema introspection
///
/// Paths are dotted logical names. A list element is addressed as
/// `<list>.item` and map entries as `<map>.key` and `<map>.value`,
/// whatever the element nodes are called in the file.
pub trait SchemaInspector {
    /// Number of nodes below the root
    fn field_count(&self) -> usize;

    /// Get field by path (e.g., "address.city")
    fn get_field_by_path(&self, path: &str) -> Option<&SchemaNode>;

    fn has_field(&self, path: &str) -> bool {
        self.get_field_by_path(path).is_some()
    }

    /// Paths of the primitive leaves, in column order
    fn leaf_paths(&self) -> Vec<String>;

    /// Maximum `(definition, repetition)` levels of the node at `path`
    fn max_levels(&self, path: &str) -> Option<(i16, i16)>;
}

impl SchemaInspector for Schema {
    fn field_count(&self) -> usize {
        self.fields().iter().map(count_fields).sum()
    }

    fn get_field_by_path(&self, path: &str) -> Option<&SchemaNode> {
        walk(self, path).map(|(node, _)| node)
    }

    fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for field in self.fields() {
            collect_leaf_paths(field, field.name().to_string(), &mut paths);
        }
        paths
    }

    fn max_levels(&self, path: &str) -> Option<(i16, i16)> {
        walk(self, path).map(|(_, levels)| levels)
    }
}

fn count_fields(node: &SchemaNode) -> usize {
    match node {
        SchemaNode::Struct { fields, .. } => 1 + fields.iter().map(count_fields).sum::<usize>(),
        SchemaNode::List { item, .. } => 1 + count_fields(item),
        SchemaNode::Map { key, value, .. } => 1 + count_fields(key) + count_fields(value),
        SchemaNode::Primitive { .. } => 1,
    }
}

/// Levels contributed by entering `node` itself
fn own_levels(node: &SchemaNode, (def, rep): (i16, i16)) -> (i16, i16) {
    let def = if node.is_nullable() { def + 1 } else { def };
    match node {
        // the repeated group between a list or map and its entries
        SchemaNode::List { .. } | SchemaNode::Map { .. } => (def + 1, rep + 1),
        _ => (def, rep),
    }
}

fn walk<'a>(schema: &'a Schema, path: &str) -> Option<(&'a SchemaNode, (i16, i16))> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut node = schema.fields().iter().find(|f| f.name() == first)?;
    let mut levels = own_levels(node, (0, 0));

    for part in parts {
        node = match (node, part) {
            (SchemaNode::Struct { fields, .. }, _) => fields.iter().find(|f| f.name() == part)?,
            (SchemaNode::List { item, .. }, "item") => item,
            (SchemaNode::Map { key, .. }, "key") => key,
            (SchemaNode::Map { value, .. }, "value") => value,
            _ => return None,
        };
        levels = own_levels(node, levels);
    }
    Some((node, levels))
}

fn collect_leaf_paths(node: &SchemaNode, path: String, paths: &mut Vec<String>) {
    match node {
        SchemaNode::Struct { fields, .. } => {
            for field in fields {
                collect_leaf_paths(field, format!("{}.{}", path, field.name()), paths);
            }
        }
        SchemaNode::List { item, .. } => {
            collect_leaf_paths(item, format!("{}.item", path), paths);
        }
        SchemaNode::Map { key, value, .. } => {
            collect_leaf_paths(key, format!("{}.key", path), paths);
            collect_leaf_paths(value, format!("{}.value", path), paths);
        }
        SchemaNode::Primitive { .. } => paths.push(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test::complex_schema;

    #[test]
    fn test_schema_inspector() {
        let schema = complex_schema();

        // id, address, address.street, address.city, tags, tags.item,
        // attributes, attributes.key, attributes.value
        assert_eq!(schema.field_count(), 9);

        assert!(schema.has_field("id"));
        assert!(schema.has_field("address.city"));
        assert!(schema.has_field("tags.item"));
        assert!(schema.has_field("attributes.value"));
        assert!(!schema.has_field("missing"));
        assert!(!schema.has_field("tags.element"));

        let city = schema.get_field_by_path("address.city").unwrap();
        assert_eq!(city.name(), "city");
    }

    #[test]
    fn test_leaf_paths_follow_column_order() {
        let schema = complex_schema();
        assert_eq!(
            schema.leaf_paths(),
            vec![
                "id",
                "address.street",
                "address.city",
                "tags.item",
                "attributes.key",
                "attributes.value"
            ]
        );
    }

    #[test]
    fn test_max_levels() {
        let schema = complex_schema();
        assert_eq!(schema.max_levels("id"), Some((0, 0)));
        // optional struct, optional leaf
        assert_eq!(schema.max_levels("address.city"), Some((2, 0)));
        // optional list, repeated group, optional element
        assert_eq!(schema.max_levels("tags.item"), Some((3, 1)));
        // required map, repeated group, required key
        assert_eq!(schema.max_levels("attributes.key"), Some((1, 1)));
        assert_eq!(schema.max_levels("attributes.value"), Some((2, 1)));
        assert_eq!(schema.max_levels("nope"), None);
    }
}
