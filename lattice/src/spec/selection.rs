use super::FieldType;
use super::ObjectType;
use super::Schema;
use super::SpecError;
use crate::graphql::FieldNode;
use crate::json_ext::Object;

/// A requested field validated against the registry: the declared type is
/// attached and the nested selection is checked recursively.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selection {
    pub(crate) name: String,
    pub(crate) field_type: FieldType,
    pub(crate) arguments: Object,
    pub(crate) selection_set: Option<Vec<Selection>>,
}

impl Selection {
    pub(crate) fn from_request(
        node: &FieldNode,
        current_type: &ObjectType,
        schema: &Schema,
        mut count: usize,
    ) -> Result<Self, SpecError> {
        // The RECURSION_LIMIT is chosen to be:
        //   < # expected to cause stack overflow &&
        //   > # expected in a legitimate request
        const RECURSION_LIMIT: usize = 512;
        if count > RECURSION_LIMIT {
            tracing::error!("selection processing recursion limit({RECURSION_LIMIT}) exceeded");
            return Err(SpecError::RecursionLimitExceeded);
        }
        count += 1;

        let field_type = current_type
            .field(&node.name)
            .ok_or_else(|| {
                SpecError::UnknownField(node.name.clone(), current_type.name().to_string())
            })?
            .clone();

        let selection_set = match field_type.inner_type_name() {
            Some(inner) => {
                if node.selections.is_empty() {
                    return Err(SpecError::MissingSubselection(
                        node.name.clone(),
                        current_type.name().to_string(),
                    ));
                }
                let inner_type = schema.object_type(inner)?;
                Some(
                    node.selections
                        .iter()
                        .map(|child| Selection::from_request(child, inner_type, schema, count))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }
            None => {
                if !node.selections.is_empty() {
                    return Err(SpecError::SubselectionOnScalar(
                        node.name.clone(),
                        current_type.name().to_string(),
                    ));
                }
                None
            }
        };

        Ok(Selection {
            name: node.name.clone(),
            field_type,
            arguments: node.arguments.clone(),
            selection_set,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graphql::FieldNode;

    fn schema() -> Schema {
        Schema::builder()
            .object_type(
                "Game",
                [
                    ("id", "ID!".parse().unwrap()),
                    ("title", "String!".parse().unwrap()),
                    ("reviews", "[Review!]".parse().unwrap()),
                ],
            )
            .object_type(
                "Review",
                [
                    ("id", "ID!".parse().unwrap()),
                    ("rating", "Int!".parse().unwrap()),
                    ("game", "Game!".parse().unwrap()),
                ],
            )
            .object_type("Query", [("games", "[Game]".parse().unwrap())])
            .build()
            .unwrap()
    }

    fn validate(node: FieldNode) -> Result<Selection, SpecError> {
        let schema = schema();
        let root = schema.object_type("Query").unwrap();
        Selection::from_request(&node, root, &schema, 0)
    }

    #[test]
    fn nested_selections_carry_their_declared_types() {
        let selection = validate(
            FieldNode::builder()
                .name("games")
                .selection(FieldNode::builder().name("title").build())
                .selection(
                    FieldNode::builder()
                        .name("reviews")
                        .selection(FieldNode::builder().name("rating").build())
                        .build(),
                )
                .build(),
        )
        .unwrap();

        assert_eq!(selection.field_type, "[Game]".parse().unwrap());
        let children = selection.selection_set.unwrap();
        assert_eq!(children[0].field_type, "String!".parse().unwrap());
        assert_eq!(children[1].field_type, "[Review!]".parse().unwrap());
    }

    #[test]
    fn selecting_an_undeclared_field_is_an_error() {
        let err = validate(
            FieldNode::builder()
                .name("games")
                .selection(FieldNode::builder().name("tite").build())
                .build(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SpecError::UnknownField("tite".to_string(), "Game".to_string()),
        );
    }

    #[test]
    fn object_fields_require_a_subselection() {
        let err = validate(FieldNode::builder().name("games").build()).unwrap_err();
        assert_eq!(
            err,
            SpecError::MissingSubselection("games".to_string(), "Query".to_string()),
        );
    }

    #[test]
    fn scalar_fields_reject_a_subselection() {
        let err = validate(
            FieldNode::builder()
                .name("games")
                .selection(
                    FieldNode::builder()
                        .name("title")
                        .selection(FieldNode::builder().name("length").build())
                        .build(),
                )
                .build(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SpecError::SubselectionOnScalar("title".to_string(), "Game".to_string()),
        );
    }

    #[test]
    fn deep_recursion_is_cut_off() {
        // games { reviews { game { reviews { ... { title } } } } }, deeper
        // than the limit while staying shape-valid at every level.
        let mut node = FieldNode::builder().name("title").build();
        for _ in 0..300 {
            node = FieldNode::builder().name("game").selection(node).build();
            node = FieldNode::builder().name("reviews").selection(node).build();
        }
        let node = FieldNode::builder().name("games").selection(node).build();
        assert_eq!(validate(node).unwrap_err(), SpecError::RecursionLimitExceeded);
    }
}
