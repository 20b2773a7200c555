//! Performance oriented JSON manipulation.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
pub use serde_json_bytes::Value;

/// A JSON object.
pub type Object = Map<ByteString, Value>;

/// A path element into a response value.
///
/// Note that the `Deserialize` implementation relies on the `untagged`
/// representation: JSON numbers become indices, JSON strings become keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathElement {
    /// An index path element.
    Index(usize),

    /// A key path element.
    Key(String),
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Index(index) => write!(f, "{index}"),
            PathElement::Key(key) => write!(f, "{key}"),
        }
    }
}

/// A path into the result data.
///
/// The response shape mirrors the request, so a path is a sequence of output
/// keys and list indices leading to the field a given error is about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub fn empty() -> Path {
        Path(Vec::new())
    }

    pub fn from_slice<T: AsRef<str>>(s: &[T]) -> Self {
        Self(
            s.iter()
                .map(|x| x.as_ref())
                .map(|s| {
                    if let Ok(index) = s.parse::<usize>() {
                        PathElement::Index(index)
                    } else {
                        PathElement::Key(s.to_string())
                    }
                })
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.0.last()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns this path extended by one element.
    pub fn join(&self, element: PathElement) -> Self {
        let mut elements = self.0.clone();
        elements.push(element);
        Path(elements)
    }

    pub(crate) fn key(&self, key: &str) -> Self {
        self.join(PathElement::Key(key.to_string()))
    }

    pub(crate) fn index(&self, index: usize) -> Self {
        self.join(PathElement::Index(index))
    }
}

impl<T> From<T> for Path
where
    T: AsRef<str>,
{
    fn from(s: T) -> Self {
        Self(
            s.as_ref()
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| {
                    if let Ok(index) = s.parse::<usize>() {
                        PathElement::Index(index)
                    } else {
                        PathElement::Key(s.to_string())
                    }
                })
                .collect(),
        )
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in self.iter() {
            write!(f, "/{element}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn path_from_str_parses_keys_and_indices() {
        let path = Path::from("games/0/reviews/12/author");
        assert_eq!(
            path,
            Path(vec![
                PathElement::Key("games".to_string()),
                PathElement::Index(0),
                PathElement::Key("reviews".to_string()),
                PathElement::Index(12),
                PathElement::Key("author".to_string()),
            ])
        );
        assert_eq!(path.to_string(), "/games/0/reviews/12/author");
    }

    #[test]
    fn path_serializes_as_mixed_array() {
        let path = Path::from("games/1/title");
        let serialized = serde_json_bytes::to_value(&path).unwrap();
        assert_eq!(serialized, json!(["games", 1, "title"]));

        let deserialized: Path = serde_json_bytes::from_value(serialized).unwrap();
        assert_eq!(deserialized, path);
    }

    #[test]
    fn join_does_not_mutate_the_original() {
        let path = Path::from("games");
        let child = path.key("reviews").index(3);
        assert_eq!(path.to_string(), "/games");
        assert_eq!(child.to_string(), "/games/reviews/3");
    }
}
