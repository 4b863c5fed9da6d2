use std::fmt::{Display, Formatter as FmtFormatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// The serialized form of a list segment, as produced by the query planner.
pub const LIST_SEGMENT: &str = "@";

/// A single step of a path into the response tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FlattenNodePathSegment {
    /// Steps into the field with the given response key.
    Field(String),
    /// Steps into every element of the list at this level.
    List,
}

impl From<String> for FlattenNodePathSegment {
    fn from(value: String) -> Self {
        if value == LIST_SEGMENT {
            FlattenNodePathSegment::List
        } else {
            FlattenNodePathSegment::Field(value)
        }
    }
}

impl From<&str> for FlattenNodePathSegment {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

impl From<FlattenNodePathSegment> for String {
    fn from(value: FlattenNodePathSegment) -> Self {
        match value {
            FlattenNodePathSegment::Field(name) => name,
            FlattenNodePathSegment::List => LIST_SEGMENT.to_string(),
        }
    }
}

impl Display for FlattenNodePathSegment {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        match self {
            FlattenNodePathSegment::Field(name) => write!(f, "{}", name),
            FlattenNodePathSegment::List => write!(f, "{}", LIST_SEGMENT),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlattenNodePath(Vec<FlattenNodePathSegment>);

impl FlattenNodePath {
    pub fn new(segments: Vec<FlattenNodePathSegment>) -> Self {
        Self(segments)
    }

    pub fn as_slice(&self) -> &[FlattenNodePathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The field segments that precede the first list segment.
    /// This is the most precise location that does not depend on a specific list element.
    pub fn fields_before_first_list(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map_while(|segment| match segment {
            FlattenNodePathSegment::Field(name) => Some(name.as_str()),
            FlattenNodePathSegment::List => None,
        })
    }
}

impl<S: Into<FlattenNodePathSegment>> FromIterator<S> for FlattenNodePath {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Display for FlattenNodePath {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
