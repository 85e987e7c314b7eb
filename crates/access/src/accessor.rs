/// What a check requires: one role, group or permission, or several.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Accessor {
    /// A single requirement.
    One(String),

    /// Several requirements, combined with AND or OR by the check.
    Many(Vec<String>),
}

impl Accessor {
    /// The requirements, one per string.
    #[must_use]
    pub fn requirements(&self) -> &[String] {
        match self {
            Self::One(requirement) => std::slice::from_ref(requirement),
            Self::Many(requirements) => requirements,
        }
    }
}

impl From<&str> for Accessor {
    fn from(requirement: &str) -> Self {
        Self::One(requirement.to_string())
    }
}

impl From<String> for Accessor {
    fn from(requirement: String) -> Self {
        Self::One(requirement)
    }
}

impl From<Vec<String>> for Accessor {
    fn from(requirements: Vec<String>) -> Self {
        Self::Many(requirements)
    }
}

impl From<Vec<&str>> for Accessor {
    fn from(requirements: Vec<&str>) -> Self {
        Self::Many(requirements.into_iter().map(ToString::to_string).collect())
    }
}

impl From<&[&str]> for Accessor {
    fn from(requirements: &[&str]) -> Self {
        Self::Many(requirements.iter().map(ToString::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Accessor {
    fn from(requirements: [&str; N]) -> Self {
        Self::Many(requirements.iter().map(ToString::to_string).collect())
    }
}
