use thiserror::Error;

/// Category of a recorded [`Issue`].
///
/// The kinds mirror the CellML constructs that can fault during parsing,
/// plus [`IssueKind::Xml`] for faults reported by the underlying XML reader
/// and [`IssueKind::Generator`], which is reserved for downstream consumers
/// of a parsed [`crate::Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    Xml,
    Model,
    Component,
    Units,
    Variable,
    Import,
    Encapsulation,
    Connection,
    Generator,
}

/// Identity of the entity an [`Issue`] is attributed to.
///
/// Entities are identified by name (imports by their source URI) rather
/// than by reference, so a log remains meaningful independently of the
/// model it describes.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    #[error("model `{0}`")]
    Model(String),
    #[error("component `{0}`")]
    Component(String),
    #[error("units `{0}`")]
    Units(String),
    #[error("variable `{0}`")]
    Variable(String),
    #[error("import `{0}`")]
    Import(String),
}

/// A single recorded fault: a human-readable description, the [`IssueKind`]
/// it falls under, and at most one [`EntityRef`] naming the most specific
/// entity responsible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{description}")]
pub struct Issue {
    pub description: String,
    pub kind: IssueKind,
    pub source: Option<EntityRef>,
}

impl Issue {
    /// Create a new issue of the given kind with no entity attribution.
    pub fn new(kind: IssueKind, description: impl Into<String>) -> Self {
        Issue {
            description: description.into(),
            kind,
            source: None,
        }
    }

    /// Attribute this issue to a specific entity.
    #[must_use]
    pub fn with_source(mut self, source: EntityRef) -> Self {
        self.source = Some(source);
        self
    }
}

/// Ordered, append-only collection of [`Issue`] records.
///
/// The log never deduplicates and never reorders, so within one parse the
/// records appear in document-traversal order. A [`crate::Parser`] embeds
/// one log; successive parses keep appending to it unless it is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    issues: Vec<Issue>,
}

impl ErrorLog {
    #[must_use]
    pub fn new() -> Self {
        ErrorLog::default()
    }

    pub fn append(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Issue> {
        self.issues.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn clear(&mut self) {
        self.issues.clear();
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_preserves_order_and_duplicates() {
        let mut log = ErrorLog::new();
        let first = Issue::new(IssueKind::Model, "first");
        let second = Issue::new(IssueKind::Units, "second")
            .with_source(EntityRef::Units("ampere".to_string()));
        log.append(first.clone());
        log.append(second.clone());
        log.append(first.clone());

        assert_eq!(log.count(), 3);
        assert_eq!(log.get(0), Some(&first));
        assert_eq!(log.get(1), Some(&second));
        assert_eq!(log.get(2), Some(&first));
        assert_eq!(log.get(3), None);
    }

    #[test]
    fn issue_displays_its_description() {
        let issue = Issue::new(IssueKind::Connection, "something went wrong");
        assert_eq!(issue.to_string(), "something went wrong");
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = ErrorLog::new();
        log.append(Issue::new(IssueKind::Xml, "bad document"));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.count(), 0);
    }
}
