/// Ordered mapping from view name to table.
///
/// Insertion order is the sheet order of the written workbook. Views are
/// free to share rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSet<T> {
    views: Vec<(String, T)>,
}

impl<T> Default for ViewSet<T> {
    fn default() -> Self {
        Self { views: Vec::new() }
    }
}

impl<T> ViewSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a view; an existing view with the same name is replaced in place
    pub fn insert(&mut self, name: impl Into<String>, table: T) {
        let name = name.into();
        match self.views.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = table,
            None => self.views.push((name, table)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.views.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.views.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let mut views = ViewSet::new();
        views.insert("b", 1);
        views.insert("a", 2);
        views.insert("c", 3);
        assert_eq!(views.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_insert_replaces_existing_name() {
        let mut views = ViewSet::new();
        views.insert("a", 1);
        views.insert("b", 2);
        views.insert("a", 3);
        assert_eq!(views.len(), 2);
        assert_eq!(views.get("a"), Some(&3));
        assert_eq!(views.names().next(), Some("a"));
    }
}
