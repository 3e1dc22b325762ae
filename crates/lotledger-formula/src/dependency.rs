//! Dependency tracking between formula fields
//!
//! Nodes are field names; an edge from a precedent to a dependent means the
//! dependent's formula references the precedent.

use ahash::{AHashMap, AHashSet};

/// Dependency graph for formula fields
///
/// Tracks which fields depend on which other fields, enabling cycle
/// detection before a formula is saved and ordered evaluation afterwards.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Field → Fields that depend on it (dependents)
    dependents: AHashMap<String, AHashSet<String>>,
    /// Field → Fields it depends on (precedents)
    precedents: AHashMap<String, AHashSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.dependents
            .entry(precedent.to_string())
            .or_default()
            .insert(dependent.to_string());
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(precedent.to_string());
    }

    /// Record every precedent of a field, replacing what was recorded before
    pub fn set_precedents<I, S>(&mut self, field: &str, precedents: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clear_precedents(field);
        for precedent in precedents {
            self.add_dependency(precedent.as_ref(), field);
        }
    }

    /// Remove the edges from a field to the fields it depends on
    pub fn clear_precedents(&mut self, field: &str) {
        if let Some(precedents) = self.precedents.remove(field) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(field);
                }
            }
        }
    }

    /// Remove all dependencies for a field
    pub fn clear_dependencies(&mut self, field: &str) {
        self.clear_precedents(field);

        // Remove as a precedent for others
        if let Some(dependents) = self.dependents.remove(field) {
            for dependent in dependents {
                if let Some(precs) = self.precedents.get_mut(&dependent) {
                    precs.remove(field);
                }
            }
        }
    }

    /// Get fields that depend on the given field
    pub fn get_dependents<'a>(&'a self, field: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.dependents
            .get(field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Get fields that the given field depends on
    pub fn get_precedents<'a>(&'a self, field: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.precedents
            .get(field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Detect circular references involving a field
    pub fn has_circular_reference(&self, field: &str) -> bool {
        self.find_cycle(field).is_some()
    }

    /// Find a chain of precedents that leads from `field` back to itself
    ///
    /// The returned path starts and ends with `field`, e.g.
    /// `["Cost Per Day", "Total Cost", "Cost Per Day"]`.
    pub fn find_cycle(&self, field: &str) -> Option<Vec<String>> {
        let mut visited = AHashSet::new();
        let mut path = vec![field.to_string()];
        if self.walk_precedents(field, field, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn walk_precedents(
        &self,
        target: &str,
        field: &str,
        visited: &mut AHashSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        let precedents = match self.precedents.get(field) {
            Some(precedents) => precedents,
            None => return false,
        };

        // Sorted so the reported cycle does not depend on hash order
        let mut precedents: Vec<&String> = precedents.iter().collect();
        precedents.sort();

        for precedent in precedents {
            if precedent == target {
                path.push(precedent.clone());
                return true;
            }
            if !visited.insert(precedent.clone()) {
                continue;
            }
            path.push(precedent.clone());
            if self.walk_precedents(target, precedent, visited, path) {
                return true;
            }
            path.pop();
        }

        false
    }

    /// Order `fields` so that every field comes after the fields it depends on
    ///
    /// Fields caught in a cycle are still emitted exactly once; their relative
    /// order is unspecified. Names not listed in `fields` are not emitted.
    pub fn evaluation_order<S: AsRef<str>>(&self, fields: &[S]) -> Vec<String> {
        let wanted: AHashSet<&str> = fields.iter().map(|f| f.as_ref()).collect();
        let mut result = Vec::new();
        let mut visited = AHashSet::new();
        let mut in_stack = AHashSet::new();

        for field in fields {
            self.topological_sort(
                field.as_ref(),
                &wanted,
                &mut result,
                &mut visited,
                &mut in_stack,
            );
        }

        result
    }

    /// Topological sort helper (DFS over precedents)
    fn topological_sort(
        &self,
        field: &str,
        wanted: &AHashSet<&str>,
        result: &mut Vec<String>,
        visited: &mut AHashSet<String>,
        in_stack: &mut AHashSet<String>,
    ) {
        if visited.contains(field) || in_stack.contains(field) {
            // Already emitted, or a circular reference
            return;
        }

        in_stack.insert(field.to_string());

        // Visit all precedents first
        if let Some(precedents) = self.precedents.get(field) {
            let mut precedents: Vec<&String> = precedents.iter().collect();
            precedents.sort();
            for precedent in precedents {
                self.topological_sort(precedent, wanted, result, visited, in_stack);
            }
        }

        in_stack.remove(field);
        visited.insert(field.to_string());
        if wanted.contains(field) {
            result.push(field.to_string());
        }
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();

        graph.add_dependency("purchasePrice", "Total Cost");

        assert!(graph.get_dependents("purchasePrice").any(|f| f == "Total Cost"));
        assert!(graph.get_precedents("Total Cost").any(|f| f == "purchasePrice"));
    }

    #[test]
    fn test_circular_reference() {
        let mut graph = DependencyGraph::new();

        // a -> b -> c -> a (circular)
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");
        graph.add_dependency("c", "a");

        assert!(graph.has_circular_reference("a"));
        assert!(graph.has_circular_reference("b"));
        assert!(graph.has_circular_reference("c"));
        assert_eq!(
            graph.find_cycle("a"),
            Some(vec!["a".to_string(), "c".to_string(), "b".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn test_self_reference() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("Total Cost", "Total Cost");

        assert_eq!(
            graph.find_cycle("Total Cost"),
            Some(vec!["Total Cost".to_string(), "Total Cost".to_string()])
        );
    }

    #[test]
    fn test_no_cycle_in_diamond() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("a", "c");
        graph.add_dependency("b", "d");
        graph.add_dependency("c", "d");

        assert!(!graph.has_circular_reference("d"));
        assert!(!graph.has_circular_reference("a"));
    }

    #[test]
    fn test_set_precedents_replaces_edges() {
        let mut graph = DependencyGraph::new();
        graph.set_precedents("margin", ["listingPrice", "cost"]);
        graph.set_precedents("margin", ["cost"]);

        let mut precedents: Vec<&str> = graph.get_precedents("margin").collect();
        precedents.sort();
        assert_eq!(precedents, vec!["cost"]);
        assert_eq!(graph.get_dependents("listingPrice").count(), 0);
    }

    #[test]
    fn test_clear_dependencies() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");

        graph.clear_dependencies("b");

        assert_eq!(graph.get_dependents("a").count(), 0);
        assert_eq!(graph.get_precedents("c").count(), 0);
    }

    #[test]
    fn test_evaluation_order() {
        let mut graph = DependencyGraph::new();
        // Cost Per Day uses Total Cost, which uses raw attributes
        graph.set_precedents("Cost Per Day", ["Total Cost", "daysInInventory"]);
        graph.set_precedents("Total Cost", ["purchasePrice", "totalExpenses"]);
        graph.set_precedents("Margin", ["Total Cost", "listingPrice"]);

        let order = graph.evaluation_order(&["Cost Per Day", "Margin", "Total Cost"]);
        assert_eq!(order, vec!["Total Cost", "Cost Per Day", "Margin"]);
    }

    #[test]
    fn test_evaluation_order_with_cycle_terminates() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "a");

        let order = graph.evaluation_order(&["a", "b"]);
        assert_eq!(order.len(), 2);
    }
}
