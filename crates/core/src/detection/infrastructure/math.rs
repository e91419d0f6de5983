//! Union-find helpers used to cluster raw detection windows.

use std::collections::HashMap;

/// Find root of element `i` with path halving for amortized near-O(1).
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Assigns a dense class label to every element.
///
/// Labels are numbered in order of each class's first element, so the
/// output is deterministic for a given input order. Returns the labels and
/// the number of classes.
pub fn label_components(parent: &mut [usize]) -> (Vec<usize>, usize) {
    let mut root_labels: HashMap<usize, usize> = HashMap::new();
    let mut labels = Vec::with_capacity(parent.len());
    for i in 0..parent.len() {
        let root = find(parent, i);
        let next = root_labels.len();
        labels.push(*root_labels.entry(root).or_insert(next));
    }
    (labels, root_labels.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find_transitive() {
        let mut parent = vec![0, 1, 2];
        union(&mut parent, 0, 1);
        union(&mut parent, 1, 2);
        assert_eq!(find(&mut parent, 0), find(&mut parent, 2));
    }

    #[test]
    fn test_union_find_separate() {
        let mut parent = vec![0, 1, 2, 3];
        union(&mut parent, 0, 1);
        union(&mut parent, 2, 3);
        assert_ne!(find(&mut parent, 0), find(&mut parent, 2));
    }

    #[test]
    fn test_label_components_first_appearance_order() {
        let mut parent = vec![0, 1, 2, 3, 4];
        union(&mut parent, 3, 1);
        union(&mut parent, 4, 0);
        let (labels, count) = label_components(&mut parent);
        assert_eq!(count, 3);
        assert_eq!(labels, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_label_components_empty() {
        let mut parent: Vec<usize> = Vec::new();
        let (labels, count) = label_components(&mut parent);
        assert!(labels.is_empty());
        assert_eq!(count, 0);
    }
}
