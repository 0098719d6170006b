//! An environment for storing variables with scopes.
use indexmap::IndexMap;
use std::hash::Hash;
use std::rc::Rc;

/// An environment as a linked-list of maps.
///
/// Each node of the linked-list corresponds to what is called "a layer", or a scope, where only
/// the current layer can be modified. The previous ones are only accessible for lookup.
///
/// For the generic parameters, `K` is the type for the environment keys, and `V` are their value.
///
/// Layers are stored behind an `Rc` and are copied on write: a child environment holds a
/// snapshot of its parent, so inserting into the parent after the child has been created is not
/// visible from the child, and the other way around. Within a layer, entries keep their insertion
/// order.
#[derive(Debug)]
pub struct Environment<K: Hash + Eq, V> {
    current: Rc<IndexMap<K, V>>,
    previous: Option<Rc<Environment<K, V>>>,
}

impl<K: Hash + Eq, V> Clone for Environment<K, V> {
    fn clone(&self) -> Self {
        Environment {
            current: Rc::clone(&self.current),
            previous: self.previous.clone(),
        }
    }
}

impl<K: Hash + Eq, V> Default for Environment<K, V> {
    fn default() -> Self {
        Self {
            current: Rc::new(IndexMap::new()),
            previous: None,
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Environment<K, V> {
    /// Creates a new empty Environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new environment with an empty current layer, whose previous layers are the
    /// layers of `self`.
    pub fn child(&self) -> Self {
        Environment {
            current: Rc::new(IndexMap::new()),
            previous: Some(Rc::new(self.clone())),
        }
    }

    /// Inserts a key-value pair into the current layer.
    pub fn insert(&mut self, key: K, value: V) {
        Rc::make_mut(&mut self.current).insert(key, value);
    }

    /// Tries to find the value of a key in the Environment, starting from the current layer.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.iter_layers().find_map(|layer| layer.get(key))
    }

    /// Tries to find the value of a key in the current layer only.
    pub fn get_current(&self, key: &K) -> Option<&V> {
        self.current.get(key)
    }

    /// Creates an iterator that visits all layers from the most recent one to the oldest.
    pub fn iter_layers(&self) -> EnvLayerIter<'_, K, V> {
        EnvLayerIter { env: Some(self) }
    }

    /// Iterates over the entries of the current layer, in insertion order.
    pub fn iter_current(&self) -> indexmap::map::Iter<'_, K, V> {
        self.current.iter()
    }
}

/// An iterator over the layers of an [Environment], from the most recent one to the oldest.
pub struct EnvLayerIter<'a, K: Hash + Eq, V> {
    env: Option<&'a Environment<K, V>>,
}

impl<'a, K: Hash + Eq, V> Iterator for EnvLayerIter<'a, K, V> {
    type Item = &'a IndexMap<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let env = self.env?;
        self.env = env.previous.as_deref();
        Some(&env.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_base() {
        let mut env_base = Environment::new();
        env_base.insert(1, 'a');
        assert_eq!(env_base.get(&1), Some(&'a'));
        assert_eq!(env_base.get(&5), None);
    }

    #[test]
    fn test_child_lookup_walks_outward() {
        let mut parent = Environment::new();
        parent.insert("x", 1);

        let mut child = parent.child();
        child.insert("y", 2);

        assert_eq!(child.get(&"x"), Some(&1));
        assert_eq!(child.get(&"y"), Some(&2));
        assert_eq!(child.get_current(&"x"), None);
        assert_eq!(parent.get(&"y"), None);
        assert_eq!(child.iter_layers().count(), 2);
    }

    #[test]
    fn test_shadowing_across_layers() {
        let mut parent = Environment::new();
        parent.insert("x", 1);
        let mut child = parent.child();
        child.insert("x", 2);

        assert_eq!(child.get(&"x"), Some(&2));
        assert_eq!(parent.get(&"x"), Some(&1));
    }

    #[test]
    fn test_parent_insert_after_child_creation() {
        let mut parent = Environment::new();
        parent.insert("x", 1);
        let child = parent.child();
        parent.insert("z", 3);

        assert_eq!(child.get(&"z"), None);
        assert_eq!(parent.get(&"z"), Some(&3));
    }

    #[test]
    fn test_iter_current_keeps_insertion_order() {
        let mut env = Environment::new();
        env.insert("b", 1);
        env.insert("a", 2);
        env.insert("c", 3);

        let keys: Vec<_> = env.iter_current().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
