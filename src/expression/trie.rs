//! Prefix tree over variable names.
//!
//! The alphabet is fixed to `a-z`, `A-Z`, `0-9` and `_`. Lookups return the
//! longest known key that prefixes the scanned text, which lets `$hostname`
//! and `$host` coexist without delimiters.

const ALPHABET_SIZE: usize = 26 + 26 + 10 + 1;

/// Returns true for characters that may appear in a variable name.
pub fn is_valid_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn index_of(c: char) -> Option<usize> {
    match c {
        'a'..='z' => Some(c as usize - 'a' as usize),
        'A'..='Z' => Some(26 + c as usize - 'A' as usize),
        '0'..='9' => Some(52 + c as usize - '0' as usize),
        '_' => Some(62),
        _ => None,
    }
}

#[derive(Debug)]
struct Node<V> {
    value: Option<V>,
    children: Vec<Option<Box<Node<V>>>>,
}

impl<V> Node<V> {
    fn new() -> Self {
        Self {
            value: None,
            children: Vec::new(),
        }
    }

    fn child(&self, index: usize) -> Option<&Node<V>> {
        self.children.get(index).and_then(|c| c.as_deref())
    }

    fn child_mut(&mut self, index: usize) -> &mut Node<V> {
        if self.children.is_empty() {
            self.children.resize_with(ALPHABET_SIZE, || None);
        }
        self.children[index].get_or_insert_with(|| Box::new(Node::new()))
    }
}

/// A trie mapping variable names to values.
#[derive(Debug)]
pub struct VariableTrie<V> {
    root: Node<V>,
    len: usize,
}

impl<V> VariableTrie<V> {
    pub fn new() -> Self {
        Self {
            root: Node::new(),
            len: 0,
        }
    }

    /// Insert or replace the value stored under `key`.
    ///
    /// # Panics
    /// If `key` is empty or contains a character outside the alphabet. Keys
    /// come from code or from validated pattern variables, so this is a
    /// programming error.
    pub fn add(&mut self, key: &str, value: V) -> &mut Self {
        assert!(!key.is_empty(), "variable name must not be empty");

        let mut node = &mut self.root;
        for c in key.chars() {
            let index = index_of(c)
                .unwrap_or_else(|| panic!("invalid character {c:?} in variable name {key:?}"));
            node = node.child_mut(index);
        }

        if node.value.replace(value).is_none() {
            self.len += 1;
        }
        self
    }

    /// Exact lookup.
    pub fn get(&self, key: &str) -> Option<&V> {
        match self.get_best_match(key) {
            Some((value, length)) if length == key.len() => Some(value),
            _ => None,
        }
    }

    /// Find the longest stored key that is a prefix of `key`.
    ///
    /// Returns the value and the matched length in bytes. Descent stops at the
    /// first character outside the alphabet.
    pub fn get_best_match(&self, key: &str) -> Option<(&V, usize)> {
        let mut node = &self.root;
        let mut best = None;

        for (consumed, c) in key.chars().enumerate() {
            let Some(next) = index_of(c).and_then(|i| node.child(i)) else {
                break;
            };
            node = next;
            if let Some(value) = &node.value {
                // Alphabet is ASCII, so chars and bytes line up
                best = Some((value, consumed + 1));
            }
        }

        best
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<V> Default for VariableTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(keys: &[&'static str]) -> VariableTrie<&'static str> {
        let mut trie = VariableTrie::new();
        for key in keys {
            trie.add(key, *key);
        }
        trie
    }

    #[test]
    fn test_longest_prefix_match() {
        let trie = trie(&["host", "hostname"]);
        assert_eq!(trie.get_best_match("hostname"), Some((&"hostname", 8)));
        assert_eq!(trie.get_best_match("hostx"), Some((&"host", 4)));
        assert_eq!(trie.get_best_match("hostnamex"), Some((&"hostname", 8)));
        assert_eq!(trie.get_best_match("hos"), None);
        assert_eq!(trie.get_best_match(""), None);
    }

    #[test]
    fn test_match_stops_on_illegal_character() {
        let trie = trie(&["host"]);
        assert_eq!(trie.get_best_match("host-name"), Some((&"host", 4)));
        assert_eq!(trie.get_best_match("ho-st"), None);
    }

    #[test]
    fn test_case_sensitive() {
        let trie = trie(&["Host"]);
        assert_eq!(trie.get("Host"), Some(&"Host"));
        assert_eq!(trie.get("host"), None);
    }

    #[test]
    fn test_full_alphabet() {
        let trie = trie(&["aZ_09", "_"]);
        assert_eq!(trie.get("aZ_09"), Some(&"aZ_09"));
        assert_eq!(trie.get("_"), Some(&"_"));
        assert_eq!(trie.len(), 2);
    }

    #[test]
    fn test_replace_keeps_count() {
        let mut trie = VariableTrie::new();
        trie.add("a", 1).add("a", 2);
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.get("a"), Some(&2));
    }

    #[test]
    #[should_panic(expected = "invalid character")]
    fn test_add_illegal_character_panics() {
        let mut trie = VariableTrie::new();
        trie.add("bad-name", ());
    }
}
