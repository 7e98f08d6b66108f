//! Identifier interning.
//!
//! Property names are interned once and afterwards handled as
//! [`PropertyKey`]s: equality is an integer comparison and the hash is
//! computed at interning time, so property tables never touch string data.

use rustc_hash::{FxHashMap, FxHasher};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// An interned property name.
///
/// Keys are only meaningful relative to the [`IdentifierPool`] that produced
/// them. Equality is identity of the interned string.
#[derive(Clone, Copy)]
pub struct PropertyKey {
    id: u32,
    hash: u32,
}

impl PropertyKey {
    /// Returns the precomputed hash of the key's text.
    #[inline]
    pub fn hash_value(self) -> u32 {
        self.hash
    }

    /// Returns the pool-local identifier.
    #[inline]
    pub fn id(self) -> u32 {
        self.id
    }
}

impl PartialEq for PropertyKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PropertyKey {}

impl Hash for PropertyKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyKey({})", self.id)
    }
}

/// Interning pool for property names.
///
/// Owned by a single runtime context; dropping the pool releases every
/// interned string.
///
/// # Examples
///
/// ```
/// use core_types::IdentifierPool;
///
/// let mut pool = IdentifierPool::new();
/// let a = pool.intern("length");
/// let b = pool.intern("length");
/// assert_eq!(a, b);
/// assert_eq!(pool.resolve(a), "length");
/// ```
#[derive(Debug, Default)]
pub struct IdentifierPool {
    lookup: FxHashMap<Rc<str>, PropertyKey>,
    names: Vec<Rc<str>>,
}

impl IdentifierPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `text`, returning the existing key if it was seen before.
    pub fn intern(&mut self, text: &str) -> PropertyKey {
        if let Some(key) = self.lookup.get(text) {
            return *key;
        }

        let mut hasher = FxHasher::default();
        text.hash(&mut hasher);
        let hash = hasher.finish();
        let key = PropertyKey {
            id: self.names.len() as u32,
            // Fold the high half in so both halves contribute to table probing.
            hash: (hash ^ (hash >> 32)) as u32,
        };

        let name: Rc<str> = Rc::from(text);
        self.names.push(Rc::clone(&name));
        self.lookup.insert(name, key);
        key
    }

    /// Returns the key for `text` if it has already been interned.
    pub fn get(&self, text: &str) -> Option<PropertyKey> {
        self.lookup.get(text).copied()
    }

    /// Returns the text of an interned key.
    ///
    /// Keys from a different pool resolve to the empty string.
    pub fn resolve(&self, key: PropertyKey) -> &str {
        self.names
            .get(key.id as usize)
            .map(|name| name.as_ref())
            .unwrap_or("")
    }

    /// Number of distinct identifiers interned so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
