use fxhash::FxBuildHasher;

// Keys are short partition/account names, FxHash is enough for them.
pub type Map<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;
pub type Set<T> = hashbrown::HashSet<T, FxBuildHasher>;
