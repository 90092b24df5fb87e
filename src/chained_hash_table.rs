//! ChainedHashTable: separate chaining over a power-of-two bucket array.
//!
//! Chain nodes live in a generational arena and link to each other by key,
//! so unlinking and chain splitting only rewrite `next` fields. On growth
//! each chain is partitioned in one pass by the single hash bit that the
//! doubled mask adds; entries are never rehashed.

use crate::config::{TableConfig, MAXIMUM_CAPACITY};
use crate::dictionary::{Dictionary, Entry};
use crate::error::DictError;
use crate::hashing::hash_of;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, trace};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct ChainKey;
}

#[derive(Debug)]
struct ChainNode<K, V> {
    entry: Entry<K, V>,
    next: Option<ChainKey>,
}

/// Head and tail of a chain being assembled during a split.
#[derive(Default, Clone, Copy)]
struct Chain {
    head: Option<ChainKey>,
    tail: Option<ChainKey>,
}

impl Chain {
    fn push<K, V>(&mut self, nodes: &mut SlotMap<ChainKey, ChainNode<K, V>>, k: ChainKey) {
        match self.tail {
            Some(t) => nodes[t].next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
    }
}

/// What the next resize should do.
#[derive(Debug, PartialEq, Eq)]
enum Growth {
    Allocate { capacity: usize, threshold: usize },
    Double { capacity: usize, threshold: usize },
    Saturated,
}

/// Round a requested capacity up to the power of two the table will use.
fn table_size_for(requested: usize) -> usize {
    requested.clamp(1, MAXIMUM_CAPACITY).next_power_of_two()
}

/// `floor(capacity * load_factor)`, or "never resize" once either side of
/// the product reaches the capacity ceiling.
fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    let ft = capacity as f32 * load_factor;
    if capacity < MAXIMUM_CAPACITY && ft < MAXIMUM_CAPACITY as f32 {
        ft as usize
    } else {
        usize::MAX
    }
}

fn plan_growth(old_capacity: usize, initial_capacity: usize, load_factor: f32) -> Growth {
    if old_capacity == 0 {
        return Growth::Allocate {
            capacity: initial_capacity,
            threshold: threshold_for(initial_capacity, load_factor),
        };
    }
    if old_capacity >= MAXIMUM_CAPACITY {
        return Growth::Saturated;
    }
    // Recomputed rather than shifted: a zero threshold would never grow.
    let capacity = old_capacity << 1;
    Growth::Double {
        capacity,
        threshold: threshold_for(capacity, load_factor),
    }
}

#[inline]
fn matches<K, V, Q>(entry: &Entry<K, V>, hash: u32, q: &Q) -> bool
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    if entry.hash() != hash {
        return false;
    }
    let k: &Q = entry.key().borrow();
    core::ptr::eq(k, q) || k == q
}

/// Hash table resolving collisions with per-bucket singly linked chains.
pub struct ChainedHashTable<K, V, S = DefaultHashBuilder> {
    hasher: S,
    buckets: Vec<Option<ChainKey>>,
    nodes: SlotMap<ChainKey, ChainNode<K, V>>,
    threshold: usize,
    load_factor: f32,
    // Power of two the first allocation uses.
    initial_capacity: usize,
}

impl<K, V> ChainedHashTable<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self::with_capacity_and_hasher(initial_capacity, DefaultHashBuilder::default())
    }

    pub fn with_capacity_and_load_factor(
        initial_capacity: usize,
        load_factor: f32,
    ) -> Result<Self, DictError> {
        Self::with_config(TableConfig::with_capacity(initial_capacity).load_factor(load_factor))
    }

    pub fn with_config(config: TableConfig) -> Result<Self, DictError> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for ChainedHashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedHashTable<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(TableConfig::default(), hasher)
    }

    pub fn with_capacity_and_hasher(initial_capacity: usize, hasher: S) -> Self {
        Self::from_parts(TableConfig::with_capacity(initial_capacity), hasher)
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, DictError> {
        config.validate()?;
        Ok(Self::from_parts(config, hasher))
    }

    fn from_parts(config: TableConfig, hasher: S) -> Self {
        let initial_capacity = table_size_for(config.initial_capacity);
        Self {
            hasher,
            buckets: Vec::new(),
            nodes: SlotMap::with_key(),
            threshold: threshold_for(initial_capacity, config.load_factor),
            load_factor: config.load_factor,
            initial_capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of buckets; `0` until the first insert allocates them.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Size above which the next insert grows the table.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Length of the chain in bucket `index`; `0` for out-of-range indexes.
    pub fn bucket_len(&self, index: usize) -> usize {
        let mut cursor = self.buckets.get(index).copied().flatten();
        let mut n = 0;
        while let Some(k) = cursor {
            n += 1;
            cursor = self.nodes[k].next;
        }
        n
    }

    #[inline]
    fn index_for(&self, hash: u32) -> usize {
        (self.buckets.len() - 1) & hash as usize
    }

    /// Allocate the bucket array, or double it and split every chain.
    fn grow(&mut self) {
        let old_capacity = self.buckets.len();
        match plan_growth(old_capacity, self.initial_capacity, self.load_factor) {
            Growth::Saturated => {
                debug!(
                    "chained table at maximum capacity {}; growth disabled",
                    old_capacity
                );
                self.threshold = usize::MAX;
            }
            Growth::Allocate {
                capacity,
                threshold,
            } => {
                trace!(
                    "allocating {} buckets (threshold {})",
                    capacity,
                    threshold
                );
                self.buckets = vec![None; capacity];
                self.threshold = threshold;
            }
            Growth::Double {
                capacity,
                threshold,
            } => {
                trace!(
                    "growing from {} to {} buckets with {} entries (threshold {})",
                    old_capacity,
                    capacity,
                    self.nodes.len(),
                    threshold
                );
                let old = core::mem::replace(&mut self.buckets, vec![None; capacity]);
                for (i, head) in old.into_iter().enumerate() {
                    let (low, high) = self.split_chain(head, old_capacity);
                    self.buckets[i] = low.head;
                    self.buckets[i + old_capacity] = high.head;
                }
                self.threshold = threshold;
            }
        }
    }

    /// Partition one chain by `hash & old_capacity`, keeping relative order.
    fn split_chain(&mut self, head: Option<ChainKey>, old_capacity: usize) -> (Chain, Chain) {
        let mut low = Chain::default();
        let mut high = Chain::default();
        let mut cursor = head;
        while let Some(k) = cursor {
            let node = &mut self.nodes[k];
            cursor = node.next.take();
            if node.entry.hash() as usize & old_capacity == 0 {
                low.push(&mut self.nodes, k);
            } else {
                high.push(&mut self.nodes, k);
            }
        }
        (low, high)
    }
}

impl<K, V, S> ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn find_node<Q>(&self, q: &Q) -> Option<ChainKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let hash = hash_of(&self.hasher, q);
        let mut cursor = self.buckets[self.index_for(hash)];
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            if matches(&node.entry, hash, q) {
                return Some(k);
            }
            cursor = node.next;
        }
        None
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_node(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_node(q).map(|k| self.nodes[k].entry.value())
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find_node(q)?;
        Some(self.nodes[k].entry.value_mut())
    }

    pub fn get_entry<Q>(&self, q: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_node(q).map(|k| &self.nodes[k].entry)
    }

    /// Map `key` to `value`. An existing mapping is updated in place and its
    /// old value returned; otherwise the entry is appended to its chain.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.buckets.is_empty() {
            self.grow();
        }
        let hash = hash_of(&self.hasher, &key);
        let index = self.index_for(hash);

        let mut tail = None;
        let mut cursor = self.buckets[index];
        while let Some(k) = cursor {
            let node = &mut self.nodes[k];
            if matches(&node.entry, hash, &key) {
                return Some(node.entry.set_value(value));
            }
            tail = Some(k);
            cursor = node.next;
        }

        let k = self.nodes.insert(ChainNode {
            entry: Entry::new(hash, key, value),
            next: None,
        });
        match tail {
            Some(t) => self.nodes[t].next = Some(k),
            None => self.buckets[index] = Some(k),
        }

        // One doubling may still floor to a threshold below len when the
        // load factor is tiny; saturation ends the loop at usize::MAX.
        while self.nodes.len() > self.threshold {
            self.grow();
        }
        None
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Unlink the entry for `q` from its chain and hand back its parts.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let hash = hash_of(&self.hasher, q);
        let index = self.index_for(hash);

        let mut prev: Option<ChainKey> = None;
        let mut cursor = self.buckets[index];
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            let next = node.next;
            if matches(&node.entry, hash, q) {
                match prev {
                    Some(p) => self.nodes[p].next = next,
                    None => self.buckets[index] = next,
                }
                return self.nodes.remove(k).map(|n| n.entry.into_parts());
            }
            prev = Some(k);
            cursor = next;
        }
        None
    }
}

impl<K, V, S> Dictionary<K, V> for ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn len(&self) -> usize {
        ChainedHashTable::len(self)
    }

    fn contains_key(&self, key: &K) -> Result<bool, DictError> {
        Ok(ChainedHashTable::contains_key(self, key))
    }

    fn get(&self, key: &K) -> Result<Option<&V>, DictError> {
        Ok(ChainedHashTable::get(self, key))
    }

    fn insert(&mut self, key: K, value: V) -> Result<Option<V>, DictError> {
        Ok(ChainedHashTable::insert(self, key, value))
    }

    fn remove(&mut self, key: &K) -> Result<Option<V>, DictError> {
        Ok(ChainedHashTable::remove(self, key))
    }
}

impl<K, V, S> fmt::Debug for ChainedHashTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedHashTable")
            .field("len", &self.nodes.len())
            .field("capacity", &self.buckets.len())
            .field("threshold", &self.threshold)
            .field("load_factor", &self.load_factor)
            .finish()
    }
}

/// One line per bucket: `i -> { key, value } -> ... -> null`.
impl<K, V, S> fmt::Display for ChainedHashTable<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.buckets.is_empty() {
            return f.write_str("table is unallocated");
        }
        for (i, head) in self.buckets.iter().enumerate() {
            write!(f, "{} -> ", i)?;
            let mut cursor = *head;
            while let Some(k) = cursor {
                let node = &self.nodes[k];
                write!(f, "{{ {}, {} }} -> ", node.entry.key(), node.entry.value())?;
                cursor = node.next;
            }
            writeln!(f, "null")?;
        }
        Ok(())
    }
}
