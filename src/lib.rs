//! dictionaries: two single-threaded key→value containers behind one
//! [`Dictionary`] contract.
//!
//! Internal Design:
//!
//! Summary
//! - ChainedHashTable<K, V, S>: power-of-two bucket array of singly linked
//!   chains. Grows by doubling; each chain is split in place into a "low"
//!   half that keeps its index and a "high" half that moves to
//!   `index + old_capacity`, decided by one bit of the cached hash.
//! - RedBlackTree<K, V, S>: ordered storage with logarithmic height.
//!   Insert and delete rebalance through iterative fixup loops.
//! - Entry<K, V>: key, value and the hash computed once at insertion;
//!   the unit both structures store.
//!
//! Constraints
//! - Single-threaded; no internal synchronization.
//! - Pointer graphs (chains, tree links) are expressed as generational
//!   slot keys into a per-structure arena. Parent links are plain keys
//!   and never own their target.
//! - No rehashing after insertion: chain splitting and the tree's
//!   diagnostics read the cached hash.
//! - Absent keys are reported as `None`; errors are reserved for
//!   construction parameters and keys with no total order, and are
//!   raised before anything is mutated.
//!
//! Hashing
//! - A 64-bit hash from the structure's `BuildHasher` is folded to 32
//!   bits and spread (`h ^ (h >> 16)`) so high bits reach the bucket
//!   mask. [`IdentityBuildHasher`] maps integer keys to themselves for
//!   predictable bucket placement.
//!
//! Notes and non-goals
//! - No general iteration API; `RedBlackTree::preorder` and the table's
//!   `Display` output exist for diagnostics.
//! - No incremental rehash: a resize completes inside the insert that
//!   triggered it.

mod chained_hash_table;
mod chained_hash_table_proptest;
pub mod config;
mod dictionary;
mod error;
pub mod hashing;
mod rb_tree;
mod rb_tree_proptest;

// Public surface
pub use chained_hash_table::ChainedHashTable;
pub use config::TableConfig;
pub use dictionary::{Dictionary, Entry};
pub use error::DictError;
pub use hashing::IdentityBuildHasher;
pub use rb_tree::{Color, NodeHandle, Preorder, RedBlackTree, TreeNodeRef, TreeViolation};
