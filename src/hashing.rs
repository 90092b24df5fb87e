//! Hash derivation shared by the hash table and the tree.

use core::hash::{BuildHasher, Hash, Hasher};

/// Fold a 64-bit hash to 32 bits and mix the high half into the low bits
/// used for bucket indexing.
#[inline]
pub fn spread(raw: u64) -> u32 {
    let h = (raw ^ (raw >> 32)) as u32;
    h ^ (h >> 16)
}

/// Hash `q` with `hasher` and spread the result.
#[inline]
pub(crate) fn hash_of<S, Q>(hasher: &S, q: &Q) -> u32
where
    S: BuildHasher,
    Q: ?Sized + Hash,
{
    spread(hasher.hash_one(q))
}

/// Integers hash to their own value; byte streams (strings, slices) are
/// folded with a x31 polynomial. Keeps bucket placement of integer keys
/// predictable, which the diagnostics and collision tests rely on.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityHasher(u64);

impl IdentityHasher {
    #[inline]
    fn mix(&mut self, word: u64) {
        self.0 = self.0.wrapping_mul(31).wrapping_add(word);
    }
}

impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.mix(b as u64);
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.mix(i as u64);
    }
    fn write_u16(&mut self, i: u16) {
        self.mix(i as u64);
    }
    fn write_u32(&mut self, i: u32) {
        self.mix(i as u64);
    }
    fn write_u64(&mut self, i: u64) {
        self.mix(i);
    }
    fn write_usize(&mut self, i: usize) {
        self.mix(i as u64);
    }
    // Signed values keep their two's complement width so -1i32 hashes to
    // 0xffff_ffff rather than u64::MAX.
    fn write_i8(&mut self, i: i8) {
        self.mix(i as u8 as u64);
    }
    fn write_i16(&mut self, i: i16) {
        self.mix(i as u16 as u64);
    }
    fn write_i32(&mut self, i: i32) {
        self.mix(i as u32 as u64);
    }
    fn write_i64(&mut self, i: i64) {
        self.mix(i as u64);
    }
    fn write_isize(&mut self, i: isize) {
        self.mix(i as usize as u64);
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// Builds [`IdentityHasher`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityBuildHasher;

impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher::default()
    }
}
