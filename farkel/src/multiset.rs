use crate::u64_sum_all_nibs;
use claim::{debug_assert_le, debug_assert_lt};
#[cfg(test)]
use proptest::{
    arbitrary::{any, Arbitrary},
    strategy::{BoxedStrategy, Strategy},
};
use std::{
    fmt,
    hash::{Hash, Hasher},
    ops,
};

/// A compressed representation of a multiset (a set with potential duplicates
/// of the same item), that can store up to 16 entries with individual counts
/// in the range `0..=15`.
///
/// `MultisetU4x16` is laid out like `0xfedc_ba98_7654_3210`, where each nibble
/// `X` is the number of items at index `0 <= X < 16` in the multiset.
///
/// Since only the counts are stored, two multisets built from the same items
/// in a different order are bitwise identical.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq)]
pub struct MultisetU4x16(u64);

impl MultisetU4x16 {
    /// A new empty set of counts.
    #[inline]
    pub const fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn from_count(idx: u8, count: u8) -> Self {
        debug_assert_lt!(idx, 16);
        debug_assert_le!(count, 15);

        Self(((count as u64) & 0x0f) << (4 * (idx as u64)))
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::new()
    }

    #[inline]
    pub fn len(self) -> u8 {
        // the length of a multiset is the sum of the counts of each element.
        // since we represent each elements' count as a nibble packed into a
        // u64, the total length is the sum of all the nibbles.
        u64_sum_all_nibs(self.0) as u8
    }

    #[inline]
    pub const fn get_count(self, idx: u8) -> u8 {
        (self.0 >> (4 * (idx as u64)) & 0x0f) as u8
    }

    pub fn is_superset_of(self, other: Self) -> bool {
        (0..16).all(|idx| self.get_count(idx) >= other.get_count(idx))
    }

    #[cfg(test)]
    pub fn into_iter_flat(self) -> impl Iterator<Item = u8> {
        (0..16).flat_map(move |idx| std::iter::repeat(idx).take(self.get_count(idx) as usize))
    }

    pub fn from_iter_flat(iter: impl Iterator<Item = u8>) -> Self {
        iter.map(|idx| Self::from_count(idx, 1))
            .fold(Self::new(), |acc, single| acc + single)
    }

    /// Returns an `Iterator` of `(idx: u8, count: u8)` tuples over all 16
    /// slots, including empty ones.
    #[allow(clippy::should_implement_trait)]
    pub fn into_iter(self) -> impl Iterator<Item = (u8, u8)> {
        (0..16).map(move |idx| (idx, self.get_count(idx)))
    }
}

impl FromIterator<(u8, u8)> for MultisetU4x16 {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (u8, u8)>,
    {
        iter.into_iter().fold(Self::new(), |acc, (idx, count)| {
            acc + MultisetU4x16::from_count(idx, count)
        })
    }
}

impl fmt::Debug for MultisetU4x16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.into_iter().filter(|(_idx, count)| count > &0);
        f.debug_map().entries(entries).finish()
    }
}

impl ops::Add for MultisetU4x16 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        // a nibble overflow would silently carry into the next slot
        debug_assert!((0..16).all(|idx| self.get_count(idx) + rhs.get_count(idx) <= 15));
        Self(self.0 + rhs.0)
    }
}

impl ops::AddAssign for MultisetU4x16 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl ops::Sub for MultisetU4x16 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        debug_assert!(self.is_superset_of(rhs));
        Self(self.0 - rhs.0)
    }
}

impl ops::SubAssign for MultisetU4x16 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl PartialEq for MultisetU4x16 {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_u64().eq(&other.as_u64())
    }
}

impl Hash for MultisetU4x16 {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.as_u64())
    }
}

#[cfg(test)]
impl Arbitrary for MultisetU4x16 {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        // keep every count <= 7 so sums of two arbitrary multisets never
        // overflow a nibble
        any::<u64>()
            .prop_map(|x| Self(x & 0x7777_7777_7777_7777))
            .boxed()
    }
}
