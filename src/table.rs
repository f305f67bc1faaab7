use std::cmp::min;
use std::ops::Index;

use thiserror::Error;

use crate::utils::MyHash;

/// The unique table ran out of cells.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
#[error("node storage is full (capacity {capacity})")]
pub struct StorageFull {
    pub capacity: usize,
}

#[derive(Clone)]
struct Entry<T> {
    value: T,
    next: usize,
}

impl<T> Default for Entry<T>
where
    T: Default,
{
    fn default() -> Self {
        Self {
            value: T::default(),
            next: 0,
        }
    }
}

/// Hash-consing table with chained buckets.
///
/// Cells are never freed: the table lives as long as its manager, and
/// managers are scoped to a single query or to a collapsed network.
pub struct Table<T> {
    data: Vec<Entry<T>>,

    buckets: Vec<usize>,
    bitmask: u64,

    /// Index of the last occupied cell.
    last_index: usize,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut data: Vec<Entry<T>> = Vec::with_capacity(capacity);
        data.resize_with(capacity, Entry::default);

        let buckets_bits = min(bits, 16);
        let buckets_size = 1 << buckets_bits;
        let buckets = vec![0; buckets_size];
        let bitmask = (buckets_size - 1) as u64;

        Self {
            data,
            buckets,
            bitmask,
            last_index: 0,
        }
    }
}

impl<T> Table<T> {
    /// Get the capacity of the table.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
    /// Get the number of occupied cells (the 0th sentry cell excluded).
    pub fn size(&self) -> usize {
        self.last_index
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index].value
    }

    /// Get the index of the next cell in the same bucket.
    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next
    }

    fn set_next(&mut self, index: usize, next: usize) {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next = next;
    }

    /// Allocate a new cell in the table and return its index.
    pub(crate) fn alloc(&mut self) -> Result<usize, StorageFull> {
        let index = self.last_index + 1;
        if index >= self.capacity() {
            return Err(StorageFull {
                capacity: self.capacity(),
            });
        }
        self.last_index = index;
        Ok(index)
    }

    /// Add a new value to the table and return its index.
    pub fn add(&mut self, value: T) -> Result<usize, StorageFull> {
        let index = self.alloc()?;
        self.data[index].value = value;
        self.data[index].next = 0;
        Ok(index)
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Put a value into the table, returning the index of the existing equal
    /// value when there is one.
    pub fn put(&mut self, value: T) -> Result<usize, StorageFull> {
        let bucket_index = self.bucket_index(&value);
        let mut index = self.buckets[bucket_index];

        if index == 0 {
            let i = self.add(value)?;
            self.buckets[bucket_index] = i;
            return Ok(i);
        }

        loop {
            if &value == self.value(index) {
                return Ok(index);
            }

            let next = self.next(index);
            if next == 0 {
                let i = self.add(value)?;
                self.set_next(index, i);
                return Ok(i);
            }
            index = next;
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}
