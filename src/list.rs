use thiserror::Error;

/// Capacity used by the bundled demo, matching its 256-slot buffers.
pub const DEMO_CAPACITY: usize = 256;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CapacityError {
    #[error("list holds at most {capacity} elements, got {len}")]
    TooLong { len: usize, capacity: usize },
}

/// Fixed-capacity ordered sequence of integers with an explicit logical length.
///
/// Slots at and past `len` are zero-filled but carry no meaning. The length is
/// checked once, at construction, so `len <= N` holds for every live value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedList<const N: usize = DEMO_CAPACITY> {
    inner: [i32; N],
    len: usize,
}

impl<const N: usize> BoundedList<N> {
    pub fn from_slice(values: &[i32]) -> Result<Self, CapacityError> {
        if values.len() > N {
            return Err(CapacityError::TooLong {
                len: values.len(),
                capacity: N,
            });
        }

        let mut inner = [0; N];
        inner[..values.len()].copy_from_slice(values);

        Ok(BoundedList {
            inner,
            len: values.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The valid prefix only.
    pub fn as_slice(&self) -> &[i32] {
        &self.inner[..self.len]
    }

    /// Consumes the list and copies its valid prefix into `dest`, leaving the
    /// remaining slots of `dest` untouched. Returns the number of elements
    /// copied.
    ///
    /// Taking `self` by value is the point: draining the same list twice does
    /// not compile.
    pub fn drain_into(self, dest: &mut [i32; N]) -> usize {
        dest[..self.len].copy_from_slice(&self.inner[..self.len]);
        self.len
    }

    /// Consumes the list and returns the backing array plus the logical length.
    pub fn into_inner(self) -> ([i32; N], usize) {
        (self.inner, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_checks_capacity() {
        let list = BoundedList::<4>::from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.as_slice(), &[1, 2, 3]);

        let err = BoundedList::<2>::from_slice(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            CapacityError::TooLong {
                len: 3,
                capacity: 2
            }
        );
    }

    #[test]
    fn empty_list() {
        let list = BoundedList::<8>::from_slice(&[]).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.as_slice(), &[]);
    }

    #[test]
    fn drain_copies_prefix_and_leaves_rest() {
        let list = BoundedList::<8>::from_slice(&[1, 2, 3]).unwrap();

        let mut dest = [9; 8];
        let copied = list.drain_into(&mut dest);

        assert_eq!(copied, 3);
        assert_eq!(&dest[..3], &[1, 2, 3]);
        // slots past the logical length stay untouched
        assert_eq!(&dest[3..], &[9; 5]);
    }

    #[test]
    fn drain_at_demo_capacity() {
        let list: BoundedList = BoundedList::from_slice(&[1, 2, 3]).unwrap();

        let mut dest = [0; DEMO_CAPACITY];
        assert_eq!(list.drain_into(&mut dest), 3);
        assert_eq!(&dest[..3], &[1, 2, 3]);
    }

    #[test]
    fn into_inner_returns_backing_array() {
        let list = BoundedList::<4>::from_slice(&[7, 8]).unwrap();
        let (inner, len) = list.into_inner();
        assert_eq!(len, 2);
        assert_eq!(inner, [7, 8, 0, 0]);
    }
}
