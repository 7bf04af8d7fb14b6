//! A lazily-allocated paged array, shared by the sparse set's sparse map
//! and the component pool's page list.
//!
//! Grounded on the paging strategy `amethyst-specs`'s `DenseVecStorage`
//! uses implicitly via its backing `Vec` growth, generalized here to
//! genuine fixed-size pages so a sparse index space doesn't force one
//! contiguous allocation sized to the highest index ever seen.

/// Default page size, in elements. A power of two, matching spec §3's
/// "Page size is a fixed power-of-two ... (default 1024)".
pub const DEFAULT_PAGE_SIZE: usize = 1024;

/// A paged array of `T`, indexed by a flat `usize`. Pages are allocated on
/// first write to an index that falls inside them; reads of an
/// unallocated page return `None`.
pub(crate) struct PagedArray<T> {
    page_size: usize,
    pages: Vec<Option<Box<[T]>>>,
}

impl<T: Copy + Default> PagedArray<T> {
    pub(crate) fn new(page_size: usize) -> Self {
        assert!(page_size.is_power_of_two(), "page size must be a power of two");
        PagedArray {
            page_size,
            pages: Vec::new(),
        }
    }

    #[inline]
    fn split(&self, index: usize) -> (usize, usize) {
        (index / self.page_size, index % self.page_size)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        let (page, offset) = self.split(index);
        self.pages.get(page)?.as_deref().map(|p| &p[offset])
    }

    /// Returns a mutable reference to the slot at `index`, allocating its
    /// backing page (filled with `T::default()`) if necessary.
    pub(crate) fn get_or_insert_mut(&mut self, index: usize) -> &mut T {
        let (page, offset) = self.split(index);
        if page >= self.pages.len() {
            self.pages.resize_with(page + 1, || None);
        }
        let slot = &mut self.pages[page];
        if slot.is_none() {
            *slot = Some(vec![T::default(); self.page_size].into_boxed_slice());
        }
        &mut slot.as_mut().unwrap()[offset]
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (page, offset) = self.split(index);
        self.pages.get_mut(page)?.as_deref_mut().map(|p| &mut p[offset])
    }

    pub(crate) fn page_size(&self) -> usize {
        self.page_size
    }

    pub(crate) fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn page(&self, index: usize) -> Option<&[T]> {
        self.pages.get(index).and_then(|p| p.as_deref())
    }

    pub(crate) fn page_mut(&mut self, index: usize) -> Option<&mut [T]> {
        self.pages.get_mut(index).and_then(|p| p.as_deref_mut())
    }

    pub(crate) fn clear(&mut self) {
        self.pages.clear();
    }
}
