//! Scene entity buffer synchronization.
//!
//! Reconciles a CPU-side ordered collection of GPU-layout records against a
//! GPU-visible storage buffer with a fixed element stride. The buffer is
//! released and reallocated only when its shape (element count or stride)
//! no longer matches the collection; contents are re-uploaded on every
//! reconcile, since attribute values change every frame even when the
//! entity set does not.

use std::marker::PhantomData;
use std::fmt;

/// A GPU buffer allocation request that could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferAllocError {
    /// Buffer label for diagnostics.
    pub label: String,
    /// Requested size in bytes.
    pub requested: u64,
    /// The device limit the request exceeded.
    pub limit: u64,
}

impl fmt::Display for BufferAllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buffer '{}': requested {} bytes exceeds device limit {}",
            self.label, self.requested, self.limit
        )
    }
}

impl std::error::Error for BufferAllocError {}

/// Allocation seam between the synchronizer and the GPU.
///
/// The production implementation is [`WgpuHeap`]; tests substitute a
/// counting fake to assert on allocation/upload behavior.
pub trait BufferHeap {
    /// Opaque handle to one live allocation.
    type Handle;

    /// Allocate a storage buffer of exactly `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BufferAllocError`] when the request cannot be satisfied.
    /// Allocation failure is fatal for the frame: the compute kernel cannot
    /// run without its scene buffers.
    fn alloc(&self, label: &str, size: u64) -> Result<Self::Handle, BufferAllocError>;

    /// Release an allocation eagerly.
    fn release(&self, handle: Self::Handle);

    /// Upload `bytes` to the start of the allocation.
    fn upload(&self, handle: &Self::Handle, bytes: &[u8]);
}

/// wgpu-backed heap borrowing the frame's device and queue.
pub struct WgpuHeap<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl<'a> WgpuHeap<'a> {
    /// Heap over the given device and queue.
    #[must_use]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl BufferHeap for WgpuHeap<'_> {
    type Handle = wgpu::Buffer;

    fn alloc(&self, label: &str, size: u64) -> Result<Self::Handle, BufferAllocError> {
        // wgpu's create_buffer has no fallible return; validate against the
        // device limits up front so oversized scenes surface as a hard error
        // instead of a validation panic mid-frame.
        let limits = self.device.limits();
        let limit = u64::from(limits.max_storage_buffer_binding_size)
            .min(limits.max_buffer_size);
        if size > limit {
            return Err(BufferAllocError {
                label: label.to_owned(),
                requested: size,
                limit,
            });
        }
        Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }))
    }

    fn release(&self, handle: Self::Handle) {
        // Free the GPU allocation now rather than whenever the last clone
        // of the handle drops.
        handle.destroy();
    }

    fn upload(&self, handle: &Self::Handle, bytes: &[u8]) {
        self.queue.write_buffer(handle, 0, bytes);
    }
}

/// A GPU-visible array of fixed-stride entity records.
///
/// Owns at most one live allocation plus the shape `(count, stride)` it was
/// allocated for. An allocation is valid for reuse only while both match
/// the current collection; any mismatch forces release-then-reallocate
/// before upload. An empty collection holds no allocation at all — a valid
/// state the kernel handles by disabling the sampling path for that
/// category.
pub struct EntityBuffer<T, H: BufferHeap> {
    handle: Option<H::Handle>,
    count: usize,
    stride: usize,
    label: &'static str,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod, H: BufferHeap> EntityBuffer<T, H> {
    /// Empty buffer with the given debug label. No allocation yet.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            handle: None,
            count: 0,
            stride: size_of::<T>(),
            label,
            _marker: PhantomData,
        }
    }

    /// Match the buffer's shape to `items` and upload their contents.
    ///
    /// Exactly one release/allocate transition happens per shape change;
    /// the upload happens on every call with a non-empty collection.
    /// Returns `true` if the allocation changed (bind groups referencing
    /// the buffer need recreation).
    ///
    /// # Errors
    ///
    /// Propagates [`BufferAllocError`] from the heap. The caller must treat
    /// this as fatal for the frame.
    pub fn reconcile(&mut self, heap: &H, items: &[T]) -> Result<bool, BufferAllocError> {
        let stride = size_of::<T>();
        let mut changed = false;

        if let Some(handle) = self.handle.take() {
            if items.is_empty() || self.count != items.len() || self.stride != stride {
                log::debug!(
                    "{}: shape {}x{} -> {}x{}, releasing",
                    self.label,
                    self.count,
                    self.stride,
                    items.len(),
                    stride
                );
                heap.release(handle);
                self.count = 0;
                changed = true;
            } else {
                self.handle = Some(handle);
            }
        }

        if items.is_empty() {
            return Ok(changed);
        }

        if self.handle.is_none() {
            let size = (items.len() * stride) as u64;
            self.handle = Some(heap.alloc(self.label, size)?);
            self.count = items.len();
            self.stride = stride;
            changed = true;
        }
        if let Some(ref handle) = self.handle {
            heap.upload(handle, bytemuck::cast_slice(items));
        }
        Ok(changed)
    }

    /// Current allocation, if any.
    #[must_use]
    pub fn handle(&self) -> Option<&H::Handle> {
        self.handle.as_ref()
    }

    /// Element count the current allocation was sized for (0 when absent).
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Fixed per-element stride in bytes.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whether no allocation is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Fake heap that counts allocations, releases, and uploads.
    #[derive(Default)]
    struct CountingHeap {
        allocs: RefCell<u32>,
        releases: RefCell<u32>,
        uploads: RefCell<Vec<usize>>,
        next_id: RefCell<u32>,
        fail_alloc: bool,
    }

    impl CountingHeap {
        fn failing() -> Self {
            Self {
                fail_alloc: true,
                ..Self::default()
            }
        }
    }

    impl BufferHeap for CountingHeap {
        type Handle = u32;

        fn alloc(&self, label: &str, size: u64) -> Result<u32, BufferAllocError> {
            if self.fail_alloc {
                return Err(BufferAllocError {
                    label: label.to_owned(),
                    requested: size,
                    limit: 0,
                });
            }
            *self.allocs.borrow_mut() += 1;
            *self.next_id.borrow_mut() += 1;
            Ok(*self.next_id.borrow())
        }

        fn release(&self, _handle: u32) {
            *self.releases.borrow_mut() += 1;
        }

        fn upload(&self, _handle: &u32, bytes: &[u8]) {
            self.uploads.borrow_mut().push(bytes.len());
        }
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Rec {
        v: [f32; 4],
    }

    fn recs(n: usize) -> Vec<Rec> {
        vec![Rec { v: [1.0; 4] }; n]
    }

    #[test]
    fn unchanged_shape_allocates_once_uploads_every_call() {
        let heap = CountingHeap::default();
        let mut buf: EntityBuffer<Rec, _> = EntityBuffer::new("test");
        let items = recs(3);

        assert!(buf.reconcile(&heap, &items).unwrap());
        assert!(!buf.reconcile(&heap, &items).unwrap());

        assert_eq!(*heap.allocs.borrow(), 1);
        assert_eq!(*heap.releases.borrow(), 0);
        assert_eq!(heap.uploads.borrow().len(), 2);
        assert_eq!(buf.count(), 3);
    }

    #[test]
    fn count_change_releases_then_reallocates() {
        let heap = CountingHeap::default();
        let mut buf: EntityBuffer<Rec, _> = EntityBuffer::new("test");

        assert!(buf.reconcile(&heap, &recs(3)).unwrap());
        assert!(buf.reconcile(&heap, &recs(5)).unwrap());

        assert_eq!(*heap.allocs.borrow(), 2);
        assert_eq!(*heap.releases.borrow(), 1);
        assert_eq!(buf.count(), 5);
    }

    #[test]
    fn empty_collection_releases_and_stays_empty() {
        let heap = CountingHeap::default();
        let mut buf: EntityBuffer<Rec, _> = EntityBuffer::new("test");

        let _ = buf.reconcile(&heap, &recs(4)).unwrap();
        assert!(buf.reconcile(&heap, &[]).unwrap());

        assert!(buf.is_empty());
        assert_eq!(buf.count(), 0);
        assert_eq!(*heap.releases.borrow(), 1);

        // No allocation on the next reconcile of an empty collection.
        assert!(!buf.reconcile(&heap, &[]).unwrap());
        assert_eq!(*heap.allocs.borrow(), 1);
    }

    #[test]
    fn upload_size_matches_count_times_stride() {
        let heap = CountingHeap::default();
        let mut buf: EntityBuffer<Rec, _> = EntityBuffer::new("test");
        let _ = buf.reconcile(&heap, &recs(3)).unwrap();
        assert_eq!(
            heap.uploads.borrow()[0],
            3 * size_of::<Rec>()
        );
        assert_eq!(buf.stride(), size_of::<Rec>());
    }

    #[test]
    fn alloc_failure_propagates() {
        let heap = CountingHeap::failing();
        let mut buf: EntityBuffer<Rec, _> = EntityBuffer::new("test");
        assert!(buf.reconcile(&heap, &recs(2)).is_err());
        assert!(buf.is_empty());
    }
}
