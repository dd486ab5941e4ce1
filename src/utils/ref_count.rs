use std::fmt;
use std::ptr::NonNull;

/// An object that manages its own lifetime through an embedded reference
/// count, COM style.
///
/// # Safety
///
/// Implementors must keep the object alive while the count is non-zero and
/// may free it when [`RefCounted::release`] brings the count to zero.
pub unsafe trait RefCounted {
    /// Adds a reference and returns the new count.
    fn add_ref(&self) -> u32;

    /// Drops a reference and returns the new count.
    ///
    /// Takes a raw pointer rather than `&self` because the last release frees
    /// the object while the call is still running.
    ///
    /// # Safety
    ///
    /// `this` must point to a live object and the caller must own the
    /// reference being released; once this returns zero `this` is dangling.
    unsafe fn release(this: NonNull<Self>) -> u32;
}

/// Owning pointer to a [`RefCounted`] native object.
///
/// Holds exactly one reference: cloning adds one, dropping releases one.
/// The count is not atomic, so the pointer stays on the thread that made it.
pub struct RefCountPtr<T: RefCounted> {
    ptr: Option<NonNull<T>>,
}

impl<T: RefCounted> RefCountPtr<T> {
    pub const fn null() -> Self {
        Self { ptr: None }
    }

    /// Wraps a raw pointer handed out by a native API.
    ///
    /// With `add_ref == false` the pointer's existing reference is adopted,
    /// which is what creation calls return.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live object, and when adopting, the
    /// caller must actually own the reference.
    pub unsafe fn from_raw(ptr: *mut T, add_ref: bool) -> Self {
        let ptr = NonNull::new(ptr);
        if let (Some(ptr), true) = (ptr, add_ref) {
            ptr.as_ref().add_ref();
        }
        Self { ptr }
    }

    pub fn is_valid(&self) -> bool {
        self.ptr.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        // SAFETY: we hold a reference, so the object is alive while `self` is.
        self.ptr.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr.map_or(std::ptr::null_mut(), NonNull::as_ptr)
    }

    /// Releases the held reference, leaving the pointer null.
    pub fn reset(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: the reference being released is the one this pointer owned.
            unsafe {
                T::release(ptr);
            }
        }
    }

    /// Gives up ownership of the reference without releasing it.
    pub fn detach(mut self) -> *mut T {
        self.ptr.take().map_or(std::ptr::null_mut(), NonNull::as_ptr)
    }
}

impl<T: RefCounted> Default for RefCountPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: RefCounted> Clone for RefCountPtr<T> {
    fn clone(&self) -> Self {
        if let Some(object) = self.get() {
            object.add_ref();
        }
        Self { ptr: self.ptr }
    }
}

impl<T: RefCounted> Drop for RefCountPtr<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: RefCounted> PartialEq for RefCountPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T: RefCounted> Eq for RefCountPtr<T> {}

impl<T: RefCounted> fmt::Debug for RefCountPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefCountPtr").field(&self.as_ptr()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted {
        refs: Cell<u32>,
        freed: Rc<Cell<bool>>,
    }

    unsafe impl RefCounted for Counted {
        fn add_ref(&self) -> u32 {
            self.refs.set(self.refs.get() + 1);
            self.refs.get()
        }

        unsafe fn release(this: NonNull<Self>) -> u32 {
            let refs = {
                let object = this.as_ref();
                let refs = object.refs.get() - 1;
                object.refs.set(refs);
                if refs == 0 {
                    object.freed.set(true);
                }
                refs
            };
            if refs == 0 {
                drop(Box::from_raw(this.as_ptr()));
            }
            refs
        }
    }

    fn make() -> (RefCountPtr<Counted>, Rc<Cell<bool>>) {
        let freed = Rc::new(Cell::new(false));
        let raw = Box::into_raw(Box::new(Counted {
            refs: Cell::new(1),
            freed: freed.clone(),
        }));
        (unsafe { RefCountPtr::from_raw(raw, false) }, freed)
    }

    #[test]
    fn drop_releases_the_last_reference() {
        let (ptr, freed) = make();
        assert!(ptr.is_valid());
        assert_eq!(ptr.get().unwrap().refs.get(), 1);
        drop(ptr);
        assert!(freed.get());
    }

    #[test]
    fn clone_adds_a_reference() {
        let (ptr, freed) = make();
        let other = ptr.clone();
        assert_eq!(ptr, other);
        assert_eq!(ptr.get().unwrap().refs.get(), 2);

        drop(ptr);
        assert!(!freed.get());
        assert_eq!(other.get().unwrap().refs.get(), 1);
        drop(other);
        assert!(freed.get());
    }

    #[test]
    fn from_raw_with_add_ref_shares_ownership() {
        let (ptr, freed) = make();
        let shared = unsafe { RefCountPtr::from_raw(ptr.as_ptr(), true) };
        assert_eq!(shared.get().unwrap().refs.get(), 2);
        drop(shared);
        drop(ptr);
        assert!(freed.get());
    }

    #[test]
    fn reset_and_detach() {
        let (mut ptr, freed) = make();
        ptr.reset();
        assert!(!ptr.is_valid());
        assert!(freed.get());
        ptr.reset();

        let (ptr, freed) = make();
        let raw = ptr.detach();
        assert!(!freed.get());
        let adopted = unsafe { RefCountPtr::from_raw(raw, false) };
        drop(adopted);
        assert!(freed.get());
    }

    #[test]
    fn release_counts_down_to_the_free() {
        let (ptr, freed) = make();
        let raw = NonNull::new(ptr.detach()).unwrap();
        unsafe {
            raw.as_ref().add_ref();
            assert_eq!(Counted::release(raw), 1);
            assert!(!freed.get());
            assert_eq!(Counted::release(raw), 0);
        }
        assert!(freed.get());
    }

    #[test]
    fn null_pointer_is_inert() {
        let ptr = RefCountPtr::<Counted>::default();
        assert!(!ptr.is_valid());
        assert!(ptr.get().is_none());
        assert!(ptr.as_ptr().is_null());
        let copy = ptr.clone();
        assert_eq!(ptr, copy);
    }
}
