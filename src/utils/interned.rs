/// Reference into an interning arena. Two handles are equal iff they point at the same
/// arena slot, so equality is a pointer comparison rather than a structural one.
#[repr(transparent)]
pub struct Interned<'a, T: 'a + ?Sized>(pub &'a T);
impl<'a, T: 'a + ?Sized> Clone for Interned<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, T: 'a + ?Sized> Copy for Interned<'a, T> {}
impl<'a, T: 'a + ?Sized> core::cmp::PartialEq for Interned<'a, T> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.0, other.0)
    }
}
impl<'a, T: 'a + ?Sized> core::cmp::Eq for Interned<'a, T> {}
impl<'a, T: 'a + ?Sized> core::hash::Hash for Interned<'a, T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.0 as *const T).hash(state)
    }
}
impl<'a, T: 'a + ?Sized> core::ops::Deref for Interned<'a, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        self.0
    }
}
impl<'a, T: 'a + ?Sized + core::fmt::Debug> core::fmt::Debug for Interned<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <T as core::fmt::Debug>::fmt(self.0, f)
    }
}
impl<'a, T: 'a + ?Sized + core::fmt::Display> core::fmt::Display for Interned<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <T as core::fmt::Display>::fmt(self.0, f)
    }
}
