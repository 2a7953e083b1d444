/*!
Value semantics over native reference types.

A value type holds its native reference in a `CopyOnWrite` box. Copies of the
value share the box, and reads never copy anything. The first mutable access
through a box that's shared (or whose native object may be aliased somewhere
the bindings can't see) clones the native object and swaps the clone in.
*/

use crate::interop::handle::{Handle, Managed, RefCounted};
use crate::unsafe_fn;
use std::fmt;
use std::rc::Rc;

/**
Where the native object behind a value came from.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Freshly allocated for this value, nobody else can see it.
    Owned,
    /// Cloned from another object, which severed any alias.
    Copied,
    /// A live pointer into another object's state.
    ///
    /// The native owner may still read or mutate the object, so the first
    /// mutation always copies, even if the box looks uniquely referenced.
    ExternallyRetained,
}

/**
A native reference type that can be duplicated.
 */
pub trait CopyableHandle: Sized {
    /// Clone the native object into a new, independent one.
    ///
    /// Returns `None` only if the native clone fails.
    fn duplicate(&self) -> Option<Self>;
}

/**
A reference type whose native object is held by a single `Managed` reference.
 */
pub trait ManagedReference: CopyableHandle {
    type Raw: RefCounted;

    fn from_managed(managed: Managed<Self::Raw>) -> Self;

    fn managed(&self) -> &Managed<Self::Raw>;
}

/**
A value type backed by a native reference type.
 */
pub trait ReferenceConvertible: Sized {
    type Reference: CopyableHandle;

    fn internal_reference(&self) -> &CopyOnWrite<Self::Reference>;

    fn internal_reference_mut(&mut self) -> &mut CopyOnWrite<Self::Reference>;

    fn from_internal_reference(reference: CopyOnWrite<Self::Reference>) -> Self;

    fn from_reference(reference: Self::Reference, provenance: Provenance) -> Self {
        Self::from_internal_reference(CopyOnWrite::with_provenance(reference, provenance))
    }

    /// An independent value with its own native object.
    fn detached(&self) -> Self {
        Self::from_internal_reference(self.internal_reference().detached())
    }
}

unsafe_fn!("`ptr` must be null or point to a live object owned by the object it was read from" =>
/// Wrap a pointer returned by a getter that hands out another object's live state.
///
/// No copy happens now, the value may never be mutated. Instead it's tagged
/// as externally retained so its first mutation copies.
pub fn retained_value<V>(ptr: *mut <V::Reference as ManagedReference>::Raw) -> Option<V>
where
    V: ReferenceConvertible,
    V::Reference: ManagedReference,
{
    let managed = Managed::from_nullable(ptr)?;
    let reference = V::Reference::from_managed(managed);

    Some(V::from_reference(reference, Provenance::ExternallyRetained))
});

unsafe_fn!("`ptr` must be null or point to a live object nobody else references" =>
/// Wrap a pointer to an object that was just allocated for the caller.
pub fn owned_value<V>(ptr: *mut <V::Reference as ManagedReference>::Raw) -> Option<V>
where
    V: ReferenceConvertible,
    V::Reference: ManagedReference,
{
    let managed = Managed::from_nullable(ptr)?;
    let reference = V::Reference::from_managed(managed);

    Some(V::from_reference(reference, Provenance::Owned))
});

/**
The copy-on-write box.
 */
pub struct CopyOnWrite<R> {
    boxed: Rc<R>,
    provenance: Provenance,
}

impl<R: CopyableHandle> CopyOnWrite<R> {
    pub fn new(reference: R) -> Self {
        CopyOnWrite::with_provenance(reference, Provenance::Owned)
    }

    pub fn with_provenance(reference: R, provenance: Provenance) -> Self {
        CopyOnWrite {
            boxed: Rc::new(reference),
            provenance,
        }
    }

    /// The reference for read-only operations. Never copies.
    pub fn reference(&self) -> &R {
        &self.boxed
    }

    /// The reference for mutating operations.
    ///
    /// Copies first if the box is shared with another value or the native
    /// object is externally retained.
    pub fn reference_mut(&mut self) -> &mut R {
        if self.provenance == Provenance::ExternallyRetained || Rc::get_mut(&mut self.boxed).is_none() {
            self.diverge();
        }

        match Rc::get_mut(&mut self.boxed) {
            Some(reference) => reference,
            None => unreachable!("a freshly diverged box is uniquely referenced"),
        }
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Whether this is the only value using the box.
    ///
    /// This says nothing about native aliases, see `Provenance::ExternallyRetained`.
    pub fn is_uniquely_referenced(&self) -> bool {
        Rc::strong_count(&self.boxed) == 1
    }

    /// Whether two values share the same box.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.boxed, &b.boxed)
    }

    /// Another value sharing the box, for handing out state that is still
    /// used elsewhere. Its first mutation copies, like any externally retained value.
    pub fn aliased(&self) -> Self {
        CopyOnWrite {
            boxed: Rc::clone(&self.boxed),
            provenance: Provenance::ExternallyRetained,
        }
    }

    /// A new box around a clone of the native object.
    pub fn detached(&self) -> Self {
        CopyOnWrite::with_provenance(duplicate_or_abort(&self.boxed), Provenance::Copied)
    }

    fn diverge(&mut self) {
        tracing::debug!(
            provenance = ?self.provenance,
            shared = !self.is_uniquely_referenced(),
            "copying native reference before mutation"
        );

        self.boxed = Rc::new(duplicate_or_abort(&self.boxed));
        self.provenance = Provenance::Copied;
    }
}

fn duplicate_or_abort<R: CopyableHandle>(reference: &R) -> R {
    match reference.duplicate() {
        Some(copy) => copy,
        None => {
            tracing::error!("native clone failed during a copy-on-write divergence");
            panic!("could not duplicate the native reference, value semantics can't be preserved")
        }
    }
}

impl<R: Handle + CopyableHandle> CopyOnWrite<R> {
    /// The raw pointer for read-only native calls.
    pub fn as_ptr(&self) -> *mut R::Raw {
        self.boxed.as_ptr()
    }

    /// The raw pointer for mutating native calls, after any needed copy.
    pub fn as_mut_ptr(&mut self) -> *mut R::Raw {
        self.reference_mut().as_ptr()
    }
}

impl<R> Clone for CopyOnWrite<R> {
    fn clone(&self) -> Self {
        CopyOnWrite {
            boxed: Rc::clone(&self.boxed),
            provenance: self.provenance,
        }
    }
}

impl<R> fmt::Debug for CopyOnWrite<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CopyOnWrite")
            .field("box", &Rc::as_ptr(&self.boxed))
            .field("shared", &(Rc::strong_count(&self.boxed) > 1))
            .field("provenance", &self.provenance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Text {
        value: String,
        clones: Rc<Cell<usize>>,
        fail: bool,
    }

    impl Text {
        fn new(value: &str) -> (Self, Rc<Cell<usize>>) {
            let clones = Rc::new(Cell::new(0));

            let text = Text {
                value: value.to_owned(),
                clones: Rc::clone(&clones),
                fail: false,
            };

            (text, clones)
        }
    }

    impl CopyableHandle for Text {
        fn duplicate(&self) -> Option<Self> {
            if self.fail {
                return None;
            }

            self.clones.set(self.clones.get() + 1);

            Some(Text {
                value: self.value.clone(),
                clones: Rc::clone(&self.clones),
                fail: false,
            })
        }
    }

    #[test]
    fn copies_share_until_mutation() {
        let (text, clones) = Text::new("toto");

        let original = CopyOnWrite::new(text);
        let unmutated = original.clone();
        let mut mutated = original.clone();

        assert!(CopyOnWrite::ptr_eq(&original, &unmutated));
        assert!(CopyOnWrite::ptr_eq(&original, &mutated));
        assert_eq!(0, clones.get());

        mutated.reference_mut().value.push_str("@titi");

        assert_eq!(1, clones.get());
        assert!(!CopyOnWrite::ptr_eq(&original, &mutated));
        assert!(CopyOnWrite::ptr_eq(&original, &unmutated));
        assert_eq!("toto", original.reference().value);
        assert_eq!("toto@titi", mutated.reference().value);
        assert_eq!(Provenance::Copied, mutated.provenance());
    }

    #[test]
    fn unique_box_mutates_in_place() {
        let (text, clones) = Text::new("toto");

        let mut value = CopyOnWrite::new(text);
        assert!(value.is_uniquely_referenced());

        value.reference_mut().value.clear();
        value.reference_mut().value.push('x');

        assert_eq!(0, clones.get());
        assert_eq!(Provenance::Owned, value.provenance());
    }

    #[test]
    fn externally_retained_always_copies_first() {
        let (text, clones) = Text::new("toto");

        let mut value = CopyOnWrite::with_provenance(text, Provenance::ExternallyRetained);
        assert!(value.is_uniquely_referenced());

        value.reference_mut().value.push('!');
        assert_eq!(1, clones.get());

        // The alias has been severed, later mutations happen in place.
        value.reference_mut().value.push('!');
        assert_eq!(1, clones.get());
        assert_eq!(Provenance::Copied, value.provenance());
    }

    #[test]
    fn reads_never_copy() {
        let (text, clones) = Text::new("toto");

        let value = CopyOnWrite::with_provenance(text, Provenance::ExternallyRetained);
        let copy = value.clone();

        assert_eq!("toto", copy.reference().value);
        assert_eq!(0, clones.get());
        assert_eq!(Provenance::ExternallyRetained, copy.provenance());
    }

    #[test]
    fn aliased_shares_until_mutation() {
        let (text, clones) = Text::new("toto");

        let registered = CopyOnWrite::new(text);
        let mut alias = registered.aliased();

        assert!(CopyOnWrite::ptr_eq(&registered, &alias));
        assert_eq!(Provenance::ExternallyRetained, alias.provenance());
        assert_eq!(Provenance::Owned, registered.provenance());

        alias.reference_mut().value.push('!');

        assert_eq!(1, clones.get());
        assert_eq!("toto", registered.reference().value);
    }

    #[test]
    fn detached_is_independent() {
        let (text, clones) = Text::new("toto");

        let value = CopyOnWrite::new(text);
        let detached = value.detached();

        assert_eq!(1, clones.get());
        assert!(!CopyOnWrite::ptr_eq(&value, &detached));
        assert_eq!(Provenance::Copied, detached.provenance());
    }

    #[test]
    #[should_panic(expected = "value semantics can't be preserved")]
    fn failed_divergence_is_fatal() {
        let (mut text, _) = Text::new("toto");
        text.fail = true;

        let mut value = CopyOnWrite::new(text);
        let _alias = value.clone();

        value.reference_mut();
    }
}
