use crate::error::Result;
use crate::interop::cow::{CopyOnWrite, CopyableHandle, ReferenceConvertible};
use crate::interop::handle::Handle;
use crate::interop::string;
use crate::sys::toolbox::*;
use crate::{unsafe_block, unsafe_fn};
use libc::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;

/**
A list of strings stored in a native `bctbx_list_t`.

Copies share the native list until one of them is modified.
 */
#[derive(Clone)]
pub struct StringList {
    internal: CopyOnWrite<Reference>,
}

/// Owns the list nodes and the C strings they point to.
#[doc(hidden)]
pub struct Reference {
    head: *mut bctbx_list_t,
}

impl Handle for Reference {
    type Raw = bctbx_list_t;

    fn as_ptr(&self) -> *mut bctbx_list_t {
        self.head
    }
}

impl CopyableHandle for Reference {
    fn duplicate(&self) -> Option<Self> {
        let head = unsafe_block!("We own the list and its strings" => {
            bctbx_list_copy_with_data(self.head, Some(bctbx_strdup_data))
        });

        Some(Reference { head })
    }
}

impl Drop for Reference {
    fn drop(&mut self) {
        unsafe_block!("The nodes and the strings were allocated for this list alone" => {
            bctbx_list_free_with_data(self.head, Some(bctbx_free));
        })
    }
}

impl ReferenceConvertible for StringList {
    type Reference = Reference;

    fn internal_reference(&self) -> &CopyOnWrite<Reference> {
        &self.internal
    }

    fn internal_reference_mut(&mut self) -> &mut CopyOnWrite<Reference> {
        &mut self.internal
    }

    fn from_internal_reference(internal: CopyOnWrite<Reference>) -> Self {
        StringList { internal }
    }
}

impl StringList {
    pub fn new() -> Self {
        StringList {
            internal: CopyOnWrite::new(Reference { head: ptr::null_mut() }),
        }
    }

    pub fn from_strings<I>(values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut list = StringList::new();

        for value in values {
            list.push(value.as_ref())?;
        }

        Ok(list)
    }

    pub fn push(&mut self, value: &str) -> Result<()> {
        let value = string::to_c_string(value)?;

        let reference = self.internal.reference_mut();
        reference.head = unsafe_block!("The list is ours and the string is a valid C string" => {
            bctbx_list_append(reference.head, bctbx_strdup(value.as_ptr()) as *mut c_void)
        });

        Ok(())
    }

    /// Append copies of all of `other`'s strings.
    pub fn append(&mut self, other: &StringList) {
        if other.is_empty() {
            return;
        }

        let copied = unsafe_block!("`other` owns its list, we copy the strings" => {
            bctbx_list_copy_with_data(other.internal.as_ptr(), Some(bctbx_strdup_data))
        });

        let reference = self.internal.reference_mut();
        reference.head = unsafe_block!("Both lists are ours" => bctbx_list_concat(reference.head, copied));
    }

    pub fn len(&self) -> usize {
        unsafe_block!("The list is live" => bctbx_list_size(self.internal.as_ptr()))
    }

    pub fn is_empty(&self) -> bool {
        self.internal.as_ptr().is_null()
    }

    pub fn get(&self, index: usize) -> Option<String> {
        let index = libc::c_int::try_from(index).ok()?;

        unsafe_block!("The list's data are C strings it owns" => {
            string::from_borrowed(bctbx_list_nth_data(self.internal.as_ptr(), index) as *const _)
        })
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            node: self.internal.as_ptr(),
            _marker: PhantomData,
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().collect()
    }
}

impl Default for StringList {
    fn default() -> Self {
        StringList::new()
    }
}

impl PartialEq for StringList {
    fn eq(&self, other: &StringList) -> bool {
        CopyOnWrite::ptr_eq(&self.internal, &other.internal) || self.iter().eq(other.iter())
    }
}

impl fmt::Debug for StringList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for StringList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl<'a> IntoIterator for &'a StringList {
    type Item = String;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/**
An iterator over copies of a list's strings.
 */
pub struct Iter<'a> {
    node: *const bctbx_list_t,
    _marker: PhantomData<&'a StringList>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.node.is_null() {
            return None;
        }

        unsafe_block!("The list outlives the iterator and can't change while it's borrowed" => {
            let value = string::from_borrowed(bctbx_list_get_data(self.node) as *const _);
            self.node = bctbx_list_next(self.node);

            Some(value.unwrap_or_default())
        })
    }
}

unsafe_fn!("`list` must be null or a list whose nodes the caller owns and whose strings are live" =>
/// Copy the strings out of a list of borrowed strings, then free the nodes only.
pub(crate) fn take_borrowed_strings(list: *mut bctbx_list_t) -> Vec<String> {
    let mut values = Vec::new();
    let mut node = list;

    while !node.is_null() {
        values.extend(string::from_borrowed(bctbx_list_get_data(node) as *const _));
        node = bctbx_list_next(node);
    }

    bctbx_list_free(list);

    values
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read() {
        let mut list = StringList::new();
        assert!(list.is_empty());

        list.push("a").unwrap();
        list.push("b").unwrap();

        assert_eq!(2, list.len());
        assert_eq!(Some("b".to_owned()), list.get(1));
        assert_eq!(None, list.get(2));
        assert_eq!(vec!["a", "b"], list.to_vec());
        assert_eq!("[\"a\", \"b\"]", list.to_string());
    }

    #[test]
    fn copies_share_until_push() {
        let original = StringList::from_strings(&["a", "b"]).unwrap();
        let unmutated = original.clone();
        let mut mutated = original.clone();

        assert!(CopyOnWrite::ptr_eq(original.internal_reference(), mutated.internal_reference()));

        mutated.push("c").unwrap();

        assert!(!CopyOnWrite::ptr_eq(original.internal_reference(), mutated.internal_reference()));
        assert!(CopyOnWrite::ptr_eq(original.internal_reference(), unmutated.internal_reference()));
        assert_eq!(vec!["a", "b"], original.to_vec());
        assert_eq!(vec!["a", "b", "c"], mutated.to_vec());
    }

    #[test]
    fn append_copies_strings() {
        let mut first = StringList::from_strings(&["a"]).unwrap();
        let second = StringList::from_strings(&["b", "c"]).unwrap();

        first.append(&second);
        drop(second);

        assert_eq!(vec!["a", "b", "c"], first.to_vec());
    }

    #[test]
    fn equality_is_by_content() {
        let a = StringList::from_strings(&["x"]).unwrap();
        let b = StringList::from_strings(vec!["x".to_owned()]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, StringList::new());
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(StringList::from_strings(&["a\0b"]).is_err());
    }

    #[test]
    fn borrowed_strings_are_copied() {
        let owner = StringList::from_strings(&["a", "b"]).unwrap();

        let list = unsafe_block!("The strings belong to `owner`" => {
            bctbx_list_copy(owner.internal_reference().as_ptr())
        });

        assert_eq!(vec!["a", "b"], unsafe { take_borrowed_strings(list) });
        assert_eq!(vec!["a", "b"], owner.to_vec());
    }
}
