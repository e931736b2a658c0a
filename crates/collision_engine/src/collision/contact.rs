//! Contacts and detection results

use crate::foundation::collections::ObjectKey;
use crate::foundation::math::Vec3;

/// One contact point between two collision objects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// World-space contact point
    pub point: Vec3,
    /// Unit normal pointing from object 2 toward object 1
    pub normal: Vec3,
    /// Penetration depth along the normal
    pub penetration_depth: f64,
    /// First object of the pair
    pub object1: ObjectKey,
    /// Second object of the pair
    pub object2: ObjectKey,
    /// Colliding sub-feature of object 1 (triangle index; 0 for primitives)
    pub triangle_id1: usize,
    /// Colliding sub-feature of object 2 (triangle index; 0 for primitives)
    pub triangle_id2: usize,
}

impl Contact {
    /// Whether the contact involves `key` on either side
    pub fn involves(&self, key: ObjectKey) -> bool {
        self.object1 == key || self.object2 == key
    }
}

/// Ordered contacts produced by one detection call
///
/// Owned by the caller and cleared at the start of every detection call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    contacts: Vec<Contact>,
}

impl DetectionResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a contact
    pub fn add_contact(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    /// All contacts in detection order
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Contact at `index`
    pub fn contact(&self, index: usize) -> Option<&Contact> {
        self.contacts.get(index)
    }

    /// Iterate over contacts
    pub fn iter(&self) -> std::slice::Iter<'_, Contact> {
        self.contacts.iter()
    }

    /// Number of contacts
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// True when no contact was found
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// True when at least one contact was found
    pub fn is_collision(&self) -> bool {
        !self.is_empty()
    }

    /// Whether any contact involves both objects
    pub fn in_collision(&self, a: ObjectKey, b: ObjectKey) -> bool {
        self.contacts.iter().any(|c| c.involves(a) && c.involves(b))
    }

    /// Drop all contacts
    pub fn clear(&mut self) {
        self.contacts.clear();
    }
}

impl<'a> IntoIterator for &'a DetectionResult {
    type Item = &'a Contact;
    type IntoIter = std::slice::Iter<'a, Contact>;

    fn into_iter(self) -> Self::IntoIter {
        self.contacts.iter()
    }
}
