//! Detachable per-owner state
//!
//! An [`Aspect`] names a bundle of state and properties that an owner (such as
//! a [`ShapeFrame`](super::ShapeFrame)) can carry without knowing its type.
//! Owners keep their aspects in an [`AspectTable`] keyed by [`Aspect::TAG`].
//! Detaching hands the whole [`EmbeddedAspect`] back to the caller, so the
//! state survives being moved to a different owner.

use std::any::Any;
use std::collections::HashMap;

/// Capability: a type that can be attached to an owner as embedded state
pub trait Aspect: 'static + Send + Sync {
    /// Mutable runtime state
    type State: Clone + Default + Send + Sync + 'static;

    /// Configuration-like properties
    type Properties: Clone + Default + Send + Sync + 'static;

    /// Registration tag, unique per aspect type
    const TAG: &'static str;
}

/// State and properties of one aspect, held by value
pub struct EmbeddedAspect<A: Aspect> {
    /// Runtime state
    pub state: A::State,
    /// Properties
    pub properties: A::Properties,
}

impl<A: Aspect> EmbeddedAspect<A> {
    /// Bundle state and properties
    pub fn new(state: A::State, properties: A::Properties) -> Self {
        Self { state, properties }
    }
}

// Manual impls: derives would demand the marker type itself be Default/Clone
impl<A: Aspect> Default for EmbeddedAspect<A> {
    fn default() -> Self {
        Self::new(A::State::default(), A::Properties::default())
    }
}

impl<A: Aspect> Clone for EmbeddedAspect<A> {
    fn clone(&self) -> Self {
        Self::new(self.state.clone(), self.properties.clone())
    }
}

impl<A: Aspect> std::fmt::Debug for EmbeddedAspect<A>
where
    A::State: std::fmt::Debug,
    A::Properties: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedAspect")
            .field("tag", &A::TAG)
            .field("state", &self.state)
            .field("properties", &self.properties)
            .finish()
    }
}

/// Runtime registration table: aspect tag to type-erased aspect blob
#[derive(Default)]
pub struct AspectTable {
    entries: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl AspectTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an aspect, returning whatever was attached under the same tag
    pub fn attach<A: Aspect>(&mut self, aspect: EmbeddedAspect<A>) -> Option<EmbeddedAspect<A>> {
        let previous = self.entries.insert(A::TAG, Box::new(aspect));
        previous.and_then(|blob| match blob.downcast::<EmbeddedAspect<A>>() {
            Ok(previous) => Some(*previous),
            Err(_) => {
                log::warn!("aspect tag '{}' was registered by a different type; replaced", A::TAG);
                None
            }
        })
    }

    /// Attach an aspect with default state and properties if none is attached
    pub fn ensure<A: Aspect>(&mut self) -> &mut EmbeddedAspect<A> {
        if self.get::<A>().is_none() {
            self.attach(EmbeddedAspect::<A>::default());
        }
        self.entries
            .get_mut(A::TAG)
            .and_then(|blob| blob.downcast_mut::<EmbeddedAspect<A>>())
            .unwrap_or_else(|| unreachable!("aspect '{}' attached above", A::TAG))
    }

    /// Remove an aspect and hand its blob back
    pub fn detach<A: Aspect>(&mut self) -> Option<EmbeddedAspect<A>> {
        if self.get::<A>().is_none() {
            return None;
        }
        self.entries
            .remove(A::TAG)
            .and_then(|blob| blob.downcast::<EmbeddedAspect<A>>().ok())
            .map(|aspect| *aspect)
    }

    /// Borrow an attached aspect
    pub fn get<A: Aspect>(&self) -> Option<&EmbeddedAspect<A>> {
        self.entries.get(A::TAG)?.downcast_ref()
    }

    /// Mutably borrow an attached aspect
    pub fn get_mut<A: Aspect>(&mut self) -> Option<&mut EmbeddedAspect<A>> {
        self.entries.get_mut(A::TAG)?.downcast_mut()
    }

    /// Current state of an attached aspect
    pub fn state<A: Aspect>(&self) -> Option<&A::State> {
        self.get::<A>().map(|aspect| &aspect.state)
    }

    /// Replace the state of an attached aspect; false if not attached
    pub fn set_state<A: Aspect>(&mut self, state: A::State) -> bool {
        match self.get_mut::<A>() {
            Some(aspect) => {
                aspect.state = state;
                true
            }
            None => false,
        }
    }

    /// Properties of an attached aspect
    pub fn properties<A: Aspect>(&self) -> Option<&A::Properties> {
        self.get::<A>().map(|aspect| &aspect.properties)
    }

    /// Replace the properties of an attached aspect; false if not attached
    pub fn set_properties<A: Aspect>(&mut self, properties: A::Properties) -> bool {
        match self.get_mut::<A>() {
            Some(aspect) => {
                aspect.properties = properties;
                true
            }
            None => false,
        }
    }

    /// Whether an aspect of this type is attached
    pub fn has<A: Aspect>(&self) -> bool {
        self.get::<A>().is_some()
    }

    /// Tags of all attached aspects
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of attached aspects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is attached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for AspectTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}
