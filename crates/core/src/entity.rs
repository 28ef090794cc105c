//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Records the decision core borrows (accounts, grants, directory bindings)
/// implement this so storage adapters can key them uniformly.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
