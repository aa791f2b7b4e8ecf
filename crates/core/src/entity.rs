//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Returns the first identifier that occurs more than once in `entities`.
pub fn first_duplicate_id<'a, E: Entity + 'a>(
    entities: impl IntoIterator<Item = &'a E>,
) -> Option<&'a E::Id> {
    let mut seen = std::collections::HashSet::new();
    entities.into_iter().map(Entity::id).find(|id| !seen.insert(*id))
}
