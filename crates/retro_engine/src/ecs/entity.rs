//! Entity implementation

slotmap::new_key_type! {
    /// Entity identifier
    ///
    /// An index plus a generation counter. Once an entity is destroyed its
    /// slot may be reused, but the old identifier keeps its stale generation
    /// and is rejected by every lookup.
    pub struct Entity;
}
