//! Cache key contract

/// An entity that knows the key it is stored under.
///
/// Keys are derived purely from the entity's identifying fields, so two
/// values describing the same entity always land on the same key.
pub trait Cacheable {
    /// Key this value is stored under
    fn cache_key(&self) -> String;
}
