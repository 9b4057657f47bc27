//! The unit of work flowing through the pipeline

/// One decoded test payload plus metadata.
///
/// The same heap object is recycled across many logical ammo items via the
/// [`AmmoPool`](crate::pool::AmmoPool). The provider's decode loop writes a
/// fresh payload and tag into a pooled instance with [`reset`](Ammo::reset),
/// exactly one worker owns the item between acquire and release, and the
/// payload reference is cleared before the object goes back to the pool so
/// a later reuse can never observe stale data.
///
/// Identifiers are deliberately not assigned at reset time: they are stamped
/// at acquire, so they reflect the actual hand-off order to workers even when
/// several items sit buffered in the dispatch channel.
#[derive(Debug)]
pub struct Ammo<P> {
    id: u64,
    tag: String,
    payload: Option<P>,
}

impl<P> Default for Ammo<P> {
    fn default() -> Self {
        Self {
            id: 0,
            tag: String::new(),
            payload: None,
        }
    }
}

impl<P> Ammo<P> {
    /// Identifier stamped at hand-off time.
    ///
    /// Strictly increasing and unique across the provider's lifetime; `0`
    /// until the item has been acquired for the first time.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Label used for case selection and reporting.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether a payload is currently loaded into this slot.
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Borrow the payload, if loaded.
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    /// Write a fresh payload and tag into this slot.
    pub fn reset(&mut self, payload: P, tag: impl Into<String>) {
        self.payload = Some(payload);
        self.tag = tag.into();
    }

    /// Transfer the payload out for the shot.
    pub fn take_payload(&mut self) -> Option<P> {
        self.payload.take()
    }

    /// Drop the payload reference.
    ///
    /// Run on release, before the object returns to the pool.
    pub fn clear(&mut self) {
        self.payload = None;
    }

    pub(crate) fn stamp(&mut self, id: u64) {
        self.id = id;
    }
}
