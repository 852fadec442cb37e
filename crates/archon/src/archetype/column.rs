//! Type erased payload columns.
use std::any::Any;

/// A boxed component payload.
pub type Payload = Box<dyn Any + Send + Sync>;

/// One storable component's payloads within an archetype.
///
/// Rows line up with the archetype's entities. A row is `None` when its
/// entity holds the component structurally but no data has been written yet.
#[derive(Default)]
pub struct Column {
    data: Vec<Option<Payload>>,
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("len", &self.data.len())
            .field("filled", &self.data.iter().filter(|p| p.is_some()).count())
            .finish()
    }
}

impl Column {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Payload> {
        self.data.get(row)?.as_ref()
    }

    pub fn get_mut(&mut self, row: usize) -> Option<&mut Payload> {
        self.data.get_mut(row)?.as_mut()
    }

    /// Iterate over every row, written or not.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Payload>> + '_ {
        self.data.iter().map(Option::as_ref)
    }

    pub(crate) fn push(&mut self, payload: Option<Payload>) {
        self.data.push(payload);
    }

    pub(crate) fn swap_remove(&mut self, row: usize) -> Option<Payload> {
        debug_assert!(
            row < self.data.len(),
            "column len {} does not contain row {}",
            self.data.len(),
            row
        );
        self.data.swap_remove(row)
    }

    /// Write the payload at `row`, returning the previous one.
    pub(crate) fn set(&mut self, row: usize, payload: Payload) -> Option<Payload> {
        self.data[row].replace(payload)
    }

    pub(crate) fn take(&mut self, row: usize) -> Option<Payload> {
        self.data.get_mut(row)?.take()
    }
}
