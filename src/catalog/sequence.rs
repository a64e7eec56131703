/// Sequential id source for one tier of one crawl invocation
///
/// Ids start at zero and are only drawn for records that are accepted into
/// the tier, so an exported tier always carries the ids `0..len`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    /// Creates a sequence starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id and advances the sequence
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}
