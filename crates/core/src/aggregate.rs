//! Aggregate contract for event-sourced domain models.

/// A consistency boundary whose state evolves only through its own events.
///
/// - `handle(&self, cmd)` decides which events a command produces and never mutates.
/// - `apply(&mut self, event)` folds one event into state.
///
/// Neither method may perform IO.
pub trait Aggregate {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied so far.
    fn version(&self) -> u64;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Run `handle` and fold the resulting events into `self`.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }
}
