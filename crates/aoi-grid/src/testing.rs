//! Recording callbacks for unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Entity, EntityCallback, EntityId, Watcher, WatcherCallback, WatcherId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Note {
    Enter(EntityId),
    Leave(EntityId),
}

/// Records every notification it receives, in order.
#[derive(Default)]
pub(crate) struct Recorder {
    notes: Mutex<Vec<Note>>,
}

impl Recorder {
    /// Drain the recorded notes.
    pub(crate) fn take(&self) -> Vec<Note> {
        core::mem::take(&mut *self.notes.lock())
    }
}

impl<T> EntityCallback<T> for Recorder {
    fn on_entity_enter(&self, peer: &Arc<Entity<T>>) {
        self.notes.lock().push(Note::Enter(peer.id()));
    }

    fn on_entity_leave(&self, peer: &Arc<Entity<T>>) {
        self.notes.lock().push(Note::Leave(peer.id()));
    }
}

impl<T> WatcherCallback<T> for Recorder {
    fn on_watching_enter(&self, entity: &Arc<Entity<T>>) {
        self.notes.lock().push(Note::Enter(entity.id()));
    }

    fn on_watching_leave(&self, entity: &Arc<Entity<T>>) {
        self.notes.lock().push(Note::Leave(entity.id()));
    }
}

pub(crate) fn entity(id: u64) -> (Arc<Entity<()>>, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let entity = Entity::new(EntityId(id), ()).with_callback(recorder.clone());
    (Arc::new(entity), recorder)
}

pub(crate) fn watcher(id: u64) -> (Arc<Watcher<()>>, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let watcher = Watcher::new(WatcherId(id), ()).with_callback(recorder.clone());
    (Arc::new(watcher), recorder)
}

/// Sort notes so peer order does not matter.
pub(crate) fn sorted(mut notes: Vec<Note>) -> Vec<Note> {
    notes.sort_by_key(|note| match *note {
        Note::Enter(id) => (0, id),
        Note::Leave(id) => (1, id),
    });
    notes
}
