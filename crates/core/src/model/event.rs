//! The model event bus: `booting`/`booted` fire once per
//! class, the rest once per instance operation. Returning `false` from any
//! `*ing` handler cancels the operation.

use crate::builder::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Booting,
    Booted,
    Hydrating,
    Hydrated,
    Creating,
    Created,
    Updating,
    Updated,
    Saving,
    Saved,
    Deleting,
    Deleted,
}

impl Event {
    /// Whether returning `false` from a handler for this event cancels the
    /// operation in progress — only the `*ing` events are cancelable.
    #[must_use]
    pub fn is_cancelable(self) -> bool {
        matches!(
            self,
            Event::Creating | Event::Updating | Event::Saving | Event::Deleting
        )
    }
}

/// One method per event name. Observers register one method per event
/// name; every method defaults to a no-op that allows the operation to
/// proceed.
pub trait Observer: Send + Sync {
    fn booting(&self) {}
    fn booted(&self) {}
    fn hydrating(&self, _attributes: &Row) {}
    fn hydrated(&self, _attributes: &Row) {}
    fn creating(&self, _attributes: &Row) -> bool {
        true
    }
    fn created(&self, _attributes: &Row) {}
    fn updating(&self, _attributes: &Row) -> bool {
        true
    }
    fn updated(&self, _attributes: &Row) {}
    fn saving(&self, _attributes: &Row) -> bool {
        true
    }
    fn saved(&self, _attributes: &Row) {}
    fn deleting(&self, _attributes: &Row) -> bool {
        true
    }
    fn deleted(&self, _attributes: &Row) {}
}

/// Dispatches a cancelable `*ing` event to every registered observer,
/// short-circuiting (and returning `false`) on the first veto.
#[must_use]
pub fn dispatch_cancelable(observers: &[Box<dyn Observer>], event: Event, attributes: &Row) -> bool {
    for observer in observers {
        let allowed = match event {
            Event::Creating => observer.creating(attributes),
            Event::Updating => observer.updating(attributes),
            Event::Saving => observer.saving(attributes),
            Event::Deleting => observer.deleting(attributes),
            _ => true,
        };
        if !allowed {
            return false;
        }
    }
    true
}

pub fn dispatch(observers: &[Box<dyn Observer>], event: Event, attributes: &Row) {
    for observer in observers {
        match event {
            Event::Booting => observer.booting(),
            Event::Booted => observer.booted(),
            Event::Hydrating => observer.hydrating(attributes),
            Event::Hydrated => observer.hydrated(attributes),
            Event::Created => observer.created(attributes),
            Event::Updated => observer.updated(attributes),
            Event::Saved => observer.saved(attributes),
            Event::Deleted => observer.deleted(attributes),
            Event::Creating | Event::Updating | Event::Saving | Event::Deleting => {
                dispatch_cancelable(std::slice::from_ref(observer), event, attributes);
            }
        }
    }
}
