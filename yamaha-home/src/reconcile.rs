//! Create-or-reuse decisions for accessory descriptors

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};
use yamaha_client::ReceiverControl;

use crate::accessory::{Accessory, AccessoryContext, AccessoryDescriptor, Binding};
use crate::identity::AccessoryId;

/// Result of reconciling one descriptor
#[derive(Debug, Clone)]
pub enum Reconciled {
    /// No persisted accessory had this id
    Created(Accessory),
    /// A persisted accessory was rebound to the current device handle
    Reused(Accessory),
}

impl Reconciled {
    pub fn accessory(&self) -> &Accessory {
        match self {
            Reconciled::Created(accessory) | Reconciled::Reused(accessory) => accessory,
        }
    }

    pub fn into_accessory(self) -> Accessory {
        match self {
            Reconciled::Created(accessory) | Reconciled::Reused(accessory) => accessory,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Reconciled::Created(_))
    }
}

/// Reuse the known accessory with the descriptor's id, or build a new one.
///
/// A reused accessory keeps its id, display name and host state; only its
/// binding is replaced. The function has no side effects, so calling it
/// again with the same inputs gives the same decision.
pub fn reconcile(
    known: &HashMap<AccessoryId, Accessory>,
    desired: &AccessoryDescriptor,
    device: Arc<dyn ReceiverControl>,
) -> Reconciled {
    let id = desired.id();
    let binding = Binding::new(device, desired.kind.clone());

    match known.get(&id) {
        Some(existing) => {
            let mut accessory = existing.clone();
            accessory.context.binding = Some(binding);
            Reconciled::Reused(accessory)
        }
        None => Reconciled::Created(Accessory {
            id,
            display_name: desired.name.clone(),
            context: AccessoryContext {
                host_state: serde_json::Value::Null,
                binding: Some(binding),
            },
        }),
    }
}

/// Reconciles batches within one discovery run
#[derive(Debug, Default)]
pub struct Reconciler {
    known: HashMap<AccessoryId, Accessory>,
    produced: HashSet<AccessoryId>,
}

impl Reconciler {
    /// Start a run against the accessories the host persisted
    pub fn new(known: impl IntoIterator<Item = Accessory>) -> Self {
        Self {
            known: known.into_iter().map(|a| (a.id, a)).collect(),
            produced: HashSet::new(),
        }
    }

    /// Reconcile every descriptor of one device.
    ///
    /// Ids already produced in this run are skipped, so an accessory never
    /// appears twice in the result set.
    pub fn reconcile_batch(
        &mut self,
        descriptors: &[AccessoryDescriptor],
        device: &Arc<dyn ReceiverControl>,
    ) -> Vec<Reconciled> {
        let mut batch = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let id = descriptor.id();
            if !self.produced.insert(id) {
                warn!(name = %descriptor.name, id = %id, "Accessory already produced in this run");
                continue;
            }

            let result = reconcile(&self.known, descriptor, Arc::clone(device));
            debug!(
                name = %result.accessory().display_name,
                id = %id,
                created = result.is_created(),
                "Reconciled accessory"
            );
            batch.push(result);
        }

        batch
    }

    /// Number of accessories produced so far
    pub fn produced(&self) -> usize {
        self.produced.len()
    }
}
