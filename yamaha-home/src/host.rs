//! The host side of the bridge
//!
//! The host owns the accessory object model and its persistence. The
//! platform only hands it accessories and status updates through
//! [`HostRegistry`].

use crate::accessory::{Accessory, StatusUpdate};
use crate::identity::AccessoryId;

/// Accessory registry provided by the host
pub trait HostRegistry: Send + Sync {
    /// Register accessories the host has not seen before
    fn register_platform_accessories(&self, accessories: &[Accessory]);

    /// Refresh accessories the host restored from its own persistence
    fn update_platform_accessories(&self, accessories: &[Accessory]);

    /// Remove accessories from the host's persistence
    fn unregister_platform_accessories(&self, accessories: &[Accessory]);

    /// Push characteristic values for one accessory
    fn update_characteristics(&self, id: &AccessoryId, updates: &[StatusUpdate]);

    /// Mark an accessory as not responding
    fn report_unreachable(&self, _id: &AccessoryId, _reason: &str) {}
}
