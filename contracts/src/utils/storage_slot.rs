//! Helper for reading and writing primitive types to hashed storage slots.
use alloc::{vec, vec::Vec};

use alloy_primitives::{keccak256, Address, B256, U256};
use stylus_sdk::prelude::*;

const SLOT_BYTE_SPACE: u8 = 32;

/// Derives the storage slot for a namespaced `label`, i.e. `keccak256(label)`.
///
/// Evaluated at compile time when used in a `const` item.
///
/// # Arguments
///
/// * `label` - Unique, descriptive name of the field (e.g.
///   `b"stylus.caller.target"`).
#[must_use]
pub const fn namespaced_slot(label: &[u8]) -> B256 {
    B256::new(keccak_const::Keccak256::new().update(label).finalize())
}

/// Derives the storage slot of `key` inside a mapping rooted at `base`.
///
/// Follows the Solidity mapping layout, `keccak256(pad32(key) ++ base)`, with
/// `base` itself being a hashed slot rather than a sequential one.
///
/// # Arguments
///
/// * `key` - Mapping key.
/// * `base` - Base slot of the mapping, see [`namespaced_slot`].
#[must_use]
pub fn mapping_slot(key: Address, base: B256) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[12..32].copy_from_slice(key.as_slice());
    preimage[32..].copy_from_slice(base.as_slice());
    keccak256(preimage)
}

/// Helper for reading and writing primitive types to specific storage slots.
///
/// Storage slots are used to keep proxy state out of the way of the contract
/// the proxy forwards to: nothing here is laid out sequentially, so no field
/// declared by a target can land on it.
///
/// The functions in this library return appropriate storage types that can
/// be used to read or write the value.
///
/// Example usage:
///
/// ```rust,ignore
/// use stylus_caller::utils::storage_slot::{namespaced_slot, StorageSlot};
/// use stylus_sdk::{alloy_primitives::{Address, B256}, prelude::*, storage::StorageAddress};
///
/// const ADMIN_SLOT: B256 = namespaced_slot(b"my.proxy.admin");
///
/// #[storage]
/// #[entrypoint]
/// pub struct Admin {
///     storage_slot: StorageSlot,
/// }
///
/// #[public]
/// impl Admin {
///     fn admin(&self) -> Address {
///         self.storage_slot.get_slot::<StorageAddress>(ADMIN_SLOT).get()
///     }
/// }
/// ```
#[storage]
pub struct StorageSlot;

impl StorageSlot {
    /// Returns a [`StorageType`] located at `slot`.
    ///
    /// The value is right-aligned within the 32-byte word, matching the
    /// Solidity layout of a standalone primitive.
    ///
    /// # Arguments
    ///
    /// * `&self` - Access to the host environment.
    /// * `slot` - The slot to get the value from.
    #[must_use]
    pub fn get_slot<ST: StorageType>(&self, slot: B256) -> ST {
        // SAFETY: Truncation is safe here because ST::SLOT_BYTES is never
        // larger than 32, so the subtraction cannot underflow and the
        // cast is always valid.
        #[allow(clippy::cast_possible_truncation)]
        unsafe {
            ST::new(
                U256::from_be_bytes(slot.0),
                SLOT_BYTE_SPACE - ST::SLOT_BYTES as u8,
                self.__stylus_host.clone(),
            )
        }
    }
}
