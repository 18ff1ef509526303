//! A [`Caller`] that only lets authorized accounts redirect it or relay
//! through it.
//!
//! Authorization follows an owner/ward model: the account that deploys the
//! contract becomes its owner, and the owner or any existing ward can add or
//! remove wards. Only the owner can hand ownership to another account.
//!
//! Owner and wards are kept at hashed storage slots ([`OWNER_SLOT`],
//! [`WARDS_SLOT`]) next to the target at [`super::TARGET_SLOT`]. Ward entries
//! use the Solidity mapping layout rooted at [`WARDS_SLOT`], see
//! [`mapping_slot`].
//!
//! Every call that does not match a selector of this contract is relayed to
//! the target, so the management functions are exposed under a reserved
//! `authedCaller_` prefix to keep them from shadowing functions of the
//! target. See [`RESERVED_SELECTORS`].
use alloc::{vec, vec::Vec};

use alloy_primitives::{Address, B256};
pub use sol::*;
use stylus_sdk::{
    call::MethodError,
    evm, function_selector, msg,
    prelude::*,
    storage::{StorageAddress, StorageBool},
};

use crate::{
    caller::{self, Caller, CallerPlainTransfer, ICaller, IForward},
    utils::storage_slot::{mapping_slot, namespaced_slot, StorageSlot},
};

#[cfg_attr(coverage_nightly, coverage(off))]
mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// Emitted when ownership gets transferred between accounts.
        ///
        /// * `previous_owner` - Address of the previous owner.
        /// * `new_owner` - Address of the new owner.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event OwnershipTransferred(address indexed previous_owner, address indexed new_owner);
        /// Emitted when `account` becomes a ward.
        ///
        /// * `account` - Account that was added.
        /// * `sender` - Owner or ward that added it.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event WardAdded(address indexed account, address indexed sender);
        /// Emitted when `account` stops being a ward.
        ///
        /// * `account` - Account that was removed.
        /// * `sender` - Owner or ward that removed it.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event WardRemoved(address indexed account, address indexed sender);
    }

    sol! {
        /// The caller account is neither the owner nor a ward.
        ///
        /// * `account` - Account that was found to not be authorized.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error CallerUnauthorizedAccount(address account);
        /// The caller account is not the owner.
        ///
        /// * `account` - Account that was found to not be the owner.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error CallerNotOwner(address account);
    }
}

/// An error that occurred in the implementation of an [`AuthedCaller`]
/// contract.
#[derive(SolidityError, Debug)]
pub enum Error {
    /// The caller account is neither the owner nor a ward.
    UnauthorizedAccount(CallerUnauthorizedAccount),
    /// The caller account is not the owner.
    NotOwner(CallerNotOwner),
    /// A call without calldata tried to transfer value through the caller.
    PlainTransfer(CallerPlainTransfer),
}

impl From<caller::Error> for Error {
    fn from(value: caller::Error) -> Self {
        match value {
            caller::Error::PlainTransfer(e) => Error::PlainTransfer(e),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl MethodError for Error {
    fn encode(self) -> alloc::vec::Vec<u8> {
        self.into()
    }
}

/// Storage slot with the address of the owner.
///
/// This is the keccak-256 hash of `"stylus.caller.owner"`:
/// `0xf214c69565f94474a989698791063531289696deeef40a2959b4545ac3e4f466`.
pub const OWNER_SLOT: B256 = namespaced_slot(b"stylus.caller.owner");

/// Base slot of the ward mapping.
///
/// This is the keccak-256 hash of `"stylus.caller.wards"`:
/// `0x79964f92c56eff2649baf0235dde8aa21fea6a440de9aadbef5716f3131abce4`.
pub const WARDS_SLOT: B256 = namespaced_slot(b"stylus.caller.wards");

/// Selectors of the functions an [`AuthedCaller`] exposes. Calls to the
/// target that use one of these never reach it.
///
/// The deployment-only constructor entry point added by the SDK is not
/// listed.
pub const RESERVED_SELECTORS: [[u8; 4]; 8] = [
    function_selector!("getTarget"),
    function_selector!("setTarget", Address),
    function_selector!("authedCaller_owner"),
    function_selector!("authedCaller_transferOwnership", Address),
    function_selector!("authedCaller_addWard", Address),
    function_selector!("authedCaller_removeWard", Address),
    function_selector!("authedCaller_isWard", Address),
    function_selector!("authedCaller_isAuthorized", Address),
];

/// Returns true if `calldata` starts with one of [`RESERVED_SELECTORS`], i.e.
/// an [`AuthedCaller`] would handle it instead of relaying it.
///
/// # Arguments
///
/// * `calldata` - Calldata meant for the target.
#[must_use]
pub fn is_reserved_selector(calldata: &[u8]) -> bool {
    calldata.get(..4).is_some_and(|selector| {
        RESERVED_SELECTORS.iter().any(|s| s == selector)
    })
}

/// Management interface of an [`AuthedCaller`] contract.
pub trait IAuthedCaller {
    /// The error type associated to the trait implementation.
    type Error: Into<alloc::vec::Vec<u8>>;

    /// Returns the address of the current owner.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    #[must_use]
    fn owner(&self) -> Address;

    /// Transfers ownership of the contract to a new account (`new_owner`).
    /// Can only be called by the current owner.
    ///
    /// WARNING: `new_owner` is not validated. Transferring to
    /// [`Address::ZERO`] or to an account nobody controls leaves the contract
    /// without an owner for good.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `new_owner` - The next owner of this contract.
    ///
    /// # Errors
    ///
    /// * [`CallerNotOwner`] - If called by any account other than the owner.
    ///
    /// # Events
    ///
    /// * [`OwnershipTransferred`].
    fn transfer_ownership(
        &mut self,
        new_owner: Address,
    ) -> Result<(), Self::Error>;

    /// Makes `who` a ward. Adding an existing ward is a no-op.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `who` - Account to authorize.
    ///
    /// # Errors
    ///
    /// * [`CallerUnauthorizedAccount`] - If the caller is neither the owner
    ///   nor a ward.
    ///
    /// # Events
    ///
    /// * [`WardAdded`] - If `who` was not a ward before.
    fn add_ward(&mut self, who: Address) -> Result<(), Self::Error>;

    /// Removes `who` from the wards. Removing an absent ward is a no-op.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `who` - Account to deauthorize.
    ///
    /// # Errors
    ///
    /// * [`CallerUnauthorizedAccount`] - If the caller is neither the owner
    ///   nor a ward.
    ///
    /// # Events
    ///
    /// * [`WardRemoved`] - If `who` was a ward before.
    fn remove_ward(&mut self, who: Address) -> Result<(), Self::Error>;

    /// Returns true if `who` is a ward.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `who` - Account to check.
    #[must_use]
    fn is_ward(&self, who: Address) -> bool;

    /// Returns true if `who` is the owner or a ward.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `who` - Account to check.
    #[must_use]
    fn is_authorized(&self, who: Address) -> bool;
}

/// State of an [`AuthedCaller`] contract.
#[storage]
pub struct AuthedCaller {
    /// Forwarding core; owns the target slot.
    pub(crate) caller: Caller,
    /// Access to hashed storage slots.
    storage_slot: StorageSlot,
}

/// NOTE: Implementation of [`TopLevelStorage`] to be able use `&mut self` when
/// calling other contracts and not `&mut (impl TopLevelStorage +
/// BorrowMut<Self>)`. Should be fixed in the future by the Stylus team.
unsafe impl TopLevelStorage for AuthedCaller {}

#[public]
#[implements(ICaller<Error = Error>, IAuthedCaller<Error = Error>)]
impl AuthedCaller {
    /// Constructor. Makes the deployer the owner.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    ///
    /// # Events
    ///
    /// * [`OwnershipTransferred`].
    #[constructor]
    pub fn constructor(&mut self) {
        self._transfer_ownership(msg::sender());
    }
}

#[public]
impl ICaller for AuthedCaller {
    type Error = Error;

    fn get_target(&self) -> Address {
        self.get_target()
    }

    fn set_target(&mut self, to: Address) -> Result<Address, Self::Error> {
        self.set_target(to)
    }
}

#[public]
impl IAuthedCaller for AuthedCaller {
    type Error = Error;

    #[selector(name = "authedCaller_owner")]
    fn owner(&self) -> Address {
        self.owner()
    }

    #[selector(name = "authedCaller_transferOwnership")]
    fn transfer_ownership(
        &mut self,
        new_owner: Address,
    ) -> Result<(), Self::Error> {
        self.transfer_ownership(new_owner)
    }

    #[selector(name = "authedCaller_addWard")]
    fn add_ward(&mut self, who: Address) -> Result<(), Self::Error> {
        self.add_ward(who)
    }

    #[selector(name = "authedCaller_removeWard")]
    fn remove_ward(&mut self, who: Address) -> Result<(), Self::Error> {
        self.remove_ward(who)
    }

    #[selector(name = "authedCaller_isWard")]
    fn is_ward(&self, who: Address) -> bool {
        self.is_ward(who)
    }

    #[selector(name = "authedCaller_isAuthorized")]
    fn is_authorized(&self, who: Address) -> bool {
        self.is_authorized(who)
    }
}

impl AuthedCaller {
    /// Returns the current forwarding target.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    #[must_use]
    pub fn get_target(&self) -> Address {
        self.caller.get_target()
    }

    /// Returns the address of the current owner.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.storage_slot.get_slot::<StorageAddress>(OWNER_SLOT).get()
    }

    /// Returns true if `who` is a ward.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `who` - Account to check.
    #[must_use]
    pub fn is_ward(&self, who: Address) -> bool {
        self.ward(who).get()
    }

    /// Returns true if `who` is the owner.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `who` - Account to check.
    #[must_use]
    pub fn is_owner(&self, who: Address) -> bool {
        who == self.owner()
    }

    /// Returns true if `who` is the owner or a ward.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    /// * `who` - Account to check.
    #[must_use]
    pub fn is_authorized(&self, who: Address) -> bool {
        self.is_owner(who) || self.is_ward(who)
    }

    /// Points the caller at `to`. Returns the caller's own address.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `to` - The new forwarding target.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If the caller is neither the owner
    ///   nor a ward.
    ///
    /// # Events
    ///
    /// * [`caller::TargetUpdated`].
    pub fn set_target(&mut self, to: Address) -> Result<Address, Error> {
        self.only_authorized()?;
        Ok(self.caller._set_target(to))
    }

    /// Transfers ownership of the contract to `new_owner`. Can only be called
    /// by the current owner. `new_owner` is not validated.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `new_owner` - The next owner of this contract.
    ///
    /// # Errors
    ///
    /// * [`Error::NotOwner`] - If called by any account other than the owner.
    ///
    /// # Events
    ///
    /// * [`OwnershipTransferred`].
    pub fn transfer_ownership(
        &mut self,
        new_owner: Address,
    ) -> Result<(), Error> {
        self.only_owner()?;
        self._transfer_ownership(new_owner);
        Ok(())
    }

    /// Makes `who` a ward.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `who` - Account to authorize.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If the caller is neither the owner
    ///   nor a ward.
    ///
    /// # Events
    ///
    /// * [`WardAdded`] - If `who` was not a ward before.
    pub fn add_ward(&mut self, who: Address) -> Result<(), Error> {
        self.only_authorized()?;
        self._add_ward(who);
        Ok(())
    }

    /// Removes `who` from the wards.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `who` - Account to deauthorize.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If the caller is neither the owner
    ///   nor a ward.
    ///
    /// # Events
    ///
    /// * [`WardRemoved`] - If `who` was a ward before.
    pub fn remove_ward(&mut self, who: Address) -> Result<(), Error> {
        self.only_authorized()?;
        self._remove_ward(who);
        Ok(())
    }

    /// Relays `calldata` and the attached value to the current target.
    /// Empty calldata without value is relayed as well, see
    /// [`Caller::relay`].
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `calldata` - The calldata to relay.
    ///
    /// # Errors
    ///
    /// * [`CallerUnauthorizedAccount`] - If the caller is neither the owner
    ///   nor a ward.
    /// * [`CallerPlainTransfer`] - If `calldata` is empty and the call carries
    ///   value.
    /// * The target's raw revert data, if the relayed call fails.
    pub fn relay(&mut self, calldata: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        self.only_authorized()?;
        self.do_fallback(calldata)
    }
}

impl AuthedCaller {
    /// Checks that [`msg::sender`] is the owner or a ward.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If called by any other account.
    pub fn only_authorized(&self) -> Result<(), Error> {
        let account = msg::sender();
        if !self.is_authorized(account) {
            return Err(Error::UnauthorizedAccount(
                CallerUnauthorizedAccount { account },
            ));
        }

        Ok(())
    }

    /// Checks that [`msg::sender`] is the owner.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    ///
    /// # Errors
    ///
    /// * [`Error::NotOwner`] - If called by any account other than the owner.
    pub fn only_owner(&self) -> Result<(), Error> {
        let account = msg::sender();
        if !self.is_owner(account) {
            return Err(Error::NotOwner(CallerNotOwner { account }));
        }

        Ok(())
    }

    /// Transfers ownership of the contract to `new_owner`.
    /// Internal function without access restriction.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `new_owner` - Account that is going to be the next owner.
    ///
    /// # Events
    ///
    /// * [`OwnershipTransferred`].
    pub fn _transfer_ownership(&mut self, new_owner: Address) {
        let previous_owner = self.owner();
        self.storage_slot.get_slot::<StorageAddress>(OWNER_SLOT).set(new_owner);
        evm::log(OwnershipTransferred { previous_owner, new_owner });
    }

    /// Sets the ward flag of `who`. Internal function without access
    /// restriction.
    ///
    /// Returns true if the flag changed.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `who` - Account to authorize.
    ///
    /// # Events
    ///
    /// * [`WardAdded`] - If `who` was not a ward before.
    pub fn _add_ward(&mut self, who: Address) -> bool {
        if self.is_ward(who) {
            return false;
        }

        self.ward(who).set(true);
        evm::log(WardAdded { account: who, sender: msg::sender() });
        true
    }

    /// Clears the ward flag of `who`. Internal function without access
    /// restriction.
    ///
    /// Returns true if the flag changed.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `who` - Account to deauthorize.
    ///
    /// # Events
    ///
    /// * [`WardRemoved`] - If `who` was a ward before.
    pub fn _remove_ward(&mut self, who: Address) -> bool {
        if !self.is_ward(who) {
            return false;
        }

        self.ward(who).set(false);
        evm::log(WardRemoved { account: who, sender: msg::sender() });
        true
    }

    fn ward(&self, who: Address) -> StorageBool {
        self.storage_slot.get_slot::<StorageBool>(mapping_slot(who, WARDS_SLOT))
    }
}

impl IForward for AuthedCaller {
    fn target(&self) -> Address {
        self.get_target()
    }
}
