//! Contract that forwards every call it does not recognize to a mutable
//! target using a regular `call`. We refer to that contract as the _target_
//! of the caller.
//!
//! Unlike a delegating proxy, the call runs in the target's own context: the
//! target sees the [`Caller`] as `msg.sender`, never the account that invoked
//! the [`Caller`]. Attached value is forwarded along with the calldata, and
//! the target's return or revert data is handed back untouched.
//!
//! The target is stored at a hashed slot, see [`TARGET_SLOT`], so it does not
//! collide with anything the target itself might keep in storage.
//!
//! See [`authed`] for a variant that restricts who may set the target and
//! relay calls.
use alloc::{vec, vec::Vec};

use alloy_primitives::{Address, B256, U256};
pub use sol::*;
use stylus_sdk::{
    call::{self, Call, MethodError},
    contract, evm, msg,
    prelude::*,
    storage::StorageAddress,
};

use crate::utils::storage_slot::{namespaced_slot, StorageSlot};

pub mod authed;

#[cfg_attr(coverage_nightly, coverage(off))]
mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// Emitted when the forwarding target changes.
        ///
        /// * `previous_target` - Target before the change.
        /// * `new_target` - Target after the change.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event TargetUpdated(address indexed previous_target, address indexed new_target);
    }

    sol! {
        /// A call without calldata tried to transfer value through the
        /// caller.
        ///
        /// * `sender` - Account that attempted the transfer.
        /// * `value` - Value attached to the call.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error CallerPlainTransfer(address sender, uint256 value);
    }
}

/// An error that occurred in the implementation of a [`Caller`] contract.
///
/// Failures of the relayed call itself are not represented here: they are
/// returned as the target's raw revert data.
#[derive(SolidityError, Debug)]
pub enum Error {
    /// A call without calldata tried to transfer value through the caller.
    PlainTransfer(CallerPlainTransfer),
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl MethodError for Error {
    fn encode(self) -> alloc::vec::Vec<u8> {
        self.into()
    }
}

/// Storage slot with the address of the current target.
///
/// This is the keccak-256 hash of `"stylus.caller.target"`:
/// `0x2aaf77d4f454ef6a90836f7e5bbbe708cf8a0574feb6abe40ad92eb51ba7e61f`.
pub const TARGET_SLOT: B256 = namespaced_slot(b"stylus.caller.target");

/// This trait provides a fallback function that relays all calls to another
/// contract using the EVM instruction `call`. The contract relayed to has to
/// be specified by overriding the virtual [`IForward::target`] function.
///
/// Relaying to a different contract can also be triggered manually through
/// the [`IForward::forward`] function.
///
/// The output of the relayed call, or its revert data, is returned back to
/// the caller verbatim.
pub trait IForward: TopLevelStorage + Sized {
    /// Calls `target` with `calldata`, attaching `value` and all remaining
    /// gas.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `target` - Address of the contract to call.
    /// * `calldata` - Calldata to forward, unmodified.
    /// * `value` - Value to attach to the call.
    ///
    /// # Errors
    ///
    /// * [`call::Error::Revert`] - If the call reverts, holding the raw
    ///   revert data.
    fn forward(
        &mut self,
        target: Address,
        calldata: &[u8],
        value: U256,
    ) -> Result<Vec<u8>, call::Error> {
        call::call(Call::new_in(self).value(value), target, calldata)
    }

    /// This is a virtual function that should be overridden so it returns
    /// the address to which [`IForward::do_fallback`] relays.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    fn target(&self) -> Address;

    /// Fallback function that relays calls to the address returned by
    /// [`IForward::target`], forwarding [`msg::value`]. Will run if no other
    /// function in the contract matches the call data.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `calldata` - The calldata to relay to the target contract.
    ///
    /// # Errors
    ///
    /// * [`CallerPlainTransfer`] - If `calldata` is empty and the call carries
    ///   value.
    /// * The target's raw revert data, if the relayed call fails.
    fn do_fallback(&mut self, calldata: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        let value = msg::value();
        check_plain_transfer(calldata, value)?;
        let target = self.target();
        Ok(self.forward(target, calldata, value)?)
    }
}

/// Rejects calls that carry value but no calldata.
///
/// A bare value transfer would otherwise be forwarded to the target with an
/// empty payload, which is almost never what the sender meant.
///
/// # Arguments
///
/// * `calldata` - Calldata of the incoming call.
/// * `value` - Value attached to the incoming call.
///
/// # Errors
///
/// * [`Error::PlainTransfer`] - If `calldata` is empty and `value` is not
///   zero.
pub fn check_plain_transfer(calldata: &[u8], value: U256) -> Result<(), Error> {
    if calldata.is_empty() && !value.is_zero() {
        return Err(Error::PlainTransfer(CallerPlainTransfer {
            sender: msg::sender(),
            value,
        }));
    }
    Ok(())
}

/// Interface of a [`Caller`] contract.
pub trait ICaller {
    /// The error type associated to the trait implementation.
    type Error: Into<alloc::vec::Vec<u8>>;

    /// Returns the current forwarding target.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    #[must_use]
    fn get_target(&self) -> Address;

    /// Points the caller at `to` and returns the caller's own address, so a
    /// target-typed call can be chained onto the result.
    ///
    /// `to` may be [`Address::ZERO`] and is not required to hold code.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `to` - The new forwarding target.
    ///
    /// # Errors
    ///
    /// Implementation specific; the base [`Caller`] never fails.
    ///
    /// # Events
    ///
    /// * [`TargetUpdated`].
    fn set_target(&mut self, to: Address) -> Result<Address, Self::Error>;
}

/// State of a [`Caller`] contract.
///
/// There are no declared fields: the target lives at [`TARGET_SLOT`].
#[storage]
pub struct Caller {
    /// Access to hashed storage slots.
    storage_slot: StorageSlot,
}

/// NOTE: Implementation of [`TopLevelStorage`] to be able use `&mut self` when
/// calling other contracts and not `&mut (impl TopLevelStorage +
/// BorrowMut<Self>)`. Should be fixed in the future by the Stylus team.
unsafe impl TopLevelStorage for Caller {}

#[public]
#[implements(ICaller<Error = Error>)]
impl Caller {}

#[public]
impl ICaller for Caller {
    type Error = Error;

    fn get_target(&self) -> Address {
        self.get_target()
    }

    fn set_target(&mut self, to: Address) -> Result<Address, Self::Error> {
        Ok(self.set_target(to))
    }
}

impl Caller {
    /// Returns the current forwarding target.
    ///
    /// # Arguments
    ///
    /// * `&self` - Read access to the contract's state.
    #[must_use]
    pub fn get_target(&self) -> Address {
        self.storage_slot.get_slot::<StorageAddress>(TARGET_SLOT).get()
    }

    /// Points the caller at `to`. Returns the caller's own address.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `to` - The new forwarding target.
    ///
    /// # Events
    ///
    /// * [`TargetUpdated`].
    pub fn set_target(&mut self, to: Address) -> Address {
        self._set_target(to)
    }

    /// Relays `calldata` and the attached value to the current target.
    ///
    /// Empty calldata is relayed too, as long as no value is attached, so an
    /// entrypoint should route it here through `#[fallback]` rather than
    /// declaring a `#[receive]` handler.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `calldata` - The calldata to relay.
    ///
    /// # Errors
    ///
    /// * [`CallerPlainTransfer`] - If `calldata` is empty and the call carries
    ///   value.
    /// * The target's raw revert data, if the relayed call fails.
    pub fn relay(&mut self, calldata: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        self.do_fallback(calldata)
    }

    /// Stores `to` as the new target without any access restriction.
    ///
    /// # Arguments
    ///
    /// * `&mut self` - Write access to the contract's state.
    /// * `to` - The new forwarding target.
    ///
    /// # Events
    ///
    /// * [`TargetUpdated`].
    pub fn _set_target(&mut self, to: Address) -> Address {
        let previous_target = self.get_target();
        self.storage_slot.get_slot::<StorageAddress>(TARGET_SLOT).set(to);
        evm::log(TargetUpdated { previous_target, new_target: to });
        contract::address()
    }
}

impl IForward for Caller {
    fn target(&self) -> Address {
        self.get_target()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::uint;
    use alloy_sol_macro::sol;
    use alloy_sol_types::{SolCall, SolError, SolValue};
    use motsu::prelude::*;
    use stylus_sdk::{storage::StorageU256, ArbResult};

    use super::*;

    const PONG: &[u8] = b"pong";

    sol! {
        interface IEcho {
            function whoami() external payable returns (address);
            function bump(uint256 by) external returns (uint256);
            function fail(uint256 code) external;
            function failEmpty() external;
        }

        error EchoFailed(uint256 code);
    }

    #[storage]
    struct Echo {
        last_sender: StorageAddress,
        received: StorageU256,
        counter: StorageU256,
    }

    unsafe impl TopLevelStorage for Echo {}

    #[public]
    impl Echo {
        #[payable]
        fn whoami(&mut self) -> Address {
            let sender = msg::sender();
            self.last_sender.set(sender);
            let received = self.received.get() + msg::value();
            self.received.set(received);
            sender
        }

        fn bump(&mut self, by: U256) -> U256 {
            let counter = self.counter.get() + by;
            self.counter.set(counter);
            counter
        }

        fn fail(&self, code: U256) -> Result<(), Vec<u8>> {
            Err(EchoFailed { code }.abi_encode())
        }

        fn fail_empty(&self) -> Result<(), Vec<u8>> {
            Err(vec![])
        }

        fn last_sender(&self) -> Address {
            self.last_sender.get()
        }

        fn received(&self) -> U256 {
            self.received.get()
        }

        fn counter(&self) -> U256 {
            self.counter.get()
        }

        #[fallback]
        fn fallback(&mut self, calldata: &[u8]) -> ArbResult {
            if calldata.is_empty() {
                self.last_sender.set(msg::sender());
            }
            Ok(PONG.to_vec())
        }
    }

    #[motsu::test]
    fn target_starts_at_zero(caller: Contract<Caller>, alice: Address) {
        assert_eq!(caller.sender(alice).get_target(), Address::ZERO);
    }

    #[motsu::test]
    fn set_target_returns_own_address(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
    ) {
        let returned = caller.sender(alice).set_target(echo.address());

        assert_eq!(returned, caller.address());
        assert_ne!(returned, echo.address());
        assert_eq!(caller.sender(alice).get_target(), echo.address());

        caller.assert_emitted(&TargetUpdated {
            previous_target: Address::ZERO,
            new_target: echo.address(),
        });
    }

    #[motsu::test]
    fn set_target_is_idempotent(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
    ) {
        caller.sender(alice).set_target(echo.address());
        caller.sender(alice).set_target(echo.address());

        assert_eq!(caller.sender(alice).get_target(), echo.address());
    }

    #[motsu::test]
    fn set_target_accepts_zero_and_codeless_addresses(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
        bob: Address,
    ) {
        caller.sender(alice).set_target(echo.address());
        caller.sender(alice).set_target(Address::ZERO);
        assert_eq!(caller.sender(alice).get_target(), Address::ZERO);

        caller.sender(alice).set_target(bob);
        assert_eq!(caller.sender(alice).get_target(), bob);
    }

    #[motsu::test]
    fn relay_presents_caller_as_sender(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
    ) {
        caller.sender(alice).set_target(echo.address());

        let output = caller
            .sender(alice)
            .relay(&IEcho::whoamiCall {}.abi_encode())
            .motsu_expect("should relay to echo");

        assert_eq!(output, caller.address().abi_encode());
        assert_eq!(echo.sender(alice).last_sender(), caller.address());
    }

    #[motsu::test]
    fn relay_returns_target_output_verbatim(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
        bob: Address,
    ) {
        caller.sender(alice).set_target(echo.address());
        let bump = IEcho::bumpCall { by: uint!(5_U256) }.abi_encode();

        let relayed = caller.sender(alice).relay(&bump).motsu_unwrap();
        assert_eq!(relayed, uint!(5_U256).abi_encode());

        // Any sender sees the same output through an unrestricted caller.
        let relayed = caller.sender(bob).relay(&bump).motsu_unwrap();
        assert_eq!(relayed, uint!(10_U256).abi_encode());
        assert_eq!(echo.sender(alice).counter(), uint!(10_U256));
    }

    #[motsu::test]
    fn relay_forwards_value(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
    ) {
        let value = uint!(1000_U256);
        alice.fund(value);
        caller.sender(alice).set_target(echo.address());

        let output = caller
            .sender_and_value(alice, value)
            .relay(&IEcho::whoamiCall {}.abi_encode())
            .motsu_expect("should relay value to echo");

        assert_eq!(output, caller.address().abi_encode());
        assert_eq!(echo.sender(alice).received(), value);
        assert_eq!(echo.balance(), value);
        assert_eq!(caller.balance(), U256::ZERO);
    }

    #[motsu::test]
    fn relay_bubbles_up_revert_data(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
    ) {
        caller.sender(alice).set_target(echo.address());

        let err = caller
            .sender(alice)
            .relay(&IEcho::failCall { code: uint!(7_U256) }.abi_encode())
            .motsu_expect_err("should revert with target error");

        assert_eq!(err, EchoFailed { code: uint!(7_U256) }.abi_encode());
    }

    #[motsu::test]
    fn relay_bubbles_up_empty_revert_data(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
    ) {
        caller.sender(alice).set_target(echo.address());

        let err = caller
            .sender(alice)
            .relay(&IEcho::failEmptyCall {}.abi_encode())
            .motsu_expect_err("should revert without data");

        assert!(err.is_empty());
    }

    #[motsu::test]
    fn relay_follows_target_changes(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        other: Contract<Echo>,
        alice: Address,
    ) {
        let whoami = IEcho::whoamiCall {}.abi_encode();

        caller.sender(alice).set_target(echo.address());
        caller.sender(alice).relay(&whoami).motsu_unwrap();

        caller.sender(alice).set_target(other.address());
        caller.sender(alice).relay(&whoami).motsu_unwrap();

        assert_eq!(echo.sender(alice).last_sender(), caller.address());
        assert_eq!(other.sender(alice).last_sender(), caller.address());
    }

    #[motsu::test]
    fn forward_calls_arbitrary_target(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
    ) {
        let output = caller
            .sender(alice)
            .forward(
                echo.address(),
                &IEcho::whoamiCall {}.abi_encode(),
                U256::ZERO,
            )
            .motsu_expect("should call echo directly");

        assert_eq!(output, caller.address().abi_encode());
        assert_eq!(caller.sender(alice).get_target(), Address::ZERO);
    }

    #[motsu::test]
    fn relay_returns_output_for_empty_calldata(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
    ) {
        caller.sender(alice).set_target(echo.address());

        let output = caller
            .sender(alice)
            .relay(&[])
            .motsu_expect("should relay empty calldata");

        assert_eq!(output, PONG);
        assert_eq!(echo.sender(alice).last_sender(), caller.address());
    }

    #[motsu::test]
    fn relay_empty_calldata_to_codeless_target_succeeds(
        caller: Contract<Caller>,
        alice: Address,
        bob: Address,
    ) {
        caller.sender(alice).set_target(bob);

        let output = caller
            .sender(alice)
            .relay(&[])
            .motsu_expect("should succeed without target code");

        assert!(output.is_empty());
    }

    #[motsu::test]
    fn relay_rejects_value_without_calldata(
        caller: Contract<Caller>,
        echo: Contract<Echo>,
        alice: Address,
    ) {
        let value = uint!(1_U256);
        alice.fund(value);
        caller.sender(alice).set_target(echo.address());

        let err = caller
            .sender_and_value(alice, value)
            .relay(&[])
            .motsu_expect_err("should reject plain transfer");

        assert_eq!(
            err,
            CallerPlainTransfer { sender: alice, value }.abi_encode()
        );
        assert_eq!(echo.sender(alice).received(), U256::ZERO);
        assert_eq!(echo.sender(alice).last_sender(), Address::ZERO);
    }

    #[test]
    fn plain_transfer_check_allows_payload_or_zero_value() {
        assert!(check_plain_transfer(&[0x01], uint!(1_U256)).is_ok());
        assert!(check_plain_transfer(&[], U256::ZERO).is_ok());
        assert!(check_plain_transfer(&[0x01, 0x02], U256::ZERO).is_ok());
    }
}
