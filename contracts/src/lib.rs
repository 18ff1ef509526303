/*!
# Stylus Caller

Call-forwarding proxies for
[Arbitrum Stylus](https://docs.arbitrum.io/stylus/stylus-gentle-introduction).

A [`Caller`] holds a single forwarding target and relays every call it does
not itself recognize to that target, attached value included. The target
observes the proxy, not the original sender, as `msg.sender`, which makes a
caller a convenient way to emulate distinct identities in tests and
orchestration scripts.

An [`AuthedCaller`] adds an owner and a set of wards, and only lets them
redirect or relay through the proxy.

All proxy state lives in hashed storage slots (see
[`utils::storage_slot`]), so forwarded-to contracts can never alias it.

## Usage

```ignore
use stylus_caller::caller::{self, Caller, ICaller};
use stylus_sdk::{alloy_primitives::Address, prelude::*, ArbResult};

#[entrypoint]
#[storage]
struct MyCaller {
    caller: Caller,
}

#[public]
#[implements(ICaller<Error = caller::Error>)]
impl MyCaller {
    #[fallback]
    #[payable]
    fn fallback(&mut self, calldata: &[u8]) -> ArbResult {
        self.caller.relay(calldata)
    }
}

#[public]
impl ICaller for MyCaller {
    type Error = caller::Error;

    fn get_target(&self) -> Address {
        self.caller.get_target()
    }

    fn set_target(&mut self, to: Address) -> Result<Address, Self::Error> {
        Ok(self.caller.set_target(to))
    }
}
```

[`Caller`]: crate::caller::Caller
[`AuthedCaller`]: crate::caller::authed::AuthedCaller
*/

#![allow(clippy::module_name_repetitions)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![deny(rustdoc::broken_intra_doc_links)]
extern crate alloc;

pub mod caller;
pub mod utils;
