#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
extern crate alloc;

use stylus_caller::caller::{self, Caller, ICaller};
use stylus_sdk::{alloy_primitives::Address, prelude::*, ArbResult};

#[entrypoint]
#[storage]
struct CallerExample {
    caller: Caller,
}

#[public]
#[implements(ICaller<Error = caller::Error>)]
impl CallerExample {
    #[fallback]
    #[payable]
    fn fallback(&mut self, calldata: &[u8]) -> ArbResult {
        self.caller.relay(calldata)
    }
}

#[public]
impl ICaller for CallerExample {
    type Error = caller::Error;

    fn get_target(&self) -> Address {
        self.caller.get_target()
    }

    fn set_target(&mut self, to: Address) -> Result<Address, Self::Error> {
        Ok(self.caller.set_target(to))
    }
}
