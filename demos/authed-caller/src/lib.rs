#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
extern crate alloc;

use stylus_caller::caller::{
    authed::{self, AuthedCaller, IAuthedCaller},
    ICaller,
};
use stylus_sdk::{alloy_primitives::Address, prelude::*, ArbResult};

#[entrypoint]
#[storage]
struct AuthedCallerExample {
    authed: AuthedCaller,
}

#[public]
#[implements(ICaller<Error = authed::Error>, IAuthedCaller<Error = authed::Error>)]
impl AuthedCallerExample {
    #[constructor]
    fn constructor(&mut self) {
        self.authed.constructor();
    }

    #[fallback]
    #[payable]
    fn fallback(&mut self, calldata: &[u8]) -> ArbResult {
        self.authed.relay(calldata)
    }
}

#[public]
impl ICaller for AuthedCallerExample {
    type Error = authed::Error;

    fn get_target(&self) -> Address {
        self.authed.get_target()
    }

    fn set_target(&mut self, to: Address) -> Result<Address, Self::Error> {
        self.authed.set_target(to)
    }
}

#[public]
impl IAuthedCaller for AuthedCallerExample {
    type Error = authed::Error;

    #[selector(name = "authedCaller_owner")]
    fn owner(&self) -> Address {
        self.authed.owner()
    }

    #[selector(name = "authedCaller_transferOwnership")]
    fn transfer_ownership(
        &mut self,
        new_owner: Address,
    ) -> Result<(), Self::Error> {
        self.authed.transfer_ownership(new_owner)
    }

    #[selector(name = "authedCaller_addWard")]
    fn add_ward(&mut self, who: Address) -> Result<(), Self::Error> {
        self.authed.add_ward(who)
    }

    #[selector(name = "authedCaller_removeWard")]
    fn remove_ward(&mut self, who: Address) -> Result<(), Self::Error> {
        self.authed.remove_ward(who)
    }

    #[selector(name = "authedCaller_isWard")]
    fn is_ward(&self, who: Address) -> bool {
        self.authed.is_ward(who)
    }

    #[selector(name = "authedCaller_isAuthorized")]
    fn is_authorized(&self, who: Address) -> bool {
        self.authed.is_authorized(who)
    }
}
