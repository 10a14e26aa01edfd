use alloy_primitives::U256;
use malachite::Natural;

pub fn u256_to_natural(num: U256) -> Natural {
    Natural::from_limbs_asc(&num.into_limbs())
}

/// Lowercase `0x` hex, the form addresses take in persisted configuration.
pub fn address_to_string(address: &alloy_primitives::Address) -> String {
    format!("{:?}", address).to_lowercase()
}

pub mod serde_address {
    use std::str::FromStr;

    use alloy_primitives::Address;

    use serde::{
        de::{Deserialize, Deserializer},
        ser::Serializer,
        Serialize,
    };

    pub fn serialize<S: Serializer>(u: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        super::address_to_string(u).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let u: String = Deserialize::deserialize(deserializer)?;
        Address::from_str(&u).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    #[test]
    fn natural_conversion_keeps_all_limbs() {
        let big = U256::from(u128::MAX) + U256::from(1u8);
        assert_eq!(u256_to_natural(big).to_string(), big.to_string());
        assert_eq!(u256_to_natural(U256::ZERO), Natural::from(0u8));
    }

    #[test]
    fn addresses_render_lowercase() {
        let addr = address!("CFFBFD665BEDB19B47837461A5ABF4388C560D35");
        assert_eq!(address_to_string(&addr), "0xcffbfd665bedb19b47837461a5abf4388c560d35");
    }
}
