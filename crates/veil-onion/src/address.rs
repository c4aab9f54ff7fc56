//! Next-hop addresses.
//!
//! Inside a layer the next hop is written as exactly [`ADDRESS_PREFIX_LEN`]
//! ASCII decimal digits, left-zero-padded. Encoder and every relay's parser
//! must agree on this width.

use std::fmt;
use std::str::FromStr;

use crate::{OnionError, Result};

/// Width of the address prefix at the start of every decrypted layer body.
pub const ADDRESS_PREFIX_LEN: usize = 10;

/// Largest address representable in the prefix.
pub const MAX_ADDRESS: u64 = 9_999_999_999;

/// Address of a relay or final recipient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddress(u64);

impl NodeAddress {
    /// Create an address, rejecting zero and values wider than the prefix.
    pub fn new(value: u64) -> Result<Self> {
        if value == 0 || value > MAX_ADDRESS {
            return Err(OnionError::InvalidAddress(format!(
                "{value} is outside 1..={MAX_ADDRESS}"
            )));
        }
        Ok(Self(value))
    }

    /// The numeric address.
    pub fn get(self) -> u64 {
        self.0
    }

    /// The TCP port this address maps to, if it fits in one.
    pub fn port(self) -> Option<u16> {
        u16::try_from(self.0).ok()
    }

    /// Fixed-width prefix form, e.g. `0000004002`.
    pub fn to_prefix(self) -> [u8; ADDRESS_PREFIX_LEN] {
        let mut out = [b'0'; ADDRESS_PREFIX_LEN];
        let mut value = self.0;
        for slot in out.iter_mut().rev() {
            // value < 10^10, so every digit fits
            *slot = b'0' + (value % 10) as u8;
            value /= 10;
        }
        out
    }

    /// Parse the first [`ADDRESS_PREFIX_LEN`] bytes of `data`.
    pub fn from_prefix(data: &[u8]) -> Result<Self> {
        let prefix = data.get(..ADDRESS_PREFIX_LEN).ok_or_else(|| {
            OnionError::InvalidAddress(format!(
                "need {ADDRESS_PREFIX_LEN} prefix bytes, have {}",
                data.len()
            ))
        })?;

        let mut value: u64 = 0;
        for &byte in prefix {
            if !byte.is_ascii_digit() {
                return Err(OnionError::InvalidAddress(
                    "address prefix is not decimal".into(),
                ));
            }
            value = value * 10 + u64::from(byte - b'0');
        }
        Self::new(value)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = ADDRESS_PREFIX_LEN)
    }
}

impl FromStr for NodeAddress {
    type Err = OnionError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != ADDRESS_PREFIX_LEN {
            return Err(OnionError::InvalidAddress(format!(
                "expected {ADDRESS_PREFIX_LEN} digits, got {}",
                s.len()
            )));
        }
        Self::from_prefix(s.as_bytes())
    }
}
