//! Typed endpoint addresses and address prefixes
//!
//! Endpoints travel on the wire as `ipv4:<dotted-quad>` or `ipv6:<colon-hex>`.
//! Prefixes in the network map use plain CIDR notation (`10.0.0.0/8`).

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::DecodeError;

const IPV4_TAG: &str = "ipv4";
const IPV6_TAG: &str = "ipv6";

/// Address family of an endpoint or prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => IPV4_TAG,
            AddressFamily::Ipv6 => IPV6_TAG,
        }
    }

    /// Bit width of addresses in this family
    pub fn max_len(&self) -> u8 {
        match self {
            AddressFamily::Ipv4 => 32,
            AddressFamily::Ipv6 => 128,
        }
    }

    fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single typed endpoint address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EndpointAddress {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
}

impl EndpointAddress {
    pub fn family(&self) -> AddressFamily {
        match self {
            EndpointAddress::Ipv4(_) => AddressFamily::Ipv4,
            EndpointAddress::Ipv6(_) => AddressFamily::Ipv6,
        }
    }

    pub fn ip(&self) -> IpAddr {
        match *self {
            EndpointAddress::Ipv4(addr) => IpAddr::V4(addr),
            EndpointAddress::Ipv6(addr) => IpAddr::V6(addr),
        }
    }
}

/// Parse a typed endpoint literal such as `ipv4:192.168.1.23`.
///
/// The family tag is mandatory and the literal after it must be valid for
/// that family; an IPv6 literal under an `ipv4:` tag is rejected.
pub fn parse_endpoint(literal: &str) -> Result<EndpointAddress, DecodeError> {
    let invalid = || DecodeError::InvalidEndpoint(literal.to_string());

    let (tag, addr) = literal.split_once(':').ok_or_else(invalid)?;
    match tag {
        IPV4_TAG => Ipv4Addr::from_str(addr)
            .map(EndpointAddress::Ipv4)
            .map_err(|_| invalid()),
        IPV6_TAG => Ipv6Addr::from_str(addr)
            .map(EndpointAddress::Ipv6)
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

impl FromStr for EndpointAddress {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_endpoint(s)
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointAddress::Ipv4(addr) => write!(f, "{}:{}", IPV4_TAG, addr),
            EndpointAddress::Ipv6(addr) => write!(f, "{}:{}", IPV6_TAG, addr),
        }
    }
}

impl Serialize for EndpointAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// CIDR address prefix, stored with host bits cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IpPrefix {
    addr: IpAddr,
    len: u8,
}

impl IpPrefix {
    /// Build a prefix, clearing any host bits in `addr`
    pub fn new(addr: IpAddr, len: u8) -> Result<Self, DecodeError> {
        let family = AddressFamily::of(&addr);
        if len > family.max_len() {
            return Err(DecodeError::InvalidPrefix(format!("{}/{}", addr, len)));
        }
        let addr = match addr {
            IpAddr::V4(v4) => IpAddr::V4(Ipv4Addr::from(mask_v4(u32::from(v4), len))),
            IpAddr::V6(v6) => IpAddr::V6(Ipv6Addr::from(mask_v6(u128::from(v6), len))),
        };
        Ok(Self { addr, len })
    }

    /// The prefix covering every address of a family
    pub fn any(family: AddressFamily) -> Self {
        let addr = match family {
            AddressFamily::Ipv4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            AddressFamily::Ipv6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        Self { addr, len: 0 }
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.addr)
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.len
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                mask_v4(u32::from(*ip), self.len) == u32::from(net)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                mask_v6(u128::from(*ip), self.len) == u128::from(net)
            }
            _ => false,
        }
    }

    /// Network bits of `ip` at this prefix's length, widened to `u128`.
    pub(crate) fn key_of(ip: &IpAddr, len: u8) -> u128 {
        match ip {
            IpAddr::V4(v4) => mask_v4(u32::from(*v4), len) as u128,
            IpAddr::V6(v6) => mask_v6(u128::from(*v6), len),
        }
    }

    pub(crate) fn key(&self) -> u128 {
        Self::key_of(&self.addr, self.len)
    }
}

fn mask_v4(bits: u32, len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        bits & (u32::MAX << (32 - len as u32))
    }
}

fn mask_v6(bits: u128, len: u8) -> u128 {
    if len == 0 {
        0
    } else {
        bits & (u128::MAX << (128 - len as u32))
    }
}

impl FromStr for IpPrefix {
    type Err = DecodeError;

    /// Accepts `addr/len`, or a bare address as a host prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecodeError::InvalidPrefix(s.to_string());

        let (addr, len) = match s.split_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (s, None),
        };
        let addr = IpAddr::from_str(addr).map_err(|_| invalid())?;
        let len = match len {
            Some(len) => len.parse::<u8>().map_err(|_| invalid())?,
            None => AddressFamily::of(&addr).max_len(),
        };
        Self::new(addr, len).map_err(|_| invalid())
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl Serialize for IpPrefix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
