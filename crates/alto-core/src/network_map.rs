//! Network map: PID -> address prefixes, with longest-prefix lookup

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use crate::endpoint::{AddressFamily, EndpointAddress, IpPrefix};
use crate::error::TopologyError;
use crate::pid::Pid;

/// Exact-match tables keyed by prefix length, probed longest first
#[derive(Debug, Default)]
struct LpmTable {
    by_len: BTreeMap<u8, HashMap<u128, Pid>>,
}

impl LpmTable {
    /// Returns the PID already holding `prefix`, if any
    fn insert(&mut self, prefix: &IpPrefix, pid: &Pid) -> Option<&Pid> {
        let table = self.by_len.entry(prefix.prefix_len()).or_default();
        match table.entry(prefix.key()) {
            std::collections::hash_map::Entry::Occupied(existing) => {
                let existing = existing.into_mut();
                if existing == pid {
                    None
                } else {
                    Some(&*existing)
                }
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(pid.clone());
                None
            }
        }
    }

    fn lookup(&self, ip: &IpAddr) -> Option<&Pid> {
        self.by_len
            .iter()
            .rev()
            .find_map(|(len, table)| table.get(&IpPrefix::key_of(ip, *len)))
    }
}

/// Mapping from PID to the prefixes it owns.
///
/// The same prefix may not be assigned to two PIDs. Nested prefixes are
/// allowed; an address belongs to the PID with the most specific match.
#[derive(Debug, Default)]
pub struct NetworkMap {
    pids: BTreeMap<Pid, Vec<IpPrefix>>,
    v4: LpmTable,
    v6: LpmTable,
}

impl NetworkMap {
    /// Build a network map, rejecting a prefix claimed by two PIDs
    pub fn from_entries<I>(entries: I) -> Result<Self, TopologyError>
    where
        I: IntoIterator<Item = (Pid, Vec<IpPrefix>)>,
    {
        let mut map = NetworkMap::default();
        for (pid, prefixes) in entries {
            map.insert(pid, prefixes)?;
        }
        Ok(map)
    }

    fn insert(&mut self, pid: Pid, prefixes: Vec<IpPrefix>) -> Result<(), TopologyError> {
        for prefix in &prefixes {
            let table = match prefix.family() {
                AddressFamily::Ipv4 => &mut self.v4,
                AddressFamily::Ipv6 => &mut self.v6,
            };
            if let Some(owner) = table.insert(prefix, &pid) {
                return Err(TopologyError::DuplicatePrefix {
                    prefix: prefix.to_string(),
                    first: owner.to_string(),
                    second: pid.to_string(),
                });
            }
        }

        let owned = self.pids.entry(pid).or_default();
        owned.extend(prefixes);
        owned.sort();
        owned.dedup();
        Ok(())
    }

    /// PID owning `ip` by longest-prefix match
    pub fn lookup(&self, ip: &IpAddr) -> Option<&Pid> {
        match ip {
            IpAddr::V4(_) => self.v4.lookup(ip),
            IpAddr::V6(_) => self.v6.lookup(ip),
        }
    }

    pub fn lookup_endpoint(&self, endpoint: &EndpointAddress) -> Option<&Pid> {
        self.lookup(&endpoint.ip())
    }

    pub fn contains_pid(&self, pid: &str) -> bool {
        self.pids.contains_key(pid)
    }

    pub fn prefixes(&self, pid: &str) -> Option<&[IpPrefix]> {
        self.pids.get(pid).map(Vec::as_slice)
    }

    /// PIDs in lexical order
    pub fn pids(&self) -> impl Iterator<Item = &Pid> {
        self.pids.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pid, &[IpPrefix])> {
        self.pids.iter().map(|(pid, prefixes)| (pid, prefixes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }
}
