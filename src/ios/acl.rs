//! Access-list rule canonicalisation.
//!
//! IOS silently reorders IPv4 standard ACL entries when it saves them: rules
//! whose address ranges do not overlap may move past each other, rules
//! whose ranges do overlap never do. To make two such lists comparable the
//! rules are collected into blocks of mutually non-overlapping rules; a rule
//! that overlaps any member of the open block closes it. A closed block is
//! sorted by address and appended to the list. Two lists that differ only
//! in how IOS was free to order them therefore come out identical.
//!
//! Extended IPv4 and IPv6 lists keep their entry order on the device, so
//! their rules are only normalised one at a time: named services become
//! port numbers and optional parts are written in one fixed way.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;
use tracing::debug;

/// Service names usable in ACL rules and the ports they stand for.
const SERVICE_PORTS: &[(&str, u16)] = &[
    ("bootps", 67),
    ("bootpc", 68),
    ("discard", 9),
    ("domain", 53),
    ("ftp", 21),
    ("ftp-data", 20),
    ("gopher", 70),
    ("ident", 113),
    ("isakmp", 500),
    ("lpd", 515),
    ("mail", 25),
    ("non500-isakmp", 4500),
    ("ntp", 123),
    ("smtp", 25),
    ("snmp", 161),
    ("tftp", 69),
    ("www", 80),
];

/// Convert a service name or numeric port to a port number.
pub fn service_to_port(service: &str) -> Result<u16> {
    SERVICE_PORTS
        .iter()
        .find(|(name, _)| *name == service)
        .map(|(_, port)| Ok(*port))
        .unwrap_or_else(|| {
            service
                .parse()
                .map_err(|_| Error::UnknownService(service.to_string()))
        })
}

// ============================================================================
// IPv4 Standard Rules
// ============================================================================

/// `0.0.0.0 255.255.255.255` is matched as `any` explicitly; everything
/// else is a bare or `host` address, or an address and wildcard mask.
static ACL4_STD_RULE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<action>permit|deny) +",
        r"(?:(?P<any>any|0\.0\.0\.0 255\.255\.255\.255)",
        r"|(?:host )?(?P<host>[0-9.]+)",
        r"|(?P<net>[0-9.]+) (?P<mask>[0-9.]+))$",
    ))
    .expect("Invalid IPv4 standard ACL rule regex")
});

/// Permit or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleAction {
    Permit,
    Deny,
}

impl RuleAction {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "permit" => Some(RuleAction::Permit),
            "deny" => Some(RuleAction::Deny),
            _ => None,
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleAction::Permit => write!(f, "permit"),
            RuleAction::Deny => write!(f, "deny"),
        }
    }
}

/// A contiguous IPv4 address range given as address and prefix length.
///
/// The address keeps any host bits it was written with; the range itself
/// always starts on the prefix boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    addr: u32,
    prefix_len: u8,
}

impl Ipv4Range {
    /// The whole address space.
    pub const ANY: Ipv4Range = Ipv4Range {
        addr: 0,
        prefix_len: 0,
    };

    /// An address with a prefix length of at most 32.
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        if prefix_len > 32 {
            return Err(Error::invalid_address(
                format!("{addr}/{prefix_len}"),
                "prefix length exceeds 32",
            ));
        }
        Ok(Self {
            addr: u32::from(addr),
            prefix_len,
        })
    }

    /// A single address.
    pub fn host(addr: Ipv4Addr) -> Self {
        Self {
            addr: u32::from(addr),
            prefix_len: 32,
        }
    }

    /// An address with a wildcard (host) mask such as `0.0.0.255`.
    ///
    /// A mask that is not a contiguous wildcard but is a contiguous netmask
    /// is accepted as a netmask; anything else is an error.
    pub fn with_mask(addr: Ipv4Addr, mask: Ipv4Addr) -> Result<Self> {
        let mask_bits = u32::from(mask);

        let prefix_len = if is_hostmask(mask_bits) {
            32 - mask_bits.count_ones()
        } else if is_hostmask(!mask_bits) {
            mask_bits.count_ones()
        } else {
            return Err(Error::invalid_address(
                format!("{addr} {mask}"),
                "mask is not contiguous",
            ));
        };

        // count_ones() of a u32 is at most 32
        Self::new(addr, prefix_len as u8)
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    fn hostmask(&self) -> u32 {
        u32::MAX.checked_shr(u32::from(self.prefix_len)).unwrap_or(0)
    }

    /// Lowest address in the range.
    pub fn first(&self) -> u32 {
        self.addr & !self.hostmask()
    }

    /// Highest address in the range.
    pub fn last(&self) -> u32 {
        self.first() | self.hostmask()
    }

    /// Whether the two ranges share at least one address.
    pub fn overlaps(&self, other: &Ipv4Range) -> bool {
        self.first() <= other.last() && self.last() >= other.first()
    }

    fn sort_key(&self) -> (u32, u8, u32) {
        (self.first(), self.prefix_len, self.addr - self.first())
    }
}

/// Contiguous run of low-order one bits (including none and all).
fn is_hostmask(bits: u32) -> bool {
    bits & bits.wrapping_add(1) == 0
}

/// Ascending by first address, then wider ranges first.
impl Ord for Ipv4Range {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Ipv4Range {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Written the way IOS shows it in a standard ACL: `any` for the whole
/// address space, a bare address for a single host, otherwise address and
/// wildcard mask.
impl fmt::Display for Ipv4Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix_len {
            0 => write!(f, "any"),
            32 => write!(f, "{}", Ipv4Addr::from(self.addr)),
            _ => write!(
                f,
                "{} {}",
                Ipv4Addr::from(self.addr),
                Ipv4Addr::from(self.hostmask())
            ),
        }
    }
}

/// One IPv4 standard ACL rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StdRule {
    /// Addresses the rule matches
    pub range: Ipv4Range,
    /// What happens to them
    pub action: RuleAction,
}

impl StdRule {
    /// Parse the rule part of a standard ACL line, e.g. `deny host 10.0.0.5`.
    pub fn parse(rule: &str) -> Result<Self> {
        let caps = ACL4_STD_RULE_REGEX
            .captures(rule)
            .ok_or_else(|| Error::acl_rule("IPv4 standard", rule))?;

        let action = RuleAction::parse(&caps["action"])
            .ok_or_else(|| Error::acl_rule("IPv4 standard", rule))?;

        let range = if caps.name("any").is_some() {
            Ipv4Range::ANY
        } else if let Some(host) = caps.name("host") {
            Ipv4Range::host(parse_ipv4(host.as_str())?)
        } else {
            Ipv4Range::with_mask(parse_ipv4(&caps["net"])?, parse_ipv4(&caps["mask"])?)?
        };

        Ok(Self { range, action })
    }
}

impl fmt::Display for StdRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.range)
    }
}

fn parse_ipv4(s: &str) -> Result<Ipv4Addr> {
    s.parse()
        .map_err(|e: std::net::AddrParseError| Error::invalid_address(s, e.to_string()))
}

/// Rules collected since the last block boundary.
///
/// No two members overlap; the set is kept ordered by address so closing
/// the block is just reading it out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingBlock {
    rules: BTreeSet<StdRule>,
}

impl PendingBlock {
    /// Whether `rule` overlaps any rule already in the block.
    pub fn overlaps(&self, rule: &StdRule) -> bool {
        self.rules.iter().any(|r| r.range.overlaps(&rule.range))
    }

    pub fn insert(&mut self, rule: StdRule) {
        self.rules.insert(rule);
    }

    /// Close the block: its rules in ascending address order, as text.
    pub fn flush(self) -> Vec<String> {
        self.rules.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Open blocks for every standard ACL seen so far, by ACL name or number.
#[derive(Debug, Clone, Default)]
pub struct StdAclBuffer {
    pending: IndexMap<String, PendingBlock>,
}

impl StdAclBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule to `id`'s open block.
    ///
    /// If the rule overlaps a member, the block is closed first and its
    /// rules are returned for appending to the list; the rule then starts a
    /// new block.
    pub fn add(&mut self, id: &str, rule: StdRule) -> Option<Vec<String>> {
        let block = self.pending.entry(id.to_string()).or_default();

        let closed = if block.overlaps(&rule) {
            let closed = std::mem::take(block);
            debug!(acl = id, rules = closed.len(), "closing standard ACL block");
            Some(closed.flush())
        } else {
            None
        };

        block.insert(rule);
        closed
    }

    /// Close every open block, leaving the buffer empty.
    ///
    /// The whole map is taken out before any block is flushed, so nothing
    /// is removed from a map while it is being walked.
    pub fn flush_all(&mut self) -> Vec<(String, Vec<String>)> {
        let pending = std::mem::take(&mut self.pending);

        pending
            .into_iter()
            .map(|(id, block)| {
                debug!(acl = %id, rules = block.len(), "flushing standard ACL block");
                (id, block.flush())
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ============================================================================
// IPv4 Extended Rules
// ============================================================================

/// `eq`/`neq` take a list of services and must match it lazily so trailing
/// keywords are not swallowed.
static ACL4_EXT_RULE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<action>permit|deny) +",
        r"(?P<protocol>ip|icmp|tcp|udp|igmp|pim|gre|esp) ",
        r"(?P<src_addr>any|host [0-9.]+|[0-9.]+ [0-9.]+)",
        r"(?: (?:(?P<src_port_listop>eq|neq) (?P<src_port_list>\S+(?: \S+)*?)",
        r"|(?P<src_port_1op>lt|gt) (?P<src_port_num>\S+)",
        r"|range (?P<src_port_low>\S+) (?P<src_port_high>\S+)))?",
        r" (?P<dst_addr>any|host [0-9.]+|[0-9.]+ [0-9.]+)",
        r"(?: (?:(?P<dst_port_listop>eq|neq) (?P<dst_port_list>\S+(?: \S+)*?)",
        r"|(?P<dst_port_1op>lt|gt) (?P<dst_port_num>\S+)",
        r"|range (?P<dst_port_low>\S+) (?P<dst_port_high>\S+)",
        r"|(?P<icmp_type>echo(?:-reply)?)))?",
        r"(?P<established> established)?",
        r"(?P<qos> dscp \S+)?",
        r"(?P<log> (?:log|log-input))?$",
    ))
    .expect("Invalid IPv4 extended ACL rule regex")
});

/// Port qualifier for one side (`src` or `dst`) of a rule, with a leading
/// space, or empty if the rule has none.
fn port_clause(caps: &Captures<'_>, side: &str) -> Result<String> {
    let group = |name: &str| caps.name(&format!("{side}_port_{name}")).map(|m| m.as_str());

    if let (Some(op), Some(list)) = (group("listop"), group("list")) {
        let ports = list
            .split(' ')
            .map(|s| service_to_port(s).map(|p| p.to_string()))
            .collect::<Result<Vec<_>>>()?;
        return Ok(format!(" {op} {}", ports.join(" ")));
    }

    if let (Some(op), Some(num)) = (group("1op"), group("num")) {
        return Ok(format!(" {op} {}", service_to_port(num)?));
    }

    if let (Some(low), Some(high)) = (group("low"), group("high")) {
        return Ok(format!(
            " range {} {}",
            service_to_port(low)?,
            service_to_port(high)?
        ));
    }

    if side == "dst" {
        if let Some(icmp) = caps.name("icmp_type") {
            return Ok(format!(" {}", icmp.as_str()));
        }
    }

    Ok(String::new())
}

fn optional<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map_or("", |m| m.as_str())
}

/// Normalise an IPv4 extended ACL rule so equivalent rules compare equal.
///
/// No attempt is made to check the rule makes sense.
pub fn normalize_ext_rule(rule: &str) -> Result<String> {
    let caps = ACL4_EXT_RULE_REGEX
        .captures(rule)
        .ok_or_else(|| Error::acl_rule("IPv4 extended", rule))?;

    Ok(format!(
        "{} {} {}{} {}{}{}{}{}",
        &caps["action"],
        &caps["protocol"],
        &caps["src_addr"],
        port_clause(&caps, "src")?,
        &caps["dst_addr"],
        port_clause(&caps, "dst")?,
        optional(&caps, "established"),
        optional(&caps, "qos"),
        optional(&caps, "log"),
    ))
}

// ============================================================================
// IPv6 Rules
// ============================================================================

/// Not anchored at the end: some rules (control-plane ICMPv6 types, for
/// example) carry trailing parts that are not modelled and are dropped.
static ACL6_RULE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<action>permit|deny)",
        r"(?: (?P<protocol>ipv6|icmp|tcp|udp|\d+))?",
        r" (?P<src_addr>any|host [0-9A-Fa-f:]+|[0-9A-Fa-f:]+/\d+)",
        r"(?: (?:(?P<src_port_1op>eq|lt|gt|neq) (?P<src_port_num>\S+)",
        r"|range (?P<src_port_low>\S+) (?P<src_port_high>\S+)))?",
        r" (?P<dst_addr>any|host [0-9A-Fa-f:]+|[0-9A-Fa-f:]+/\d+)",
        r"(?: (?:(?P<dst_port_1op>eq|lt|gt|neq) (?P<dst_port_num>\S+)",
        r"|range (?P<dst_port_low>\S+) (?P<dst_port_high>\S+)",
        r"|(?P<icmp_type>echo(?:-reply)?)))?",
        r"(?P<established> established)?",
        r"(?P<log> (?:log|log-input))?",
    ))
    .expect("Invalid IPv6 ACL rule regex")
});

/// Normalise an IPv6 ACL rule so equivalent rules compare equal.
///
/// The protocol defaults to `ipv6` and addresses are lower-cased. Logging
/// options are not part of the normalised form.
pub fn normalize_v6_rule(rule: &str) -> Result<String> {
    let caps = ACL6_RULE_REGEX
        .captures(rule)
        .ok_or_else(|| Error::acl_rule("IPv6", rule))?;

    Ok(format!(
        "{} {} {}{} {}{}{}",
        &caps["action"],
        caps.name("protocol").map_or("ipv6", |m| m.as_str()),
        caps["src_addr"].to_lowercase(),
        port_clause(&caps, "src")?,
        caps["dst_addr"].to_lowercase(),
        port_clause(&caps, "dst")?,
        optional(&caps, "established"),
    ))
}
