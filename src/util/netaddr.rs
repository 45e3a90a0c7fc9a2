// Jetporch
// Copyright (C) 2023 - Michael DeHaan <michael@michaeldehaan.net> + contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Address pools and switch port lists as they appear in cluster input files.

use ipnet::Ipv4Net;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

// ==============================================================================================================
// IPV4 RANGES
// ==============================================================================================================

/// An inclusive IPv4 interval, written either `start-end` or as a CIDR block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ipv4Range {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl Ipv4Range {
    pub fn overlaps(&self, other: &Ipv4Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl FromStr for Ipv4Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains('/') {
            let net: Ipv4Net = s.parse().map_err(|_| format!("invalid CIDR block: {}", s))?;
            return Ok(Ipv4Range { start: net.network(), end: net.broadcast() });
        }
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("expected start-end or CIDR, got: {}", s))?;
        let start: Ipv4Addr = start.trim().parse().map_err(|_| format!("invalid IPv4 address: {}", start.trim()))?;
        let end: Ipv4Addr = end.trim().parse().map_err(|_| format!("invalid IPv4 address: {}", end.trim()))?;
        if start > end {
            return Err(format!("range start {} is greater than end {}", start, end));
        }
        Ok(Ipv4Range { start, end })
    }
}

impl fmt::Display for Ipv4Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

pub fn is_valid_ipv4(s: &str) -> bool {
    s.trim().parse::<Ipv4Addr>().is_ok()
}

/// Names of the previously accepted ranges that intersect `range`, in insertion order.
pub fn overlapping_ranges<'a, I>(range: &Ipv4Range, accepted: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a String, &'a Ipv4Range)>,
{
    accepted
        .into_iter()
        .filter(|(_, other)| range.overlaps(other))
        .map(|(name, _)| name.clone())
        .collect()
}

// ==============================================================================================================
// SWITCH PORTS
// ==============================================================================================================

/// One switch port position. A plain port `N` spans all of its breakout
/// sub-ports, a breakout port `N:M` is a single position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct PortPos {
    port: u32,
    sub: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PortSpan {
    first: PortPos,
    last: PortPos,
}

impl PortSpan {
    fn overlaps(&self, other: &PortSpan) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// A comma separated switch port list such as `1-10,12,15:1-15:4`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PortSet {
    spans: Vec<PortSpan>,
    reversed: bool,
}

impl PortSet {
    /// True when every range is written low to high.
    pub fn ranges_ordered(&self) -> bool {
        !self.reversed
    }

    pub fn overlaps(&self, other: &PortSet) -> bool {
        self.spans.iter().any(|a| other.spans.iter().any(|b| a.overlaps(b)))
    }

    /// True when two entries inside this one list cover the same port.
    pub fn has_internal_overlap(&self) -> bool {
        for (i, a) in self.spans.iter().enumerate() {
            if self.spans[i + 1..].iter().any(|b| a.overlaps(b)) {
                return true;
            }
        }
        false
    }

    pub fn merge(&mut self, other: &PortSet) {
        self.spans.extend(other.spans.iter().copied());
        self.reversed = self.reversed || other.reversed;
    }
}

fn parse_position(token: &str) -> Result<(u32, Option<u32>), String> {
    let token = token.trim();
    let parse = |t: &str| t.trim().parse::<u32>().map_err(|_| format!("invalid port: {}", token));
    match token.split_once(':') {
        Some((port, sub)) => Ok((parse(port)?, Some(parse(sub)?))),
        None => Ok((parse(token)?, None)),
    }
}

impl FromStr for PortSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = PortSet::default();
        for token in s.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (a, b) = match token.split_once('-') {
                Some((a, b)) => (parse_position(a)?, parse_position(b)?),
                None => {
                    let p = parse_position(token)?;
                    (p, p)
                }
            };
            // ordering is judged on what the user wrote, not on the expanded span
            let (lo, hi) = if (a.0, a.1.unwrap_or(0)) > (b.0, b.1.unwrap_or(0)) {
                set.reversed = true;
                (b, a)
            } else {
                (a, b)
            };
            set.spans.push(PortSpan {
                first: PortPos { port: lo.0, sub: lo.1.unwrap_or(0) },
                last: PortPos { port: hi.0, sub: hi.1.unwrap_or(u32::MAX) },
            });
        }
        if set.spans.is_empty() {
            return Err(String::from("no switch ports given"));
        }
        Ok(set)
    }
}

/// False when the list does not parse or any range runs high to low.
pub fn check_port_ranges(ports: &str) -> bool {
    match ports.parse::<PortSet>() {
        Ok(set) => set.ranges_ordered(),
        Err(_) => false,
    }
}
