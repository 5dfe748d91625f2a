//! Per-direction traffic counters.

use std::fmt;

/// One of the two independent relay channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Bytes received on connection 1, written to connection 2.
    FirstToSecond,
    /// Bytes received on connection 2, written to connection 1.
    SecondToFirst,
}

impl Direction {
    pub const BOTH: [Self; 2] = [Self::FirstToSecond, Self::SecondToFirst];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstToSecond => f.write_str("1->2"),
            Self::SecondToFirst => f.write_str("2->1"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionStats {
    /// Bytes written to the destination endpoint.
    pub forwarded_bytes: u64,
    /// Number of drains forwarded.
    pub forwards: u64,
    /// Bytes copied to the sniff endpoint.
    pub mirrored_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub first_to_second: DirectionStats,
    pub second_to_first: DirectionStats,
    /// Ticks executed since the engine was created.
    pub ticks: u64,
}

impl RelayStats {
    pub const fn direction(&self, direction: Direction) -> &DirectionStats {
        match direction {
            Direction::FirstToSecond => &self.first_to_second,
            Direction::SecondToFirst => &self.second_to_first,
        }
    }

    pub(crate) const fn direction_mut(&mut self, direction: Direction) -> &mut DirectionStats {
        match direction {
            Direction::FirstToSecond => &mut self.first_to_second,
            Direction::SecondToFirst => &mut self.second_to_first,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_lookup_matches_field() {
        let mut stats = RelayStats::default();
        stats.direction_mut(Direction::SecondToFirst).forwarded_bytes = 7;

        assert_eq!(stats.second_to_first.forwarded_bytes, 7);
        assert_eq!(stats.direction(Direction::FirstToSecond).forwarded_bytes, 0);
    }

    #[test]
    fn direction_display() {
        assert_eq!(Direction::FirstToSecond.to_string(), "1->2");
        assert_eq!(Direction::SecondToFirst.to_string(), "2->1");
    }
}
