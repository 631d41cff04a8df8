//! Capability tracking for request descriptions and backends
//!
//! A request records the backend features it needs (streaming bodies,
//! websockets) in a type parameter. Backends declare what they provide the
//! same way, and [`Supports`] ties the two together so that sending a
//! streaming request to a capability-less backend does not type-check.

use std::fmt;

mod sealed {
    pub trait Sealed {}
}

/// Runtime view of a capability set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet {
    pub streaming: bool,
    pub websockets: bool,
}

impl CapabilitySet {
    pub const NONE: CapabilitySet = CapabilitySet {
        streaming: false,
        websockets: false,
    };
    pub const STREAMING: CapabilitySet = CapabilitySet {
        streaming: true,
        websockets: false,
    };
    pub const WEBSOCKETS: CapabilitySet = CapabilitySet {
        streaming: false,
        websockets: true,
    };
    pub const ALL: CapabilitySet = CapabilitySet {
        streaming: true,
        websockets: true,
    };

    /// True when every capability in `other` is also in `self`.
    #[must_use]
    pub const fn contains(self, other: CapabilitySet) -> bool {
        (self.streaming || !other.streaming) && (self.websockets || !other.websockets)
    }

    #[must_use]
    pub const fn union(self, other: CapabilitySet) -> CapabilitySet {
        CapabilitySet {
            streaming: self.streaming || other.streaming,
            websockets: self.websockets || other.websockets,
        }
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.streaming, self.websockets) {
            (false, false) => f.write_str("{}"),
            (true, false) => f.write_str("{streaming}"),
            (false, true) => f.write_str("{websockets}"),
            (true, true) => f.write_str("{streaming, websockets}"),
        }
    }
}

/// A compile-time capability set.
pub trait Capabilities: sealed::Sealed + Send + Sync + 'static {
    const SET: CapabilitySet;
}

/// No backend features required.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapabilities;

/// Streaming request or response bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Streaming;

/// Websocket responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSockets;

/// Both streaming and websockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingAndWebSockets;

macro_rules! capabilities {
    ($($ty:ty => $set:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Capabilities for $ty {
                const SET: CapabilitySet = $set;
            }
        )*
    };
}

capabilities! {
    NoCapabilities => CapabilitySet::NONE,
    Streaming => CapabilitySet::STREAMING,
    WebSockets => CapabilitySet::WEBSOCKETS,
    StreamingAndWebSockets => CapabilitySet::ALL,
}

/// Type-level union of two capability sets.
pub trait Union<Rhs: Capabilities>: Capabilities {
    type Output: Capabilities;
}

macro_rules! union {
    ($($lhs:ty, $rhs:ty => $out:ty;)*) => {
        $(
            impl Union<$rhs> for $lhs {
                type Output = $out;
            }
        )*
    };
}

union! {
    NoCapabilities, NoCapabilities => NoCapabilities;
    NoCapabilities, Streaming => Streaming;
    NoCapabilities, WebSockets => WebSockets;
    NoCapabilities, StreamingAndWebSockets => StreamingAndWebSockets;
    Streaming, NoCapabilities => Streaming;
    Streaming, Streaming => Streaming;
    Streaming, WebSockets => StreamingAndWebSockets;
    Streaming, StreamingAndWebSockets => StreamingAndWebSockets;
    WebSockets, NoCapabilities => WebSockets;
    WebSockets, Streaming => StreamingAndWebSockets;
    WebSockets, WebSockets => WebSockets;
    WebSockets, StreamingAndWebSockets => StreamingAndWebSockets;
    StreamingAndWebSockets, NoCapabilities => StreamingAndWebSockets;
    StreamingAndWebSockets, Streaming => StreamingAndWebSockets;
    StreamingAndWebSockets, WebSockets => StreamingAndWebSockets;
    StreamingAndWebSockets, StreamingAndWebSockets => StreamingAndWebSockets;
}

/// Implemented when the capability set `Self` includes `R`.
pub trait Supports<R: Capabilities>: Capabilities {}

macro_rules! supports {
    ($($provided:ty => [$($required:ty),*];)*) => {
        $($(impl Supports<$required> for $provided {})*)*
    };
}

supports! {
    NoCapabilities => [NoCapabilities];
    Streaming => [NoCapabilities, Streaming];
    WebSockets => [NoCapabilities, WebSockets];
    StreamingAndWebSockets => [NoCapabilities, Streaming, WebSockets, StreamingAndWebSockets];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn union_set<A: Union<B>, B: Capabilities>() -> CapabilitySet {
        <A as Union<B>>::Output::SET
    }

    #[test]
    fn union_matches_runtime_union() {
        assert_eq!(union_set::<NoCapabilities, Streaming>(), CapabilitySet::STREAMING);
        assert_eq!(union_set::<Streaming, WebSockets>(), CapabilitySet::ALL);
        assert_eq!(union_set::<WebSockets, WebSockets>(), CapabilitySet::WEBSOCKETS);
        assert_eq!(
            CapabilitySet::STREAMING.union(CapabilitySet::WEBSOCKETS),
            CapabilitySet::ALL
        );
    }

    #[test]
    fn containment() {
        assert!(CapabilitySet::ALL.contains(CapabilitySet::STREAMING));
        assert!(CapabilitySet::STREAMING.contains(CapabilitySet::NONE));
        assert!(!CapabilitySet::NONE.contains(CapabilitySet::WEBSOCKETS));
        assert!(!CapabilitySet::STREAMING.contains(CapabilitySet::ALL));
    }

    #[test]
    fn display_lists_members() {
        assert_eq!(CapabilitySet::ALL.to_string(), "{streaming, websockets}");
        assert_eq!(CapabilitySet::NONE.to_string(), "{}");
    }
}
