use std::fmt;

/// A marker type to indicate that a read timed out.
#[derive(Debug)]
pub struct TimedOut;

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("timed out")
    }
}

impl std::error::Error for TimedOut {}

/// A marker type to indicate that the exchange task went away without answering.
#[derive(Debug)]
pub struct ExchangeAbandoned;

impl fmt::Display for ExchangeAbandoned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("exchange task ended without producing a response")
    }
}

impl std::error::Error for ExchangeAbandoned {}
