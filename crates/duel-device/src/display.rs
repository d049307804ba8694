//! Display indicator model.
//!
//! The reference device has a 5x5 LED matrix. The trigger logic only decides
//! *what* to show; rendering is left to the embedding (real matrix, console,
//! or nothing in tests).

/// What the device display should currently show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayIndicator {
    /// Start-up banner, shown once at power-on.
    Banner,
    /// Idle, no round requested.
    Awaiting,
    /// A round was requested and is about to arm.
    GetReady,
    /// Armed, waiting out the host's fairness delay.
    Armed,
    /// Live window open, first press wins.
    Live,
}

impl DisplayIndicator {
    /// Scrolling text for the text-based indicators.
    pub fn text(&self) -> Option<&'static str> {
        match self {
            DisplayIndicator::Banner => Some("RXN DUEL!"),
            DisplayIndicator::Awaiting => Some("Awaiting"),
            DisplayIndicator::GetReady => Some("Get Ready!"),
            _ => None,
        }
    }

    /// LED rows for the pattern-based indicators.
    ///
    /// Armed is a single centre dot; live is the full cross.
    pub fn leds(&self) -> Option<[[bool; 5]; 5]> {
        const O: bool = false;
        const X: bool = true;
        match self {
            DisplayIndicator::Armed => Some([
                [O, O, O, O, O],
                [O, O, O, O, O],
                [O, O, X, O, O],
                [O, O, O, O, O],
                [O, O, O, O, O],
            ]),
            DisplayIndicator::Live => Some([
                [X, O, O, O, X],
                [O, X, O, X, O],
                [O, O, X, O, O],
                [O, X, O, X, O],
                [X, O, O, O, X],
            ]),
            _ => None,
        }
    }
}
