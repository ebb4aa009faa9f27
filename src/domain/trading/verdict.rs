use serde::{Deserialize, Serialize};
use std::fmt;

/// Action derived from the predicted probability of a price increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Buy,
    HoldOrWait,
}

impl Verdict {
    pub fn is_buy(&self) -> bool {
        matches!(self, Verdict::Buy)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Buy => write!(f, "BUY"),
            Verdict::HoldOrWait => write!(f, "HOLD or WAIT"),
        }
    }
}

/// Outcome of comparing the current adjusted price with a sell target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetCheck {
    pub target_price: f64,
    pub current_price: f64,
    pub reached: bool,
}

/// Message handed to an `AlertNotifier` once a target has been reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAlert {
    pub ticker: String,
    pub target_price: f64,
    pub current_price: f64,
}

impl TargetAlert {
    pub fn subject(&self) -> String {
        format!(
            "Sell Alert: {} has hit ${:.2}",
            self.ticker, self.current_price
        )
    }

    pub fn body(&self) -> String {
        format!(
            "{} has reached the target price of ${:.2}. Current price is ${:.2}. Consider selling.",
            self.ticker, self.target_price, self.current_price
        )
    }
}
