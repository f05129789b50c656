use core::fmt;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::str::FromStr;

pub const MAX_CLOSENESS: u8 = 100;

/// Feedback a guess would produce against a hypothetical target.
#[derive(
    Copy, Clone, Debug, SerializeDisplay, DeserializeFromStr, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum FeedbackCode {
    Adjacent,
    Closeness(u8),
}

impl FeedbackCode {
    /// Number of distinct codes: `Adjacent` plus closeness scores `0..=100`.
    pub const COUNT: usize = MAX_CLOSENESS as usize + 2;

    pub fn to_ind(&self) -> usize {
        match *self {
            FeedbackCode::Adjacent => 0,
            FeedbackCode::Closeness(score) => score as usize + 1,
        }
    }

    pub fn from_ind(ind: usize) -> Option<Self> {
        match ind {
            0 => Some(FeedbackCode::Adjacent),
            i if i < Self::COUNT => Some(FeedbackCode::Closeness((i - 1) as u8)),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        (0..Self::COUNT).filter_map(Self::from_ind).collect()
    }
}

impl FromStr for FeedbackCode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "a" | "adj" | "adjacent" => Ok(FeedbackCode::Adjacent),
            other => match other.parse::<u8>() {
                Ok(score) if score <= MAX_CLOSENESS => Ok(FeedbackCode::Closeness(score)),
                Ok(_) => Err("Closeness out of range"),
                Err(_) => Err("Wrong feedback code"),
            },
        }
    }
}

impl fmt::Display for FeedbackCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackCode::Adjacent => write!(f, "A"),
            FeedbackCode::Closeness(score) => write!(f, "{score}"),
        }
    }
}

/// A real reading reported by whoever is playing the game.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Feedback {
    Adjacent,
    Distance { miles: f64 },
}

impl Feedback {
    /// `miles` is ignored when `is_adjacent` holds.
    pub fn new(is_adjacent: bool, miles: f64) -> Self {
        if is_adjacent {
            Feedback::Adjacent
        } else {
            Feedback::Distance { miles }
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Adjacent => write!(f, "adjacent"),
            Feedback::Distance { miles } => write!(f, "{miles:.0} mi"),
        }
    }
}
