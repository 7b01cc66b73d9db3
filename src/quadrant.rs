//! The four Competing Values quadrants and the score vector keyed by them.
//!
//! Every instrument in this crate scores the same four categories. The
//! source-neutral names map onto the classic framework as
//! Collaborate = Clan, Create = Adhocracy, Compete = Market and
//! Control = Hierarchy; the classic names are accepted when deserializing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four fixed culture/leadership categories.
///
/// The declaration order is the canonical order used for iteration and for
/// breaking ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quadrant {
    #[serde(alias = "Clan")]
    Collaborate,
    #[serde(alias = "Adhocracy")]
    Create,
    #[serde(alias = "Market")]
    Compete,
    #[serde(alias = "Hierarchy")]
    Control,
}

impl Quadrant {
    /// All quadrants in canonical order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::Collaborate,
        Quadrant::Create,
        Quadrant::Compete,
        Quadrant::Control,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::Collaborate => "Collaborate",
            Quadrant::Create => "Create",
            Quadrant::Compete => "Compete",
            Quadrant::Control => "Control",
        }
    }

    /// Report label, as shown on charts and in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::Collaborate => "Clã (Colaborar)",
            Quadrant::Create => "Adhocracia (Criar)",
            Quadrant::Compete => "Mercado (Competir)",
            Quadrant::Control => "Hierarquia (Controlar)",
        }
    }

    /// First word of the label, used for compact badges.
    pub fn short_label(&self) -> &'static str {
        self.label().split(' ').next().unwrap_or(self.as_str())
    }

    pub fn color(&self) -> &'static str {
        match self {
            Quadrant::Collaborate => "#6a8e87",
            Quadrant::Create => "#f7a53e",
            Quadrant::Compete => "#e54a41",
            Quadrant::Control => "#4b6a9e",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Quadrant::Collaborate => 0,
            Quadrant::Create => 1,
            Quadrant::Compete => 2,
            Quadrant::Control => 3,
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete four-quadrant score vector.
///
/// Two numeric domains share this shape: CVF sets hold percentage-share
/// averages in [0, 100], CVCQ sets hold mean ratings in [1, 7] (0 meaning no
/// ratings were recorded for that quadrant).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSet {
    #[serde(rename = "Collaborate", alias = "Clan")]
    pub collaborate: f64,
    #[serde(rename = "Create", alias = "Adhocracy")]
    pub create: f64,
    #[serde(rename = "Compete", alias = "Market")]
    pub compete: f64,
    #[serde(rename = "Control", alias = "Hierarchy")]
    pub control: f64,
}

impl ScoreSet {
    pub fn new(collaborate: f64, create: f64, compete: f64, control: f64) -> Self {
        Self {
            collaborate,
            create,
            compete,
            control,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn from_fn(mut f: impl FnMut(Quadrant) -> f64) -> Self {
        Self::new(
            f(Quadrant::Collaborate),
            f(Quadrant::Create),
            f(Quadrant::Compete),
            f(Quadrant::Control),
        )
    }

    pub fn get(&self, quadrant: Quadrant) -> f64 {
        match quadrant {
            Quadrant::Collaborate => self.collaborate,
            Quadrant::Create => self.create,
            Quadrant::Compete => self.compete,
            Quadrant::Control => self.control,
        }
    }

    pub fn set(&mut self, quadrant: Quadrant, value: f64) {
        match quadrant {
            Quadrant::Collaborate => self.collaborate = value,
            Quadrant::Create => self.create = value,
            Quadrant::Compete => self.compete = value,
            Quadrant::Control => self.control = value,
        }
    }

    /// Values in canonical quadrant order.
    pub fn iter(&self) -> impl Iterator<Item = (Quadrant, f64)> + '_ {
        Quadrant::ALL.into_iter().map(move |q| (q, self.get(q)))
    }

    pub fn total(&self) -> f64 {
        self.collaborate + self.create + self.compete + self.control
    }

    pub fn add(&self, other: &ScoreSet) -> ScoreSet {
        ScoreSet::from_fn(|q| self.get(q) + other.get(q))
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|(_, v)| v.is_finite())
    }

    /// Whether `quadrant` carries a rating. Only meaningful for CVCQ sets,
    /// where 0 is reserved for "no ratings recorded".
    pub fn has_data(&self, quadrant: Quadrant) -> bool {
        self.get(quadrant) != 0.0
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.collaborate, self.create, self.compete, self.control]
    }

    /// Round each value to two decimals, as displayed on charts.
    pub fn rounded(&self) -> ScoreSet {
        ScoreSet::from_fn(|q| (self.get(q) * 100.0).round() / 100.0)
    }
}
