use std::fmt::Display;

macro_rules! decl_clamped_float {
    {
        $(#[$meta:meta])*
        $name:ident in $min:literal..$max:literal, slider $smin:literal..$smax:literal / $scale:literal
    } => {
        $(#[$meta])*
        #[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
        pub struct $name(f64);

        impl $name {
            /// The smallest slider position.
            pub const SLIDER_MIN: i32 = $smin;
            /// The largest slider position.
            pub const SLIDER_MAX: i32 = $smax;

            /// Clamps the given value to the interval
            #[doc = concat!("[", stringify!($min), ", ", stringify!($max), "]")]
            /// and constructs a new instance from it. `NaN` is treated as the lower bound.
            pub fn new(value: f64) -> Self {
                if value.is_nan() {
                    return Self($min);
                }
                Self(value.clamp($min, $max))
            }

            /// Converts an integer slider position to the normalized value by dividing it by
            #[doc = concat!(stringify!($scale), ".")]
            pub fn from_slider(position: i32) -> Self {
                Self::new(f64::from(position.clamp($smin, $smax)) / $scale)
            }

            /// Returns the slider position closest to this value.
            pub fn to_slider(&self) -> i32 {
                (self.0 * $scale).round() as i32
            }

            /// Returns the value encapsulated by this instance.
            pub fn value(&self) -> f64 {
                self.0
            }
        }

        impl From<f64> for $name {
            fn from(source: f64) -> Self {
                Self::new(source)
            }
        }

        impl From<$name> for f64 {
            fn from(source: $name) -> Self {
                source.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

decl_clamped_float! {
    /// Voice pitch, represented as a value in the interval [-1, 1], with 0 being normal pitch.
    Pitch in -1.0..1.0, slider -10..10 / 10.0
}

decl_clamped_float! {
    /// Speech rate, represented as a value in the interval [-1, 1], with 0 being normal speed.
    Rate in -1.0..1.0, slider -10..10 / 10.0
}

decl_clamped_float! {
    /// Voice volume, represented as a value in the interval [0, 1], with 1 being full volume.
    Volume in 0.0..1.0, slider 0..100 / 100.0
}

impl Default for Pitch {
    fn default() -> Self {
        Self(0.0)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self(0.0)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(0.7)
    }
}

/// Where speech may be interrupted when it is stopped or paused.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Default)]
pub enum BoundaryHint {
    /// Interrupt right away.
    #[default]
    Immediate,
    /// Finish the word being spoken.
    Word,
    /// Finish the sentence being spoken.
    Sentence,
    /// Finish the whole utterance.
    Utterance,
}
