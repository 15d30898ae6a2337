use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use crate::StructuralError;
use super::StringArrayPool;

/// Number of marker entries appended to the pool.
const MARKERS: usize = 3;

/// Attempts to find a rotation count that the comparator stops at.
const ATTEMPTS: usize = 32;

/// A numeric-prefixed pool entry read by the comparator.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Index of the entry in the unrotated pool.
    pub index: usize,
    pub divisor: f64,

    /// Whether the term is subtracted from the checksum.
    pub negative: bool
}

/// JS `WhiteSpace` and `LineTerminator` code points.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{9}' | '\u{a}' | '\u{b}' | '\u{c}' | '\u{d}' | ' ' | '\u{a0}' | '\u{1680}'
            | '\u{2000}'..='\u{200a}' | '\u{2028}' | '\u{2029}' | '\u{202f}' | '\u{205f}'
            | '\u{3000}' | '\u{feff}'
    )
}

/// Emulates the global `parseInt` with a single argument.
pub fn parse_int(value: &str) -> f64 {
    let trimmed = value.trim_start_matches(is_js_whitespace);
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1.0, &trimmed[1..]),
        Some(b'+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed)
    };

    let hex = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"));
    let (digits, radix) = match hex {
        Some(v) => (v, 16),
        None => (rest, 10)
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return f64::NAN;
    }

    let magnitude = match radix {
        10 => digits.parse::<f64>().unwrap_or(f64::NAN),
        _ => digits.chars()
            .filter_map(|c| c.to_digit(16))
            .fold(0.0, |acc, digit| acc * 16.0 + digit as f64)
    };

    sign * magnitude
}

/// State of the comparator loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ComparatorState {
    /// About to evaluate the checksum after `shifts` rotations.
    Probe {
        shifts: usize
    },

    /// The checksum did not match, the array rotates left once.
    Rotate {
        shifts: usize
    },

    /// The checksum matched, the array is aligned.
    Aligned {
        shifts: usize
    }
}

/// Mirrors the emitted comparator: evaluates the checksum over the marker
/// entries and rotates the array left until it equals the control value.
#[derive(Debug, Clone)]
pub struct Comparator<'a> {
    pub markers: &'a [Marker],
    pub control: f64
}

impl<'a> Comparator<'a> {
    /// The checksum of `array` as currently rotated.
    /// Evaluated in the same order as the emitted expression.
    pub fn checksum(&self, array: &[String]) -> f64 {
        self.markers.iter().fold(0.0, |sum, marker| {
            let value = array.get(marker.index).map_or(f64::NAN, |v| parse_int(v));
            let value = if marker.negative { -value } else { value };
            sum + value / marker.divisor
        })
    }

    /// Advances `state` by one step. `array` is rotated in place.
    pub fn step(&self, state: ComparatorState, array: &mut Vec<String>) -> ComparatorState {
        match state {
            ComparatorState::Probe { shifts } => {
                if self.checksum(array) == self.control {
                    ComparatorState::Aligned { shifts }
                } else {
                    ComparatorState::Rotate { shifts }
                }
            },
            ComparatorState::Rotate { shifts } => {
                array.rotate_left(1);
                ComparatorState::Probe { shifts: shifts + 1 }
            },
            aligned => aligned
        }
    }

    /// Runs the loop on `array` for at most `limit` rotations.
    /// Returns the number of rotations at which it stopped.
    pub fn run(&self, mut array: Vec<String>, limit: usize) -> Option<usize> {
        let mut state = ComparatorState::Probe { shifts: 0 };
        loop {
            state = self.step(state, &mut array);
            match state {
                ComparatorState::Aligned { shifts } => return Some(shifts),
                ComparatorState::Probe { shifts } if shifts > limit => return None,
                _ => {}
            }
        }
    }
}

/// How the emitted array is rotated and how the runtime restores it.
#[derive(Debug, Clone)]
pub struct Rotation {
    /// The array is emitted rotated right by this amount.
    pub count: usize,
    pub markers: Vec<Marker>,
    pub control: f64
}

impl Rotation {
    /// Appends marker entries to `pool` and picks a rotation count that the
    /// comparator provably stops at, and at no earlier shift.
    pub fn plan(pool: &mut StringArrayPool, rng: &mut StdRng) -> Result<Self, StructuralError> {
        let mut markers = Vec::with_capacity(MARKERS);
        let mut control = 0.0;
        for i in 0..MARKERS {
            let divisor = rng.gen_range(2..=12) as f64;
            let quotient = rng.gen_range(1_000..100_000) as f64;
            let suffix: String = (0..rng.gen_range(4..=7))
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .filter(|c| c.is_ascii_alphabetic())
                .collect();
            let negative = i % 2 == 1;

            let index = pool.insert(&format!("{}{}x", divisor * quotient, suffix));
            control += if negative { -quotient } else { quotient };
            markers.push(Marker {
                index,
                divisor,
                negative
            });
        }

        let values = pool.values().to_vec();
        let n = values.len();
        for _ in 0..ATTEMPTS {
            let count = rng.gen_range(1..n);
            let mut emitted = values.clone();
            emitted.rotate_right(count);

            let comparator = Comparator {
                markers: &markers,
                control
            };
            if comparator.run(emitted, n) == Some(count) {
                return Ok(Self {
                    count,
                    markers,
                    control
                });
            }
        }

        Err(StructuralError::RotationUnverifiable)
    }

    /// The array literal order: `values` rotated right by [Rotation::count].
    pub fn apply(&self, values: &[String]) -> Vec<String> {
        let mut emitted = values.to_vec();
        let len = emitted.len().max(1);
        emitted.rotate_right(self.count % len);
        emitted
    }
}
