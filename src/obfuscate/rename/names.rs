use std::collections::HashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use swc_core::ecma::atoms::JsWord;
use crate::options::{ConfigurationError, IdentifierNamesGenerator, Options};

/// Words that can never be used as a binding name.
const RESERVED_WORDS: &[&str] = &[
    "abstract", "arguments", "await", "boolean", "break", "byte", "case", "catch", "char",
    "class", "const", "continue", "debugger", "default", "delete", "do", "double", "else",
    "enum", "eval", "export", "extends", "false", "final", "finally", "float", "for",
    "function", "goto", "if", "implements", "import", "in", "instanceof", "int",
    "interface", "let", "long", "native", "new", "null", "package", "private", "protected",
    "public", "return", "short", "static", "super", "switch", "synchronized", "this",
    "throw", "throws", "transient", "true", "try", "typeof", "var", "void", "volatile",
    "while", "with", "yield", "undefined", "NaN", "Infinity", "globalThis"
];

const MANGLED_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Produces candidate identifier names in the configured style.
///
/// Every call to [NameGenerator::sequence] starts over from the beginning,
/// so the same candidates can be offered to sibling scopes.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    style: IdentifierNamesGenerator,
    prefix: String,
    dictionary: Vec<String>,
    seed: u64
}

impl NameGenerator {
    pub fn new(options: &Options, seed: u64) -> Self {
        Self {
            style: options.identifier_names_generator,
            prefix: options.identifiers_prefix.clone(),
            dictionary: options.identifiers_dictionary.clone(),
            seed
        }
    }

    /// Returns a fresh sequence of candidates.
    pub fn sequence(&self) -> NameSequence<'_> {
        let state = match self.style {
            IdentifierNamesGenerator::Hexadecimal => SequenceState::Hexadecimal(StdRng::seed_from_u64(self.seed)),
            IdentifierNamesGenerator::Mangled => SequenceState::Mangled(0),
            IdentifierNamesGenerator::Dictionary => SequenceState::Dictionary(0)
        };

        NameSequence {
            generator: self,
            state
        }
    }
}

#[derive(Debug)]
enum SequenceState {
    Hexadecimal(StdRng),
    Mangled(usize),
    Dictionary(usize)
}

/// A lazy sequence of candidate names. Hexadecimal and mangled sequences are unbounded.
#[derive(Debug)]
pub struct NameSequence<'a> {
    generator: &'a NameGenerator,
    state: SequenceState
}

/// Converts `index` to a bijective base-52 name (`a`, ..., `Z`, `aa`, ...).
fn mangled_name(mut index: usize) -> String {
    let base = MANGLED_ALPHABET.len();
    let mut name = Vec::new();
    loop {
        name.push(MANGLED_ALPHABET[index % base]);
        if index < base {
            break;
        }
        index = index / base - 1;
    }
    name.reverse();

    String::from_utf8(name).unwrap_or_default()
}

impl<'a> Iterator for NameSequence<'a> {
    type Item = JsWord;

    fn next(&mut self) -> Option<Self::Item> {
        let name = match &mut self.state {
            SequenceState::Hexadecimal(rng) => format!("_0x{:x}", rng.gen_range(0x1000..0x1000000u32)),
            SequenceState::Mangled(index) => {
                let name = mangled_name(*index);
                *index += 1;
                name
            },
            SequenceState::Dictionary(index) => {
                let name = self.generator.dictionary.get(*index)?.clone();
                *index += 1;
                name
            }
        };

        let mut prefixed = self.generator.prefix.clone();
        prefixed.push_str(&name);

        Some(JsWord::from(prefixed))
    }
}

/// Tracks every name in use during one run and hands out fresh names
/// for synthesized declarations.
#[derive(Debug)]
pub struct NameRegistry {
    generator: NameGenerator,

    /// Names that no generated name may take: reserved words, configured
    /// reserved names and every identifier name found in the source.
    taken: HashSet<JsWord>,

    /// Names configured as reserved. Bindings with these names are never renamed.
    reserved: HashSet<JsWord>,

    /// Position in the generator sequence for [NameRegistry::fresh].
    /// Restarting would offer names that are already taken.
    fresh_position: usize
}

impl NameRegistry {
    pub fn new(options: &Options, seed: u64) -> Self {
        let reserved: HashSet<JsWord> = options.reserved_names
            .iter()
            .map(|name| JsWord::from(name.as_str()))
            .collect();

        let mut taken: HashSet<JsWord> = RESERVED_WORDS
            .iter()
            .map(|word| JsWord::from(*word))
            .collect();
        taken.extend(reserved.iter().cloned());

        Self {
            generator: NameGenerator::new(options, seed),
            taken,
            reserved,
            fresh_position: 0
        }
    }

    pub fn generator(&self) -> &NameGenerator {
        &self.generator
    }

    /// Marks a name as used anywhere in the program.
    pub fn reserve(&mut self, name: JsWord) {
        self.taken.insert(name);
    }

    pub fn is_taken(&self, name: &JsWord) -> bool {
        self.taken.contains(name)
    }

    /// Whether the name was reserved through configuration.
    pub fn is_reserved(&self, name: &JsWord) -> bool {
        self.reserved.contains(name)
    }

    /// Returns a name that is used nowhere in the program and reserves it.
    pub fn fresh(&mut self) -> Result<JsWord, ConfigurationError> {
        let mut sequence = self.generator.sequence().skip(self.fresh_position);
        loop {
            let candidate = sequence.next().ok_or(ConfigurationError::NameSupplierExhausted)?;
            self.fresh_position += 1;

            if !self.taken.contains(&candidate) {
                self.taken.insert(candidate.clone());
                return Ok(candidate);
            }
        }
    }
}
