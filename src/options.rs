use std::fmt::{Display, Formatter};
use swc_core::ecma::ast::Ident;

/// How the source text should be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceType {
    /// A classic script. Top-level declarations live in the global scope.
    #[default]
    Script,

    /// An ES module. Top-level declarations live in the module scope.
    Module
}

/// The style of generated identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierNamesGenerator {
    /// Names like `_0x3fa2c1`.
    #[default]
    Hexadecimal,

    /// Short names like `a`, `b`, ..., `aa`.
    Mangled,

    /// Names taken from [Options::identifiers_dictionary].
    /// This sequence is finite and may run out.
    Dictionary
}

/// The encoding applied to every pooled string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringArrayEncoding {
    #[default]
    None,
    Base64,
    Rc4
}

/// Obfuscation options.
///
/// Deserializes from camelCase JSON, every field is optional.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Seed for every randomized decision. `0` picks a random seed.
    pub seed: u64,

    pub source_type: SourceType,

    pub identifier_names_generator: IdentifierNamesGenerator,

    /// Candidate names for [IdentifierNamesGenerator::Dictionary].
    pub identifiers_dictionary: Vec<String>,

    /// Prepended to every generated identifier name.
    pub identifiers_prefix: String,

    /// Rename bindings declared in the global scope (and non-import
    /// bindings of the module scope).
    pub rename_globals: bool,

    /// Identifier names that are never renamed and never generated.
    pub reserved_names: Vec<String>,

    /// String values that are never split or pooled (exact match).
    pub reserved_strings: Vec<String>,

    pub string_array: bool,
    pub string_array_threshold: f64,
    pub string_array_encoding: StringArrayEncoding,

    /// Key for [StringArrayEncoding::Rc4]. Generated when absent.
    pub string_array_encoding_key: Option<String>,

    /// Offset accessor call sites by a random amount.
    pub string_array_index_shift: bool,

    pub rotate_string_array: bool,

    pub split_strings: bool,

    /// Maximum number of user-perceived characters per chunk.
    /// Signed so that invalid values can be rejected instead of wrapping.
    pub split_strings_chunk_length: i64,

    pub control_flow_flattening: bool,
    pub control_flow_flattening_threshold: f64,

    pub dead_code_injection: bool,
    pub dead_code_injection_threshold: f64,

    /// Emit every string literal as `\xNN`/`\uNNNN` escapes.
    pub unicode_escape_sequence: bool
}

impl Default for Options {
    fn default() -> Self {
        Self {
            seed: 0,
            source_type: SourceType::Script,
            identifier_names_generator: IdentifierNamesGenerator::Hexadecimal,
            identifiers_dictionary: Vec::new(),
            identifiers_prefix: String::new(),
            rename_globals: false,
            reserved_names: Vec::new(),
            reserved_strings: Vec::new(),
            string_array: true,
            string_array_threshold: 0.75,
            string_array_encoding: StringArrayEncoding::None,
            string_array_encoding_key: None,
            string_array_index_shift: true,
            rotate_string_array: true,
            split_strings: false,
            split_strings_chunk_length: 10,
            control_flow_flattening: false,
            control_flow_flattening_threshold: 0.75,
            dead_code_injection: false,
            dead_code_injection_threshold: 0.4,
            unicode_escape_sequence: false
        }
    }
}

impl Options {
    /// Options with every pass that adds nodes switched off.
    /// Only identifier renaming and member expression conversion remain.
    pub fn no_additional_nodes() -> Self {
        Self {
            string_array: false,
            string_array_index_shift: false,
            rotate_string_array: false,
            ..Self::default()
        }
    }

    /// Parses options from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validates option values. Runs before any pass.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (option, value) in [
            ("stringArrayThreshold", self.string_array_threshold),
            ("controlFlowFlatteningThreshold", self.control_flow_flattening_threshold),
            ("deadCodeInjectionThreshold", self.dead_code_injection_threshold)
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::InvalidThreshold { option, value });
            }
        }

        if self.split_strings && self.split_strings_chunk_length <= 0 {
            return Err(ConfigurationError::NonPositiveChunkLength(self.split_strings_chunk_length));
        }

        let mut prefix = self.identifiers_prefix.chars();
        let valid_prefix = match prefix.next() {
            Some(first) => Ident::is_valid_start(first) && prefix.all(Ident::is_valid_continue),
            None => true
        };
        if !valid_prefix {
            return Err(ConfigurationError::InvalidIdentifiersPrefix(self.identifiers_prefix.clone()));
        }

        if let Some(key) = &self.string_array_encoding_key {
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigurationError::MalformedEncodingKey(key.clone()));
            }
        }

        if self.identifier_names_generator == IdentifierNamesGenerator::Dictionary
            && self.identifiers_dictionary.is_empty() {
            return Err(ConfigurationError::EmptyDictionary);
        }

        Ok(())
    }
}

/// An invalid option value, or a name supplier that ran out of names.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A threshold outside of `[0, 1]`.
    InvalidThreshold {
        option: &'static str,
        value: f64
    },

    /// `splitStringsChunkLength` is zero or negative.
    NonPositiveChunkLength(i64),

    /// `identifiersPrefix` cannot start an identifier.
    InvalidIdentifiersPrefix(String),

    /// The RC4 key is empty or contains characters other than ASCII letters and digits.
    MalformedEncodingKey(String),

    /// The dictionary generator was selected without any names.
    EmptyDictionary,

    /// The name sequence ended before every binding received a name.
    NameSupplierExhausted
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidThreshold { option, value } =>
                write!(f, "validation failed: {} must be within [0, 1], got {}", option, value),
            Self::NonPositiveChunkLength(length) =>
                write!(f, "validation failed: splitStringsChunkLength must be positive, got {}", length),
            Self::InvalidIdentifiersPrefix(prefix) =>
                write!(f, "validation failed: identifiersPrefix {:?} is not a valid identifier start", prefix),
            Self::MalformedEncodingKey(key) =>
                write!(f, "validation failed: malformed stringArrayEncodingKey {:?}", key),
            Self::EmptyDictionary =>
                write!(f, "validation failed: identifiersDictionary is empty"),
            Self::NameSupplierExhausted =>
                write!(f, "identifier name supplier exhausted")
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_valid() {
        assert_eq!(Options::default().validate(), Ok(()));
        assert_eq!(Options::no_additional_nodes().validate(), Ok(()));
    }

    #[test]
    fn test_chunk_length_must_be_positive() {
        for length in [0, -3] {
            let options = Options {
                split_strings: true,
                split_strings_chunk_length: length,
                ..Options::no_additional_nodes()
            };

            assert_eq!(options.validate(), Err(ConfigurationError::NonPositiveChunkLength(length)));
        }
    }

    #[test]
    fn test_threshold_out_of_range() {
        let options = Options {
            control_flow_flattening_threshold: 1.5,
            ..Options::default()
        };

        assert!(matches!(
            options.validate(),
            Err(ConfigurationError::InvalidThreshold { option: "controlFlowFlatteningThreshold", .. })
        ));
    }

    #[test]
    fn test_identifiers_prefix() {
        for prefix in ["", "_", "$x", "p_1", "é"] {
            let options = Options {
                identifiers_prefix: String::from(prefix),
                ..Options::default()
            };
            assert_eq!(options.validate(), Ok(()), "{:?}", prefix);
        }

        for prefix in ["1", "a-b", "a b", "'"] {
            let options = Options {
                identifiers_prefix: String::from(prefix),
                ..Options::default()
            };
            assert_eq!(
                options.validate(),
                Err(ConfigurationError::InvalidIdentifiersPrefix(String::from(prefix)))
            );
        }
    }

    #[test]
    fn test_malformed_key() {
        let options = Options {
            string_array_encoding: StringArrayEncoding::Rc4,
            string_array_encoding_key: Some(String::from("a'b")),
            ..Options::default()
        };

        assert!(matches!(options.validate(), Err(ConfigurationError::MalformedEncodingKey(_))));
    }

    #[test]
    fn test_from_json() {
        let options = Options::from_json(r#"{
            "seed": 42,
            "sourceType": "module",
            "identifierNamesGenerator": "mangled",
            "splitStrings": true,
            "splitStringsChunkLength": 3,
            "stringArrayEncoding": "rc4",
            "reservedStrings": ["bar"]
        }"#).expect("options should parse");

        assert_eq!(options.seed, 42);
        assert_eq!(options.source_type, SourceType::Module);
        assert_eq!(options.identifier_names_generator, IdentifierNamesGenerator::Mangled);
        assert_eq!(options.split_strings_chunk_length, 3);
        assert_eq!(options.string_array_encoding, StringArrayEncoding::Rc4);
        assert_eq!(options.reserved_strings, vec![String::from("bar")]);
        // Unspecified fields keep their defaults
        assert!(options.string_array);
    }
}
