use base64::alphabet::Alphabet;
use base64::Engine;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use crate::StructuralError;
use crate::options::{Options, StringArrayEncoding};

/// The base64 alphabet used by the runtime decoder, lowercase letters first.
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+/";

/// Length of a generated RC4 key.
const KEY_LENGTH: usize = 4;

/// The encoding applied to every pooled string of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    None,
    Base64,
    Rc4 {
        key: String
    }
}

impl Encoding {
    /// Picks the run encoding. A missing RC4 key is generated from `rng`.
    pub fn from_options(options: &Options, rng: &mut StdRng) -> Self {
        match options.string_array_encoding {
            StringArrayEncoding::None => Self::None,
            StringArrayEncoding::Base64 => Self::Base64,
            StringArrayEncoding::Rc4 => {
                let key = match &options.string_array_encoding_key {
                    Some(v) => v.clone(),
                    None => (0..KEY_LENGTH)
                        .map(|_| char::from(rng.sample(Alphanumeric)))
                        .collect()
                };

                Self::Rc4 { key }
            }
        }
    }

    /// Encodes a pooled string.
    pub fn encode(&self, value: &str) -> Result<String, StructuralError> {
        match self {
            Self::None => Ok(value.to_string()),
            Self::Base64 => Ok(engine()?.encode(value.as_bytes())),
            Self::Rc4 { key } => Ok(engine()?.encode(rc4(key.as_bytes(), value.as_bytes())))
        }
    }

    /// Reverses [Encoding::encode] the way the runtime decoder does:
    /// base64 to bytes, RC4 if keyed, then the bytes as UTF-8.
    pub fn decode(&self, encoded: &str) -> Result<String, StructuralError> {
        let bytes = match self {
            Self::None => return Ok(encoded.to_string()),
            Self::Base64 => engine()?.decode(encoded)
                .map_err(|e| StructuralError::Encoding(e.to_string()))?,
            Self::Rc4 { key } => {
                let encrypted = engine()?.decode(encoded)
                    .map_err(|e| StructuralError::Encoding(e.to_string()))?;
                rc4(key.as_bytes(), &encrypted)
            }
        };

        String::from_utf8(bytes).map_err(|e| StructuralError::Encoding(e.to_string()))
    }
}

/// The base64 engine for [ALPHABET]. Output is unpadded, input padding is optional.
fn engine() -> Result<GeneralPurpose, StructuralError> {
    const CONFIG: GeneralPurposeConfig = GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent);

    let alphabet = Alphabet::new(ALPHABET)
        .map_err(|e| StructuralError::Encoding(e.to_string()))?;
    Ok(GeneralPurpose::new(&alphabet, CONFIG))
}

/// RC4 over bytes. Encryption and decryption are the same operation.
pub fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut s: Vec<u8> = (0..=255).collect();
    if key.is_empty() {
        return data.to_vec();
    }

    let mut j: usize = 0;
    for i in 0..256 {
        j = (j + s[i] as usize + key[i % key.len()] as usize) % 256;
        s.swap(i, j);
    }

    let mut i: usize = 0;
    j = 0;
    data.iter()
        .map(|byte| {
            i = (i + 1) % 256;
            j = (j + s[i] as usize) % 256;
            s.swap(i, j);
            byte ^ s[(s[i] as usize + s[j] as usize) % 256]
        })
        .collect()
}
