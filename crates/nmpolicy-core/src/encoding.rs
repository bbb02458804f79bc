use crate::error::DocumentError;
use crate::types::State;

/// Serialization format of a state document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Json,
    #[default]
    Yaml,
}

impl Encoding {
    /// JSON when the bytes hold a JSON object or array, YAML otherwise.
    pub fn detect(bytes: &[u8]) -> Self {
        let first = bytes.iter().copied().find(|b| !b.is_ascii_whitespace());
        let looks_like_json = matches!(first, Some(b'{') | Some(b'['));
        if looks_like_json && serde_json::from_slice::<State>(bytes).is_ok() {
            Encoding::Json
        } else {
            Encoding::Yaml
        }
    }

    /// Decode a document. Blank input decodes to [`State::Null`].
    pub fn decode(self, bytes: &[u8]) -> Result<State, DocumentError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(State::Null);
        }
        let state = match self {
            Encoding::Json => serde_json::from_slice(bytes)?,
            Encoding::Yaml => serde_yaml::from_slice(bytes)?,
        };
        Ok(state)
    }

    pub fn encode(self, state: &State) -> Result<Vec<u8>, DocumentError> {
        let bytes = match self {
            Encoding::Json => serde_json::to_vec_pretty(state)?,
            Encoding::Yaml => serde_yaml::to_string(state)?.into_bytes(),
        };
        Ok(bytes)
    }
}

/// Decode a document in whichever encoding it is written in.
pub fn decode_state(bytes: &[u8]) -> Result<(State, Encoding), DocumentError> {
    let encoding = Encoding::detect(bytes);
    let state = encoding.decode(bytes)?;
    Ok((state, encoding))
}
