use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;

/// The one signing algorithm this service accepts.
///
/// Tokens signed with any other algorithm (including "none") are rejected
/// outright to rule out algorithm-confusion attacks.
const ALGORITHM: Algorithm = Algorithm::HS512;

/// Session token handler for issuing and validating tokens.
///
/// Holds the shared signing secret in key form. Stateless apart from the
/// secret: a token is valid iff its signature verifies under [`ALGORITHM`],
/// its expiry lies in the future (no leeway), and it carries a subject.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHandler {
    /// Create a handler around a signing secret.
    ///
    /// The secret should be at least 512 bits for HS512 and must come from
    /// configuration, never from source code.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is a hard boundary; no clock-skew allowance.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Serialize and sign a claim set.
    ///
    /// # Errors
    /// * `EncodingFailed` - serialization or signing failed
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(ALGORITHM);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode a token, verifying signature, algorithm, and expiry.
    ///
    /// # Errors
    /// * `Expired` - the token's `exp` lies in the past
    /// * `InvalidSignature` - any other defect (bad signature, foreign
    ///   algorithm, malformed token, missing `exp`)
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::Expired,
                    _ => JwtError::InvalidSignature,
                }
            })?;

        Ok(token_data.claims)
    }

    /// Validate a token and extract its subject.
    ///
    /// # Errors
    /// * `Expired` | `InvalidSignature` - see [`JwtHandler::decode`]
    /// * `MissingSubject` - the token validated but carries no `sub`
    pub fn validate(&self, token: &str) -> Result<String, JwtError> {
        self.decode(token)?.sub.ok_or(JwtError::MissingSubject)
    }
}
