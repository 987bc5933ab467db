//! JWT Token Service
//!
//! Issues an HS256 access token bound to the account address (the `aud`
//! claim) plus an opaque refresh token. Time comes from an injected
//! [`Clock`], which is also what expiry is checked against on decode.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{Duration, SecondsFormat};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

use wata_crypto::keccak256;
use wata_types::{AccountRole, Address, Clock, SystemClock};

use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::{AccessClaims, TokenPair};

/// Subject claim carried by every access token
pub const ACCESS_TOKEN_SUBJECT: &str = "auth";

/// Tolerated clock skew when checking expiry
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// JWT service for token management
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    /// Create a new JWT service on the system clock
    pub fn new(config: JwtConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
            clock,
        }
    }

    /// Access token lifetime in whole seconds
    pub fn expires_in(&self) -> i64 {
        i64::try_from(self.config.access_token_lifetime.as_secs()).unwrap_or(i64::MAX)
    }

    /// Issue an access/refresh token pair for `address`
    pub fn issue(&self, address: &Address, referral_code: &str) -> AuthResult<TokenPair> {
        let now = self.clock.now();
        let lifetime = Duration::from_std(self.config.access_token_lifetime)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;
        let address_text = address.to_checksum();

        let claims = AccessClaims {
            aud: address_text.clone(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            sub: ACCESS_TOKEN_SUBJECT.to_string(),
            user_id: user_id_for(address),
            address: address_text.clone(),
            referral_code: referral_code.to_string(),
            role: AccountRole::User.as_str().to_string(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(format!("Failed to encode access token: {}", e)))?;

        let stamp = now.to_rfc3339_opts(SecondsFormat::Nanos, true);
        let refresh_token = BASE64.encode(keccak256(format!("{}{}", address_text, stamp).as_bytes()));

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.expires_in(),
        })
    }

    /// Validate signature, issuer, audience and expiry of an access token
    pub fn decode_access_token(&self, token: &str, address: &Address) -> AuthResult<AccessClaims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[address.to_checksum()]);
        // expiry is checked below against the injected clock
        validation.validate_exp = false;

        let claims = decode::<AccessClaims>(token, &self.decoding_key, &validation)?.claims;

        if claims.exp + EXPIRY_LEEWAY_SECS < self.clock.now().timestamp() {
            return Err(AuthError::TokenExpired);
        }
        if claims.sub != ACCESS_TOKEN_SUBJECT {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}

/// Stable short identifier derived from the canonical address text
pub fn user_id_for(address: &Address) -> String {
    let hash = keccak256(address.to_checksum().as_bytes());
    hex::encode(&hash[..16])
}
