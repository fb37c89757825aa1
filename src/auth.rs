//! Message authentication.
//!
//! A connection carries exactly one authenticator: either the null variant,
//! which signs nothing, or the HMAC-MD5 variant holding a username, a secret
//! key, and the authenticator id allocated by the server during binding. The
//! digest algorithm and its 16-byte width are fixed by protocol compatibility
//! with the reference server and must not be substituted.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use md5::Md5;

use crate::{
    error::{OmapiError, Result},
    map::ObjectMap,
    message::Message,
};

type HmacMd5 = Hmac<Md5>;

/// Width of an HMAC-MD5 signature in bytes.
pub const HMAC_MD5_SIGNATURE_LEN: usize = 16;

/// Authenticator id sentinel for keyed authenticators before binding.
pub const UNBOUND_AUTH_ID: i32 = -1;

/// Signing capability negotiated for a connection.
#[derive(Clone, Debug)]
pub enum Authenticator {
    /// No authentication; empty signatures, authenticator id 0.
    Null,
    /// Keyed HMAC-MD5 signing.
    HmacMd5(HmacMd5Authenticator),
}

impl Authenticator {
    /// Return the key/value material sent when opening the authenticator
    /// object on the server.
    #[must_use]
    pub fn auth_object(&self) -> ObjectMap {
        match self {
            Self::Null => ObjectMap::new(),
            Self::HmacMd5(auth) => {
                let mut object = ObjectMap::new();
                object.insert("name", auth.username.as_str());
                object
            }
        }
    }

    /// Return the authenticator id stamped on signed messages.
    #[must_use]
    pub fn auth_id(&self) -> i32 {
        match self {
            Self::Null => 0,
            Self::HmacMd5(auth) => auth.auth_id,
        }
    }

    /// Record the authenticator id allocated by the server.
    ///
    /// A no-op for the null authenticator, which has no server-side object.
    pub fn set_auth_id(&mut self, auth_id: i32) {
        if let Self::HmacMd5(auth) = self {
            auth.auth_id = auth_id;
        }
    }

    /// Return the signature width this authenticator produces.
    #[must_use]
    pub fn signature_len(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::HmacMd5(_) => HMAC_MD5_SIGNATURE_LEN,
        }
    }

    /// Compute the signature over `message`'s signing serialization.
    #[must_use]
    pub fn sign(&self, message: &Message) -> Vec<u8> {
        match self {
            Self::Null => Vec::new(),
            Self::HmacMd5(auth) => hmac_md5(&auth.key, &message.signing_bytes()),
        }
    }
}

/// Keyed HMAC-MD5 authenticator state.
#[derive(Clone, Debug)]
pub struct HmacMd5Authenticator {
    username: String,
    key: Vec<u8>,
    auth_id: i32,
}

impl HmacMd5Authenticator {
    /// Create an unbound authenticator from a username and a base64 secret
    /// key.
    ///
    /// # Errors
    ///
    /// Returns [`OmapiError::InvalidKey`] if the key is not valid base64;
    /// this is a fatal configuration error.
    pub fn new(username: impl Into<String>, base64_key: &str) -> Result<Self> {
        let key = BASE64.decode(base64_key).map_err(OmapiError::InvalidKey)?;
        Ok(Self {
            username: username.into(),
            key,
            auth_id: UNBOUND_AUTH_ID,
        })
    }

    /// Return the username identifying the key on the server.
    #[must_use]
    pub fn username(&self) -> &str { &self.username }
}

fn hmac_md5(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacMd5::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
