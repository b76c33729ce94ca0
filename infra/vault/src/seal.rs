//! AEAD sealing of encoded secrets under ephemeral keys.
//!
//! Blob layout:
//!
//! ```text
//! [V(1)][FLAGS(1)][NONCE(12)][CIPHERTEXT(N)][TAG(16)]
//! ```

use aead::inout::InOutBuf;
use aead::{Key, Nonce};
use getrandom::fill;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::error::{ReadOnceError, ReadOnceErrorExt};
use crate::types::{
    FLAG_COMPRESSED, HEADER_LEN, KEY_LEN, NONCE_LEN, PAYLOAD_VERSION_V1, TAG_LEN, VaultCipher,
};

pub(crate) type SecretKey = Zeroizing<[u8; KEY_LEN]>;

/// Draws a fresh key from the OS RNG.
pub(crate) fn generate_key() -> Result<SecretKey, ReadOnceError> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    fill(&mut key[..]).map_err(|e| ReadOnceError::Encryption {
        message: "System RNG unavailable for key generation".into(),
        context: Some(e.to_string().into()),
    })?;
    Ok(key)
}

/// Encodes `value` with postcard into a buffer sized up front.
///
/// `to_stdvec` grows its output by reallocation and leaves freed copies of the
/// plaintext behind; writing into an exact-size slice does not.
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Zeroizing<Vec<u8>>, ReadOnceError> {
    let size = postcard::experimental::serialized_size(value).context("Postcard sizing failed")?;

    let mut buf = Zeroizing::new(vec![0u8; size]);
    let used = postcard::to_slice(value, &mut buf).context("Postcard encoding failed")?.len();
    buf.truncate(used);
    Ok(buf)
}

fn init_cipher<C: VaultCipher>(key: &[u8; KEY_LEN]) -> Result<C, ReadOnceError> {
    let key = Key::<C>::try_from(&key[..]).map_err(|_| ReadOnceError::Encryption {
        message: format!("Cipher does not accept {KEY_LEN}-byte keys").into(),
        context: None,
    })?;
    Ok(C::new(&key))
}

fn next_nonce<C: VaultCipher>() -> Result<Nonce<C>, ReadOnceError> {
    let mut nonce = Nonce::<C>::default();
    fill(&mut nonce).map_err(|e| ReadOnceError::Encryption {
        message: "System RNG unavailable for nonce generation".into(),
        context: Some(e.to_string().into()),
    })?;
    Ok(nonce)
}

/// Encrypts `data` under `key`, binding it to `aad`.
///
/// Every intermediate buffer that holds plaintext is wiped before returning.
pub(crate) fn seal<C: VaultCipher>(
    key: &[u8; KEY_LEN],
    data: &[u8],
    aad: &[u8],
    compress: bool,
) -> Result<Vec<u8>, ReadOnceError> {
    let cipher = init_cipher::<C>(key)?;

    let owned = Zeroizing::new(if compress {
        lz4_flex::compress_prepend_size(data)
    } else {
        Vec::new()
    });
    let data = if compress { owned.as_slice() } else { data };
    let flags = if compress { FLAG_COMPRESSED } else { 0 };

    let nonce = next_nonce::<C>()?;

    // Sized up front so the plaintext is never left behind by a reallocation.
    let mut buf =
        Zeroizing::new(Vec::with_capacity(HEADER_LEN + NONCE_LEN + data.len() + TAG_LEN));
    buf.push(PAYLOAD_VERSION_V1);
    buf.push(flags);
    buf.extend_from_slice(&nonce);
    buf.extend_from_slice(data);

    let (_hdr, rest) = buf.split_at_mut(HEADER_LEN);
    let (_nonce_part, data_part) = rest.split_at_mut(nonce.len());
    let in_out = InOutBuf::from(data_part);

    let tag = cipher.encrypt_inout_detached(&nonce, aad, in_out).map_err(|_| {
        ReadOnceError::Encryption {
            message: "Encryption failed".into(),
            context: Some("AEAD encryption failed".into()),
        }
    })?;

    buf.extend_from_slice(tag.as_slice());
    Ok(std::mem::take(&mut *buf))
}

/// Decrypts a blob produced by [`seal`] back into the encoded plaintext.
pub(crate) fn unseal<C: VaultCipher>(
    key: &[u8; KEY_LEN],
    blob: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, ReadOnceError> {
    if blob.len() < (HEADER_LEN + NONCE_LEN + TAG_LEN) {
        return Err(ReadOnceError::InvalidPayload {
            message: format!(
                "Sealed secret too short ({} bytes). Expected at least {} bytes",
                blob.len(),
                HEADER_LEN + NONCE_LEN + TAG_LEN
            )
            .into(),
            context: None,
        });
    }

    let version = blob[0];
    let flags = blob[1];

    if version != PAYLOAD_VERSION_V1 {
        return Err(ReadOnceError::InvalidPayload {
            message: "Unsupported sealed secret version".into(),
            context: Some(format!("version={version}").into()),
        });
    }

    let cipher = init_cipher::<C>(key)?;

    let rest = &blob[HEADER_LEN..];
    let (nonce_slice, rest) = rest.split_at(NONCE_LEN);
    let (ciphertext, tag_slice) = rest.split_at(rest.len() - TAG_LEN);

    let nonce = nonce_slice.try_into().map_err(|_| ReadOnceError::Decryption {
        message: "Invalid nonce length".into(),
        context: None,
    })?;

    let tag = tag_slice.try_into().map_err(|_| ReadOnceError::Decryption {
        message: "Invalid tag length".into(),
        context: None,
    })?;

    let mut buf = Zeroizing::new(ciphertext.to_vec());
    let in_out = InOutBuf::from(&mut buf[..]);

    cipher.decrypt_inout_detached(&nonce, aad, in_out, &tag).map_err(|_| {
        ReadOnceError::Decryption {
            message: "Decryption failed".into(),
            context: Some("AEAD authentication failed".into()),
        }
    })?;

    if (flags & FLAG_COMPRESSED) != 0 {
        let decompressed = lz4_flex::decompress_size_prepended(&buf).map_err(|_| {
            ReadOnceError::InvalidPayload {
                message: "Decompression failed".into(),
                context: Some("LZ4 stream invalid".into()),
            }
        })?;
        return Ok(Zeroizing::new(decompressed));
    }

    Ok(buf)
}
