use aes::Aes128;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};

use crate::error::{CdmError, CdmResult};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/**
    AES-128-CBC encryption with PKCS#7 padding.

    Key / IV: the session AES key and IV (halves of the session point X coordinate).
    Plaintext: canonical client data XML.
    Output: ciphertext only; the caller prepends the IV.
*/
pub fn aes_cbc_encrypt(key: &[u8; 16], iv: &[u8; 16], plaintext: &[u8]) -> Vec<u8> {
    Aes128CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/**
    AES-128-CBC decryption with PKCS#7 unpadding.
*/
pub fn aes_cbc_decrypt(key: &[u8; 16], iv: &[u8; 16], ciphertext: &[u8]) -> CdmResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return Err(CdmError::AesCbcInvalidInput(
            "ciphertext must be non-empty and block-aligned".into(),
        ));
    }
    Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CdmError::Pkcs7PaddingInvalid)
}
