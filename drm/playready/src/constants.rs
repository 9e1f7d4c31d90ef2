use hex_literal::hex;

/**
    The WMRM server ECC P-256 public key (64 bytes, X || Y).

    The ephemeral session point of every challenge is ElGamal-encrypted to
    this key, so only the license server can recover the session AES key.
*/
pub const WMRM_SERVER_KEY: [u8; 64] = hex!(
    "c8b6af16ee941aadaa5389b4af2c10e3"
    "56be42af175ef3face93254e7b0b3d9b"
    "982b27b5cb2341326e56aa857dbfd5c6"
    "34ce2cf9ea74fca8f2af5957efeea562"
);
