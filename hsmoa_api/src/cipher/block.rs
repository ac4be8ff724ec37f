//! Rijndael block cipher with a key-length-derived schedule.
//!
//! The upstream encrypts with CryptoJS, which sizes the key schedule from the
//! key itself: `Nk = key_len / 4` words and `Nk + 6` rounds. Standard AES
//! only allows `Nk` of 4, 6 or 8, so a 36-byte key (`Nk = 9`, 15 rounds) has
//! no registry implementation. For 16/24/32-byte keys this is plain AES.

use std::sync::OnceLock;

use crate::Error;

pub const BLOCK_SIZE: usize = 16;

pub type Block = [u8; BLOCK_SIZE];

struct SBoxes {
    forward: [u8; 256],
    inverse: [u8; 256],
}

fn sboxes() -> &'static SBoxes {
    static SBOXES: OnceLock<SBoxes> = OnceLock::new();
    SBOXES.get_or_init(|| {
        let mut forward = [0u8; 256];
        let mut inverse = [0u8; 256];
        for x in 0..=255u8 {
            let inv = if x == 0 {
                0
            } else {
                (1..=255u8).find(|&y| gmul(x, y) == 1).unwrap_or(0)
            };
            let s = inv
                ^ inv.rotate_left(1)
                ^ inv.rotate_left(2)
                ^ inv.rotate_left(3)
                ^ inv.rotate_left(4)
                ^ 0x63;
            forward[x as usize] = s;
            inverse[s as usize] = x;
        }
        SBoxes { forward, inverse }
    })
}

/// Multiplication in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1.
fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80 != 0;
        a <<= 1;
        if carry {
            a ^= 0x1b;
        }
        b >>= 1;
    }
    product
}

fn sub_word(word: u32) -> u32 {
    let sbox = &sboxes().forward;
    u32::from_be_bytes(word.to_be_bytes().map(|b| sbox[b as usize]))
}

/// Expanded key for one cipher instance.
pub struct Rijndael {
    round_keys: Vec<Block>,
}

impl Rijndael {
    /// Expands `key`. The length must be a multiple of 4 and at least 16 bytes.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        if key.len() < 16 || key.len() % 4 != 0 {
            return Err(Error::Decrypt(format!(
                "unsupported key length {} bytes",
                key.len()
            )));
        }
        let nk = key.len() / 4;
        let rounds = nk + 6;
        let total_words = (rounds + 1) * 4;

        let mut words: Vec<u32> = key
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let mut rcon: u8 = 1;
        for i in nk..total_words {
            let mut t = words[i - 1];
            if i % nk == 0 {
                t = sub_word(t.rotate_left(8)) ^ (u32::from(rcon) << 24);
                rcon = gmul(rcon, 2);
            } else if nk > 6 && i % nk == 4 {
                t = sub_word(t);
            }
            words.push(words[i - nk] ^ t);
        }

        let round_keys = words
            .chunks_exact(4)
            .map(|group| {
                let mut block = [0u8; BLOCK_SIZE];
                for (col, word) in group.iter().enumerate() {
                    block[col * 4..col * 4 + 4].copy_from_slice(&word.to_be_bytes());
                }
                block
            })
            .collect();
        Ok(Self { round_keys })
    }

    pub fn rounds(&self) -> usize {
        self.round_keys.len() - 1
    }

    pub fn encrypt_block(&self, state: &mut Block) {
        let sbox = &sboxes().forward;
        let last = self.rounds();
        add_round_key(state, &self.round_keys[0]);
        for round in 1..=last {
            for b in state.iter_mut() {
                *b = sbox[*b as usize];
            }
            shift_rows(state);
            if round != last {
                mix_columns(state);
            }
            add_round_key(state, &self.round_keys[round]);
        }
    }

    pub fn decrypt_block(&self, state: &mut Block) {
        let inv_sbox = &sboxes().inverse;
        let last = self.rounds();
        add_round_key(state, &self.round_keys[last]);
        for round in (0..last).rev() {
            inv_shift_rows(state);
            for b in state.iter_mut() {
                *b = inv_sbox[*b as usize];
            }
            add_round_key(state, &self.round_keys[round]);
            if round != 0 {
                inv_mix_columns(state);
            }
        }
    }
}

fn add_round_key(state: &mut Block, key: &Block) {
    for (s, k) in state.iter_mut().zip(key) {
        *s ^= k;
    }
}

// State is column-major: byte `r + 4c` is row r, column c.
fn shift_rows(state: &mut Block) {
    let old = *state;
    for r in 1..4 {
        for c in 0..4 {
            state[r + 4 * c] = old[r + 4 * ((c + r) % 4)];
        }
    }
}

fn inv_shift_rows(state: &mut Block) {
    let old = *state;
    for r in 1..4 {
        for c in 0..4 {
            state[r + 4 * ((c + r) % 4)] = old[r + 4 * c];
        }
    }
}

fn mix_columns(state: &mut Block) {
    for col in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [col[0], col[1], col[2], col[3]];
        col[0] = gmul(a0, 2) ^ gmul(a1, 3) ^ a2 ^ a3;
        col[1] = a0 ^ gmul(a1, 2) ^ gmul(a2, 3) ^ a3;
        col[2] = a0 ^ a1 ^ gmul(a2, 2) ^ gmul(a3, 3);
        col[3] = gmul(a0, 3) ^ a1 ^ a2 ^ gmul(a3, 2);
    }
}

fn inv_mix_columns(state: &mut Block) {
    for col in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [col[0], col[1], col[2], col[3]];
        col[0] = gmul(a0, 14) ^ gmul(a1, 11) ^ gmul(a2, 13) ^ gmul(a3, 9);
        col[1] = gmul(a0, 9) ^ gmul(a1, 14) ^ gmul(a2, 11) ^ gmul(a3, 13);
        col[2] = gmul(a0, 13) ^ gmul(a1, 9) ^ gmul(a2, 14) ^ gmul(a3, 11);
        col[3] = gmul(a0, 11) ^ gmul(a1, 13) ^ gmul(a2, 9) ^ gmul(a3, 14);
    }
}

/// CBC decryption followed by PKCS#7 unpadding.
pub fn cbc_decrypt(cipher: &Rijndael, iv: &Block, data: &[u8]) -> Result<Vec<u8>, Error> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(Error::Decrypt(format!(
            "ciphertext length {} is not a positive multiple of {}",
            data.len(),
            BLOCK_SIZE
        )));
    }
    let mut out = Vec::with_capacity(data.len());
    let mut prev = *iv;
    for chunk in data.chunks_exact(BLOCK_SIZE) {
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(chunk);
        let next_prev = block;
        cipher.decrypt_block(&mut block);
        for (b, p) in block.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        out.extend_from_slice(&block);
        prev = next_prev;
    }

    let pad = usize::from(out[out.len() - 1]);
    if pad == 0 || pad > BLOCK_SIZE || out[out.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err(Error::Decrypt("invalid PKCS#7 padding".into()));
    }
    out.truncate(out.len() - pad);
    Ok(out)
}

/// PKCS#7 padding followed by CBC encryption.
pub fn cbc_encrypt(cipher: &Rijndael, iv: &Block, data: &[u8]) -> Vec<u8> {
    let pad = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut padded = data.to_vec();
    padded.resize(data.len() + pad, pad as u8);

    let mut prev = *iv;
    for chunk in padded.chunks_exact_mut(BLOCK_SIZE) {
        for (b, p) in chunk.iter_mut().zip(prev.iter()) {
            *b ^= p;
        }
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(chunk);
        cipher.encrypt_block(&mut block);
        chunk.copy_from_slice(&block);
        prev = block;
    }
    padded
}
