// Classical ciphers: Caesar/ROT-n, Vigenere and repeating XOR on text.

fn rot_byte(c: u8, shift: u8) -> u8 {
    match c {
        b'A'..=b'Z' => (c - b'A' + shift) % 26 + b'A',
        b'a'..=b'z' => (c - b'a' + shift) % 26 + b'a',
        _ => c,
    }
}

fn normalise_shift(shift: i64) -> u8 {
    shift.rem_euclid(26) as u8
}

/// Rotates ASCII letters by `shift`, keeping case. Everything else is left
/// alone. ROT13 is `rot_text(s, 13)`.
pub fn rot_text(text: &str, shift: i64) -> String {
    let shift = normalise_shift(shift);
    text.chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                rot_byte(c as u8, shift) as char
            } else {
                c
            }
        })
        .collect()
}

pub fn rot_bytes(bytes: &[u8], shift: i64) -> Vec<u8> {
    let shift = normalise_shift(shift);
    bytes.iter().map(|&c| rot_byte(c, shift)).collect()
}

/// Decrypts Vigenere ciphertext. Only letters consume key characters; the
/// key is case-insensitive. An empty key leaves the text unchanged.
pub fn vigenere_decrypt(ciphertext: &str, key: &str) -> String {
    vigenere(ciphertext, key, -1)
}

pub fn vigenere_encrypt(plaintext: &str, key: &str) -> String {
    vigenere(plaintext, key, 1)
}

fn vigenere(text: &str, key: &str, direction: i64) -> String {
    let shifts: Vec<i64> = key
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| (c.to_ascii_lowercase() as u8 - b'a') as i64 * direction)
        .collect();
    if shifts.is_empty() {
        return text.to_string();
    }

    let mut i = 0;
    text.chars()
        .map(|c| {
            if !c.is_ascii_alphabetic() {
                return c;
            }
            let shifted = rot_byte(c as u8, normalise_shift(shifts[i % shifts.len()]));
            i += 1;
            shifted as char
        })
        .collect()
}

/// XORs the code points of two strings pairwise, stopping at the shorter
/// one. Results outside the valid `char` range become U+FFFD.
pub fn xor_text(a: &str, b: &str) -> String {
    a.chars()
        .zip(b.chars())
        .map(|(x, y)| char::from_u32(x as u32 ^ y as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
