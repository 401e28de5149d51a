/// Checksum weights for the first nine NIP digits.
const NIP_WEIGHTS: [u32; 9] = [6, 5, 7, 2, 3, 4, 5, 6, 7];

/// Check a Polish tax identification number (NIP).
///
/// Accepts an optional `PL` prefix and `-` / space separators. The tenth
/// digit must equal the weighted sum of the first nine modulo 11.
///
/// The submission flow does not reject invalid numbers (the test gateway
/// accepts synthetic ones); callers use this for diagnostics.
pub fn is_valid_nip(nip: &str) -> bool {
    let trimmed = nip.trim();
    let trimmed = trimmed
        .strip_prefix("PL")
        .or_else(|| trimmed.strip_prefix("pl"))
        .unwrap_or(trimmed);
    let digits: Vec<u32> = trimmed
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .map(|c| c.to_digit(10))
        .collect::<Option<_>>()
        .unwrap_or_default();
    if digits.len() != 10 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .zip(NIP_WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();
    let check = sum % 11;
    check != 10 && check == digits[9]
}
