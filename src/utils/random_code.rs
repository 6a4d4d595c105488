use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";

/// 生成临时密码
///
/// 至少包含一个大写字母、一个小写字母和一个数字，去掉了易混淆的字符。
pub fn generate_password(length: usize) -> String {
    let length = length.max(8);
    let mut rng = rand::rng();
    let all: Vec<u8> = [UPPER, LOWER, DIGITS].concat();

    let mut chars: Vec<u8> = Vec::with_capacity(length);
    for set in [UPPER, LOWER, DIGITS] {
        if let Some(c) = set.choose(&mut rng) {
            chars.push(*c);
        }
    }
    while chars.len() < length {
        chars.push(all[rng.random_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    String::from_utf8_lossy(&chars).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validate::validate_password;

    #[test]
    fn test_generated_password_passes_policy() {
        for _ in 0..50 {
            let password = generate_password(12);
            assert_eq!(password.len(), 12);
            assert!(validate_password(&password).is_valid, "{password}");
        }
    }

    #[test]
    fn test_minimum_length() {
        assert_eq!(generate_password(3).len(), 8);
    }
}
