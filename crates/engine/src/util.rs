//! Internal helpers for input validation.
//!
//! These utilities are **not** part of the public API. They centralize name
//! and amount validation so every operation enforces the same rules.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, MoneyCents, ResultEngine};

/// Trim, NFC-normalize and collapse inner whitespace of a display name.
pub(crate) fn normalize_display(input: &str) -> Option<String> {
    let composed: String = input.trim().nfc().collect();
    let mut out = String::new();
    for token in composed.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Comparison key for names: lowercase, accents folded.
pub(crate) fn name_key(input: &str) -> String {
    input
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized display name or `InvalidName` labeled with `label`.
pub(crate) fn required_name(value: &str, label: &str) -> ResultEngine<String> {
    normalize_display(value)
        .ok_or_else(|| EngineError::InvalidName(format!("{label} name must not be empty")))
}

/// Amount of a single expense: above zero and at most [`MoneyCents::MAX_ENTRY`].
pub(crate) fn positive_amount(amount: MoneyCents) -> ResultEngine<MoneyCents> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "amount must be greater than 0".to_string(),
        ));
    }
    if amount > MoneyCents::MAX_ENTRY {
        return Err(EngineError::InvalidAmount(format!(
            "amount must not exceed {}",
            MoneyCents::MAX_ENTRY
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_collapses_whitespace() {
        assert_eq!(
            normalize_display("  Mary   Ann "),
            Some("Mary Ann".to_string())
        );
        assert_eq!(normalize_display("   "), None);
    }

    #[test]
    fn display_composes_accents() {
        // "e" + combining acute accent
        assert_eq!(normalize_display("Rene\u{301}"), Some("René".to_string()));
    }

    #[test]
    fn amount_bounds() {
        assert!(positive_amount(MoneyCents::new(1)).is_ok());
        assert!(positive_amount(MoneyCents::MAX_ENTRY).is_ok());
        assert!(positive_amount(MoneyCents::ZERO).is_err());
        assert!(positive_amount(MoneyCents::new(-5)).is_err());
        assert!(positive_amount(MoneyCents::new(90_000_000_000_000_000)).is_err());
    }

    #[test]
    fn key_folds_case_and_accents() {
        assert_eq!(name_key("RENÉ"), name_key("rene"));
        assert_ne!(name_key("Ann"), name_key("Anna"));
    }
}
