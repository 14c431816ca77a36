//! Cosmetic display hints derived from labels and values.
//!
//! Everything here is regex/table-driven and advisory: a wrong hint renders a
//! value less prettily, never incorrectly. Nothing in the correctness path
//! (compilation, resolution, validation) depends on this module.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::principal;

// ---------------------------- Hint vocabulary ----------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextFormat {
    Plain,
    Timestamp,
    Uuid,
    Url,
    Image,
    Email,
    Phone,
    Btc,
    Eth,
    AccountId,
    Principal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberFormat {
    Normal,
    Timestamp,
    Cycle,
}

// ---------------------------- Label matching ------------------------------ //

static TIMESTAMP_KEYS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)time|date|deadline|status_?at|created_?at|updated_?at|deleted_?at|valid_?until",
    )
    .unwrap()
});

static CYCLE_KEYS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cycle").unwrap());

static ACCOUNT_ID_KEYS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)account_identifier|ledger_account|block_hash|transaction_hash|tx_hash")
        .unwrap()
});

static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Split a label into lowercase word tokens (`ledgerAccount_id` →
/// `["ledger", "account", "id"]`).
fn tokenize(label: &str) -> Vec<String> {
    let spaced = CAMEL_BOUNDARY.replace_all(label, "$1 $2");
    spaced
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn has_token(tokens: &[String], candidates: &[&str]) -> bool {
    tokens.iter().any(|t| candidates.contains(&t.as_str()))
}

/// Classify a text field from its label and (when available) its value.
/// Value evidence wins over label evidence.
pub fn text_format_for(label: &str, value: Option<&str>) -> TextFormat {
    if let Some(v) = value {
        if is_image(v) {
            return TextFormat::Image;
        }
        if is_btc_address(v) {
            return TextFormat::Btc;
        }
        if is_eth_address(v) {
            return TextFormat::Eth;
        }
        if is_account_identifier(v) {
            return TextFormat::AccountId;
        }
        if is_uuid(v) {
            return TextFormat::Uuid;
        }
        if is_iso_date(v) {
            return TextFormat::Timestamp;
        }
        if is_canister_text(v) {
            return TextFormat::Principal;
        }
        if is_url(v) {
            return TextFormat::Url;
        }
    }

    if label.is_empty() {
        return TextFormat::Plain;
    }
    if TIMESTAMP_KEYS.is_match(label) {
        return TextFormat::Timestamp;
    }
    if ACCOUNT_ID_KEYS.is_match(label) {
        return TextFormat::AccountId;
    }

    let tokens = tokenize(label);
    if has_token(&tokens, &["email", "mail"]) {
        return TextFormat::Email;
    }
    if has_token(&tokens, &["phone", "tel", "mobile"]) {
        return TextFormat::Phone;
    }
    if has_token(&tokens, &["url", "link", "website"]) {
        return TextFormat::Url;
    }
    if has_token(&tokens, &["uuid", "guid"]) {
        return TextFormat::Uuid;
    }
    if has_token(&tokens, &["btc", "bitcoin"]) {
        return TextFormat::Btc;
    }
    if has_token(&tokens, &["eth", "ethereum"]) {
        return TextFormat::Eth;
    }
    if has_token(&tokens, &["principal", "canister"]) {
        return TextFormat::Principal;
    }
    TextFormat::Plain
}

pub fn number_format_for(label: &str) -> NumberFormat {
    if label.is_empty() {
        return NumberFormat::Normal;
    }
    if TIMESTAMP_KEYS.is_match(label) {
        return NumberFormat::Timestamp;
    }
    if CYCLE_KEYS.is_match(label) {
        return NumberFormat::Cycle;
    }
    NumberFormat::Normal
}

// ---------------------------- Value matching ------------------------------ //

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})$").unwrap()
});

static BTC_BECH32_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(bc1|tb1|bcrt1)[a-zA-HJ-NP-Z0-9]{25,60}$").unwrap());

static BTC_BASE58_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[13mn2][a-km-zA-HJ-NP-Z1-9]{25,34}$").unwrap());

static ETH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap());

static HEX64_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-fA-F0-9]{64}$").unwrap());

pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

pub fn is_image(s: &str) -> bool {
    if s.starts_with("data:image") {
        return true;
    }
    [".jpg", ".jpeg", ".png", ".gif", ".svg"]
        .iter()
        .any(|ext| s.ends_with(ext))
}

pub fn is_uuid(s: &str) -> bool {
    UUID_RE.is_match(s)
}

pub fn is_iso_date(s: &str) -> bool {
    ISO_DATE_RE.is_match(s)
}

pub fn is_btc_address(s: &str) -> bool {
    BTC_BECH32_RE.is_match(s) || BTC_BASE58_RE.is_match(s)
}

pub fn is_eth_address(s: &str) -> bool {
    ETH_RE.is_match(s)
}

/// 64-char hex: ledger account identifiers and various hashes.
pub fn is_account_identifier(s: &str) -> bool {
    HEX64_RE.is_match(s)
}

/// Canister-class principal text: valid checksum, 27 chars, `-cai` suffix.
pub fn is_canister_text(s: &str) -> bool {
    s.len() == 27 && s.ends_with("-cai") && principal::is_valid_text(s)
}

// ---------------------------- Label formatting ---------------------------- //

/// Human display form of a raw field label.
///
/// `__arg0` → `Arg 0`, `__ret1` → `Ret 1`, `_0_` → `Item 0`, `tags_item` →
/// `Item`, `created_at`/`createdAt` → `Created At`.
pub fn format_label(label: &str) -> String {
    if let Some(num) = label.strip_prefix("__arg") {
        return format!("Arg {num}");
    }
    if let Some(num) = label.strip_prefix("__ret") {
        return format!("Ret {num}");
    }
    if label.len() > 2 && label.starts_with('_') && label.ends_with('_') {
        let inner = &label[1..label.len() - 1];
        if inner.bytes().all(|b| b.is_ascii_digit()) {
            return format!("Item {inner}");
        }
    }
    if label.ends_with("_item") {
        return "Item".to_string();
    }

    let spaced = CAMEL_BOUNDARY.replace_all(label.trim_matches('_'), "$1 $2");
    spaced
        .split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// --------------------------- Pretty renderers ----------------------------- //

/// Render a nanosecond epoch timestamp as RFC 3339, if it is in range.
pub fn nanos_to_datetime(nanos: i128) -> Option<String> {
    let secs = i64::try_from(nanos.div_euclid(1_000_000_000)).ok()?;
    let sub = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok()?;
    let dt = chrono::DateTime::from_timestamp(secs, sub)?;
    Some(dt.to_rfc3339())
}

/// Render a cycle count in the `N T` / `N M` convention.
pub fn cycles_display(cycles: u128) -> String {
    let mcycles = cycles / 1_000_000;
    if mcycles >= 1_000_000 {
        format!("{} T", mcycles / 1_000_000)
    } else {
        format!("{mcycles} M")
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_formatting_table() {
        assert_eq!(format_label("__arg0"), "Arg 0");
        assert_eq!(format_label("__ret2"), "Ret 2");
        assert_eq!(format_label("_0_"), "Item 0");
        assert_eq!(format_label("tags_item"), "Item");
        assert_eq!(format_label("created_at"), "Created At");
        assert_eq!(format_label("userAddress"), "User Address");
        assert_eq!(format_label("__internal__"), "Internal");
    }

    #[test]
    fn label_based_text_formats() {
        assert_eq!(text_format_for("created_at", None), TextFormat::Timestamp);
        assert_eq!(text_format_for("user_email", None), TextFormat::Email);
        assert_eq!(text_format_for("website", None), TextFormat::Url);
        assert_eq!(text_format_for("tx_hash", None), TextFormat::AccountId);
        assert_eq!(text_format_for("canisterId", None), TextFormat::Principal);
        assert_eq!(text_format_for("name", None), TextFormat::Plain);
    }

    #[test]
    fn value_evidence_wins_over_labels() {
        assert_eq!(
            text_format_for("note", Some("https://example.com/x")),
            TextFormat::Url
        );
        assert_eq!(
            text_format_for("note", Some("0x52908400098527886E0F7030069857D2E4169EE7")),
            TextFormat::Eth
        );
        assert_eq!(
            text_format_for("note", Some("2e9b7c5a-07b1-4f52-8a0e-4b26c93b5ef1")),
            TextFormat::Uuid
        );
        assert_eq!(
            text_format_for("note", Some("2024-01-15T10:30:00Z")),
            TextFormat::Timestamp
        );
        assert_eq!(
            text_format_for("website", Some("just text")),
            TextFormat::Url
        );
    }

    #[test]
    fn number_formats_from_labels() {
        assert_eq!(number_format_for("timestamp_nanos"), NumberFormat::Timestamp);
        assert_eq!(number_format_for("cycles_balance"), NumberFormat::Cycle);
        assert_eq!(number_format_for("amount"), NumberFormat::Normal);
    }

    #[test]
    fn pretty_renderers() {
        // 2021-05-06T19:17:10Z in nanoseconds
        let nanos = 1_620_328_630_000_000_000i128;
        assert_eq!(
            nanos_to_datetime(nanos).as_deref(),
            Some("2021-05-06T19:17:10+00:00")
        );
        assert_eq!(cycles_display(3_000_000_000_000), "3 T");
        assert_eq!(cycles_display(42_000_000), "42 M");
    }
}
