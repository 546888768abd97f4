//! ads.txt line parser.
//!
//! Parses one line of an `ads.txt` file into an authorized-seller record.
//! The grammar is `DOMAIN, ACCOUNT_ID, (DIRECT|RESELLER)[, CERT_AUTHORITY_ID]`
//! with comments introduced by `#` and terminated by `;` or end of line.
//! Blank lines, header comments, and malformed lines are expected input and
//! yield [`Option::None`] rather than an error.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Comment span: `#` up to the next `;` or end of line.
fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#[^#;]+(;|$)").expect("comment regex is valid"))
}

/// Full-line seller grammar, applied after comment stripping and lower-casing.
fn seller_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^ *([-_.\w]+), *([-_.\w]+), *(direct|reseller)(, *([-_.\w]+))? *$")
            .expect("seller regex is valid")
    })
}

/// Relationship between the publisher and the seller account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Direct,
    Reseller,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Direct => "direct",
            AccountType::Reseller => "reseller",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(AccountType::Direct),
            "reseller" => Ok(AccountType::Reseller),
            other => Err(ParseError::AccountType {
                value: other.to_string(),
            }),
        }
    }
}

/// A seller record parsed from a single data line, before it is attributed
/// to a portal and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSeller {
    pub domain_name: String,
    pub account_id: String,
    pub account_type: AccountType,
    /// Empty when the optional fourth field is omitted.
    pub cert_auth_id: String,
}

impl ParsedSeller {
    /// Dedup key within one response body; mirrors the store-wide unique key.
    pub fn seller_key(&self) -> (String, String, AccountType) {
        (
            self.domain_name.clone(),
            self.account_id.clone(),
            self.account_type,
        )
    }
}

/// A line matched the grammar but produced an unusable record. Distinct from
/// "not a data line", which is silent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported account type '{value}'")]
    AccountType { value: String },
    #[error("empty {field} in data line")]
    EmptyField { field: &'static str },
}

/// Remove every comment span from `line`. Idempotent: stripping a stripped
/// line changes nothing.
pub fn strip_comments(line: &str) -> String {
    comment_re().replace_all(line, "").into_owned()
}

/// Parse one raw `ads.txt` line.
///
/// Returns `Ok(None)` for anything that is not a data line (blank lines,
/// comments, malformed rows); these are expected and skipped silently.
/// `Err` is reserved for lines that matched the grammar but failed record
/// validation, which the caller reports per portal.
pub fn parse_line(line: &str) -> Result<Option<ParsedSeller>, ParseError> {
    let stripped = strip_comments(line).to_lowercase();

    let Some(caps) = seller_re().captures(&stripped) else {
        return Ok(None);
    };

    let domain_name = caps[1].trim().to_string();
    let account_id = caps[2].trim().to_string();
    let account_type = caps[3].parse::<AccountType>()?;
    let cert_auth_id = caps
        .get(5)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    if domain_name.is_empty() {
        return Err(ParseError::EmptyField {
            field: "domain name",
        });
    }
    if account_id.is_empty() {
        return Err(ParseError::EmptyField {
            field: "account id",
        });
    }

    Ok(Some(ParsedSeller {
        domain_name,
        account_id,
        account_type,
        cert_auth_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments() {
        let cases = [
            ("#Some comment", ""),
            ("# Some comment  ", ""),
            ("#Some comment  ", ""),
            ("  #Some comment", "  "),
            (" #Some comment ; abc", "  abc"),
            (
                "google.com, pub-5231479214411897, RESELLER, f08c47fec0942fa0 #Some comment",
                "google.com, pub-5231479214411897, RESELLER, f08c47fec0942fa0 ",
            ),
        ];
        for (raw, expected) in cases {
            assert_eq!(strip_comments(raw), expected, "stripping {raw:?}");
        }
    }

    #[test]
    fn strip_comments_is_idempotent() {
        let raw = "google.com, pub-1, DIRECT #note; trailing #more";
        let once = strip_comments(raw);
        assert_eq!(strip_comments(&once), once);
    }

    #[test]
    fn parses_four_field_line() {
        let parsed =
            parse_line("google.com, pub-5231479214411897, RESELLER, f08c47fec0942fa0")
                .unwrap()
                .expect("data line");
        assert_eq!(parsed.domain_name, "google.com");
        assert_eq!(parsed.account_id, "pub-5231479214411897");
        assert_eq!(parsed.account_type, AccountType::Reseller);
        assert_eq!(parsed.cert_auth_id, "f08c47fec0942fa0");
    }

    #[test]
    fn parses_three_field_line_without_cert_auth() {
        let parsed = parse_line("cnn.com,  pub-5231479214411897, DIRECT")
            .unwrap()
            .expect("data line");
        assert_eq!(parsed.domain_name, "cnn.com");
        assert_eq!(parsed.account_id, "pub-5231479214411897");
        assert_eq!(parsed.account_type, AccountType::Direct);
        assert_eq!(parsed.cert_auth_id, "");
    }

    #[test]
    fn account_type_is_case_insensitive() {
        let parsed = parse_line(" google.com,   pub-5231479214411897, ReselLER, f08c47fec0942fa0")
            .unwrap()
            .expect("data line");
        assert_eq!(parsed.account_type, AccountType::Reseller);
    }

    #[test]
    fn domain_is_lower_cased() {
        let parsed = parse_line("Google.COM, pub-1, DIRECT")
            .unwrap()
            .expect("data line");
        assert_eq!(parsed.domain_name, "google.com");
    }

    #[test]
    fn mid_line_comment_keeps_trailing_content() {
        // The `#note;` span is removed but the fields after the `;` survive.
        let parsed = parse_line(
            "google.com, pub-5231479214411897, #Some comment; ReselLER, f08c47fec0942fa0 #Another comment",
        )
        .unwrap()
        .expect("data line");
        assert_eq!(parsed.account_type, AccountType::Reseller);
        assert_eq!(parsed.cert_auth_id, "f08c47fec0942fa0");
    }

    #[test]
    fn non_data_lines_are_silent() {
        for raw in [
            "",
            "   ",
            "#contact=ads@example.com",
            "subdomain=uk.example.com",
            "google.com, pub-1", // too few fields
            "google.com, pub-1, agency, cert", // unknown relationship
        ] {
            assert_eq!(parse_line(raw), Ok(None), "line {raw:?}");
        }
    }

    #[test]
    fn account_type_round_trips() {
        assert_eq!("direct".parse::<AccountType>(), Ok(AccountType::Direct));
        assert_eq!("RESELLER".parse::<AccountType>(), Ok(AccountType::Reseller));
        assert!("agency".parse::<AccountType>().is_err());
        assert_eq!(AccountType::Direct.to_string(), "direct");
    }
}
