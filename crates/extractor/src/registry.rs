//! Ordered registry of extraction patterns.
//!
//! Each entry binds one [`Category`] to a regular expression and a
//! [`FieldMap`] naming which capture group feeds which output field.
//! Entries are tried in declaration order and the first match wins, so a
//! more specific shape (airtime, "payment of X RWF to Airtime") must be
//! registered before the general one it overlaps with ("payment of X RWF
//! to Y").
//!
//! New message shapes are added by registering another pattern; the
//! extractor and batch parser never need to change.

use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex, RegexBuilder};

use crate::category::Category;
use crate::error::RegistryError;

/// Amount literal, with optional thousands separators and decimals.
const AMOUNT: &str = r"(?P<amount>\d[\d,]*(?:\.\d+)?)";

/// Literal `YYYY-MM-DD HH:MM:SS` date, space or `T` separated.
const DATE_LITERAL: &str = r"\b\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}\b";

/// Optional trailing literal date after the pattern head.
const DATE_TAIL: &str =
    r"(?:.*?(?P<date>\b\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}\b))?";

/// Epoch milliseconds, only when introduced as a time ("at 1715351458724").
const EPOCH_DATE: &str = r"\b(?:at|on|date|time)\s*:?\s*(\d{13})\b";

const TX_ID: &str = r"\b(?:financial\s+transaction\s+id|transaction\s+id|txid)\s*:\s*(\d+)";
const FEE: &str = r"\bfee(?:\s+(?:was|paid))?\s*:?\s*(\d[\d,]*(?:\.\d+)?)\s*rwf";

/// Maps capture group names to output fields.
///
/// A group named here but absent from the pattern simply yields no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub amount: String,
    pub counterparty: String,
    pub date: String,
    pub tx_id: String,
    pub fee: String,
    /// Counterparty to report when the message never names one.
    pub fixed_counterparty: Option<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            amount: "amount".to_string(),
            counterparty: "party".to_string(),
            date: "date".to_string(),
            tx_id: "txid".to_string(),
            fee: "fee".to_string(),
            fixed_counterparty: None,
        }
    }
}

impl FieldMap {
    pub fn with_fixed_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.fixed_counterparty = Some(counterparty.into());
        self
    }

    fn bind(&self, caps: &Captures<'_>) -> CaptureBindings {
        let get = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };

        CaptureBindings {
            amount: get(&self.amount),
            counterparty: get(&self.counterparty).or_else(|| self.fixed_counterparty.clone()),
            date: get(&self.date),
            tx_id: get(&self.tx_id),
            fee: get(&self.fee),
        }
    }
}

/// Raw substrings captured by a pattern, before typed conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureBindings {
    pub amount: Option<String>,
    pub counterparty: Option<String>,
    pub date: Option<String>,
    pub tx_id: Option<String>,
    pub fee: Option<String>,
}

/// One category bound to one message shape.
#[derive(Debug, Clone)]
pub struct ExtractionPattern {
    category: Category,
    regex: Regex,
    fields: FieldMap,
}

impl ExtractionPattern {
    /// Compile a pattern. Matching is case-insensitive and `.` spans lines.
    pub fn new(category: Category, pattern: &str) -> Result<Self, RegistryError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|source| RegistryError::InvalidPattern { category, source })?;

        Ok(Self {
            category,
            regex,
            fields: FieldMap::default(),
        })
    }

    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = fields;
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// A successful registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryMatch {
    pub category: Category,
    /// Position of the winning pattern in declaration order.
    pub pattern_index: usize,
    pub bindings: CaptureBindings,
}

/// Ordered, read-only set of extraction patterns.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<ExtractionPattern>,
    tx_id: Regex,
    fee: Regex,
    date: Regex,
    epoch: Regex,
}

impl PatternRegistry {
    pub fn new(patterns: Vec<ExtractionPattern>) -> Self {
        Self {
            patterns,
            tx_id: auxiliary(TX_ID),
            fee: auxiliary(FEE),
            date: auxiliary(&format!("({DATE_LITERAL})")),
            epoch: auxiliary(EPOCH_DATE),
        }
    }

    pub fn builder() -> PatternRegistryBuilder {
        PatternRegistryBuilder::default()
    }

    /// The MTN MoMo message shapes, in priority order.
    pub fn builtin() -> Result<Self, RegistryError> {
        let tail = |head: &str| format!("{head}{DATE_TAIL}");

        Self::builder()
            .pattern(
                Category::Incoming,
                tail(&format!(
                    r"you\s+have\s+received\s+{AMOUNT}\s*rwf\s+from\s+(?P<party>.+?)(?:\s+on\s+your\s+mobile\s+money\s+account)?(?:\s+(?:at|on)\s|\s*\.|\s*$)"
                )),
            )
            .pattern(
                Category::Deposit,
                tail(&format!(r"bank\s+deposit\s+of\s+{AMOUNT}\s*rwf")),
            )
            .pattern(
                Category::Airtime,
                tail(&format!(r"payment\s+of\s+{AMOUNT}\s*rwf\s+to\s+airtime\b")),
            )
            .pattern(
                Category::CashPower,
                tail(&format!(
                    r"payment\s+of\s+{AMOUNT}\s*rwf\s+to\s+(?:mtn\s+)?cash\s*power\b"
                )),
            )
            .pattern(
                Category::CashPower,
                tail(&format!(r"cash\s*power\s+token\b.*?\bworth\s+{AMOUNT}\s*rwf")),
            )
            .pattern(
                Category::Bundle,
                tail(&format!(
                    r"transaction\s+of\s+{AMOUNT}\s*rwf\s+by\s+(?P<party>[^.]*?bundle[^.]*?)\s+on\s+your\s+momo\s+account"
                )),
            )
            .pattern(
                Category::Bundle,
                tail(&format!(
                    r"purchased\s+an\s+internet\s+bundle\s+of\s+(?P<party>.+?)\s+for\s+{AMOUNT}\s*rwf"
                )),
            )
            .pattern(
                Category::Bundle,
                tail(&format!(
                    r"payment\s+of\s+{AMOUNT}\s*rwf\s+to\s+(?P<party>bundles?\s+and\s+packs)\b"
                )),
            )
            .pattern(
                Category::Payment,
                tail(&format!(
                    r"payment\s+of\s+{AMOUNT}\s*rwf\s+to\s+(?P<party>.+?)\s+(?:with\s+token\b.*?)?has\s+been\s+completed"
                )),
            )
            .pattern(
                Category::Payment,
                tail(&format!(
                    r"transaction\s+of\s+{AMOUNT}\s*rwf\s+by\s+(?P<party>.+?)\s+on\s+your\s+momo\s+account"
                )),
            )
            .pattern(
                Category::Transfer,
                tail(&format!(
                    r"{AMOUNT}\s*rwf\s+transferred\s+to\s+(?P<party>.+?)\s+from\b"
                )),
            )
            .pattern_with(
                Category::Transfer,
                tail(&format!(r"bank\s+transfer\s+of\s+{AMOUNT}\s*rwf")),
                FieldMap::default().with_fixed_counterparty("Bank"),
            )
            .pattern(
                Category::Withdrawal,
                tail(&format!(
                    r"via\s+agent\s*:\s*(?P<party>.+?)\s+withdrawn\s+{AMOUNT}\s*rwf"
                )),
            )
            .pattern_with(
                Category::Withdrawal,
                tail(&format!(r"withdrawn\s+{AMOUNT}\s*rwf")),
                FieldMap::default().with_fixed_counterparty("Agent"),
            )
            .build()
    }

    /// Process-wide registry built from [`PatternRegistry::builtin`].
    ///
    /// Initialized on first use and shared read-only afterwards.
    pub fn shared() -> Arc<PatternRegistry> {
        static SHARED: OnceLock<Arc<PatternRegistry>> = OnceLock::new();
        SHARED
            .get_or_init(|| {
                Arc::new(PatternRegistry::builtin().expect("built-in patterns must compile"))
            })
            .clone()
    }

    /// Find the first pattern matching `body`.
    pub fn lookup(&self, body: &str) -> Option<RegistryMatch> {
        self.patterns
            .iter()
            .enumerate()
            .find_map(|(pattern_index, pattern)| {
                let caps = pattern.regex.captures(body)?;
                let mut bindings = pattern.fields.bind(&caps);

                if bindings.tx_id.is_none() {
                    bindings.tx_id = first_group(&self.tx_id, body);
                }
                if bindings.fee.is_none() {
                    bindings.fee = first_group(&self.fee, body);
                }
                // A literal date anywhere in the body beats epoch digits.
                if bindings.date.is_none() {
                    bindings.date = first_group(&self.date, body)
                        .or_else(|| first_group(&self.epoch, body));
                }

                Some(RegistryMatch {
                    category: pattern.category,
                    pattern_index,
                    bindings,
                })
            })
    }

    pub fn patterns(&self) -> &[ExtractionPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Collects patterns in priority order and compiles them together.
#[derive(Debug, Default)]
pub struct PatternRegistryBuilder {
    entries: Vec<(Category, String, FieldMap)>,
}

impl PatternRegistryBuilder {
    pub fn pattern(self, category: Category, pattern: impl Into<String>) -> Self {
        self.pattern_with(category, pattern, FieldMap::default())
    }

    pub fn pattern_with(
        mut self,
        category: Category,
        pattern: impl Into<String>,
        fields: FieldMap,
    ) -> Self {
        self.entries.push((category, pattern.into(), fields));
        self
    }

    pub fn build(self) -> Result<PatternRegistry, RegistryError> {
        let patterns = self
            .entries
            .into_iter()
            .map(|(category, pattern, fields)| {
                ExtractionPattern::new(category, &pattern).map(|p| p.with_fields(fields))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PatternRegistry::new(patterns))
    }
}

fn auxiliary(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("auxiliary pattern must compile")
}

fn first_group(regex: &Regex, body: &str) -> Option<String> {
    regex
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
