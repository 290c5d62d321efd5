use std::fmt;

/// Item identifier as printed in the source: `17`, `17-1`.
///
/// Ordering is numeric on `base`, then `sub`; `None` sorts before any sub-index
/// so `2 < 2-1 < 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier {
    pub base: u32,
    pub sub: Option<u32>,
}

impl Identifier {
    pub fn new(base: u32, sub: Option<u32>) -> Self {
        Self { base, sub }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub {
            Some(sub) => write!(f, "{}-{}", self.base, sub),
            None => write!(f, "{}", self.base),
        }
    }
}

/// Identifier as read off a single line, before the segmenter resolves bare
/// continuation markers (`-1`) against the previous block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawIdentifier {
    Full(Identifier),
    Continuation(u32),
}

impl RawIdentifier {
    /// Parses the identifier token captured by the classifier. Leading zeros
    /// are dropped; a base of zero or more than five digits is rejected.
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(sub) = token.strip_prefix('-') {
            return parse_component(sub).map(Self::Continuation);
        }

        let (base, sub) = match token.split_once('-') {
            Some((base, sub)) => (base, Some(sub)),
            None => (token, None),
        };

        let base = parse_component(base)?;
        if base == 0 {
            return None;
        }
        let sub = match sub {
            Some(value) => Some(parse_component(value)?),
            None => None,
        };

        Some(Self::Full(Identifier::new(base, sub)))
    }

    /// Resolves against the most recent block identifier, if any.
    pub fn resolve(self, previous: Option<Identifier>) -> Option<Identifier> {
        match self {
            Self::Full(identifier) => Some(identifier),
            Self::Continuation(sub) => previous.map(|prev| Identifier::new(prev.base, Some(sub))),
        }
    }
}

fn parse_component(value: &str) -> Option<u32> {
    let digits = value.trim_start_matches('0');
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if digits.is_empty() {
        return Some(0);
    }
    if digits.len() > 5 {
        return None;
    }
    digits.parse().ok()
}
