use semver::VersionReq;
use std::error::Error as StdError;
use std::fmt;

pub use semver::Version;

/// An npm-style version range: `||`-separated alternatives, each of which
/// is a conjunction of comparators. `semver::VersionReq` understands a
/// single comma-separated conjunction, so parsing normalizes each
/// alternative into that shape first.
#[derive(Debug, Clone)]
pub struct RangeSet {
    source: String,
    alternatives: Vec<VersionReq>,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    input: String,
    message: String,
}

impl ParseError {
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.input)
    }
}

impl StdError for ParseError {}

impl RangeSet {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let trimmed = source.trim();
        let effective = if trimmed.is_empty() || trimmed == "latest" {
            "*"
        } else {
            trimmed
        };

        let mut alternatives = Vec::new();

        for alternative in effective.split("||") {
            let alternative = alternative.trim();
            if alternative.is_empty() {
                continue;
            }

            let normalized = normalize_conjunction(alternative);
            let req = VersionReq::parse(&normalized).map_err(|err| ParseError {
                input: source.to_string(),
                message: err.to_string(),
            })?;

            alternatives.push(req);
        }

        if alternatives.is_empty() {
            alternatives.push(VersionReq::STAR);
        }

        Ok(RangeSet {
            source: source.to_string(),
            alternatives,
        })
    }

    /// The wildcard range, matching every version.
    pub fn any() -> Self {
        RangeSet {
            source: "*".to_string(),
            alternatives: vec![VersionReq::STAR],
        }
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Picks the highest version string satisfying `range` out of `versions`,
/// returning the original string so callers can index back into whatever
/// map the strings came from. Unparseable version strings are skipped.
pub fn max_satisfying<'a, I>(versions: I, range: &RangeSet) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(Version, &'a str)> = None;

    for raw in versions {
        let Ok(parsed) = Version::parse(raw) else {
            continue;
        };

        if !range.matches(&parsed) {
            continue;
        }

        match &best {
            Some((current, _)) if parsed <= *current => {}
            _ => best = Some((parsed, raw)),
        }
    }

    best.map(|(_, raw)| raw)
}

/// Rewrites one `||`-free npm range into `VersionReq` syntax: hyphen
/// ranges become a `>=`/`<=` pair, and whitespace-separated comparators
/// become comma-separated ones. A lone operator token glues onto the
/// version that follows it (`>= 1.2.0` is one comparator, not two).
fn normalize_conjunction(part: &str) -> String {
    let tokens: Vec<&str> = part.split_whitespace().collect();

    if tokens.len() <= 1 {
        return part.to_string();
    }

    if tokens.len() == 3 && tokens[1] == "-" {
        return format!(">={}, <={}", tokens[0], tokens[2]);
    }

    let mut result = String::new();

    for (index, token) in tokens.iter().enumerate() {
        if index > 0 {
            if is_operator(tokens[index - 1]) {
                result.push(' ');
            } else {
                result.push_str(", ");
            }
        }

        result.push_str(token);
    }

    result
}

fn is_operator(token: &str) -> bool {
    matches!(token, "=" | ">" | ">=" | "<" | "<=" | "~" | "^")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_range() {
        let set = RangeSet::parse("^1.0.0").unwrap();
        assert!(set.matches(&Version::parse("1.4.2").unwrap()));
        assert!(!set.matches(&Version::parse("2.0.0").unwrap()));
    }

    #[test]
    fn treats_empty_and_latest_as_wildcard() {
        for input in ["", "  ", "latest"] {
            let set = RangeSet::parse(input).unwrap();
            assert!(set.matches(&Version::parse("999.0.0").unwrap()));
        }
    }

    #[test]
    fn handles_or_alternatives() {
        let set = RangeSet::parse("^1.0.0 || ^2.0.0").unwrap();
        assert!(set.matches(&Version::parse("1.5.0").unwrap()));
        assert!(set.matches(&Version::parse("2.3.0").unwrap()));
        assert!(!set.matches(&Version::parse("3.0.0").unwrap()));
    }

    #[test]
    fn normalizes_spaced_operator() {
        let set = RangeSet::parse(">= 4.21.0").unwrap();
        assert!(set.matches(&Version::parse("4.21.0").unwrap()));
        assert!(!set.matches(&Version::parse("4.20.9").unwrap()));
    }

    #[test]
    fn normalizes_space_conjunction() {
        let set = RangeSet::parse(">=1.0.0 <2.0.0").unwrap();
        assert!(set.matches(&Version::parse("1.9.9").unwrap()));
        assert!(!set.matches(&Version::parse("2.0.0").unwrap()));
    }

    #[test]
    fn handles_hyphen_range() {
        let set = RangeSet::parse("1.2.3 - 2.0.0").unwrap();
        assert!(set.matches(&Version::parse("1.5.0").unwrap()));
        assert!(set.matches(&Version::parse("2.0.0").unwrap()));
        assert!(!set.matches(&Version::parse("2.0.1").unwrap()));
    }

    #[test]
    fn max_satisfying_picks_highest_match() {
        let versions = ["1.0.0", "1.2.0", "2.0.0"];
        let range = RangeSet::parse("^1.0.0").unwrap();
        assert_eq!(max_satisfying(versions, &range), Some("1.2.0"));
    }

    #[test]
    fn max_satisfying_skips_garbage_versions() {
        let versions = ["not-a-version", "1.1.0"];
        let range = RangeSet::parse("*").unwrap();
        assert_eq!(max_satisfying(versions, &range), Some("1.1.0"));
    }

    #[test]
    fn max_satisfying_reports_no_match() {
        let versions = ["1.0.0", "1.2.0"];
        let range = RangeSet::parse("^3.0.0").unwrap();
        assert_eq!(max_satisfying(versions, &range), None);
    }
}
