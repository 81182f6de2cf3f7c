//! Phase classification rule table
//!
//! One canonical, ordered table replaces the historical cascade of
//! substring checks duplicated across frontend variants. Each rule pairs a
//! matcher with an outcome; [`RuleTable::classify`] evaluates top to
//! bottom and the first matching rule wins. Classification is a pure
//! function of the line — feeding the same line twice yields the same
//! candidate.
//!
//! Matching is on the stable text of the backend's progress vocabulary,
//! not on its emoji decorations.

use super::Phase;

/// One classification candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub phase: Phase,
    /// Percent hint in [0, 100]; the tracker applies the monotonic clamp
    pub percent: f32,
    /// Human-readable step label for display
    pub step: String,
}

/// Percent curve for the counter-driven writing-section rule
///
/// The historical frontends disagreed on the exact bounds (60–90 vs
/// 65–90); the curve is a table parameter, not a contract.
#[derive(Debug, Clone, Copy)]
pub struct SectionCurve {
    pub base: f32,
    pub span: f32,
}

impl Default for SectionCurve {
    fn default() -> Self {
        Self {
            base: 60.0,
            span: 30.0,
        }
    }
}

/// How a rule matches a line
#[derive(Debug, Clone, Copy)]
enum Matcher {
    /// Line contains the substring
    Contains(&'static str),
    /// Line contains at least one of the substrings
    AnyOf(&'static [&'static str]),
    /// Line contains every one of the substrings
    AllOf(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, line: &str) -> bool {
        match self {
            Matcher::Contains(needle) => line.contains(needle),
            Matcher::AnyOf(needles) => needles.iter().any(|n| line.contains(n)),
            Matcher::AllOf(needles) => needles.iter().all(|n| line.contains(n)),
        }
    }
}

/// How a matched rule computes percent and step label
#[derive(Debug, Clone, Copy)]
enum Outcome {
    /// Fixed percent and step label
    Fixed { percent: f32, step: &'static str },
    /// Percent interpolated from an `[i/n]` counter found on the line;
    /// non-matching when the counter is absent or out of range
    Counter {
        base: f32,
        span: f32,
        noun: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    matcher: Matcher,
    phase: Phase,
    outcome: Outcome,
}

/// Ordered classification table; first match wins
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(SectionCurve::default())
    }
}

impl RuleTable {
    /// Build the canonical table with the given writing-section curve
    ///
    /// Counter rules precede their fixed-marker siblings so a line like
    /// `Crawling: [3/10]` hits the counter rule first.
    pub fn new(sections: SectionCurve) -> Self {
        let rules = vec![
            Rule {
                matcher: Matcher::Contains("Researching:"),
                phase: Phase::Planning,
                outcome: Outcome::Fixed {
                    percent: 5.0,
                    step: "Planning research strategy...",
                },
            },
            Rule {
                matcher: Matcher::Contains("Research Plan:"),
                phase: Phase::Planning,
                outcome: Outcome::Fixed {
                    percent: 10.0,
                    step: "Research plan created...",
                },
            },
            Rule {
                matcher: Matcher::Contains("Searching:"),
                phase: Phase::Searching,
                outcome: Outcome::Counter {
                    base: 15.0,
                    span: 10.0,
                    noun: "Searching source",
                },
            },
            Rule {
                matcher: Matcher::Contains("Source Discovery"),
                phase: Phase::Searching,
                outcome: Outcome::Fixed {
                    percent: 15.0,
                    step: "Gathering sources...",
                },
            },
            Rule {
                matcher: Matcher::Contains("Crawling"),
                phase: Phase::Crawling,
                outcome: Outcome::Counter {
                    base: 25.0,
                    span: 25.0,
                    noun: "Crawling page",
                },
            },
            Rule {
                matcher: Matcher::AnyOf(&["Web Crawling", "Crawling websites"]),
                phase: Phase::Crawling,
                outcome: Outcome::Fixed {
                    percent: 25.0,
                    step: "Crawling websites...",
                },
            },
            Rule {
                matcher: Matcher::Contains("Successfully crawled"),
                phase: Phase::Indexing,
                outcome: Outcome::Fixed {
                    percent: 50.0,
                    step: "Building knowledge index...",
                },
            },
            Rule {
                matcher: Matcher::AnyOf(&["Built search index", "Knowledge base built"]),
                phase: Phase::Writing,
                outcome: Outcome::Fixed {
                    percent: 60.0,
                    step: "Writing report sections...",
                },
            },
            Rule {
                matcher: Matcher::AllOf(&["Writing", "sections"]),
                phase: Phase::Writing,
                outcome: Outcome::Fixed {
                    percent: 60.0,
                    step: "Analyzing and writing...",
                },
            },
            Rule {
                matcher: Matcher::Contains("Section"),
                phase: Phase::Writing,
                outcome: Outcome::Counter {
                    base: sections.base,
                    span: sections.span,
                    noun: "Writing section",
                },
            },
            Rule {
                matcher: Matcher::AnyOf(&["Adding references", "Reference Processing"]),
                phase: Phase::Writing,
                outcome: Outcome::Fixed {
                    percent: 90.0,
                    step: "Finalizing references...",
                },
            },
            Rule {
                matcher: Matcher::Contains("Verification"),
                phase: Phase::Verifying,
                outcome: Outcome::Fixed {
                    percent: 95.0,
                    step: "Verifying report quality...",
                },
            },
            Rule {
                matcher: Matcher::Contains("Research Complete"),
                phase: Phase::Done,
                outcome: Outcome::Fixed {
                    percent: 100.0,
                    step: "Research completed!",
                },
            },
        ];
        Self { rules }
    }

    /// Classify one line; `None` when no rule matches
    pub fn classify(&self, line: &str) -> Option<ProgressUpdate> {
        for rule in &self.rules {
            if !rule.matcher.matches(line) {
                continue;
            }
            match rule.outcome {
                Outcome::Fixed { percent, step } => {
                    return Some(ProgressUpdate {
                        phase: rule.phase,
                        percent,
                        step: step.to_string(),
                    });
                }
                Outcome::Counter { base, span, noun } => {
                    // A malformed or absent counter makes the rule
                    // non-matching; evaluation continues down the table.
                    let Some((i, n)) = extract_counter(line) else {
                        continue;
                    };
                    let percent = base + span * i as f32 / n as f32;
                    return Some(ProgressUpdate {
                        phase: rule.phase,
                        percent,
                        step: format!("{} {} of {}...", noun, i, n),
                    });
                }
            }
        }
        None
    }
}

/// Extract an `[i/n]` or bare `i/n` counter from a line
///
/// Returns `None` when `n` is 0 or `i > n` — out-of-range counters must
/// not produce out-of-range percents.
fn extract_counter(line: &str) -> Option<(u32, u32)> {
    let pair = bracketed_counter(line).or_else(|| bare_counter(line))?;
    let (i, n) = pair;
    if n == 0 || i > n {
        return None;
    }
    Some((i, n))
}

/// Parse the first `[digits/digits]` token
fn bracketed_counter(line: &str) -> Option<(u32, u32)> {
    let open = line.find('[')?;
    let rest = &line[open + 1..];
    let close = rest.find(']')?;
    let inner = &rest[..close];
    let (i, n) = inner.split_once('/')?;
    Some((i.trim().parse().ok()?, n.trim().parse().ok()?))
}

/// Parse the first bare `digits/digits` token
fn bare_counter(line: &str) -> Option<(u32, u32)> {
    let bytes = line.as_bytes();
    for (pos, &b) in bytes.iter().enumerate() {
        if b != b'/' || pos == 0 || pos + 1 >= bytes.len() {
            continue;
        }
        if !bytes[pos - 1].is_ascii_digit() || !bytes[pos + 1].is_ascii_digit() {
            continue;
        }
        // Digit runs are pure ASCII, so these walks stay on char boundaries
        let mut start = pos;
        while start > 0 && bytes[start - 1].is_ascii_digit() {
            start -= 1;
        }
        let mut end = pos + 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        let i = line[start..pos].parse().ok()?;
        let n = line[pos + 1..end].parse().ok()?;
        return Some((i, n));
    }
    None
}
