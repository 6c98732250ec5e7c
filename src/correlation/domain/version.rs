use crate::shared::error::VersionEvaluationError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Pre-release label, ordered alpha < beta < rc
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreRelease {
    Alpha,
    Beta,
    Rc,
}

/// Release stage, ordered dev < pre-release < final < post-release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Dev(u64),
    Pre(PreRelease, u64),
    Final,
    Post(u64),
}

/// A dotted release version such as `2.14.1`, `1.0rc1` or `v3.2.0.post2`.
///
/// Release segments are compared numerically with missing trailing segments
/// treated as zero, so `1.0 == 1.0.0` and `1.9.0 < 1.10.0`. A `+local` suffix
/// is ignored for ordering.
#[derive(Debug, Clone)]
pub struct ReleaseVersion {
    release: Vec<u64>,
    stage: Stage,
}

impl ReleaseVersion {
    pub fn parse(input: &str) -> Result<Self, VersionEvaluationError> {
        let trimmed = input.trim().to_ascii_lowercase();
        let without_local = trimmed.split('+').next().unwrap_or_default();
        let body = without_local.strip_prefix('v').unwrap_or(without_local);

        if body.is_empty() {
            return Err(VersionEvaluationError::new(input, "empty version"));
        }

        let release_end = body
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(body.len());
        let (release_part, suffix) = body.split_at(release_end);
        let release_part = if suffix.is_empty() {
            release_part
        } else {
            // "1.0.rc1" keeps the separator dot on the release side
            release_part.strip_suffix('.').unwrap_or(release_part)
        };

        let release = release_part
            .split('.')
            .map(|segment| {
                segment.parse::<u64>().map_err(|_| {
                    VersionEvaluationError::new(input, "non-numeric release segment")
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stage = parse_stage(suffix)
            .ok_or_else(|| VersionEvaluationError::new(input, "unrecognized suffix"))?;

        Ok(Self { release, stage })
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn segment(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }
}

fn parse_stage(suffix: &str) -> Option<Stage> {
    let suffix = suffix.trim_start_matches(['-', '_', '.']);
    if suffix.is_empty() {
        return Some(Stage::Final);
    }

    let label_end = suffix
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(suffix.len());
    let (label, rest) = suffix.split_at(label_end);
    let number_text = rest.trim_start_matches(['-', '_', '.']);
    let number = if number_text.is_empty() {
        0
    } else {
        number_text.parse::<u64>().ok()?
    };

    let stage = match label {
        "a" | "alpha" => Stage::Pre(PreRelease::Alpha, number),
        "b" | "beta" => Stage::Pre(PreRelease::Beta, number),
        "c" | "rc" | "pre" | "preview" => Stage::Pre(PreRelease::Rc, number),
        "post" | "rev" | "r" => Stage::Post(number),
        "dev" => Stage::Dev(number),
        // "1.0-1" is an implicit post-release
        "" if !number_text.is_empty() => Stage::Post(number),
        _ => return None,
    };
    Some(stage)
}

impl FromStr for ReleaseVersion {
    type Err = VersionEvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.release.len().max(other.release.len());
        (0..width)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.stage.cmp(&other.stage))
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReleaseVersion {}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        match self.stage {
            Stage::Final => Ok(()),
            Stage::Dev(n) => write!(f, ".dev{}", n),
            Stage::Pre(PreRelease::Alpha, n) => write!(f, "a{}", n),
            Stage::Pre(PreRelease::Beta, n) => write!(f, "b{}", n),
            Stage::Pre(PreRelease::Rc, n) => write!(f, "rc{}", n),
            Stage::Post(n) => write!(f, ".post{}", n),
        }
    }
}
