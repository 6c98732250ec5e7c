use crate::correlation::domain::{CpeMatchCriterion, ReleaseVersion};
use crate::shared::error::VersionEvaluationError;

/// Checks a raw component version against the bounds of a CPE criterion.
///
/// All present bounds must hold; absent bounds impose no constraint. When
/// the version or any present bound fails to parse, the only fallback is
/// exact string equality with `versionStartIncluding`. Every other bound
/// combination is then treated as no match.
pub fn is_in_range(version: &str, criterion: &CpeMatchCriterion) -> bool {
    match evaluate_bounds(version, criterion) {
        Ok(in_range) => in_range,
        Err(e) => {
            tracing::debug!(
                version,
                criteria = criterion.criteria(),
                error = %e,
                "version not comparable, falling back to exact start match"
            );
            criterion.start_including() == Some(version)
        }
    }
}

fn evaluate_bounds(
    version: &str,
    criterion: &CpeMatchCriterion,
) -> Result<bool, VersionEvaluationError> {
    let v = ReleaseVersion::parse(version)?;

    if let Some(bound) = parse_bound(criterion.start_including())? {
        if v < bound {
            return Ok(false);
        }
    }
    if let Some(bound) = parse_bound(criterion.start_excluding())? {
        if v <= bound {
            return Ok(false);
        }
    }
    if let Some(bound) = parse_bound(criterion.end_including())? {
        if v > bound {
            return Ok(false);
        }
    }
    if let Some(bound) = parse_bound(criterion.end_excluding())? {
        if v >= bound {
            return Ok(false);
        }
    }

    Ok(true)
}

/// A blank bound imposes no constraint
fn parse_bound(bound: Option<&str>) -> Result<Option<ReleaseVersion>, VersionEvaluationError> {
    bound
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(ReleaseVersion::parse)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPE: &str = "cpe:2.3:a:apache:log4j:*:*:*:*:*:*:*:*";

    #[test]
    fn test_half_open_range() {
        let criterion = CpeMatchCriterion::new(CPE)
            .with_start_including("1.0")
            .with_end_excluding("2.0");
        assert!(!is_in_range("0.9", &criterion));
        assert!(is_in_range("1.0", &criterion));
        assert!(is_in_range("1.9.9", &criterion));
        assert!(!is_in_range("2.0", &criterion));
    }

    #[test]
    fn test_exclusive_start_inclusive_end() {
        let criterion = CpeMatchCriterion::new(CPE)
            .with_start_excluding("1.0")
            .with_end_including("2.0");
        assert!(!is_in_range("1.0", &criterion));
        assert!(is_in_range("1.0.1", &criterion));
        assert!(is_in_range("2.0", &criterion));
        assert!(is_in_range("2.0.0", &criterion));
        assert!(!is_in_range("2.0.1", &criterion));
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let criterion = CpeMatchCriterion::new(CPE).with_end_excluding("1.10.0");
        assert!(is_in_range("1.9.0", &criterion));
        assert!(!is_in_range("1.10.0", &criterion));
    }

    #[test]
    fn test_no_bounds_matches_any_parsable_version() {
        let criterion = CpeMatchCriterion::new(CPE);
        assert!(is_in_range("2.14.1", &criterion));
        assert!(!is_in_range("unknown", &criterion));
    }

    #[test]
    fn test_inverted_bounds_never_match() {
        let criterion = CpeMatchCriterion::new(CPE)
            .with_start_including("3.0")
            .with_end_excluding("2.0");
        for version in ["1.0", "2.0", "2.5", "3.0", "4.0"] {
            assert!(!is_in_range(version, &criterion), "{}", version);
        }
    }

    #[test]
    fn test_unparsable_version_falls_back_to_start_including_equality() {
        let criterion = CpeMatchCriterion::new(CPE)
            .with_start_including("2.0-SNAPSHOT")
            .with_end_excluding("3.0");
        assert!(is_in_range("2.0-SNAPSHOT", &criterion));
        assert!(!is_in_range("2.1-SNAPSHOT", &criterion));
    }

    #[test]
    fn test_unparsable_version_with_other_bounds_never_matches() {
        let criterion = CpeMatchCriterion::new(CPE)
            .with_end_including("1.0-SNAPSHOT");
        assert!(!is_in_range("1.0-SNAPSHOT", &criterion));
    }

    #[test]
    fn test_blank_bounds_impose_no_constraint() {
        let criterion = CpeMatchCriterion::new(CPE)
            .with_start_including("")
            .with_end_excluding("2.15.0");
        assert!(is_in_range("2.14.1", &criterion));
        assert!(!is_in_range("2.15.0", &criterion));

        let criterion = CpeMatchCriterion::new(CPE)
            .with_start_excluding("   ")
            .with_end_including("\t");
        assert!(is_in_range("1.0", &criterion));
    }

    #[test]
    fn test_blank_bound_text_is_ignored_during_evaluation() {
        assert!(parse_bound(Some("")).unwrap().is_none());
        assert!(parse_bound(Some("  ")).unwrap().is_none());
        assert!(parse_bound(None).unwrap().is_none());
        assert!(parse_bound(Some("1.2")).unwrap().is_some());
    }

    #[test]
    fn test_unparsable_bound_uses_fallback() {
        let criterion = CpeMatchCriterion::new(CPE)
            .with_start_including("1.0")
            .with_end_excluding("latest");
        assert!(is_in_range("1.0", &criterion));
        assert!(!is_in_range("1.5", &criterion));
    }
}
