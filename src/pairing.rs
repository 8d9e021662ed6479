#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("URL lists differ in length: {left} vs {right} (entries are paired by position)")]
pub struct LengthMismatchError {
    pub left: usize,
    pub right: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPair {
    pub primary: String,
    pub secondary: String,
}

/// One URL per line; surrounding whitespace and blank lines are ignored.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Zips two lists by position. Position `i` of `primary` is assumed to
/// describe the same book as position `i` of `secondary`.
pub fn pair(
    primary: Vec<String>,
    secondary: Vec<String>,
) -> Result<Vec<UrlPair>, LengthMismatchError> {
    if primary.len() != secondary.len() {
        return Err(LengthMismatchError {
            left: primary.len(),
            right: secondary.len(),
        });
    }

    Ok(primary
        .into_iter()
        .zip(secondary)
        .map(|(primary, secondary)| UrlPair { primary, secondary })
        .collect())
}
