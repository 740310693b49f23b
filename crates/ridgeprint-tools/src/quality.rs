use ridgeprint_pipeline::QualityScore;

/// Parse the quality tool's stdout: exactly one non-empty line holding an
/// integer in `1..=5`.
///
/// # Errors
///
/// Returns a description of what was wrong with the output.
pub fn parse_quality_output(stdout: &str, exit_status: i32) -> Result<QualityScore, String> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    let Some(line) = lines.next() else {
        return Err("empty output".to_string());
    };
    if lines.next().is_some() {
        return Err(format!("expected a single line, got {:?}", stdout.trim()));
    }
    let value: u8 = line
        .parse()
        .map_err(|_| format!("not an integer score: {line:?}"))?;
    QualityScore::new(value, exit_status).ok_or_else(|| {
        format!(
            "score {value} outside {}..={}",
            QualityScore::BEST,
            QualityScore::WORST
        )
    })
}
