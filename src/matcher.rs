use crate::error::MatchError;

/// Checks that `numbers` is exactly `number_length` ASCII digits.
pub fn check_digits(numbers: &str, number_length: usize) -> Result<(), String> {
    if let Some((position, ch)) = numbers.chars().enumerate().find(|(_, c)| !c.is_ascii_digit()) {
        return Err(format!(
            "contains non-digit character {:?} at position {}",
            ch, position
        ));
    }
    if numbers.len() != number_length {
        return Err(format!(
            "expected {} digits, got {}",
            number_length,
            numbers.len()
        ));
    }
    Ok(())
}

pub fn validate_numbers(id: &str, numbers: &str, number_length: usize) -> Result<(), MatchError> {
    check_digits(numbers, number_length).map_err(|reason| MatchError::InvalidFormat {
        id: id.to_string(),
        reason,
    })
}

/// Counts the positions where `a` and `b` hold the same digit.
///
/// Both inputs must be `number_length` digits; anything else is an
/// `InvalidFormat` naming the offending value rather than a zero match.
pub fn digit_match(a: &str, b: &str, number_length: usize) -> Result<usize, MatchError> {
    validate_numbers(a, a, number_length)?;
    validate_numbers(b, b, number_length)?;

    Ok(a.bytes().zip(b.bytes()).filter(|(x, y)| x == y).count())
}
