/// Split `name` into its text and its numeric suffix (`0` when it has none).
/// A suffix too long for `u64` is kept as part of the text.
fn split_suffix(name: &str) -> (&str, u64) {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    match name[stem.len()..].parse() {
        Ok(index) => (stem, index),
        Err(_) => (name, 0),
    }
}

/// Numeric suffix of `other` when it is `stem` followed only by digits.
fn suffix_after(stem: &str, other: &str) -> Option<u64> {
    let digits = other.strip_prefix(stem)?;
    if digits.is_empty() {
        return Some(0);
    }
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Return `name`, or `name` with the lowest free numeric suffix if it is
/// already taken in `existing`. A suffix of `0` is written as no suffix.
pub fn unique_name<'a, I>(name: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let (stem, index) = split_suffix(name);
    let mut taken: Vec<u64> = existing
        .into_iter()
        .filter_map(|other| suffix_after(stem, other))
        .collect();

    if !taken.contains(&index) {
        return name.to_string();
    }

    taken.sort_unstable();
    taken.dedup();
    let free = taken
        .iter()
        .enumerate()
        .find(|(position, used)| *position as u64 != **used)
        .map(|(position, _)| position as u64)
        .unwrap_or(taken.len() as u64);

    if free == 0 {
        stem.to_string()
    } else {
        format!("{stem}{free}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_names_are_kept() {
        assert_eq!(unique_name("users", ["orders"]), "users");
        assert_eq!(unique_name("users2", ["users", "users1"]), "users2");
    }

    #[test]
    fn taken_names_get_the_lowest_free_suffix() {
        assert_eq!(unique_name("users", ["users"]), "users1");
        assert_eq!(unique_name("users", ["users", "users1", "users3"]), "users2");
        assert_eq!(unique_name("users1", ["users1", "users2"]), "users");
    }

    #[test]
    fn duplicate_suffixes_do_not_skip_free_slots() {
        assert_eq!(unique_name("t", ["t", "t0", "t1"]), "t2");
    }

    #[test]
    fn suffixes_too_long_for_a_number_stay_in_the_name() {
        let long = "x99999999999999999999999";

        assert_eq!(unique_name("x", [long]), "x");
        assert_eq!(unique_name(long, [long]), format!("{long}1"));
        let next = format!("{long}1");
        assert_eq!(unique_name(long, [long, next.as_str()]), format!("{long}2"));
    }

    #[test]
    fn names_made_only_of_digits() {
        assert_eq!(unique_name("42", ["42"]), "");
        assert_eq!(unique_name("7", ["7", ""]), "1");
    }
}
