//! First-success resolution over an ordered candidate list

use std::fmt::Display;

use tracing::debug;

/// Try each candidate in order and return the first one that succeeds
///
/// Failures are logged at debug level and otherwise swallowed; `None` means
/// every candidate failed (or there were none).
pub fn first_success<C, T, E, F>(candidates: impl IntoIterator<Item = C>, mut attempt: F) -> Option<(C, T)>
where
    C: Display,
    E: Display,
    F: FnMut(&C) -> Result<T, E>,
{
    for candidate in candidates {
        match attempt(&candidate) {
            Ok(value) => return Some((candidate, value)),
            Err(e) => debug!("Candidate {} failed: {}", candidate, e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_first_success() {
        let mut tried = Vec::new();
        let found = first_success(["a", "b", "c"], |c| {
            tried.push(*c);
            if *c == "b" { Ok(2) } else { Err("nope") }
        });
        assert_eq!(found, Some(("b", 2)));
        assert_eq!(tried, vec!["a", "b"]);
    }

    #[test]
    fn exhausted_list_yields_none() {
        let found: Option<(&str, ())> = first_success(["a", "b"], |_| Err("nope"));
        assert_eq!(found, None);

        let empty: Vec<String> = Vec::new();
        assert!(first_success(empty, |_| Ok::<_, String>(())).is_none());
    }
}
