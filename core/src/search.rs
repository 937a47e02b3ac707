use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// One ranked hit: a document, how many query-word matches it holds, and the
/// earliest position of any match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub location: String,
    pub frequency: usize,
    pub position: usize,
}

impl SearchResult {
    pub fn new(location: impl Into<String>, frequency: usize, position: usize) -> Self {
        Self { location: location.into(), frequency, position }
    }

    pub fn add_frequency(&mut self, n: usize) { self.frequency += n; }

    /// Keeps the smaller of the current and the given position.
    pub fn update_position(&mut self, position: usize) {
        if position < self.position {
            self.position = position;
        }
    }
}

/// Frequency descending, then earliest position ascending, then location
/// compared case-insensitively. Locations equal except for case fall back to
/// a byte-wise comparison so the order stays total.
impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .frequency
            .cmp(&self.frequency)
            .then_with(|| self.position.cmp(&other.position))
            .then_with(|| cmp_ignore_case(&self.location, &other.location))
            .then_with(|| self.location.cmp(&other.location))
    }
}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\", {}, {}", self.location, self.frequency, self.position)
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars().flat_map(char::to_lowercase).cmp(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_frequency_then_position_then_location() {
        let mut results = vec![
            SearchResult::new("b.txt", 2, 5),
            SearchResult::new("A.txt", 2, 5),
            SearchResult::new("c.txt", 2, 1),
            SearchResult::new("d.txt", 9, 40),
            SearchResult::new("a.txt", 2, 5),
        ];
        results.sort();
        let order: Vec<&str> = results.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(order, vec!["d.txt", "c.txt", "A.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn accumulates() {
        let mut r = SearchResult::new("x", 1, 10);
        r.add_frequency(3);
        r.update_position(12);
        r.update_position(4);
        assert_eq!(r, SearchResult::new("x", 4, 4));
        assert_eq!(r.to_string(), "\"x\", 4, 4");
    }
}
