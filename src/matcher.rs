use crate::model::ScriptEntry;
use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32Str};

pub struct FuzzyMatcher {
    matcher: Matcher,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
        }
    }

    /// Exact file name, then exact display name, then the best fuzzy match
    /// on the display name. Ties keep scan order.
    pub fn resolve<'a>(
        &mut self,
        query: &str,
        entries: &'a [ScriptEntry],
    ) -> Option<&'a ScriptEntry> {
        if let Some(e) = entries.iter().find(|e| e.name == query) {
            return Some(e);
        }
        if let Some(e) = entries.iter().find(|e| e.display_name == query) {
            return Some(e);
        }

        let pattern = Pattern::parse(query, CaseMatching::Smart, Normalization::Smart);
        let mut buf = Vec::new();
        let mut best: Option<(u32, &ScriptEntry)> = None;
        for entry in entries {
            let haystack = Utf32Str::new(&entry.display_name, &mut buf);
            if let Some(score) = pattern.score(haystack, &mut self.matcher) {
                if best.is_none_or(|(s, _)| score > s) {
                    best = Some((score, entry));
                }
            }
        }
        best.map(|(_, e)| e)
    }
}
