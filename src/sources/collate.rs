use std::cmp::Ordering;
use std::env;
use icu_collator::{Collator, CollatorOptions, Strength};
use icu_locid::Locale;
use log::debug;

/// Locale collation for script names, with byte order breaking ties so the
/// result is total and stable.
pub struct NameOrder {
    collator: Option<Collator>,
}

impl NameOrder {
    /// Uses `LC_ALL`, `LC_COLLATE` or `LANG`, first one set wins.
    pub fn from_env() -> Self {
        let tag = ["LC_ALL", "LC_COLLATE", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|v| !v.is_empty());
        Self::for_locale(tag.as_deref())
    }

    /// `None`, `C` and `POSIX` get the root collation.
    pub fn for_locale(posix_tag: Option<&str>) -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);

        let locale = posix_tag.and_then(bcp47_locale);
        let collator = match &locale {
            Some(locale) => Collator::try_new(&locale.into(), options),
            None => Collator::try_new(&Default::default(), options),
        };
        let collator = match collator {
            Ok(c) => Some(c),
            Err(e) => {
                debug!("No collation data for {:?}: {}", posix_tag, e);
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let primary = match &self.collator {
            Some(c) => c.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        };
        primary.then_with(|| a.cmp(b))
    }
}

/// `de_DE.UTF-8@euro` -> `de-DE`
fn bcp47_locale(posix_tag: &str) -> Option<Locale> {
    let base = posix_tag.split(['.', '@']).next()?;
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    base.replace('_', "-").parse().ok()
}
