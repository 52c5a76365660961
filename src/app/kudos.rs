// src/app/kudos.rs

//! Kudos: independently awarded quality signals
//!
//! Each backend may award any of the flags below. They only ever
//! accumulate, and the set is scored into a desirability percentage used
//! for ranking.

use crate::error::Error;
use bitflags::bitflags;
use std::str::FromStr;

bitflags! {
    /// Set of quality signals awarded to an application
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Kudos: u64 {
        /// Translated into the user's language
        const MY_LANGUAGE          = 1 << 0;
        /// Released upstream recently
        const RECENT_RELEASE       = 1 << 1;
        /// Featured or recommended by the distributor
        const FEATURED_RECOMMENDED = 1 << 2;
        /// Built with a modern toolkit
        const MODERN_TOOLKIT       = 1 << 3;
        /// Provides a desktop search provider
        const SEARCH_PROVIDER      = 1 << 4;
        /// Installs user documentation
        const INSTALLS_USER_DOCS   = 1 << 5;
        /// Uses desktop notifications
        const USES_NOTIFICATIONS   = 1 << 6;
        /// Ships search keywords
        const HAS_KEYWORDS         = 1 << 7;
        /// Uses an application menu
        const USES_APP_MENU        = 1 << 8;
        /// Has screenshots
        const HAS_SCREENSHOTS      = 1 << 9;
        /// Popular with users; floors the score at 50%
        const POPULAR              = 1 << 10;
        /// Input method supports a symbol
        const IBUS_HAS_SYMBOL      = 1 << 11;
    }
}

/// Score contribution of each weighted flag
const WEIGHTS: [(Kudos, u32); 11] = [
    (Kudos::MY_LANGUAGE, 20),
    (Kudos::RECENT_RELEASE, 20),
    (Kudos::FEATURED_RECOMMENDED, 20),
    (Kudos::MODERN_TOOLKIT, 20),
    (Kudos::SEARCH_PROVIDER, 10),
    (Kudos::INSTALLS_USER_DOCS, 10),
    (Kudos::USES_NOTIFICATIONS, 20),
    (Kudos::HAS_KEYWORDS, 5),
    (Kudos::USES_APP_MENU, 10),
    (Kudos::HAS_SCREENSHOTS, 20),
    (Kudos::IBUS_HAS_SYMBOL, 20),
];

/// Minimum score of a popular application
const POPULAR_FLOOR: u32 = 50;

/// Kebab-case names, in dump order
const NAMES: [(Kudos, &str); 12] = [
    (Kudos::MY_LANGUAGE, "my-language"),
    (Kudos::RECENT_RELEASE, "recent-release"),
    (Kudos::FEATURED_RECOMMENDED, "featured-recommended"),
    (Kudos::MODERN_TOOLKIT, "modern-toolkit"),
    (Kudos::SEARCH_PROVIDER, "search-provider"),
    (Kudos::INSTALLS_USER_DOCS, "installs-user-docs"),
    (Kudos::USES_NOTIFICATIONS, "uses-notifications"),
    (Kudos::USES_APP_MENU, "uses-app-menu"),
    (Kudos::HAS_KEYWORDS, "has-keywords"),
    (Kudos::HAS_SCREENSHOTS, "has-screenshots"),
    (Kudos::POPULAR, "popular"),
    (Kudos::IBUS_HAS_SYMBOL, "ibus-has-symbol"),
];

impl Kudos {
    /// Weighted desirability, 0 to 100
    pub fn percentage(&self) -> u32 {
        let mut percentage: u32 = WEIGHTS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, weight)| weight)
            .sum();

        // popular apps should be at *least* 50%
        if self.contains(Kudos::POPULAR) {
            percentage = percentage.max(POPULAR_FLOOR);
        }
        percentage.min(100)
    }

    /// Number of flags set, for simple relative ranking
    pub fn weight(&self) -> u32 {
        self.bits().count_ones()
    }

    /// Names of the set flags
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        NAMES
            .iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
    }

    /// Look up a single flag by its kebab-case name
    pub fn from_kebab(name: &str) -> Option<Kudos> {
        NAMES
            .iter()
            .find(|(_, candidate)| *candidate == name)
            .map(|(flag, _)| *flag)
    }
}

impl FromStr for Kudos {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kudos::from_kebab(s).ok_or_else(|| Error::InvalidValue(format!("Invalid kudo: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screenshots_and_keywords_score_25() {
        let kudos = Kudos::HAS_SCREENSHOTS | Kudos::HAS_KEYWORDS;
        assert_eq!(kudos.percentage(), 25);
        assert_eq!(kudos.weight(), 2);
    }

    #[test]
    fn test_popular_floors_at_50() {
        let kudos = Kudos::SEARCH_PROVIDER;
        assert_eq!(kudos.percentage(), 10);
        assert_eq!((kudos | Kudos::POPULAR).percentage(), 50);

        // floor, not additive
        let strong = Kudos::MY_LANGUAGE
            | Kudos::RECENT_RELEASE
            | Kudos::FEATURED_RECOMMENDED
            | Kudos::MODERN_TOOLKIT;
        assert_eq!((strong | Kudos::POPULAR).percentage(), 80);
    }

    #[test]
    fn test_all_flags_clamp_to_100() {
        assert_eq!(Kudos::all().percentage(), 100);
        assert_eq!(Kudos::all().weight(), 12);
        assert_eq!(Kudos::empty().percentage(), 0);
    }

    #[test]
    fn test_names_parse_back() {
        for name in Kudos::all().names() {
            let flag: Kudos = name.parse().unwrap();
            assert_eq!(flag.names().collect::<Vec<_>>(), vec![name]);
        }
        assert!("shiny".parse::<Kudos>().is_err());
    }
}
