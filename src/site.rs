use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Source sites the pipeline knows how to extract from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    LubimyCzytac,
    Bookland,
    TaniaKsiazka,
    NowaEra,
}

impl SiteKind {
    pub const ALL: [SiteKind; 4] = [
        SiteKind::LubimyCzytac,
        SiteKind::Bookland,
        SiteKind::TaniaKsiazka,
        SiteKind::NowaEra,
    ];

    /// Lower-case substrings that identify the site in a URL.
    pub fn patterns(self) -> &'static [&'static str] {
        match self {
            SiteKind::LubimyCzytac => &["lubimyczytac"],
            SiteKind::Bookland => &["bookland.com.pl"],
            SiteKind::TaniaKsiazka => &["taniaksiazka.pl"],
            SiteKind::NowaEra => &["sklep.nowaera.pl"],
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            SiteKind::LubimyCzytac => "lubimyczytac",
            SiteKind::Bookland => "bookland",
            SiteKind::TaniaKsiazka => "taniaksiazka",
            SiteKind::NowaEra => "nowaera",
        }
    }

    /// Prefix for this site's fields when records are merged (`lubimy_reviews`).
    pub fn field_prefix(self) -> &'static str {
        match self {
            SiteKind::LubimyCzytac => "lubimy",
            SiteKind::Bookland => "bookland",
            SiteKind::TaniaKsiazka => "tania",
            SiteKind::NowaEra => "nowaera",
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for SiteKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        SiteKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == needle || kind.field_prefix() == needle)
            .ok_or_else(|| anyhow::anyhow!("unknown site kind: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Site(SiteKind),
    Unrecognized,
}

impl Classification {
    pub fn site(self) -> Option<SiteKind> {
        match self {
            Classification::Site(kind) => Some(kind),
            Classification::Unrecognized => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Site(kind) => kind.fmt(f),
            Classification::Unrecognized => f.write_str("unrecognized"),
        }
    }
}

/// Substring match against the lower-cased URL. When several patterns match,
/// the longest one wins; ties go to the earlier kind in [`SiteKind::ALL`].
pub fn classify(url: &str) -> Classification {
    let lowered = url.to_lowercase();

    let mut best: Option<(usize, SiteKind)> = None;
    for kind in SiteKind::ALL {
        for pattern in kind.patterns() {
            if !lowered.contains(pattern) {
                continue;
            }
            let better = match best {
                Some((len, _)) => pattern.len() > len,
                None => true,
            };
            if better {
                best = Some((pattern.len(), kind));
            }
        }
    }

    match best {
        Some((_, kind)) => Classification::Site(kind),
        None => Classification::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_matches_known_domains_case_insensitively() {
        let cases = [
            ("https://lubimyczytac.pl/ksiazka/1", Classification::Site(SiteKind::LubimyCzytac)),
            ("https://WWW.Bookland.com.pl/x", Classification::Site(SiteKind::Bookland)),
            ("https://www.taniaksiazka.pl/abc-p-1.html", Classification::Site(SiteKind::TaniaKsiazka)),
            ("https://sklep.nowaera.pl/produkt", Classification::Site(SiteKind::NowaEra)),
            ("https://example.com/book", Classification::Unrecognized),
            ("", Classification::Unrecognized),
        ];

        for (url, expected) in cases {
            assert_eq!(classify(url), expected, "url={url}");
        }
    }

    #[test]
    fn classify_prefers_longest_pattern() {
        // "taniaksiazka.pl" is longer than "lubimyczytac".
        let url = "https://taniaksiazka.pl/lubimyczytac-poleca";
        assert_eq!(classify(url), Classification::Site(SiteKind::TaniaKsiazka));
    }

    #[test]
    fn classify_is_deterministic() {
        let url = "https://lubimyczytac.pl/ksiazka/4837/sklep.nowaera.pl";
        let first = classify(url);
        for _ in 0..10 {
            assert_eq!(classify(url), first);
        }
        assert_eq!(first, Classification::Site(SiteKind::NowaEra));
    }

    #[test]
    fn site_kind_parses_slug_and_prefix() -> anyhow::Result<()> {
        assert_eq!("lubimyczytac".parse::<SiteKind>()?, SiteKind::LubimyCzytac);
        assert_eq!("tania".parse::<SiteKind>()?, SiteKind::TaniaKsiazka);
        assert!("amazon".parse::<SiteKind>().is_err());
        Ok(())
    }
}
