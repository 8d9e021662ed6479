use crate::extract::FieldRule;
use crate::site::SiteKind;

/// A second page derived from a primary URL by substring rewrite, fetched for
/// its reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Companion {
    pub kind: SiteKind,
    pub find: &'static str,
    pub replace: &'static str,
}

impl Companion {
    pub fn url_for(&self, url: &str) -> Option<String> {
        url.contains(self.find)
            .then(|| url.replacen(self.find, self.replace, 1))
    }
}

#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub kind: SiteKind,
    pub rules: &'static [FieldRule],
    pub default_template: &'static str,
    pub max_output_tokens: u32,
    /// Send the extracted title/description (and reviews) as separate user
    /// messages ahead of the filled template.
    pub send_source_content: bool,
    pub companion: Option<Companion>,
}

impl SiteProfile {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.field)
    }
}

#[derive(Debug, Clone)]
pub struct SiteRegistry {
    profiles: Vec<SiteProfile>,
}

impl SiteRegistry {
    pub fn new(profiles: Vec<SiteProfile>) -> Self {
        Self { profiles }
    }

    pub fn get(&self, kind: SiteKind) -> Option<&SiteProfile> {
        self.profiles.iter().find(|profile| profile.kind == kind)
    }

    pub fn profiles(&self) -> &[SiteProfile] {
        &self.profiles
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new(vec![
            SiteProfile {
                kind: SiteKind::LubimyCzytac,
                rules: LUBIMYCZYTAC_RULES,
                default_template: LUBIMYCZYTAC_TEMPLATE,
                max_output_tokens: 2000,
                send_source_content: false,
                companion: None,
            },
            SiteProfile {
                kind: SiteKind::Bookland,
                rules: BOOKLAND_RULES,
                default_template: BOOKLAND_TEMPLATE,
                max_output_tokens: 4000,
                send_source_content: true,
                companion: None,
            },
            SiteProfile {
                kind: SiteKind::TaniaKsiazka,
                rules: TANIAKSIAZKA_RULES,
                default_template: TANIAKSIAZKA_TEMPLATE,
                max_output_tokens: 2000,
                send_source_content: false,
                companion: Some(Companion {
                    kind: SiteKind::LubimyCzytac,
                    find: "taniaksiazka.pl",
                    replace: "lubimyczytac.pl/ksiazka",
                }),
            },
            SiteProfile {
                kind: SiteKind::NowaEra,
                rules: NOWAERA_RULES,
                default_template: NOWAERA_TEMPLATE,
                max_output_tokens: 2000,
                send_source_content: false,
                companion: None,
            },
        ])
    }
}

const LUBIMYCZYTAC_RULES: &[FieldRule] = &[
    FieldRule::first("description", "#book-description"),
    FieldRule::reviews("reviews", "p.expandTextNoJS.p-expanded.js-expanded"),
];

const BOOKLAND_RULES: &[FieldRule] = &[
    FieldRule::first("title", "h1"),
    FieldRule::first("description", ".ProductInformation-Description"),
];

const TANIAKSIAZKA_RULES: &[FieldRule] = &[
    FieldRule::first("title", "h1"),
    FieldRule::first("description", "#product-description"),
    FieldRule::first("details", ".product-features"),
];

const NOWAERA_RULES: &[FieldRule] = &[
    FieldRule::first("title", "h1"),
    FieldRule::first("description", ".product-description"),
    FieldRule::first("details", ".product-attributes"),
    FieldRule::first("extra_info", ".product-additional-info"),
];

const LUBIMYCZYTAC_TEMPLATE: &str = "Oto aktualny opis książki:
{description}

Oto autentyczne opinie czytelników o tej książce:
{reviews}

Na podstawie opisu i opinii stwórz nowy, przekonujący opis książki w HTML. \
Podsumuj, co czytelnicy cenią najbardziej, nawiązując do konkretów z opinii. \
Nie zwracaj żadnych dodatkowych komentarzy, tylko sam opis.";

const BOOKLAND_TEMPLATE: &str = "Stwórz optymalizowany pod SEO opis książki „{title}” w HTML.

1. Opis powinien wykorzystywać tagi HTML (nie Markdown):
   - <h2> dla podtytułów sekcji
   - <p> dla paragrafów
   - <b> dla wyróżnienia kluczowych fraz
   - <ul>/<li> dla list

2. Opis powinien zawierać następujące sekcje:
   <h2>Unikalne, kreatywne hasło związane z treścią książki. Nie używaj standardowych fraz \
jak „Odkryj tajemnice”, „Poznaj”, „Zanurz się”.</h2>
   <p>Wprowadzenie prezentujące główne zalety i unikalne cechy książki</p>
   <p>Szczegółowy opis fabuły lub treści z <b>wyróżnionymi</b> słowami kluczowymi</p>
   <p>Wartości i korzyści dla czytelnika</p>
   <p>Określenie grupy docelowej i rekomendacje</p>
   <p>Podsumowanie opinii czytelników z nawiązaniem do konkretów</p>
   <h3>Przekonujący call to action</h3>

3. Słownictwo ma być odpowiednie dla gatunku książki i dostosowane do odbiorców. \
Nie zwracaj żadnych dodatkowych komentarzy, tylko sam opis.";

const TANIAKSIAZKA_TEMPLATE: &str = "Tytuł: {title}

Aktualny opis:
{description}

Szczegóły produktu:
{details}

Stwórz nowy opis tej książki do sklepu internetowego, zoptymalizowany pod SEO. \
Nie zwracaj żadnych dodatkowych komentarzy, tylko sam opis.";

const NOWAERA_TEMPLATE: &str = "Tytuł: {title}

Aktualny opis:
{description}

Szczegóły produktu:
{details}

Dodatkowe informacje:
{extra_info}

Stwórz nowy opis tej publikacji edukacyjnej dla uczniów, rodziców i nauczycieli. \
Podkreśl zgodność z podstawą programową i praktyczne korzyści. \
Nie zwracaj żadnych dodatkowych komentarzy, tylko sam opis.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::placeholders;

    #[test]
    fn default_registry_covers_every_site_kind() {
        let registry = SiteRegistry::default();
        for kind in SiteKind::ALL {
            assert!(registry.get(kind).is_some(), "missing profile for {kind}");
        }
    }

    #[test]
    fn default_templates_only_use_their_own_fields() {
        let registry = SiteRegistry::default();
        for profile in registry.profiles() {
            let fields = profile.fields().collect::<Vec<_>>();
            for name in placeholders(profile.default_template) {
                assert!(
                    fields.contains(&name.as_str()),
                    "{}: template uses {{{name}}} not in {fields:?}",
                    profile.kind
                );
            }
        }
    }

    #[test]
    fn companion_rewrites_taniaksiazka_to_lubimyczytac() {
        let registry = SiteRegistry::default();
        let companion = registry
            .get(SiteKind::TaniaKsiazka)
            .and_then(|profile| profile.companion)
            .expect("taniaksiazka companion");

        assert_eq!(
            companion
                .url_for("https://taniaksiazka.pl/wiedzmin-ostatnie-zyczenie")
                .as_deref(),
            Some("https://lubimyczytac.pl/ksiazka/wiedzmin-ostatnie-zyczenie")
        );
        assert_eq!(companion.url_for("https://example.com/x"), None);
    }
}
