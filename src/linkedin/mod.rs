mod extractor;
mod headline;
mod locator;

pub use extractor::{canonical_profile_url, Extractor, DEFAULT_ORIGIN};
pub use headline::{HeadlineParser, Occupation};
pub use locator::{CardLocator, LocatorStrategy};

use itertools::Itertools;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// One person as it crosses the boundary to the remote store. `profile_url`
/// is the natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub profile_url: String,
    pub name: String,
    pub headline: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub image_url: String,
}

impl fmt::Display for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_none(s: &str) -> &str {
            if s.is_empty() {
                "None"
            } else {
                s
            }
        }

        writeln!(f, "Name            : {}", self.name)?;
        writeln!(f, "Profile         : {}", self.profile_url)?;
        writeln!(f, "Headline        : {}", or_none(&self.headline))?;
        writeln!(f, "Title           : {}", or_none(&self.title))?;
        writeln!(f, "Company         : {}", or_none(&self.company))?;
        writeln!(f, "Image           : {}", or_none(&self.image_url))?;

        Ok(())
    }
}

/// Card Locator and Extractor bundled into one scan pass over a snapshot.
#[derive(Debug, Clone, Default)]
pub struct Harvester {
    pub locator: CardLocator,
    pub extractor: Extractor,
}

impl Harvester {
    pub fn new(locator: CardLocator, extractor: Extractor) -> Self {
        Harvester { locator, extractor }
    }

    /// Records found in `html`, first occurrence per profile URL, in document
    /// order. Cards that don't yield a record are skipped silently.
    pub fn harvest(&self, html: &str) -> Vec<ConnectionRecord> {
        let doc = Html::parse_document(html);
        let cards = self.locator.locate(&doc);
        debug!("Cards located: {}", cards.len());

        cards
            .into_iter()
            .filter_map(|card| self.extractor.extract(card))
            .unique_by(|record| record.profile_url.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn record(
        profile_url: &str,
        name: &str,
        headline: &str,
        title: &str,
        company: &str,
        image_url: &str,
    ) -> ConnectionRecord {
        ConnectionRecord {
            profile_url: profile_url.to_string(),
            name: name.to_string(),
            headline: headline.to_string(),
            title: title.to_string(),
            company: company.to_string(),
            location: String::new(),
            image_url: image_url.to_string(),
        }
    }

    #[test]
    fn harvest_connections_page() {
        let html = fs::read_to_string("tests/htmls/connections.html").expect("Invalid file url");
        let records = Harvester::default().harvest(&html);

        assert_eq!(
            records,
            vec![
                record(
                    "https://www.linkedin.com/in/jane-doe-123/",
                    "Jane Doe",
                    "Senior Engineer at Acme Corp",
                    "Senior Engineer",
                    "Acme Corp",
                    "https://media.licdn.com/dms/image/C4E03AQ/profile-displayphoto-shrink_100_100/jane.jpg",
                ),
                record(
                    "https://www.linkedin.com/in/bob-smith",
                    "Bob Smith",
                    "Engineer | Globex",
                    "Engineer",
                    "Globex",
                    "",
                ),
                record(
                    "https://www.linkedin.com/in/carol-xu",
                    "Carol Xu",
                    "Freelancer and consultant",
                    "Freelancer and consultant",
                    "",
                    "",
                ),
            ]
        );
    }

    #[test]
    fn harvest_search_page_without_known_cards() {
        let html = fs::read_to_string("tests/htmls/search.html").expect("Invalid file url");
        let records = Harvester::default().harvest(&html);

        assert_eq!(
            records,
            vec![
                record(
                    "https://www.linkedin.com/in/dave-lee",
                    "Dave Lee",
                    "Product Manager - Initech",
                    "Product Manager",
                    "Initech",
                    "https://media.licdn.com/dms/image/dave.jpg",
                ),
                record(
                    "https://www.linkedin.com/in/erin-moss/",
                    "Erin Moss",
                    "Data Scientist @ Hooli",
                    "Data Scientist",
                    "Hooli",
                    "",
                ),
                record(
                    "https://www.linkedin.com/in/frank-ode",
                    "Frank Ode",
                    "Recruiter at Umbrella",
                    "Recruiter",
                    "Umbrella",
                    "",
                ),
            ]
        );
    }

    #[test]
    fn harvest_is_idempotent() {
        let html = fs::read_to_string("tests/htmls/connections.html").expect("Invalid file url");
        let h = Harvester::default();
        assert_eq!(h.harvest(&html), h.harvest(&html));
    }

    #[test]
    fn harvest_empty_document() {
        assert!(Harvester::default().harvest("").is_empty());
        assert!(Harvester::default()
            .harvest("<html><body><main><p>Nothing here</p></main></body></html>")
            .is_empty());
    }

    #[test]
    fn display_marks_missing_fields() {
        let r = record("https://x/in/a", "A Person", "", "", "", "");
        let shown = r.to_string();
        assert!(shown.contains("Headline        : None"));
        assert!(shown.contains("Name            : A Person"));
    }
}
