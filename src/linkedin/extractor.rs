use super::{ConnectionRecord, HeadlineParser};
use itertools::Itertools;
use lazy_static::lazy_static;
use scraper::{ElementRef, Selector};
use tracing::debug;

pub const DEFAULT_ORIGIN: &str = "https://www.linkedin.com";

const PROFILE_MARKER: &str = "/in/";

/// Anonymized members ("LinkedIn Member") link to an opaque URN instead of a slug.
const PLACEHOLDER_PROFILES: &[&str] = &["/in/ACoAA"];

/// Lowercase tokens that mark a span as button or link chrome rather than a name.
const NAME_CHROME: &[&str] = &["view", "linkedin", "connect"];

/// Mis-decoded separators ("•", "·") that leak into degree badges.
const MOJIBAKE: &[&str] = &["â€¢", "Â·"];

const HEADLINE_CHROME: &[&str] = &["Connect", "Follow", "mutual", "Message"];

const CDN_HOSTS: &[&str] = &["licdn"];

const IMAGE_PLACEHOLDERS: &[&str] = &["ghost", "data:", "/aero-v1/sc/h/"];

const E: &str = "Invalid selector";
lazy_static! {
    static ref A: Selector = Selector::parse("a[href]").expect(E);
    static ref HIDDEN_SPAN: Selector = Selector::parse(r#"span[aria-hidden="true"]"#).expect(E);
    static ref SPAN: Selector = Selector::parse("span").expect(E);
    static ref IMG: Selector = Selector::parse("img[src]").expect(E);
}

type NameStrategy = fn(ElementRef<'_>) -> Option<String>;

/// Tried in order against each profile link; first hit wins.
const NAME_STRATEGIES: &[NameStrategy] = &[hidden_span_name, span_name, link_text_name];

#[derive(Debug, Clone)]
pub struct Extractor {
    origin: String,
    headline: HeadlineParser,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(DEFAULT_ORIGIN)
    }
}

impl Extractor {
    pub fn new<S: Into<String>>(origin: S) -> Self {
        Extractor {
            origin: origin.into().trim_end_matches('/').to_string(),
            headline: HeadlineParser::default(),
        }
    }

    pub fn with_headline_parser(mut self, parser: HeadlineParser) -> Self {
        self.headline = parser;
        self
    }

    /// Recovers one record from a card. Pure: calling it twice on the same
    /// card gives the same answer.
    pub fn extract(&self, card: ElementRef<'_>) -> Option<ConnectionRecord> {
        let (profile_url, name) = card.select(&A).find_map(|link| {
            let url = canonical_profile_url(&self.origin, link.value().attr("href")?)?;
            let name = NAME_STRATEGIES.iter().find_map(|strategy| strategy(link))?;
            Some((url, name))
        })?;

        let headline = find_headline(card, &name);
        let occupation = self.headline.parse(&headline);
        let image_url = find_image(card);

        debug!(
            "Found: {} - {}",
            name,
            headline.chars().take(50).collect::<String>()
        );

        Some(ConnectionRecord {
            profile_url,
            name,
            headline,
            title: occupation.title,
            company: occupation.company,
            location: String::new(),
            image_url,
        })
    }
}

/// Absolute profile URL with the query string removed, or `None` when `href`
/// is not a real member profile.
pub fn canonical_profile_url(origin: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if !href.contains(PROFILE_MARKER) || PLACEHOLDER_PROFILES.iter().any(|p| href.contains(p)) {
        return None;
    }

    let absolute = if href.starts_with("http") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else if href.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", origin.trim_end_matches('/'), href)
    };

    let url = absolute
        .split_once('?')
        .map_or(absolute.as_str(), |(path, _)| path);
    reqwest::Url::parse(url).ok()?;

    Some(url.to_string())
}

fn plausible_name(text: &str) -> bool {
    let len = text.chars().count();
    let lower = text.to_lowercase();
    len > 2
        && len < 50
        && text.split(' ').count() <= 5
        && !NAME_CHROME.iter().any(|t| lower.contains(t))
        && !MOJIBAKE.iter().any(|m| text.contains(m))
}

fn span_text_name(link: ElementRef<'_>, spans: &Selector) -> Option<String> {
    link.select(spans)
        .map(|span| span.text().collect::<String>().trim().to_string())
        .find(|text| plausible_name(text))
}

fn hidden_span_name(link: ElementRef<'_>) -> Option<String> {
    span_text_name(link, &HIDDEN_SPAN)
}

fn span_name(link: ElementRef<'_>) -> Option<String> {
    span_text_name(link, &SPAN)
}

fn link_text_name(link: ElementRef<'_>) -> Option<String> {
    let text = link.text().collect::<String>();
    let text = text.trim();
    let len = text.chars().count();
    if len <= 2 || len >= 50 {
        return None;
    }
    text.lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
}

/// The first non-chrome line within three lines after the line holding the
/// name. Empty when the name is not found.
fn find_headline(card: ElementRef<'_>, name: &str) -> String {
    let text = card.text().collect::<String>();
    let lines = text
        .split('\n')
        .map(str::trim)
        .filter(|line| {
            let len = line.chars().count();
            len > 5 && len < 200
        })
        .collect_vec();

    let Some(at) = lines.iter().position(|line| line.contains(name)) else {
        return String::new();
    };

    lines
        .iter()
        .skip(at + 1)
        .take(3)
        .find(|line| {
            line.chars().count() > 10 && !HEADLINE_CHROME.iter().any(|c| line.contains(c))
        })
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn find_image(card: ElementRef<'_>) -> String {
    card.select(&IMG)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| {
            CDN_HOSTS.iter().any(|host| src.contains(host))
                && !IMAGE_PLACEHOLDERS.iter().any(|p| src.contains(p))
        })
        .map(|src| match src.strip_prefix("//") {
            Some(rest) => format!("https://{}", rest),
            None => src.to_string(),
        })
        .unwrap_or_default()
}
