use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

/// Card wrappers seen across releases of the connections, search and
/// "people you may know" listings. Add new shapes here.
const CARD_SELECTORS: &[&str] = &[
    "li.mn-connection-card",
    "li.reusable-search__result-container",
    "div.entity-result",
    r#"div[data-view-name="search-entity-result-universal-template"]"#,
    "li.discover-entity-type-card",
    "li.org-people-profile-card__profile-card-spacing",
];

/// Ancestor levels walked from a profile link before giving up.
const MAX_WALK_DEPTH: usize = 10;

const E: &str = "Invalid selector";
lazy_static! {
    static ref CARD_CONTAINERS: Selector = Selector::parse(&CARD_SELECTORS.join(", ")).expect(E);
    static ref PROFILE_LINK: Selector = Selector::parse(r#"a[href*="/in/"]"#).expect(E);
    static ref MAIN: Selector = Selector::parse("main").expect(E);
    static ref BODY: Selector = Selector::parse("body").expect(E);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LocatorStrategy {
    /// Known card selectors, falling back to the anchor walk when none match.
    #[default]
    Auto,
    Selectors,
    Anchors,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CardLocator {
    strategy: LocatorStrategy,
}

impl CardLocator {
    pub fn new(strategy: LocatorStrategy) -> Self {
        CardLocator { strategy }
    }

    /// One element per candidate person. Never returns the same node twice,
    /// nor a node nested inside an already returned card. `Auto` lists the
    /// selector matches first, then cards the anchor walk finds outside them.
    pub fn locate<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let root = scan_root(doc);
        match self.strategy {
            LocatorStrategy::Selectors => by_selectors(root),
            LocatorStrategy::Anchors => by_anchor_walk(root, vec![]),
            LocatorStrategy::Auto => by_anchor_walk(root, by_selectors(root)),
        }
    }
}

fn scan_root(doc: &Html) -> ElementRef<'_> {
    doc.select(&MAIN)
        .next()
        .or_else(|| doc.select(&BODY).next())
        .unwrap_or_else(|| doc.root_element())
}

fn by_selectors(root: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut cards = vec![];
    for el in root.select(&CARD_CONTAINERS) {
        claim(&mut cards, el);
    }
    cards
}

/// Adds a card for every profile link not already inside one of `cards`.
fn by_anchor_walk<'a>(
    root: ElementRef<'a>,
    mut cards: Vec<ElementRef<'a>>,
) -> Vec<ElementRef<'a>> {
    for link in root.select(&PROFILE_LINK) {
        if is_claimed(&cards, link) {
            continue;
        }
        if let Some(card) = walk_to_card(root, link) {
            claim(&mut cards, card);
        }
    }
    cards
}

fn walk_to_card<'a>(root: ElementRef<'a>, link: ElementRef<'a>) -> Option<ElementRef<'a>> {
    for node in link.ancestors().take(MAX_WALK_DEPTH) {
        if node.id() == root.id() {
            return None;
        }
        let el = ElementRef::wrap(node)?;
        if looks_like_card(el) {
            return Some(el);
        }
    }
    None
}

fn looks_like_card(el: ElementRef<'_>) -> bool {
    match el.value().name() {
        "li" | "article" => true,
        "div" => el.select(&PROFILE_LINK).count() == 1,
        _ => false,
    }
}

/// True when `el` is a claimed card or sits inside one.
fn is_claimed(cards: &[ElementRef<'_>], el: ElementRef<'_>) -> bool {
    el.ancestors()
        .map(|node| node.id())
        .chain(std::iter::once(el.id()))
        .any(|id| cards.iter().any(|card| card.id() == id))
}

fn claim<'a>(cards: &mut Vec<ElementRef<'a>>, candidate: ElementRef<'a>) {
    if !is_claimed(cards, candidate) {
        cards.push(candidate);
    }
}
