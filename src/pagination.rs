use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashSet;
use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;
use crate::extractor::create_selector;

/// Selectors for the search result pages.
#[derive(Debug, Clone)]
pub struct ListingPageSelectors {
    /// Present only when the page has no results left.
    pub empty_marker: String,
    pub card: String,
    pub card_link: String,
}

impl Default for ListingPageSelectors {
    fn default() -> Self {
        ListingPageSelectors {
            empty_marker: "div.item_empty".into(),
            card: "div.AnnoncesList_product_x__S7zyQ".into(),
            card_link: "a.AnnoncesList_saz__RXM7e".into(),
        }
    }
}

/// State of one crawl run. Every pagination step of the run goes through the
/// same session, two sessions never share a page counter.
#[derive(Debug)]
pub struct CrawlSession {
    id: String,
    seed: Url,
    base: Url,
    page: AtomicUsize,
    scheduled: DashSet<String>,
}

impl CrawlSession {
    pub fn new(seed: &str, base: &str) -> Result<CrawlSession> {
        Ok(CrawlSession {
            id: nanoid::nanoid!(10),
            seed: Url::parse(seed)?,
            base: Url::parse(base)?,
            page: AtomicUsize::new(1),
            scheduled: DashSet::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Number of the last listing page scheduled. The seed counts as page 1.
    pub fn page(&self) -> usize {
        self.page.load(Ordering::SeqCst)
    }

    /// Records `url` as scheduled. Returns false when it already was.
    pub fn schedule(&self, url: &Url) -> bool {
        self.scheduled.insert(url.to_string())
    }

    /// Bumps the page counter and returns the URL of the new page.
    pub fn next_page_url(&self) -> Url {
        let page = self.page.fetch_add(1, Ordering::SeqCst) + 1;
        self.page_url(page)
    }

    /// The seed URL with `o=<page>`, replacing any `o` already present.
    pub fn page_url(&self, page: usize) -> Url {
        let mut url = self.seed.clone();
        let kept: Vec<(String, String)> = self
            .seed
            .query_pairs()
            .filter(|(key, _)| key != "o")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("o", &page.to_string());
        url
    }
}

/// What to fetch after a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageDecision {
    pub detail_urls: Vec<Url>,
    pub next_page: Option<Url>,
}

impl PageDecision {
    pub fn finished() -> PageDecision {
        PageDecision::default()
    }

    pub fn is_finished(&self) -> bool {
        self.detail_urls.is_empty() && self.next_page.is_none()
    }
}

pub struct Paginator {
    empty_marker: Selector,
    card: Selector,
    card_link: Selector,
}

impl Paginator {
    pub fn new(selectors: &ListingPageSelectors) -> Result<Paginator> {
        Ok(Paginator {
            empty_marker: create_selector(&selectors.empty_marker)?,
            card: create_selector(&selectors.card)?,
            card_link: create_selector(&selectors.card_link)?,
        })
    }

    /// Decides the follow-up requests for a listing page.
    ///
    /// A page carrying the empty-results marker ends the crawl and leaves the
    /// page counter alone. Any other page yields one detail URL per card and
    /// the next listing page, even when no card was found: only the marker
    /// stops pagination.
    pub fn plan(&self, session: &CrawlSession, html: &str) -> PageDecision {
        let document = Html::parse_document(html);

        if document.select(&self.empty_marker).next().is_some() {
            log::info!("[{}] reached empty results page", session.id());
            return PageDecision::finished();
        }

        let mut detail_urls = Vec::new();
        for card in document.select(&self.card) {
            let href = card
                .select(&self.card_link)
                .find_map(|link| link.value().attr("href"));
            let Some(href) = href else {
                log::warn!("[{}] listing card without a link, skipping", session.id());
                continue;
            };
            match session.base.join(href) {
                Ok(url) => detail_urls.push(url),
                Err(e) => log::warn!("[{}] bad card link {href:?}: {e}", session.id()),
            }
        }

        PageDecision {
            detail_urls,
            next_page: Some(session.next_page_url()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_sets_page_parameter() {
        let session = CrawlSession::new(
            "https://www.affare.tn/petites-annonces/tunisie/immobilier",
            "https://www.affare.tn",
        )
        .unwrap();
        assert_eq!(
            session.page_url(2).as_str(),
            "https://www.affare.tn/petites-annonces/tunisie/immobilier?o=2"
        );
    }

    #[test]
    fn test_page_url_replaces_existing_page_parameter() {
        let session =
            CrawlSession::new("https://example.tn/list?cat=7&o=3", "https://example.tn").unwrap();
        assert_eq!(
            session.page_url(9).as_str(),
            "https://example.tn/list?cat=7&o=9"
        );
    }

    #[test]
    fn test_next_page_url_advances_counter() {
        let session = CrawlSession::new("https://example.tn/list", "https://example.tn").unwrap();
        assert_eq!(session.next_page_url().as_str(), "https://example.tn/list?o=2");
        assert_eq!(session.next_page_url().as_str(), "https://example.tn/list?o=3");
        assert_eq!(session.page(), 3);
    }

    #[test]
    fn test_invalid_card_selector_is_reported() {
        let selectors = ListingPageSelectors {
            card: "div..".into(),
            ..Default::default()
        };
        match Paginator::new(&selectors) {
            Err(crate::Error::Selector(sel)) => assert_eq!(sel, "div.."),
            Err(e) => panic!("expected selector error, got {e:?}"),
            Ok(_) => panic!("expected selector error"),
        }
    }

    #[test]
    fn test_schedule_filters_duplicates() {
        let session = CrawlSession::new("https://example.tn/list", "https://example.tn").unwrap();
        let url = Url::parse("https://example.tn/annonce/1").unwrap();
        assert!(session.schedule(&url));
        assert!(!session.schedule(&url));
    }
}
