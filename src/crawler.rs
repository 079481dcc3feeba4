use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use url::Url;

use crate::data_models::Listing;
use crate::error::{Error, Result};
use crate::extractor::ListingExtractor;
use crate::pagination::{CrawlSession, PageDecision, Paginator};

/// Source of page bodies. The crawler only needs the HTML of a URL.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<HttpFetcher> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let res = self.client.get(url.clone()).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = res.text().await?;
        Ok(body)
    }
}

#[derive(Debug, Clone)]
enum PageTask {
    Listing(Url),
    Detail(Url),
}

impl PageTask {
    fn url(&self) -> &Url {
        match self {
            PageTask::Listing(url) | PageTask::Detail(url) => url,
        }
    }
}

enum PageOutcome {
    Listing(PageDecision),
    Detail(Listing),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub listing_pages: usize,
    pub detail_pages: usize,
    pub listings: usize,
    pub failed_pages: usize,
}

/// Walks the paginated search results of one site and extracts every ad.
///
/// Pages are fetched concurrently, at most `concurrency` at a time. A page that
/// fails to fetch or parse is logged and counted, the rest of the crawl goes on.
/// A failed listing page is skipped and the following one requested, until
/// `max_listing_failures` listing pages in a row have failed.
pub struct Crawler<F: Fetch> {
    fetcher: Arc<F>,
    extractor: Arc<ListingExtractor>,
    paginator: Arc<Paginator>,
    concurrent_fetches: Arc<Semaphore>,
    max_listing_failures: usize,
}

const DEFAULT_MAX_LISTING_FAILURES: usize = 3;

impl<F: Fetch> Crawler<F> {
    pub fn new(
        fetcher: F,
        extractor: ListingExtractor,
        paginator: Paginator,
        concurrency: usize,
    ) -> Crawler<F> {
        Crawler {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            paginator: Arc::new(paginator),
            concurrent_fetches: Arc::new(Semaphore::new(concurrency.max(1))),
            max_listing_failures: DEFAULT_MAX_LISTING_FAILURES,
        }
    }

    pub fn with_max_listing_failures(mut self, max: usize) -> Crawler<F> {
        self.max_listing_failures = max.max(1);
        self
    }

    /// Runs until no page is left in flight. Extracted listings are sent on
    /// `listings_tx` as soon as their page is parsed.
    pub async fn run(
        &self,
        session: Arc<CrawlSession>,
        listings_tx: mpsc::UnboundedSender<Listing>,
    ) -> CrawlStats {
        let mut stats = CrawlStats::default();
        let mut tasks = JoinSet::new();
        let mut listing_failures = 0;

        log::info!("[{}] crawling from {}", session.id(), session.seed());
        self.spawn_page(&mut tasks, &session, PageTask::Listing(session.seed().clone()));

        while let Some(joined) = tasks.join_next().await {
            let (task, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    log::error!("[{}] page task aborted, error: {}", session.id(), e);
                    stats.failed_pages += 1;
                    continue;
                }
            };

            match result {
                Ok(PageOutcome::Listing(decision)) => {
                    stats.listing_pages += 1;
                    listing_failures = 0;
                    for url in decision.detail_urls {
                        self.spawn_page(&mut tasks, &session, PageTask::Detail(url));
                    }
                    if let Some(next) = decision.next_page {
                        log::info!("[{}] next listing page: {next}", session.id());
                        self.spawn_page(&mut tasks, &session, PageTask::Listing(next));
                    }
                }
                Ok(PageOutcome::Detail(listing)) => {
                    stats.detail_pages += 1;
                    if listings_tx.send(listing).is_err() {
                        log::error!("[{}] listing sink is gone, dropping listing", session.id());
                        continue;
                    }
                    stats.listings += 1;
                }
                Err(e) => {
                    log::error!(
                        "[{}] error processing {}, error: {:#}",
                        session.id(),
                        task.url(),
                        e
                    );
                    stats.failed_pages += 1;

                    if let PageTask::Listing(_) = task {
                        listing_failures += 1;
                        if listing_failures >= self.max_listing_failures {
                            log::error!(
                                "[{}] {} listing pages failed in a row, stopping",
                                session.id(),
                                listing_failures
                            );
                            continue;
                        }
                        let next = session.next_page_url();
                        log::warn!("[{}] skipping to listing page: {next}", session.id());
                        self.spawn_page(&mut tasks, &session, PageTask::Listing(next));
                    }
                }
            }
        }

        log::info!("[{}] crawl finished: {:?}", session.id(), stats);
        stats
    }

    fn spawn_page(
        &self,
        tasks: &mut JoinSet<(PageTask, Result<PageOutcome>)>,
        session: &Arc<CrawlSession>,
        task: PageTask,
    ) {
        if !session.schedule(task.url()) {
            log::debug!("[{}] already scheduled: {}", session.id(), task.url());
            return;
        }

        let fetcher = self.fetcher.clone();
        let extractor = self.extractor.clone();
        let paginator = self.paginator.clone();
        let semaphore = self.concurrent_fetches.clone();
        let session = session.clone();

        tasks.spawn(async move {
            let result =
                process_page(&*fetcher, &extractor, &paginator, &semaphore, &session, &task).await;
            (task, result)
        });
    }
}

async fn process_page<F: Fetch>(
    fetcher: &F,
    extractor: &ListingExtractor,
    paginator: &Paginator,
    semaphore: &Semaphore,
    session: &CrawlSession,
    task: &PageTask,
) -> Result<PageOutcome> {
    let html = {
        let _permit = semaphore.acquire().await?;
        log::info!("[{}] fetching {}", session.id(), task.url());
        fetcher.fetch(task.url()).await?
    };

    match task {
        PageTask::Listing(_) => Ok(PageOutcome::Listing(paginator.plan(session, &html))),
        PageTask::Detail(url) => extractor
            .extract(url.as_str(), &html)
            .map(PageOutcome::Detail),
    }
}
