use dariprice::pagination::{CrawlSession, ListingPageSelectors, Paginator};

const SEED: &str = "https://www.affare.tn/petites-annonces/tunisie/immobilier";
const BASE: &str = "https://www.affare.tn";

fn paginator() -> Paginator {
    Paginator::new(&ListingPageSelectors::default()).unwrap()
}

fn session() -> CrawlSession {
    CrawlSession::new(SEED, BASE).unwrap()
}

fn card(href: &str) -> String {
    format!(
        r#"<div class="AnnoncesList_product_x__S7zyQ">
            <a class="AnnoncesList_saz__RXM7e" href="{href}"><h2>Annonce</h2></a>
        </div>"#
    )
}

fn listing_page(hrefs: &[&str]) -> String {
    let cards: String = hrefs.iter().map(|href| card(href)).collect();
    format!("<html><body><div class=\"list\">{cards}</div></body></html>")
}

const EMPTY_PAGE: &str = r#"<html><body>
    <div class="item_empty">Aucune annonce ne correspond à votre recherche</div>
</body></html>"#;

#[cfg(test)]
mod listing_page_tests {
    use super::*;

    #[test]
    fn test_one_detail_request_per_card_and_next_page() {
        let session = session();
        let html = listing_page(&[
            "/annonce/immobilier/villa-1",
            "/annonce/immobilier/appartement-2",
            "/annonce/immobilier/studio-3",
        ]);

        let decision = paginator().plan(&session, &html);
        let urls: Vec<&str> = decision.detail_urls.iter().map(|u| u.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.affare.tn/annonce/immobilier/villa-1",
                "https://www.affare.tn/annonce/immobilier/appartement-2",
                "https://www.affare.tn/annonce/immobilier/studio-3",
            ]
        );
        assert_eq!(
            decision.next_page.unwrap().as_str(),
            "https://www.affare.tn/petites-annonces/tunisie/immobilier?o=2"
        );
        assert_eq!(session.page(), 2);
    }

    #[test]
    fn test_page_numbers_increase_by_one() {
        let session = session();
        let paginator = paginator();
        let html = listing_page(&["/annonce/1"]);

        for expected in 2..=5 {
            let decision = paginator.plan(&session, &html);
            assert_eq!(
                decision.next_page.unwrap().as_str(),
                format!("{SEED}?o={expected}")
            );
            assert_eq!(session.page(), expected);
        }
    }

    #[test]
    fn test_page_without_cards_still_advances() {
        let session = session();
        let decision = paginator().plan(&session, "<html><body></body></html>");
        assert!(decision.detail_urls.is_empty());
        assert!(decision.next_page.is_some());
        assert_eq!(session.page(), 2);
    }

    #[test]
    fn test_card_without_link_is_skipped() {
        let session = session();
        let html = format!(
            "<html><body>{}<div class=\"AnnoncesList_product_x__S7zyQ\"><span>Sponsorisé</span></div></body></html>",
            card("/annonce/1")
        );
        let decision = paginator().plan(&session, &html);
        assert_eq!(decision.detail_urls.len(), 1);
    }

    #[test]
    fn test_absolute_links_are_kept() {
        let session = session();
        let html = listing_page(&["https://www.affare.tn/annonce/42"]);
        let decision = paginator().plan(&session, &html);
        assert_eq!(
            decision.detail_urls[0].as_str(),
            "https://www.affare.tn/annonce/42"
        );
    }
}

#[cfg(test)]
mod empty_results_tests {
    use super::*;

    #[test]
    fn test_empty_marker_stops_everything() {
        let session = session();
        let decision = paginator().plan(&session, EMPTY_PAGE);
        assert!(decision.is_finished());
        assert!(decision.detail_urls.is_empty());
        assert!(decision.next_page.is_none());
        assert_eq!(session.page(), 1);
    }

    #[test]
    fn test_empty_marker_wins_over_cards() {
        let session = session();
        let html = format!(
            "<html><body><div class=\"item_empty\"></div>{}</body></html>",
            card("/annonce/1")
        );
        assert!(paginator().plan(&session, &html).is_finished());
        assert_eq!(session.page(), 1);
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;

    #[test]
    fn test_sessions_do_not_share_counters() {
        let first = session();
        let second = session();
        let html = listing_page(&["/annonce/1"]);

        paginator().plan(&first, &html);
        paginator().plan(&first, &html);
        let decision = paginator().plan(&second, &html);

        assert_eq!(first.page(), 3);
        assert_eq!(second.page(), 2);
        assert_eq!(decision.next_page.unwrap().as_str(), format!("{SEED}?o=2"));
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_invalid_seed_is_rejected() {
        assert!(CrawlSession::new("not a url", BASE).is_err());
    }
}
