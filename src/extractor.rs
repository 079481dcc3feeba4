use scraper::{ElementRef, Html, Selector};

use crate::data_models::{Attributes, Listing};
use crate::error::{Error, Result};

/// CSS selectors describing an ad detail page. The defaults follow the
/// affare.tn markup; its class names carry build hashes and change with
/// every redeploy of the site, so they are kept overridable.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    /// Repeated info block holding the category, location and date.
    pub info_block: String,
    /// Position of the info block carrying the property type. Only used when
    /// no attribute row is labelled with one of `type_labels`.
    pub type_index: usize,
    /// Position of the posting date among the direct text nodes of all info
    /// blocks. Only used when no attribute row matches `date_labels`.
    pub date_index: usize,
    pub title: String,
    pub price: String,
    /// Matched on the exact `class` attribute, not on a single class.
    pub location: String,
    pub attribute_row: String,
    pub attribute_cell: String,
    pub description: String,
    pub description_paragraph: String,
    pub type_labels: Vec<String>,
    pub date_labels: Vec<String>,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        ListingSelectors {
            info_block: "div.Annonce_f201510__BNC4l".into(),
            type_index: 1,
            date_index: 4,
            title: "div.Annonce_product_info__91ryJ h1".into(),
            price: "span.Annonce_price__tE_l1".into(),
            location: r#"div[class="Annonce_f201510__BNC4l m-t-10"]"#.into(),
            attribute_row: "div.Annonce_flx785550__AnK7v".into(),
            attribute_cell: "div > div".into(),
            description: "div.Annonce_dessto__r_nAG".into(),
            description_paragraph: "p".into(),
            type_labels: vec!["Type".into(), "Type de bien".into()],
            date_labels: vec![
                "Date".into(),
                "Publiée le".into(),
                "Date de publication".into(),
            ],
        }
    }
}

/// Turns a fetched detail page into a [`Listing`].
///
/// Selectors that match nothing leave the field as `None`. Positional lookups
/// (type and posting date without a labelled row) fail the whole page with
/// [`Error::MissingNode`] when the markup has fewer elements than expected.
pub struct ListingExtractor {
    selectors: ListingSelectors,
    info_block: Selector,
    title: Selector,
    price: Selector,
    location: Selector,
    attribute_row: Selector,
    attribute_cell: Selector,
    description: Selector,
    description_paragraph: Selector,
}

impl ListingExtractor {
    pub fn new(selectors: ListingSelectors) -> Result<ListingExtractor> {
        Ok(ListingExtractor {
            info_block: create_selector(&selectors.info_block)?,
            title: create_selector(&selectors.title)?,
            price: create_selector(&selectors.price)?,
            location: create_selector(&selectors.location)?,
            attribute_row: create_selector(&selectors.attribute_row)?,
            attribute_cell: create_selector(&selectors.attribute_cell)?,
            description: create_selector(&selectors.description)?,
            description_paragraph: create_selector(&selectors.description_paragraph)?,
            selectors,
        })
    }

    pub fn extract(&self, url: &str, html: &str) -> Result<Listing> {
        let document = Html::parse_document(html);
        let mut listing = Listing::new(url.to_string());

        listing.attributes = self.extract_attributes(&document)?;

        let labelled_type = lookup_label(&listing.attributes, &self.selectors.type_labels);
        listing.property_type = match labelled_type {
            Some(value) => Some(value),
            None => self.positional_type(&document)?,
        };
        let labelled_date = lookup_label(&listing.attributes, &self.selectors.date_labels);
        listing.posting_date = match labelled_date {
            Some(value) => Some(value),
            None => Some(self.positional_date(&document)?),
        };

        listing.title = document.select(&self.title).find_map(first_direct_text);
        listing.price = document.select(&self.price).find_map(first_direct_text);
        listing.location = self.extract_location(&document);
        listing.description = self.extract_description(&document);

        Ok(listing)
    }

    /// Each row contributes one entry: the first text is the label, the rest
    /// joined with single spaces is the value. A repeated label overwrites the
    /// earlier one.
    fn extract_attributes(&self, document: &Html) -> Result<Attributes> {
        let mut attributes = Attributes::new();
        for row in document.select(&self.attribute_row) {
            let mut texts = row
                .select(&self.attribute_cell)
                .flat_map(direct_texts)
                .map(str::trim)
                .filter(|t| !t.is_empty());

            let label = texts.next().ok_or(Error::MissingLabel)?;
            let value = texts.collect::<Vec<_>>().join(" ");
            attributes.insert(label.to_string(), value);
        }
        Ok(attributes)
    }

    fn positional_type(&self, document: &Html) -> Result<Option<String>> {
        let blocks: Vec<ElementRef> = document.select(&self.info_block).collect();
        let index = self.selectors.type_index;
        let block = blocks.get(index).ok_or_else(|| Error::MissingNode {
            selector: self.selectors.info_block.clone(),
            index,
            found: blocks.len(),
        })?;

        Ok(block
            .text()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map(str::to_string))
    }

    fn positional_date(&self, document: &Html) -> Result<String> {
        let texts: Vec<&str> = document
            .select(&self.info_block)
            .flat_map(direct_texts)
            .collect();
        let index = self.selectors.date_index;
        texts
            .get(index)
            .map(|t| t.trim().to_string())
            .ok_or_else(|| Error::MissingNode {
                selector: format!("{}::text", self.selectors.info_block),
                index,
                found: texts.len(),
            })
    }

    fn extract_location(&self, document: &Html) -> Option<String> {
        let mut blocks = document.select(&self.location).peekable();
        blocks.peek()?;
        let location: String = blocks.flat_map(direct_texts).collect();
        Some(location.trim().to_string())
    }

    /// Paragraphs of every description block, in document order.
    fn extract_description(&self, document: &Html) -> Option<String> {
        let mut blocks = document.select(&self.description).peekable();
        blocks.peek()?;
        let description = blocks
            .flat_map(|block| block.select(&self.description_paragraph))
            .flat_map(direct_texts)
            .collect::<Vec<_>>()
            .join(" ");
        Some(description.replace('\u{a0}', " "))
    }
}

pub(crate) fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::Selector(sel_str.into()))
}

/// Text nodes that are immediate children of `element`, in document order.
fn direct_texts<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
}

fn first_direct_text(element: ElementRef) -> Option<String> {
    direct_texts(element)
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

fn lookup_label(attributes: &Attributes, labels: &[String]) -> Option<String> {
    labels
        .iter()
        .find_map(|label| attributes.get(label))
        .cloned()
}
