use axum::http::StatusCode;
use maud::{DOCTYPE, Markup, html};

use crate::data_models::StateCities;
use crate::predictor::Estimate;

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="fr" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | DariPrice" }
            }
            body {
                main class="container narrow" {
                    (content)
                }
            }
        }
    }
}

pub fn index_page(locations: &StateCities) -> Markup {
    let locations = locations.sorted();
    layout(
        "Estimate a price",
        html! {
            h1 { "Estimate a property price" }
            @if locations.is_empty() {
                p class="warning" { "No locations are configured yet." }
            }
            form method="post" action="/" {
                label for="property_type" { "Property type" }
                select id="property_type" name="property_type" required {
                    option value="House" { "House" }
                    option value="Apartment" { "Apartment" }
                }

                label for="area" { "Area (m²)" }
                input id="area" name="area" type="number" min="1" step="any" required;

                label for="n_bedrooms" { "Bedrooms" }
                input id="n_bedrooms" name="n_bedrooms" type="number" min="0" step="1" required;

                label for="n_bathrooms" { "Bathrooms" }
                input id="n_bathrooms" name="n_bathrooms" type="number" min="0" step="1" required;

                label for="state" { "State" }
                select id="state" name="state" required {
                    @for (state, _) in &locations {
                        option value=(state) { (state) }
                    }
                }

                label for="city" { "City" }
                select id="city" name="city" required {
                    @for (state, cities) in &locations {
                        optgroup label=(state) {
                            @for city in cities {
                                option value=(city) { (city) }
                            }
                        }
                    }
                }

                button type="submit" { "Estimate" }
            }
        },
    )
}

pub fn result_page(estimate: &Estimate) -> Markup {
    let features = &estimate.features;
    layout(
        "Estimated price",
        html! {
            h1 { "Estimated price" }
            p class="lead" id="estimated_price" { (format_price(estimate.price)) " TND" }
            p {
                (features.property_type) ", " (features.area) " m², "
                (features.n_bedrooms) " bedrooms, " (features.n_bathrooms) " bathrooms in "
                (features.city) ", " (features.state)
            }
            a href="/" { "Go back" }
        },
    )
}

pub fn error_page(status: StatusCode, message: &str) -> Markup {
    layout(
        "Error",
        html! {
            h1 { (status.as_u16()) " " (status.canonical_reason().unwrap_or("Error")) }
            p { (message) }
            a href="/" { "Go back" }
        },
    )
}

/// Groups thousands with spaces: `1234567` -> `1 234 567`.
fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if price < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0), "0");
        assert_eq!(format_price(999), "999");
        assert_eq!(format_price(1000), "1 000");
        assert_eq!(format_price(1234567), "1 234 567");
        assert_eq!(format_price(-45000), "-45 000");
    }
}
