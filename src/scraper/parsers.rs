use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{RawHistoryTable, RawListingRow};
use scraper::{ElementRef, Html, Selector};

// ── Page schemas ──────────────────────────────────────────────────────────────

/// Where each listing field lives on the "all coins" page.
#[derive(Debug, Clone, Copy)]
pub struct ListingSchema {
    pub table: &'static str,
    pub row: &'static str,
    pub symbol: &'static str,
    pub name_link: &'static str,
    pub supply: &'static str,
}

pub const LISTING_SCHEMA: ListingSchema = ListingSchema {
    table: "table#currencies-all",
    row: "tr",
    symbol: "span.currency-symbol",
    name_link: "a.currency-name-container",
    supply: "td.circulating-supply",
};

/// Expected column layout of a coin's historical-data table.
#[derive(Debug, Clone, Copy)]
pub struct HistorySchema {
    pub table: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

pub const HISTORY_SCHEMA: HistorySchema = HistorySchema {
    table: "table.table",
    required: &["Date", "Open", "High", "Low", "Close"],
    optional: &["Volume", "Market Cap"],
};

impl HistorySchema {
    /// Checks the page headers against the schema and returns them with footnote
    /// markers ("Open*", "Close**") stripped.
    pub fn validate(&self, headers: &[String]) -> ScrapeResult<Vec<String>> {
        let columns: Vec<String> = headers.iter().map(|h| normalise_header(h)).collect();

        let max = self.required.len() + self.optional.len();
        if columns.len() < self.required.len() || columns.len() > max {
            return Err(ScrapeError::structure(format!(
                "history table has {} columns ({:?}), expected {}..={}",
                columns.len(),
                columns,
                self.required.len(),
                max
            )));
        }

        let expected = self.required.iter().chain(self.optional.iter());
        for (got, want) in columns.iter().zip(expected) {
            if !got.eq_ignore_ascii_case(want) {
                return Err(ScrapeError::structure(format!(
                    "history column {:?} where {:?} was expected",
                    got, want
                )));
            }
        }

        Ok(columns)
    }
}

fn normalise_header(h: &str) -> String {
    h.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('*')
        .trim()
        .to_string()
}

fn selector(css: &str) -> ScrapeResult<Selector> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::structure(format!("selector {:?}: {:?}", css, e)))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text of the cell's first child element, or its first bare token when it has none.
fn first_token(cell: ElementRef<'_>) -> String {
    cell.children()
        .find_map(ElementRef::wrap)
        .map(element_text)
        .unwrap_or_else(|| {
            cell.text()
                .flat_map(str::split_whitespace)
                .next()
                .unwrap_or_default()
                .to_string()
        })
}

// ── Listing page ──────────────────────────────────────────────────────────────

pub fn parse_listing_page(html: &str) -> ScrapeResult<Vec<RawListingRow>> {
    let doc = Html::parse_document(html);
    let schema = LISTING_SCHEMA;

    let table_sel = selector(schema.table)?;
    let row_sel = selector(schema.row)?;
    let symbol_sel = selector(schema.symbol)?;
    let link_sel = selector(schema.name_link)?;
    let supply_sel = selector(schema.supply)?;

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScrapeError::structure(format!("no `{}` on listing page", schema.table)))?;

    let mut rows = Vec::new();

    // First row is the header.
    for (i, tr) in table.select(&row_sel).enumerate().skip(1) {
        let missing = |what: &str| {
            ScrapeError::structure(format!("listing row {} has no `{}`", i, what))
        };

        let symbol = tr
            .select(&symbol_sel)
            .next()
            .map(element_text)
            .ok_or_else(|| missing(schema.symbol))?;

        let href = tr
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
            .ok_or_else(|| missing(schema.name_link))?;

        let supply = tr
            .select(&supply_sel)
            .next()
            .map(first_token)
            .ok_or_else(|| missing(schema.supply))?;

        rows.push(RawListingRow { symbol, href, supply });
    }

    Ok(rows)
}

// ── Historical-data page ──────────────────────────────────────────────────────

pub fn parse_history_page(html: &str) -> ScrapeResult<RawHistoryTable> {
    let doc = Html::parse_document(html);

    let table_sel = selector(HISTORY_SCHEMA.table)?;
    let head_sel = selector("thead th")?;
    let first_row_th_sel = selector("tr th")?;
    let body_row_sel = selector("tbody tr")?;
    let td_sel = selector("td")?;

    let table = doc.select(&table_sel).next().ok_or_else(|| {
        ScrapeError::structure(format!("no `{}` on history page", HISTORY_SCHEMA.table))
    })?;

    let mut headers: Vec<String> = table.select(&head_sel).map(element_text).collect();
    if headers.is_empty() {
        headers = table.select(&first_row_th_sel).map(element_text).collect();
    }

    let rows = table
        .select(&body_row_sel)
        .map(|tr| tr.select(&td_sel).map(element_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    Ok(RawHistoryTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <table id="currencies-all">
          <thead><tr><th>#</th><th>Name</th><th>Symbol</th><th>Circulating Supply</th></tr></thead>
          <tbody>
            <tr>
              <td>1</td>
              <td><a class="currency-name-container link-secondary" href="/currencies/bitcoin/">Bitcoin</a></td>
              <td><span class="currency-symbol">BTC</span></td>
              <td class="no-wrap circulating-supply"> <span data-supply="?">?</span> </td>
            </tr>
            <tr>
              <td>2</td>
              <td><a class="currency-name-container" href="/currencies/ether/">Ether</a></td>
              <td><span class="currency-symbol"> ETH </span></td>
              <td class="circulating-supply"> <span>120000000</span> </td>
            </tr>
          </tbody>
        </table>
        </body></html>
    "#;

    #[test]
    fn listing_rows_skip_header_and_pick_schema_fields() {
        let rows = parse_listing_page(LISTING).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "BTC");
        assert_eq!(rows[0].href, "/currencies/bitcoin/");
        assert_eq!(rows[0].supply, "?");
        assert_eq!(rows[1].symbol, "ETH");
        assert_eq!(rows[1].supply, "120000000");
    }

    #[test]
    fn supply_without_child_element_uses_first_token() {
        let html = r#"<table id="currencies-all">
            <tr><th>h</th></tr>
            <tr><td><a class="currency-name-container" href="/currencies/x/">X</a></td>
                <td><span class="currency-symbol">X</span></td>
                <td class="circulating-supply">  4200 X </td></tr>
        </table>"#;
        let rows = parse_listing_page(html).unwrap();
        assert_eq!(rows[0].supply, "4200");
    }

    #[test]
    fn missing_listing_table_is_a_structure_error() {
        let err = parse_listing_page("<html><table id=\"other\"></table></html>").unwrap_err();
        assert!(matches!(err, ScrapeError::ParseStructure(_)));
    }

    #[test]
    fn listing_row_without_symbol_is_a_structure_error() {
        let html = r#"<table id="currencies-all">
            <tr><th>h</th></tr>
            <tr><td><a class="currency-name-container" href="/currencies/x/">X</a></td>
                <td class="circulating-supply"><span>1</span></td></tr>
        </table>"#;
        let err = parse_listing_page(html).unwrap_err();
        assert!(err.to_string().contains("currency-symbol"));
    }

    #[test]
    fn history_headers_and_cells_are_extracted() {
        let html = r#"<table class="table">
            <thead><tr><th>Date</th><th>Open*</th><th>High</th><th>Low</th><th>Close**</th>
                <th>Volume</th><th>Market Cap</th></tr></thead>
            <tbody>
              <tr><td>Apr 29, 2013</td><td>134.44</td><td>147.49</td><td>134.00</td>
                  <td>144.54</td><td>-</td><td>1,603,768,865</td></tr>
            </tbody>
        </table>"#;
        let raw = parse_history_page(html).unwrap();
        assert_eq!(raw.headers.len(), 7);
        assert_eq!(raw.rows.len(), 1);
        assert_eq!(raw.rows[0][0], "Apr 29, 2013");
        assert_eq!(raw.rows[0][6], "1,603,768,865");
    }

    #[test]
    fn history_schema_strips_markers_and_accepts_optional_columns() {
        let headers: Vec<String> = ["Date", "Open*", "High", "Low", "Close**", "Volume"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cols = HISTORY_SCHEMA.validate(&headers).unwrap();
        assert_eq!(cols, vec!["Date", "Open", "High", "Low", "Close", "Volume"]);
    }

    #[test]
    fn history_schema_rejects_unexpected_layout() {
        let headers: Vec<String> = ["Date", "Price", "Change"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(HISTORY_SCHEMA.validate(&headers).is_err());

        let reordered: Vec<String> = ["Open", "Date", "High", "Low", "Close"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(HISTORY_SCHEMA.validate(&reordered).is_err());
    }
}
