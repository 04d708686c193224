use reqwest::Client;
use ::scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Result, ScraperError};
use crate::types::{KtcRankings, RankingPage};

pub const DYNASTY_URL: &str = "https://keeptradecut.com/dynasty-rankings";
pub const FANTASY_URL: &str = "https://keeptradecut.com/fantasy-rankings";

const PLAYERS_ARRAY_MARKER: &str = "var playersArray";

/// KeepTradeCut rankings scraper
#[derive(Debug, Clone)]
pub struct KtcScraper {
    client: Client,
    dynasty_url: String,
    fantasy_url: String,
}

impl KtcScraper {
    /// Create a scraper pointed at the public KTC pages
    pub fn new() -> Result<Self> {
        Self::with_urls(DYNASTY_URL, FANTASY_URL, Duration::from_secs(30))
    }

    /// Create a scraper with custom page URLs and request timeout
    pub fn with_urls(
        dynasty_url: impl Into<String>,
        fantasy_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()?;

        Ok(Self { client, dynasty_url: dynasty_url.into(), fantasy_url: fantasy_url.into() })
    }

    /// URL of the page holding rankings of the given kind
    pub fn page_url(&self, page: RankingPage) -> &str {
        match page {
            RankingPage::Dynasty => &self.dynasty_url,
            RankingPage::Redraft => &self.fantasy_url,
        }
    }

    /// Fetch and decode one rankings page
    pub async fn scrape_rankings(&self, page: RankingPage) -> Result<KtcRankings> {
        let url = self.page_url(page);
        info!("Fetching KTC {:?} rankings from: {}", page, url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Status { status: status.as_u16(), url: url.to_string() });
        }

        let body = response.text().await?;
        info!("Successfully fetched KTC page ({} bytes)", body.len());

        let entries = extract_players_array(&body)?;
        let rankings = KtcRankings::from_entries(page, entries);

        info!(
            "Decoded {} KTC players ({} undecodable entries)",
            rankings.players.len(),
            rankings.undecodable
        );
        Ok(rankings)
    }
}

/// Pull the `playersArray` literal out of a rankings page.
///
/// The array lives in an inline `<script>`; a body that is already a bare
/// JSON array is accepted as well.
pub fn extract_players_array(body: &str) -> Result<Vec<serde_json::Value>> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let document = Html::parse_document(body);
    let script_selector =
        Selector::parse("script").map_err(|e| ScraperError::Selector(e.to_string()))?;

    for script in document.select(&script_selector) {
        let source = script.text().collect::<String>();
        if let Some(array) = decode_after_marker(&source)? {
            debug!("Found playersArray with {} entries", array.len());
            return Ok(array);
        }
    }

    Err(ScraperError::MissingPlayersArray)
}

fn decode_after_marker(source: &str) -> Result<Option<Vec<serde_json::Value>>> {
    let Some(marker) = source.find(PLAYERS_ARRAY_MARKER) else {
        return Ok(None);
    };
    let rest = &source[marker + PLAYERS_ARRAY_MARKER.len()..];
    let Some(open) = rest.find('[') else {
        return Ok(None);
    };

    // The literal is followed by `;` and more script, so read exactly one value
    let mut stream =
        serde_json::Deserializer::from_str(&rest[open..]).into_iter::<Vec<serde_json::Value>>();
    match stream.next() {
        Some(array) => Ok(Some(array?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head><script>var other = 1;</script></head>
        <body>
          <div id="rankings-page-rankings"></div>
          <script type="text/javascript">
            var ranksJSON = null;
            var playersArray = [{"playerName":"Bijan Robinson","position":"RB","team":"ATL",
              "superflexValues":{"value":9100,"rank":3}},
              {"playerName":"2026 Early 1st","position":"RDP","team":"",
              "superflexValues":{"value":6000,"rank":40}}];
            var somethingElse = [1, 2, 3];
          </script>
        </body></html>
    "#;

    #[test]
    fn test_extracts_array_from_script() {
        let entries = extract_players_array(PAGE).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["playerName"], "Bijan Robinson");
        assert_eq!(entries[1]["position"], "RDP");
    }

    #[test]
    fn test_accepts_bare_json_array() {
        let entries = extract_players_array(r#" [{"playerName":"A"}] "#).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_array_is_an_error() {
        let err = extract_players_array("<html><script>var x = 1;</script></html>").unwrap_err();
        assert!(matches!(err, ScraperError::MissingPlayersArray));
    }

    #[test]
    fn test_page_url_selection() {
        let scraper =
            KtcScraper::with_urls("http://d", "http://f", Duration::from_secs(1)).unwrap();
        assert_eq!(scraper.page_url(RankingPage::Dynasty), "http://d");
        assert_eq!(scraper.page_url(RankingPage::Redraft), "http://f");
    }
}
