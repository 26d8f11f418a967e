use popcorn_models::{DetailRecord, SearchResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::SourceError;

#[derive(Debug, Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster", default)]
    poster: String,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<OmdbSearchItem>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbDetail {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: String,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Released", default)]
    released: String,
    #[serde(rename = "Poster", default)]
    poster: String,
    #[serde(rename = "Genre", default)]
    genre: String,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: String,
    #[serde(rename = "Plot", default)]
    plot: String,
    #[serde(rename = "Runtime", default)]
    runtime: String,
    #[serde(rename = "Actors", default)]
    actors: String,
    #[serde(rename = "Director", default)]
    director: String,
}

/// OMDb answers "True"/"False" as strings
fn is_true(response: &str) -> bool {
    response.eq_ignore_ascii_case("true")
}

/// Parse a search response body
pub fn parse_search_body(body: &str) -> Result<Vec<SearchResult>, SourceError> {
    let parsed: OmdbSearchResponse = serde_json::from_str(body)?;

    if !is_true(&parsed.response) {
        return Err(SourceError::NotFound(
            parsed.error.unwrap_or_else(|| "Movie not found!".to_string()),
        ));
    }

    Ok(parsed
        .search
        .into_iter()
        .map(|item| SearchResult {
            imdb_id: item.imdb_id,
            title: item.title,
            year: item.year,
            poster: item.poster,
        })
        .collect())
}

/// Parse a detail response body; `requested_id` fills in a missing `imdbID`
pub fn parse_detail_body(body: &str, requested_id: &str) -> Result<DetailRecord, SourceError> {
    let parsed: OmdbDetail = serde_json::from_str(body)?;

    if !is_true(&parsed.response) {
        return Err(SourceError::NotFound(
            parsed.error.unwrap_or_else(|| "Incorrect IMDb ID.".to_string()),
        ));
    }

    let imdb_id = if parsed.imdb_id.is_empty() {
        requested_id.to_string()
    } else {
        parsed.imdb_id
    };

    Ok(DetailRecord {
        imdb_id,
        title: parsed.title,
        year: parsed.year,
        released: parsed.released,
        poster: parsed.poster,
        genre: parsed.genre,
        imdb_rating: parsed.imdb_rating,
        plot: parsed.plot,
        runtime: parsed.runtime,
        actors: parsed.actors,
        director: parsed.director,
    })
}

async fn get_body(client: &Client, base_url: &str, params: &[(&str, &str)]) -> Result<String, SourceError> {
    let response = client
        .get(base_url)
        .query(params)
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        warn!(
            operation = "omdb_request",
            status = status.as_u16(),
            "OMDb returned a non-success status"
        );
        return Err(SourceError::Http {
            status: status.as_u16(),
            body: error_text,
        });
    }

    Ok(response.text().await?)
}

/// Search titles on OMDb
pub async fn search(client: &Client, base_url: &str, api_key: &str, query: &str) -> Result<Vec<SearchResult>, SourceError> {
    debug!(operation = "omdb_search", query = query, "Searching OMDb");
    let body = get_body(client, base_url, &[("apikey", api_key), ("s", query)]).await?;
    let results = parse_search_body(&body)?;
    debug!(operation = "omdb_search", query = query, count = results.len(), "OMDb search returned");
    Ok(results)
}

/// Fetch one title with the full plot
pub async fn get_details(client: &Client, base_url: &str, api_key: &str, imdb_id: &str) -> Result<DetailRecord, SourceError> {
    debug!(operation = "omdb_details", imdb_id = imdb_id, "Fetching OMDb details");
    let body = get_body(client, base_url, &[("apikey", api_key), ("i", imdb_id), ("plot", "full")]).await?;
    parse_detail_body(&body, imdb_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_FOUND: &str = r#"{
        "Search": [
            {"Title": "Batman Begins", "Year": "2005", "imdbID": "tt0372784", "Type": "movie", "Poster": "https://m.media-amazon.com/images/M/bb.jpg"},
            {"Title": "The Batman", "Year": "2022", "imdbID": "tt1877830", "Type": "movie", "Poster": "N/A"}
        ],
        "totalResults": "2",
        "Response": "True"
    }"#;

    const DETAIL_FOUND: &str = r#"{
        "Title": "Inception", "Year": "2010", "Rated": "PG-13", "Released": "16 Jul 2010",
        "Runtime": "148 min", "Genre": "Action, Adventure, Sci-Fi", "Director": "Christopher Nolan",
        "Actors": "Leonardo DiCaprio, Joseph Gordon-Levitt, Elliot Page",
        "Plot": "A thief who steals corporate secrets.", "Poster": "https://example.com/p.jpg",
        "imdbRating": "8.8", "imdbID": "tt1375666", "Type": "movie", "Response": "True"
    }"#;

    #[test]
    fn test_parse_search_found_keeps_order() {
        let results = parse_search_body(SEARCH_FOUND).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].imdb_id, "tt0372784");
        assert_eq!(results[0].title, "Batman Begins");
        assert_eq!(results[1].imdb_id, "tt1877830");
        assert_eq!(results[1].poster, "N/A");
    }

    #[test]
    fn test_parse_search_not_found() {
        let err = parse_search_body(r#"{"Response":"False","Error":"Movie not found!"}"#).unwrap_err();
        assert_eq!(err, SourceError::NotFound("Movie not found!".to_string()));
    }

    #[test]
    fn test_parse_search_too_many_results_is_not_found() {
        let err = parse_search_body(r#"{"Response":"False","Error":"Too many results."}"#).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_search_malformed() {
        let err = parse_search_body("<html>oops</html>").unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[test]
    fn test_parse_detail_found() {
        let detail = parse_detail_body(DETAIL_FOUND, "tt1375666").unwrap();
        assert_eq!(detail.title, "Inception");
        assert_eq!(detail.released, "16 Jul 2010");
        assert_eq!(detail.director, "Christopher Nolan");
        assert_eq!(detail.runtime_minutes(), Some(148));
        assert_eq!(detail.imdb_rating_value(), Some(8.8));
    }

    #[test]
    fn test_parse_detail_unknown_id() {
        let err = parse_detail_body(r#"{"Response":"False","Error":"Incorrect IMDb ID."}"#, "tt0").unwrap_err();
        assert_eq!(err, SourceError::NotFound("Incorrect IMDb ID.".to_string()));
    }

    #[test]
    fn test_parse_detail_fills_missing_id() {
        let detail = parse_detail_body(r#"{"Response":"True","Title":"X"}"#, "tt42").unwrap();
        assert_eq!(detail.imdb_id, "tt42");
        assert_eq!(detail.runtime_minutes(), None);
    }
}
