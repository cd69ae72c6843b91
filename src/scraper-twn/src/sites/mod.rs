//! Per-site knowledge: where the listing pages live and how to read listing and article pages.

mod setn;
mod ttv;

use chrono::NaiveDateTime;
use core_twn::html::resolve_url;
use core_twn::news_time::format_news_time;
use data_model_twn::api::{NewsDraft, UpdateNewsPayload};
use data_model_twn::models::{QueryState, SourceWebsite};
use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

use crate::errors::Error;

pub use setn::Setn;
pub use ttv::Ttv;

/// A news site the scraper knows how to read.
pub trait NewsSite: Send + Sync {
    fn source(&self) -> SourceWebsite;

    /// Listing page `page` (1-based).
    fn listing_url(&self, page: u32) -> String;

    /// Articles on a listing page. Items missing a title, time or link are skipped.
    fn parse_listing(&self, html: &str, page_url: &Url, now: NaiveDateTime) -> Vec<NewsDraft>;

    /// The update written back for an article page. Always moves the row to `Fetched`.
    fn parse_detail(&self, html: &str, url: &str) -> Result<UpdateNewsPayload, Error>;
}

/// The scraper for `source`. `category` only applies to sites with category listings.
pub fn site_for(source: SourceWebsite, category: Option<&str>) -> Box<dyn NewsSite> {
    match source {
        SourceWebsite::Ttv => Box::new(match category {
            Some(category) => Ttv::new(category),
            None => Ttv::default(),
        }),
        SourceWebsite::Setn => Box::new(Setn),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Matches of `css` under `scope`; nothing for an unparsable selector.
fn select_elements<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => scope.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// First capture of the first pattern that matches `text`.
fn capture_name(text: &str, patterns: &[&str]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        Regex::new(pattern)
            .ok()?
            .captures(text)?
            .get(1)
            .map(|m| m.as_str().to_string())
    })
}

fn listed_draft(
    source: SourceWebsite,
    title: Option<String>,
    raw_time: Option<String>,
    href: Option<&str>,
    page_url: &Url,
    now: NaiveDateTime,
) -> Option<NewsDraft> {
    let news_title = title?;
    let raw_time = raw_time?;
    let Some(news_time) = format_news_time(&raw_time, now) else {
        tracing::debug!("Skipping '{}': unreadable time '{}'", news_title, raw_time);
        return None;
    };
    let news_url = resolve_url(page_url, href?)?;
    Some(NewsDraft {
        news_time: Some(news_time),
        news_title: Some(news_title),
        news_url: Some(news_url),
        source_website: Some(source.into()),
        ..Default::default()
    })
}

fn fetched_update(
    url: &str,
    title: Option<String>,
    paragraphs: Vec<String>,
) -> Result<(String, UpdateNewsPayload), Error> {
    let title = title.ok_or(Error::MissingField {
        url: url.to_string(),
        field: "title",
    })?;
    if paragraphs.is_empty() {
        return Err(Error::MissingField {
            url: url.to_string(),
            field: "article body",
        });
    }
    let content = paragraphs.join("\n");
    let payload = UpdateNewsPayload {
        news_title: Some(title),
        news_content: Some(content.clone()),
        query_state: Some(QueryState::Fetched.into()),
        ..Default::default()
    };
    Ok((content, payload))
}
