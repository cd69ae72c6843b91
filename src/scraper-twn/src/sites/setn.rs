use chrono::NaiveDateTime;
use core_twn::html::{element_text, select_all_text, select_attr, select_first_text};
use data_model_twn::api::{NameList, NewsDraft, UpdateNewsPayload};
use data_model_twn::models::SourceWebsite;
use scraper::Html;
use url::Url;

use super::{NewsSite, capture_name, fetched_update, listed_draft, select_elements};
use crate::errors::Error;

/// 三立新聞網 (www.setn.com), the "all news" listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Setn;

impl NewsSite for Setn {
    fn source(&self) -> SourceWebsite {
        SourceWebsite::Setn
    }

    fn listing_url(&self, page: u32) -> String {
        format!("https://www.setn.com/ViewAll.aspx?p={}", page)
    }

    /// Listing times are `MM/DD HH:MM`; the year is inferred from `now`.
    fn parse_listing(&self, html: &str, page_url: &Url, now: NaiveDateTime) -> Vec<NewsDraft> {
        let document = Html::parse_document(html);
        select_elements(document.root_element(), "div.newsItems")
            .into_iter()
            .filter_map(|item| {
                let link = select_elements(item, "h3.view-li-title a").into_iter().next()?;
                listed_draft(
                    SourceWebsite::Setn,
                    Some(element_text(link)).filter(|t| !t.is_empty()),
                    select_first_text(item, "time"),
                    link.value().attr("href"),
                    page_url,
                    now,
                )
            })
            .collect()
    }

    fn parse_detail(&self, html: &str, url: &str) -> Result<UpdateNewsPayload, Error> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let (content, mut payload) = fetched_update(
            url,
            select_first_text(root, "h1.news-title-3"),
            select_all_text(root, "div#ckuse article p"),
        )?;

        payload.image_url = select_attr(root, r#"meta[property="og:image"]"#, "content");
        payload.category =
            select_attr(root, r#"meta[property="article:section"]"#, "content").map(|c| NameList::new([c]));
        payload.keywords = select_attr(root, r#"meta[name="news_keywords"]"#, "content")
            .map(|joined| NameList::new(joined.split(',')))
            .filter(|k| !k.is_empty());
        payload.author = capture_name(&content, &[r"記者(\p{Han}+)／", r"責任編輯／(\p{Han}+)"]);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_model_twn::models::parse_news_time;

    const LISTING: &str = r#"<html><body>
        <div class="newsItems">
          <h3 class="view-li-title"><a href="/News.aspx?NewsID=1500001">立法院三讀通過總預算</a></h3>
          <time>01/05 14:30</time>
        </div>
        <div class="newsItems">
          <h3 class="view-li-title"><a href="https://www.setn.com/News.aspx?NewsID=1500000">跨年煙火</a></h3>
          <time>12/31 23:59</time>
        </div>
        <div class="newsItems"><time>01/05 10:00</time></div>
        </body></html>"#;

    const DETAIL: &str = r#"<html><head>
        <meta property="og:image" content="https://attach.setn.com/newsimages/1.jpg">
        <meta property="article:section" content="政治">
        <meta name="news_keywords" content="立法院, 總預算,,預算">
        </head><body>
        <h1 class="news-title-3">立法院三讀通過總預算</h1>
        <div id="ckuse"><article>
          <p>記者王小明／台北報導</p>
          <p>立法院今天三讀通過總預算。</p>
        </article></div>
        </body></html>"#;

    #[test]
    fn test_parse_listing_infers_year() {
        let now = parse_news_time("2025-01-06 09:00:00").unwrap();
        let page_url = Url::parse(&Setn.listing_url(1)).unwrap();
        let drafts = Setn.parse_listing(LISTING, &page_url, now);

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].news_title.as_deref(), Some("立法院三讀通過總預算"));
        assert_eq!(drafts[0].news_time.as_deref(), Some("2025-01-05 14:30:00"));
        assert_eq!(
            drafts[0].news_url.as_deref(),
            Some("https://www.setn.com/News.aspx?NewsID=1500001")
        );
        assert_eq!(drafts[0].source_website, Some(2));
        // December seen in January belongs to last year.
        assert_eq!(drafts[1].news_time.as_deref(), Some("2024-12-31 23:59:00"));
    }

    #[test]
    fn test_parse_detail() {
        let payload = Setn
            .parse_detail(DETAIL, "https://www.setn.com/News.aspx?NewsID=1500001")
            .unwrap();

        assert_eq!(payload.news_title.as_deref(), Some("立法院三讀通過總預算"));
        assert_eq!(
            payload.news_content.as_deref(),
            Some("記者王小明／台北報導\n立法院今天三讀通過總預算。")
        );
        assert_eq!(
            payload.image_url.as_deref(),
            Some("https://attach.setn.com/newsimages/1.jpg")
        );
        assert_eq!(payload.category, Some(NameList::new(["政治"])));
        assert_eq!(payload.keywords, Some(NameList::new(["立法院", "總預算", "預算"])));
        assert_eq!(payload.author.as_deref(), Some("王小明"));
        assert_eq!(payload.query_state, Some(2));
    }

    #[test]
    fn test_parse_detail_editor_byline() {
        let html = r#"<h1 class="news-title-3">標題</h1>
            <div id="ckuse"><article><p>內文</p><p>責任編輯／李四</p></article></div>"#;
        let payload = Setn.parse_detail(html, "https://www.setn.com/News.aspx?NewsID=2").unwrap();
        assert_eq!(payload.author.as_deref(), Some("李四"));
        assert_eq!(payload.keywords, None);
    }

    #[test]
    fn test_parse_detail_without_title_fails() {
        let html = r#"<div id="ckuse"><article><p>內文</p></article></div>"#;
        let result = Setn.parse_detail(html, "https://www.setn.com/News.aspx?NewsID=3");
        assert!(matches!(result, Err(Error::MissingField { field: "title", .. })));
    }
}
