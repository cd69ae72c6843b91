use chrono::NaiveDateTime;
use core_twn::html::{select_all_text, select_attrs, select_first_text};
use data_model_twn::api::{NameList, NewsDraft, UpdateNewsPayload};
use data_model_twn::models::SourceWebsite;
use scraper::Html;
use url::Url;

use super::{NewsSite, capture_name, fetched_update, listed_draft, select_elements};
use crate::errors::Error;

pub const DEFAULT_CATEGORY: &str = "社會";

/// 台視新聞 (news.ttv.com.tw), one category listing at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ttv {
    category: String,
}

impl Ttv {
    pub fn new(category: &str) -> Self {
        Self {
            category: category.trim().to_string(),
        }
    }
}

impl Default for Ttv {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY)
    }
}

impl NewsSite for Ttv {
    fn source(&self) -> SourceWebsite {
        SourceWebsite::Ttv
    }

    fn listing_url(&self, page: u32) -> String {
        format!("https://news.ttv.com.tw/category/{}/{}", self.category, page)
    }

    fn parse_listing(&self, html: &str, page_url: &Url, now: NaiveDateTime) -> Vec<NewsDraft> {
        let document = Html::parse_document(html);
        select_elements(document.root_element(), "article.container a")
            .into_iter()
            .filter_map(|link| {
                listed_draft(
                    SourceWebsite::Ttv,
                    select_first_text(link, "div.title"),
                    select_first_text(link, "div.time"),
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
            select_first_text(root, "h1.mb-ht-hf"),
            select_all_text(root, "div#newscontent > p"),
        )?;

        // The article image follows the site banner when both are present.
        let images = select_attrs(root, "article#contentarea img", "src");
        payload.image_url = images.get(1).or_else(|| images.first()).cloned();

        payload.category = select_all_text(root, "div#crumbs li")
            .pop()
            .map(|c| NameList::new([c]));
        let keywords = NameList::new(select_all_text(root, "ul.news-status > ul.tag li"));
        payload.keywords = Some(keywords).filter(|k| !k.is_empty());
        payload.author = capture_name(&content, &[r"責任編輯／(\p{Han}+)"]);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_model_twn::models::parse_news_time;

    const LISTING: &str = r#"<html><body>
        <article class="container">
          <a href="https://news.ttv.com.tw/news/11401010001"><div class="title">颱風　明天登陸</div><div class="time">2025.01.01 08:30</div></a>
          <a href="/news/11401010002"><div class="title">第二則</div><div class="time">2025.01.01 07:15</div></a>
          <a href="/news/broken"><div class="title">沒有時間</div></a>
          <a href="/news/badtime"><div class="title">時間錯誤</div><div class="time">昨天</div></a>
        </article>
        <a href="/outside"><div class="title">Not in the list</div><div class="time">2025.01.01 00:00</div></a>
        </body></html>"#;

    const DETAIL: &str = r#"<html><body>
        <div id="crumbs"><ul><li>首頁</li><li>新聞</li><li>社會</li></ul></div>
        <h1 class="mb-ht-hf">颱風　明天登陸　全台嚴防</h1>
        <ul class="news-status"><ul class="tag"><li>颱風</li><li>氣象署</li></ul></ul>
        <article id="contentarea">
          <img src="https://cdn.ttv.com.tw/banner.png">
          <img src="https://cdn.ttv.com.tw/photo.jpg">
          <div id="newscontent">
            <p>中央氣象署表示，颱風明天登陸。</p>
            <p>民眾應做好防颱準備。</p>
            <p>責任編輯／林小美</p>
          </div>
        </article>
        </body></html>"#;

    fn now() -> NaiveDateTime {
        parse_news_time("2025-01-02 00:00:00").unwrap()
    }

    #[test]
    fn test_parse_listing() {
        let site = Ttv::default();
        let page_url = Url::parse(&site.listing_url(1)).unwrap();
        let drafts = site.parse_listing(LISTING, &page_url, now());

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].news_title.as_deref(), Some("颱風 明天登陸"));
        assert_eq!(drafts[0].news_time.as_deref(), Some("2025-01-01 08:30:00"));
        assert_eq!(
            drafts[0].news_url.as_deref(),
            Some("https://news.ttv.com.tw/news/11401010001")
        );
        assert_eq!(drafts[0].source_website, Some(1));
        assert_eq!(
            drafts[1].news_url.as_deref(),
            Some("https://news.ttv.com.tw/news/11401010002")
        );
    }

    #[test]
    fn test_parse_detail() {
        let payload = Ttv::default()
            .parse_detail(DETAIL, "https://news.ttv.com.tw/news/11401010001")
            .unwrap();

        assert_eq!(payload.news_title.as_deref(), Some("颱風 明天登陸 全台嚴防"));
        assert_eq!(
            payload.news_content.as_deref(),
            Some("中央氣象署表示，颱風明天登陸。\n民眾應做好防颱準備。\n責任編輯／林小美")
        );
        assert_eq!(payload.image_url.as_deref(), Some("https://cdn.ttv.com.tw/photo.jpg"));
        assert_eq!(payload.category, Some(NameList::new(["社會"])));
        assert_eq!(payload.keywords, Some(NameList::new(["颱風", "氣象署"])));
        assert_eq!(payload.author.as_deref(), Some("林小美"));
        assert_eq!(payload.query_state, Some(2));
    }

    #[test]
    fn test_parse_detail_single_image_and_no_editor() {
        let html = r#"<h1 class="mb-ht-hf">標題</h1>
            <article id="contentarea"><img src="/only.jpg"><div id="newscontent"><p>內文</p></div></article>"#;
        let payload = Ttv::default().parse_detail(html, "https://news.ttv.com.tw/news/1").unwrap();
        assert_eq!(payload.image_url.as_deref(), Some("/only.jpg"));
        assert_eq!(payload.author, None);
        assert_eq!(payload.category, None);
        assert_eq!(payload.keywords, None);
    }

    #[test]
    fn test_parse_detail_without_body_fails() {
        let html = r#"<h1 class="mb-ht-hf">標題</h1>"#;
        let result = Ttv::default().parse_detail(html, "https://news.ttv.com.tw/news/1");
        assert!(matches!(result, Err(Error::MissingField { field: "article body", .. })));
    }
}
