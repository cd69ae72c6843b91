use core_twn::{
    Conversation, NewsApiClient,
    llms::{ANNOTATION_SYSTEM_PROMPT, LlmProvider},
};
use data_model_twn::api::{AddAiNewsPayload, AiHandleNews};
use data_model_twn::models::AiModel;
use regex::Regex;

use crate::errors::Error;

pub const DEFAULT_BATCH_SIZE: i64 = 10;

/// What happened to one article.
#[derive(Debug)]
pub enum AnnotationResult {
    /// The annotation was stored under this id.
    Stored { id: i32 },
    /// Some other run got there first (409).
    AlreadyAnnotated,
    /// The model call, the reply, or the API rejected it. The article stays unannotated.
    Failed { error: Error },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub stored: usize,
    pub already_annotated: usize,
    pub failed: usize,
}

/// Pulls the annotation JSON out of a model reply: the ```json fenced block if there is one,
/// otherwise the outermost `{...}` in the text.
pub fn extract_annotation(reply: &str) -> Result<AddAiNewsPayload, Error> {
    let fenced = Regex::new(r"(?s)```json(.*?)```")
        .ok()
        .and_then(|re| re.captures(reply))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim());

    let json = match fenced {
        Some(block) => block,
        None => match (reply.find('{'), reply.rfind('}')) {
            (Some(start), Some(end)) if start < end => &reply[start..=end],
            _ => return Err(Error::NoJsonInReply),
        },
    };

    Ok(serde_json::from_str(json)?)
}

/// The `/add_ai_news` payload for one article: the model's fields plus which article and which model.
pub fn annotation_payload(reply: &str, news_id: i32, model: AiModel) -> Result<AddAiNewsPayload, Error> {
    let mut payload = extract_annotation(reply)?;
    payload.news_id = Some(news_id);
    payload.ai_model = Some(model.into());
    Ok(payload)
}

pub struct Annotator<P: LlmProvider> {
    api: NewsApiClient,
    provider: P,
    model: AiModel,
    batch_size: i64,
}

impl<P: LlmProvider> Annotator<P> {
    pub fn new(api: NewsApiClient, provider: P, model: AiModel, batch_size: i64) -> Self {
        Self {
            api,
            provider,
            model,
            batch_size,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Annotates one batch in a single running conversation, so each article sees the earlier
    /// exchanges of its batch as context.
    pub async fn annotate_batch(&self, batch: &[AiHandleNews]) -> Vec<AnnotationResult> {
        let mut conversation = Conversation::new(ANNOTATION_SYSTEM_PROMPT);
        let mut results = Vec::with_capacity(batch.len());
        for news in batch {
            let result = self.annotate_one(&mut conversation, news).await;
            match &result {
                AnnotationResult::Stored { id } => {
                    tracing::info!("[news: {}] Stored annotation {}", news.id, id)
                }
                AnnotationResult::AlreadyAnnotated => {
                    tracing::info!("[news: {}] Already annotated by {}", news.id, self.model.model_name())
                }
                AnnotationResult::Failed { error } => {
                    tracing::error!("[SKIP] [news: {}] {}", news.id, error)
                }
            }
            results.push(result);
        }
        results
    }

    async fn annotate_one(&self, conversation: &mut Conversation, news: &AiHandleNews) -> AnnotationResult {
        let reply = match conversation.ask(&self.provider, news.news_content.trim()).await {
            Ok(reply) => reply,
            Err(e) => return AnnotationResult::Failed { error: e.into() },
        };
        tracing::debug!("[news: {}] Model replied ({} chars)", news.id, reply.chars().count());

        let payload = match annotation_payload(&reply, news.id, self.model) {
            Ok(payload) => payload,
            Err(error) => return AnnotationResult::Failed { error },
        };

        match self.api.add_ai_news(&payload).await {
            Ok(response) => AnnotationResult::Stored { id: response.id },
            Err(e) if e.status() == Some(409) => AnnotationResult::AlreadyAnnotated,
            Err(e) => AnnotationResult::Failed { error: e.into() },
        }
    }

    /// Works through the unannotated articles until the API has none left.
    ///
    /// Articles that failed are excluded from later polls of the same run, so they can't hold
    /// back the ones queued behind them.
    pub async fn run(&self) -> Result<RunSummary, Error> {
        let mut summary = RunSummary::default();
        let mut failed_ids: Vec<i32> = Vec::new();
        loop {
            let batch = self
                .api
                .wait_ai_handle_list(self.batch_size, self.model, &failed_ids)
                .await?;
            if batch.is_empty() {
                tracing::info!("No news waiting for {}", self.model.model_name());
                break;
            }
            summary.batches += 1;
            tracing::info!("Annotating {} news with {}", batch.len(), self.model.model_name());

            for (news, result) in batch.iter().zip(self.annotate_batch(&batch).await) {
                match result {
                    AnnotationResult::Stored { .. } => summary.stored += 1,
                    AnnotationResult::AlreadyAnnotated => summary.already_annotated += 1,
                    AnnotationResult::Failed { .. } => {
                        summary.failed += 1;
                        failed_ids.push(news.id);
                    }
                }
            }
        }
        if !failed_ids.is_empty() {
            tracing::warn!("{} news couldn't be annotated this run: {:?}", failed_ids.len(), failed_ids);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_twn::llms::mock::sample_annotation_reply;

    #[test]
    fn test_extract_fenced_block() {
        let payload = extract_annotation(sample_annotation_reply()).unwrap();
        assert_eq!(payload.title.as_deref(), Some("立法院三讀通過總預算案"));
        assert_eq!(payload.sentiment_analysis.as_deref(), Some("中立"));
        assert_eq!(payload.keyword.unwrap().names(), ["立法院", "總預算"]);
    }

    #[test]
    fn test_extract_bare_object() {
        let reply = r#"{"title": "標題", "category": "社會", "keyword": "颱風, 停班停課", "sentiment_analysis": "負面"}"#;
        let payload = extract_annotation(reply).unwrap();
        assert_eq!(payload.category.unwrap().names(), ["社會"]);
        assert_eq!(payload.keyword.unwrap().names(), ["颱風", "停班停課"]);
    }

    #[test]
    fn test_extract_object_inside_prose() {
        let reply = "分析如下 {\"title\": \"標題\"} 以上。";
        assert_eq!(extract_annotation(reply).unwrap().title.as_deref(), Some("標題"));
    }

    #[test]
    fn test_extract_without_json() {
        assert!(matches!(extract_annotation("抱歉，我無法回答。"), Err(Error::NoJsonInReply)));
        assert!(matches!(
            extract_annotation("```json\n{not json}\n```"),
            Err(Error::InvalidJson(_))
        ));
    }

    #[test]
    fn test_payload_carries_news_and_model() {
        let payload = annotation_payload(sample_annotation_reply(), 7, AiModel::Llama3_1_8b).unwrap();
        assert_eq!(payload.news_id, Some(7));
        assert_eq!(payload.ai_model, Some(3));
    }

    #[test]
    fn test_payload_ignores_model_supplied_ids() {
        let reply = r#"```json
{"news_id": 99, "ai_model": 2, "title": "t", "category": [], "keyword": [], "sentiment_analysis": "中立"}
```"#;
        let payload = annotation_payload(reply, 7, AiModel::default()).unwrap();
        assert_eq!(payload.news_id, Some(7));
        assert_eq!(payload.ai_model, Some(1));
    }
}
