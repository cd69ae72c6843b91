use indoc::indoc;

/// Instructions for the annotation model. The reply must end with a fenced JSON block whose keys
/// match the `/add_ai_news` payload.
pub const ANNOTATION_SYSTEM_PROMPT: &str = indoc! { r#"
  你是一位專業的新聞分析師，擅長從新聞提取關鍵資訊。
  1. 標題：
  - 整理出一個可以貫穿整個文章的標題，使用肯定句，最多35個文字。
  2. 分類：
  - 將內容分類，並回答是屬於哪一項，政治、國際、地方、社會、娛樂、生活、氣象、健康、體育、財經、旅遊、科技。
  3. 關鍵字：
  - 提取最多5個核心的名詞，包含團體、政黨、名人、技術。
  - 名人需判斷是否為政治人物，是政治人物需加上政黨名稱。
  - 使用", "作為關鍵字的間格符號。
  4. 語意分析：
  - 分析內容的情感類別，並回答是正面、負面還是中立。
  5. 將以上結果轉換成json格式，放在 ```json 區塊中：
  - {"title": "標題結果", "category": ["分類結果1", "分類結果2"], "keyword": ["關鍵字結果1", "關鍵字結果2"], "sentiment_analysis": "語意分析結果"}
"# };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_every_payload_key() {
        for key in ["\"title\"", "\"category\"", "\"keyword\"", "\"sentiment_analysis\""] {
            assert!(ANNOTATION_SYSTEM_PROMPT.contains(key), "missing {}", key);
        }
        assert!(!ANNOTATION_SYSTEM_PROMPT.starts_with(' '));
    }
}
