//! 翻译模块
//!
//! `Translator` 是翻译服务的抽象；`HttpTranslator` 对接DeepLX兼容的HTTP接口，
//! 批量请求使用 `[索引] 文本` 标记，逐批顺序发送。`translate_document` 负责
//! 对整个页面做一次翻译。

// 标准库导入
use std::collections::HashMap;
use std::time::Duration;

// 第三方crate导入
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

// 本地模块导入
use crate::api_constants::{api_config, service_config};
use crate::dom::Document;
use crate::error::{MirrorError, Result};
use crate::html_processor::{apply_translations_to_dom, extract_translatable_texts, unique_texts};

/// 文本翻译服务
#[allow(async_fn_in_trait)]
pub trait Translator {
    /// 翻译单条文本
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;

    /// 按顺序翻译多条文本，返回与输入等长的译文
    async fn translate_batch(&self, texts: &[String], target_lang: &str) -> Result<Vec<String>> {
        let mut translations = Vec::with_capacity(texts.len());
        for text in texts {
            translations.push(self.translate(text, target_lang).await?);
        }
        Ok(translations)
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

/// 基于HTTP的翻译客户端
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: Client,
    api_url: String,
    batch_size: usize,
}

impl HttpTranslator {
    /// 创建翻译客户端
    pub fn new(api_url: &str, batch_size: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(service_config::REQUEST_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            batch_size: batch_size.max(1),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 发送一次翻译请求，返回译文文本
    async fn request(&self, text: &str, target_lang: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&TranslateRequest {
                text,
                source_lang: api_config::SOURCE_LANG_AUTO,
                target_lang,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(crate::mirror_error!(
                translation_api,
                status.as_u16(),
                body,
                self.api_url
            ));
        }

        let response_text = response.text().await?;
        Ok(parse_translation_response(response_text))
    }

    /// 翻译一个带索引标记的批次，返回 (批内索引, 译文)
    async fn translate_indexed_batch(
        &self,
        chunk: &[String],
        target_lang: &str,
    ) -> Result<HashMap<usize, String>> {
        let indexed_text = chunk
            .iter()
            .enumerate()
            .map(|(i, text)| format!("[{}] {}", i, text))
            .collect::<Vec<_>>()
            .join("\n");

        let translated = self.request(&indexed_text, target_lang).await?;
        Ok(parse_indexed_lines(&translated))
    }
}

impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        self.request(text, target_lang).await
    }

    async fn translate_batch(&self, texts: &[String], target_lang: &str) -> Result<Vec<String>> {
        let mut translations = vec![String::new(); texts.len()];

        for (batch_idx, chunk) in texts.chunks(self.batch_size).enumerate() {
            let offset = batch_idx * self.batch_size;

            // 含换行的文本会破坏索引标记，单独翻译
            let indexed = if chunk.len() > 1 && chunk.iter().all(|t| !t.contains('\n')) {
                self.translate_indexed_batch(chunk, target_lang).await?
            } else {
                HashMap::new()
            };

            debug!(
                "批次 {}: {} 个文本项, 索引命中 {}",
                batch_idx + 1,
                chunk.len(),
                indexed.len()
            );

            for (i, text) in chunk.iter().enumerate() {
                translations[offset + i] = match indexed.get(&i) {
                    Some(translation) => translation.clone(),
                    None => self.request(text, target_lang).await?,
                };
            }
        }

        Ok(translations)
    }
}

/// 从响应体中取出译文：优先 JSON 的 data/text/result 字段，否则使用原始文本
fn parse_translation_response(response_text: String) -> String {
    match serde_json::from_str::<serde_json::Value>(&response_text) {
        Ok(json_val) => json_val
            .get("data")
            .or_else(|| json_val.get("text"))
            .or_else(|| json_val.get("result"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or(response_text),
        Err(_) => response_text,
    }
}

/// 解析 `[索引] 译文` 形式的多行结果
fn parse_indexed_lines(translated: &str) -> HashMap<usize, String> {
    let index_regex = match Regex::new(r"^\[(\d+)\]\s*(.*)$") {
        Ok(regex) => regex,
        Err(e) => {
            warn!("无法编译索引正则表达式: {}", e);
            return HashMap::new();
        }
    };

    let mut translations = HashMap::new();
    for line in translated.lines() {
        if let Some(captures) = index_regex.captures(line.trim()) {
            if let (Some(index_str), Some(text)) = (captures.get(1), captures.get(2)) {
                if let Ok(index) = index_str.as_str().parse::<usize>() {
                    let translated = text.as_str().trim();
                    if !translated.is_empty() {
                        translations.insert(index, translated.to_string());
                    }
                }
            }
        }
    }

    translations
}

/// 翻译整个页面中 script/style 之外的所有可见文本，返回回写的文本节点数
pub async fn translate_document<T: Translator>(
    doc: &mut Document,
    translator: &T,
    target_lang: &str,
) -> Result<usize> {
    let slots = extract_translatable_texts(doc);
    if slots.is_empty() {
        return Ok(0);
    }

    let originals = unique_texts(&slots);
    info!(
        "📝 提取到 {} 个文本节点 ({} 条不重复文本)",
        slots.len(),
        originals.len()
    );

    let translations = translator.translate_batch(&originals, target_lang).await?;
    if translations.len() != originals.len() {
        return Err(MirrorError::Internal {
            source: anyhow::anyhow!(
                "译文数量不匹配: 期望 {}, 实际 {}",
                originals.len(),
                translations.len()
            ),
        });
    }

    Ok(apply_translations_to_dom(doc, &slots, &originals, &translations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::Mutex;

    /// 记录收到的文本并返回大写形式
    #[derive(Default)]
    struct RecordingTranslator {
        seen: Mutex<Vec<String>>,
    }

    impl Translator for RecordingTranslator {
        async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(format!("{}:{}", target_lang, text.to_uppercase()))
        }
    }

    #[tokio::test]
    async fn test_translate_document_never_sends_script_or_style() {
        let mut doc = Document::parse_html(
            r#"<html><head><style>.hello { color: red }</style></head>
<body><p>hello</p><script>console.log("hello script")</script><p>world</p></body></html>"#,
        )
        .unwrap();
        let translator = RecordingTranslator::default();

        let applied = translate_document(&mut doc, &translator, "fr").await.unwrap();

        assert_eq!(applied, 2);
        let seen = translator.seen.lock().unwrap().clone();
        assert_eq!(seen, vec!["hello", "world"]);

        let html = doc.to_html().unwrap();
        assert!(html.contains("<p>fr:HELLO</p>"));
        assert!(html.contains(r#"console.log("hello script")"#));
        assert!(html.contains(".hello { color: red }"));
    }

    #[tokio::test]
    async fn test_translate_document_translates_repeated_text_once() {
        let mut doc = Document::parse_html("<p>Menu</p><p>Menu</p><p>Menu</p>").unwrap();
        let translator = RecordingTranslator::default();

        let applied = translate_document(&mut doc, &translator, "de").await.unwrap();

        assert_eq!(applied, 3);
        assert_eq!(translator.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_http_translate_reads_data_field() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/translate")
            .match_body(Matcher::PartialJson(json!({
                "text": "Hello",
                "source_lang": "auto",
                "target_lang": "fr"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "code": 200, "data": "Bonjour" }).to_string())
            .create_async()
            .await;

        let translator = HttpTranslator::new(&format!("{}/translate", server.url()), 10).unwrap();
        let translated = translator.translate("Hello", "fr").await.unwrap();

        assert_eq!(translated, "Bonjour");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_batch_uses_index_markers_and_falls_back() {
        let mut server = Server::new_async().await;
        let batch = server
            .mock("POST", "/translate")
            .match_body(Matcher::PartialJson(json!({ "text": "[0] Hello\n[1] World" })))
            .with_status(200)
            .with_body(json!({ "data": "[0] Bonjour" }).to_string())
            .create_async()
            .await;
        let single = server
            .mock("POST", "/translate")
            .match_body(Matcher::PartialJson(json!({ "text": "World" })))
            .with_status(200)
            .with_body(json!({ "data": "Monde" }).to_string())
            .create_async()
            .await;

        let translator = HttpTranslator::new(&format!("{}/translate", server.url()), 10).unwrap();
        let texts = vec!["Hello".to_string(), "World".to_string()];
        let translated = translator.translate_batch(&texts, "fr").await.unwrap();

        assert_eq!(translated, vec!["Bonjour", "Monde"]);
        batch.assert_async().await;
        single.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_status_is_translation_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/translate")
            .with_status(429)
            .with_body("Too Many Requests")
            .create_async()
            .await;

        let translator = HttpTranslator::new(&format!("{}/translate", server.url()), 10).unwrap();
        let err = translator.translate("Hello", "fr").await.unwrap_err();

        match err {
            MirrorError::TranslationApi { status_code, message, .. } => {
                assert_eq!(status_code, 429);
                assert_eq!(message, "Too Many Requests");
            }
            other => panic!("Wrong error type: {}", other),
        }
    }

    #[test]
    fn test_parse_translation_response_fallbacks() {
        assert_eq!(parse_translation_response(r#"{"text":"Hola"}"#.to_string()), "Hola");
        assert_eq!(parse_translation_response(r#"{"result":"Ciao"}"#.to_string()), "Ciao");
        assert_eq!(parse_translation_response("plain body".to_string()), "plain body");
    }

    #[test]
    fn test_parse_indexed_lines_skips_noise() {
        let parsed = parse_indexed_lines("[0] Un\nnoise\n [2]  Trois \n[3]");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get(&0).map(String::as_str), Some("Un"));
        assert_eq!(parsed.get(&2).map(String::as_str), Some("Trois"));
    }
}
