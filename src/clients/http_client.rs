/// 题目持久化 HTTP 客户端
///
/// 封装所有与远程题目 API 相关的调用逻辑
use crate::clients::question_api::{ApiOperation, QuestionApi};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{QuestionContent, QuestionId, WorksheetId};
use crate::store::DropPosition;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// 题目持久化 HTTP 客户端
pub struct HttpQuestionClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

/// 新建接口的返回体
#[derive(Debug, Deserialize)]
struct CreatedQuestion {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
}

impl HttpQuestionClient {
    /// 创建新的 HTTP 客户端
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::RequestFailed {
                endpoint: config.api_base_url.clone(),
                source: Box::new(e),
            })?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    fn questions_url(&self, worksheet_id: &WorksheetId) -> String {
        format!("{}/worksheets/{}/questions", self.base_url, worksheet_id)
    }

    fn question_url(&self, worksheet_id: &WorksheetId, question_id: &QuestionId) -> String {
        format!("{}/{}", self.questions_url(worksheet_id), question_id)
    }

    /// 发送请求，非 2xx 响应转换为错误
    async fn send(&self, operation: ApiOperation, request: RequestBuilder) -> Result<Response, ApiError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| ApiError::RequestFailed {
            endpoint: operation.to_string(),
            source: Box::new(e),
        })?;

        let status = response.status();
        debug!("{} 返回状态 {}", operation, status);

        if !status.is_success() {
            let message = response.text().await.ok().filter(|text| !text.is_empty());
            return Err(ApiError::BadResponse {
                endpoint: operation.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl QuestionApi for HttpQuestionClient {
    async fn create_question(
        &self,
        worksheet_id: &WorksheetId,
        content: &QuestionContent,
    ) -> Result<QuestionId, ApiError> {
        let request = self.http.post(self.questions_url(worksheet_id)).json(content);
        let response = self.send(ApiOperation::Create, request).await?;

        let created: CreatedQuestion =
            response
                .json()
                .await
                .map_err(|e| ApiError::JsonParseFailed {
                    source: Box::new(e),
                })?;

        parse_created(created)
    }

    async fn update_question(
        &self,
        worksheet_id: &WorksheetId,
        question_id: &QuestionId,
        content: &QuestionContent,
    ) -> Result<(), ApiError> {
        let request = self
            .http
            .put(self.question_url(worksheet_id, question_id))
            .json(content);
        self.send(ApiOperation::Update, request).await?;
        Ok(())
    }

    async fn delete_question(
        &self,
        worksheet_id: &WorksheetId,
        question_id: &QuestionId,
    ) -> Result<(), ApiError> {
        let request = self.http.delete(self.question_url(worksheet_id, question_id));
        self.send(ApiOperation::Delete, request).await?;
        Ok(())
    }

    async fn reorder_question(
        &self,
        worksheet_id: &WorksheetId,
        moved: &QuestionId,
        target: &QuestionId,
        position: DropPosition,
    ) -> Result<(), ApiError> {
        let url = format!("{}/reorder", self.question_url(worksheet_id, moved));
        let body = json!({
            "targetId": target,
            "position": position,
        });
        self.send(ApiOperation::Reorder, self.http.post(url).json(&body))
            .await?;
        Ok(())
    }
}

fn parse_created(created: CreatedQuestion) -> Result<QuestionId, ApiError> {
    if created.id.trim().is_empty() {
        return Err(ApiError::EmptyResponse {
            endpoint: ApiOperation::Create.to_string(),
        });
    }
    Ok(QuestionId::new(created.id))
}

// 服务端返回的 id 可能是字符串也可能是整数
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer question id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
