use serde::{Deserialize, Serialize};
use std::fmt;

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// 选择题
    MultipleChoice,
    /// 简答题
    LongAnswer,
    /// 数学表达式
    MathExpression,
    /// 判断题
    TrueFalse,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::LongAnswer => "long_answer",
            QuestionKind::MathExpression => "math_expression",
            QuestionKind::TrueFalse => "true_false",
        }
    }

    /// 新建草稿时使用的空题目数据
    pub fn default_payload(&self) -> TypePayload {
        match self {
            QuestionKind::MultipleChoice => TypePayload::MultipleChoice {
                options: Vec::new(),
            },
            QuestionKind::LongAnswer => TypePayload::LongAnswer {
                markscheme: Vec::new(),
            },
            QuestionKind::MathExpression => TypePayload::MathExpression {
                expected_answer: String::new(),
            },
            QuestionKind::TrueFalse => TypePayload::TrueFalse { answer: true },
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 选择题选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    pub correct: bool,
}

/// 评分细则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkschemeRule {
    pub description: String,
    pub weight: f64,
}

/// 题型相关的结构化数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypePayload {
    MultipleChoice { options: Vec<ChoiceOption> },
    LongAnswer { markscheme: Vec<MarkschemeRule> },
    MathExpression { expected_answer: String },
    TrueFalse { answer: bool },
}

impl TypePayload {
    pub fn kind(&self) -> QuestionKind {
        match self {
            TypePayload::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            TypePayload::LongAnswer { .. } => QuestionKind::LongAnswer,
            TypePayload::MathExpression { .. } => QuestionKind::MathExpression,
            TypePayload::TrueFalse { .. } => QuestionKind::TrueFalse,
        }
    }

    /// 由评分细则推导出的分值
    ///
    /// 只有带评分细则的简答题才有推导分值，其余题型直接使用设置的分值。
    pub fn derived_points(&self) -> Option<f64> {
        match self {
            TypePayload::LongAnswer { markscheme } if !markscheme.is_empty() => {
                Some(markscheme.iter().map(|rule| rule.weight).sum())
            }
            _ => None,
        }
    }

    /// 第一条权重为负数或不是有限数的评分细则
    pub fn invalid_weight(&self) -> Option<(usize, f64)> {
        match self {
            TypePayload::LongAnswer { markscheme } => markscheme
                .iter()
                .enumerate()
                .find(|(_, rule)| !is_valid_points(rule.weight))
                .map(|(index, rule)| (index, rule.weight)),
            _ => None,
        }
    }
}

/// 分值和权重都必须是非负有限数
pub fn is_valid_points(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// 发送给持久化 API 的题目内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionContent {
    pub kind: QuestionKind,
    pub prompt: String,
    pub point_value: f64,
    pub payload: TypePayload,
}
