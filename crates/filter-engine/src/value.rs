//! 属性值模型
//!
//! 记录属性和全局变量只有三种形态：字符串、数值、缺失。
//! 字符串与数值之间不做任何隐式转换。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 属性值
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    /// 键不存在或类型不受支持
    #[default]
    Absent,
}

/// 共享的缺失值，供按引用返回的查找使用
pub static ABSENT: Value = Value::Absent;

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// 类型名称，用于调试输出
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Absent => "absent",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

/// 从 JSON 值转换：只保留字符串和数值，布尔、数组、对象、null 一律视为缺失
impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or_default(),
            _ => Self::Absent,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{:.6}", n),
            Self::Absent => write!(f, "<absent>"),
        }
    }
}
