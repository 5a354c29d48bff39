//! 求值所需的外部协作者
//!
//! 记录属性通过 [`PropertyStore`] 查找，全局变量和外部谓词由 [`FilterContext`] 提供。
//! 这里同时提供两者的内存实现。

use crate::error::{FilterError, Result};
use crate::models::{FilterGlobal, FunctionId};
use crate::value::{Value, ABSENT};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// 记录属性存储
#[cfg_attr(test, mockall::automock)]
pub trait PropertyStore {
    /// 键是否存在（与值的类型无关）
    fn contains(&self, key: &str) -> bool;

    /// 按键取值，键不存在或类型不受支持时返回 [`Value::Absent`]
    fn get(&self, key: &str) -> &Value;
}

/// 求值上下文
#[cfg_attr(test, mockall::automock)]
pub trait FilterContext {
    fn global(&self, global: FilterGlobal) -> &Value;

    /// 执行外部注册的谓词
    fn eval_function(&self, id: FunctionId) -> bool;
}

/// 按键排序存储的属性集
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    props: Vec<(String, Value)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置属性，已存在的键会被覆盖
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Ok(i) => self.props[i].1 = value,
            Err(i) => self.props.insert(i, (key, value)),
        }
    }

    /// 从 JSON 对象文本构建
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }

    /// 从 JSON 对象构建，只取顶层字段
    ///
    /// 字符串和数值原样保留，其余类型的字段视为存在但取值为 [`Value::Absent`]。
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| FilterError::NotAnObject(json_type_name(value)))?;

        Ok(map.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn position(&self, key: &str) -> std::result::Result<usize, usize> {
        self.props.binary_search_by(|(k, _)| k.as_str().cmp(key))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

impl PropertyStore for Properties {
    fn contains(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    fn get(&self, key: &str) -> &Value {
        match self.position(key) {
            Ok(i) => &self.props[i].1,
            Err(_) => &ABSENT,
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// 外部谓词
pub type FilterFunction = Arc<dyn Fn() -> bool + Send + Sync>;

/// 内存求值上下文：全局变量表 + 已注册的外部谓词
#[derive(Clone, Default)]
pub struct EvaluationContext {
    globals: HashMap<FilterGlobal, Value>,
    functions: Vec<FilterFunction>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_global(&mut self, global: FilterGlobal, value: impl Into<Value>) {
        self.globals.insert(global, value.into());
    }

    pub fn with_global(mut self, global: FilterGlobal, value: impl Into<Value>) -> Self {
        self.set_global(global, value);
        self
    }

    /// 注册外部谓词，返回供 `Filter::Function` 引用的句柄
    pub fn register_function<F>(&mut self, function: F) -> FunctionId
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.functions.push(Arc::new(function));
        FunctionId((self.functions.len() - 1) as u32)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

impl FilterContext for EvaluationContext {
    fn global(&self, global: FilterGlobal) -> &Value {
        self.globals.get(&global).unwrap_or(&ABSENT)
    }

    fn eval_function(&self, id: FunctionId) -> bool {
        match self.functions.get(id.0 as usize) {
            Some(function) => function(),
            None => {
                warn!(function_id = %id, "外部谓词未注册，按不匹配处理");
                false
            }
        }
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("globals", &self.globals)
            .field("functions", &self.functions.len())
            .finish()
    }
}
