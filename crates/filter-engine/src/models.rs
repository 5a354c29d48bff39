//! 过滤器树领域模型

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 由上下文提供的全局变量
///
/// 叶子过滤器设置了全局引用时，取值来源从记录属性切换为上下文。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterGlobal {
    /// 当前缩放级别
    Zoom,
    /// 记录的几何类型
    Geometry,
    /// 当前每像素米数
    MetersPerPixel,
}

impl FilterGlobal {
    pub const ALL: [FilterGlobal; 3] = [Self::Zoom, Self::Geometry, Self::MetersPerPixel];

    /// 规则中使用的关键字，同时作为叶子过滤器的 key
    pub fn key(self) -> &'static str {
        match self {
            Self::Zoom => "$zoom",
            Self::Geometry => "$geometry",
            Self::MetersPerPixel => "$meters_per_pixel",
        }
    }

    /// 根据关键字解析全局变量，不是全局关键字时返回 None
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.key() == key)
    }
}

impl fmt::Display for FilterGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// 外部注册的谓词函数句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub u32);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 过滤器树节点
///
/// 组合节点独占其操作数序列，树构建完成后只读。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// 任一操作数匹配
    Any { operands: Vec<Filter> },
    /// 全部操作数匹配
    All { operands: Vec<Filter> },
    /// 没有操作数匹配
    NoneOf { operands: Vec<Filter> },
    /// 键是否存在
    Existence { key: String, exists: bool },
    Equality {
        key: String,
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        global: Option<FilterGlobal>,
    },
    /// 取值属于集合中任意一项
    EqualitySet {
        key: String,
        values: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        global: Option<FilterGlobal>,
    },
    /// min <= value < max
    Range {
        key: String,
        #[serde(
            default = "neg_infinity",
            skip_serializing_if = "is_neg_infinite",
            with = "range_bound"
        )]
        min: f64,
        #[serde(
            default = "infinity",
            skip_serializing_if = "is_pos_infinite",
            with = "range_bound"
        )]
        max: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        global: Option<FilterGlobal>,
    },
    /// 外部谓词
    Function { id: FunctionId },
    /// 恒为真
    #[default]
    Always,
}

fn neg_infinity() -> f64 {
    f64::NEG_INFINITY
}

fn infinity() -> f64 {
    f64::INFINITY
}

fn is_neg_infinite(v: &f64) -> bool {
    *v == f64::NEG_INFINITY
}

fn is_pos_infinite(v: &f64) -> bool {
    *v == f64::INFINITY
}

/// 范围边界编解码
///
/// JSON 无法表示非有限数，无穷和 NaN 以关键字 "inf" / "-inf" / "nan" 写出。
mod range_bound {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Bound {
        Number(f64),
        Keyword(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Bound::deserialize(deserializer)? {
            Bound::Number(n) => Ok(n),
            Bound::Keyword(k) => match k.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("无效的范围边界: {}", other))),
            },
        }
    }
}

impl Filter {
    pub fn any(operands: Vec<Filter>) -> Self {
        Self::Any { operands }
    }

    pub fn all(operands: Vec<Filter>) -> Self {
        Self::All { operands }
    }

    pub fn none_of(operands: Vec<Filter>) -> Self {
        Self::NoneOf { operands }
    }

    pub fn exists(key: impl Into<String>) -> Self {
        Self::Existence {
            key: key.into(),
            exists: true,
        }
    }

    pub fn missing(key: impl Into<String>) -> Self {
        Self::Existence {
            key: key.into(),
            exists: false,
        }
    }

    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equality {
            key: key.into(),
            value: value.into(),
            global: None,
        }
    }

    pub fn global_equals(global: FilterGlobal, value: impl Into<Value>) -> Self {
        Self::Equality {
            key: global.key().to_string(),
            value: value.into(),
            global: Some(global),
        }
    }

    pub fn one_of(key: impl Into<String>, values: Vec<Value>) -> Self {
        Self::EqualitySet {
            key: key.into(),
            values,
            global: None,
        }
    }

    pub fn global_one_of(global: FilterGlobal, values: Vec<Value>) -> Self {
        Self::EqualitySet {
            key: global.key().to_string(),
            values,
            global: Some(global),
        }
    }

    /// 半开区间 [min, max)，任一端可为无穷
    pub fn range(key: impl Into<String>, min: f64, max: f64) -> Self {
        Self::Range {
            key: key.into(),
            min,
            max,
            global: None,
        }
    }

    pub fn global_range(global: FilterGlobal, min: f64, max: f64) -> Self {
        Self::Range {
            key: global.key().to_string(),
            min,
            max,
            global: Some(global),
        }
    }

    pub fn function(id: u32) -> Self {
        Self::Function { id: FunctionId(id) }
    }

    /// 叶子过滤器检查的属性键；组合节点、函数和恒真节点没有键
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Existence { key, .. }
            | Self::Equality { key, .. }
            | Self::EqualitySet { key, .. }
            | Self::Range { key, .. } => Some(key),
            Self::Any { .. }
            | Self::All { .. }
            | Self::NoneOf { .. }
            | Self::Function { .. }
            | Self::Always => None,
        }
    }

    /// 组合节点的操作数，其他节点返回空切片
    pub fn operands(&self) -> &[Filter] {
        match self {
            Self::Any { operands } | Self::All { operands } | Self::NoneOf { operands } => operands,
            _ => &[],
        }
    }

    pub(crate) fn operands_mut(&mut self) -> Option<&mut Vec<Filter>> {
        match self {
            Self::Any { operands } | Self::All { operands } | Self::NoneOf { operands } => {
                Some(operands)
            }
            _ => None,
        }
    }

    /// 是否为布尔组合节点（any / all / none）
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Self::Any { .. } | Self::All { .. } | Self::NoneOf { .. }
        )
    }

    /// 叶子过滤器引用的全局变量
    pub fn global(&self) -> Option<FilterGlobal> {
        match self {
            Self::Equality { global, .. }
            | Self::EqualitySet { global, .. }
            | Self::Range { global, .. } => *global,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_operands() {
        let leaf = Filter::equals("kind", "park");
        assert_eq!(leaf.key(), Some("kind"));
        assert!(leaf.operands().is_empty());
        assert!(!leaf.is_operator());

        let group = Filter::all(vec![leaf.clone(), Filter::exists("name")]);
        assert_eq!(group.key(), None);
        assert_eq!(group.operands().len(), 2);
        assert!(group.is_operator());

        assert_eq!(Filter::function(3).key(), None);
        assert!(!Filter::function(3).is_operator());
        assert!(!Filter::Always.is_operator());
    }

    #[test]
    fn test_global_constructors_use_keyword() {
        let f = Filter::global_range(FilterGlobal::Zoom, 10.0, f64::INFINITY);
        assert_eq!(f.key(), Some("$zoom"));
        assert_eq!(f.global(), Some(FilterGlobal::Zoom));
        assert_eq!(Filter::range("height", 0.0, 1.0).global(), None);
    }

    #[test]
    fn test_global_from_key() {
        assert_eq!(FilterGlobal::from_key("$geometry"), Some(FilterGlobal::Geometry));
        assert_eq!(
            FilterGlobal::from_key("$meters_per_pixel"),
            Some(FilterGlobal::MetersPerPixel)
        );
        assert_eq!(FilterGlobal::from_key("geometry"), None);
    }

    #[test]
    fn test_filter_deserialization() {
        let json = r#"
        {
            "type": "all",
            "operands": [
                { "type": "equality", "key": "kind", "value": "park" },
                { "type": "range", "key": "$zoom", "min": 12, "global": "zoom" },
                { "type": "equality_set", "key": "class", "values": ["a", 2] },
                { "type": "none_of", "operands": [{ "type": "function", "id": 4 }] },
                { "type": "existence", "key": "name", "exists": false },
                { "type": "always" }
            ]
        }
        "#;

        let filter: Filter = serde_json::from_str(json).unwrap();
        let operands = filter.operands();
        assert_eq!(operands.len(), 6);
        assert_eq!(operands[0], Filter::equals("kind", "park"));
        assert_eq!(
            operands[1],
            Filter::global_range(FilterGlobal::Zoom, 12.0, f64::INFINITY)
        );
        assert_eq!(
            operands[2],
            Filter::one_of("class", vec![Value::from("a"), Value::from(2)])
        );
        assert_eq!(operands[3], Filter::none_of(vec![Filter::function(4)]));
        assert_eq!(operands[4], Filter::missing("name"));
        assert_eq!(operands[5], Filter::Always);
    }

    #[test]
    fn test_unbounded_range_serialization() {
        let f = Filter::range("height", 5.0, f64::INFINITY);
        let json = serde_json::to_string(&f).unwrap();
        assert!(!json.contains("max"));

        let parsed: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, f);
    }

    #[test]
    fn test_malformed_range_survives_serialization() {
        let props: crate::context::Properties = [("h", 5.0)].into_iter().collect();
        let ctx = crate::context::EvaluationContext::new();

        for f in [
            Filter::range("h", f64::INFINITY, f64::INFINITY),
            Filter::range("h", 0.0, f64::NEG_INFINITY),
            Filter::range("h", f64::NEG_INFINITY, f64::NEG_INFINITY),
        ] {
            let json = serde_json::to_string(&f).unwrap();
            let parsed: Filter = serde_json::from_str(&json).unwrap();

            assert_eq!(parsed, f, "{}", json);
            assert!(!parsed.eval(&props, &ctx), "{}", json);
        }
    }

    #[test]
    fn test_range_bound_keywords() {
        let json = r#"{ "type": "range", "key": "h", "min": "inf", "max": "-inf" }"#;
        let parsed: Filter = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, Filter::range("h", f64::INFINITY, f64::NEG_INFINITY));

        let json = r#"{ "type": "range", "key": "h", "min": "huge" }"#;
        assert!(serde_json::from_str::<Filter>(json).is_err());
    }
}
