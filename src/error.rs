//! 统一错误处理模块
//!
//! 提供镜像翻译流程中渲染、解析、翻译、文件读写各阶段的统一错误类型

// 标准库导入
use std::fmt;

// 第三方crate导入
use anyhow::Error as AnyhowError;

/// 镜像翻译统一错误类型
///
/// 任何一步失败都会向上传播并终止整个运行，不做部分恢复
#[derive(Debug)]
pub enum MirrorError {
    /// 网络请求相关错误
    Network {
        /// 错误消息
        message: String,
        /// HTTP状态码（如果适用）
        status_code: Option<u16>,
    },

    /// HTML解析或序列化错误
    HtmlParse {
        /// 具体错误信息
        details: String,
    },

    /// 文件操作相关错误
    FileOperation {
        /// 文件路径
        path: String,
        /// 操作类型（读取、写入、删除等）
        operation: String,
        /// 底层错误信息
        source: String,
    },

    /// 翻译API相关错误
    TranslationApi {
        /// API响应状态码
        status_code: u16,
        /// 错误消息
        message: String,
        /// API地址
        api_url: String,
    },

    /// 页面渲染错误（浏览器启动、导航、取内容）
    Render {
        /// 目标URL
        url: String,
        /// 错误详情
        details: String,
    },

    /// 两个不同的路径片段映射到同一个本地文件名
    FilenameCollision {
        /// 冲突的文件名
        filename: String,
        /// 已占用该文件名的路径片段
        existing: String,
        /// 新的路径片段
        incoming: String,
    },

    /// 配置相关错误
    Configuration {
        /// 配置项名称
        field: String,
        /// 错误原因
        reason: String,
    },

    /// 输入验证错误
    InputValidation {
        /// 输入值
        input: String,
        /// 验证失败原因
        reason: String,
    },

    /// 内部处理错误（包装anyhow::Error）
    Internal {
        /// 包装的错误
        source: AnyhowError,
    },
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorError::Network { message, status_code } => {
                if let Some(code) = status_code {
                    write!(f, "网络请求失败 [{}]: {}", code, message)
                } else {
                    write!(f, "网络请求失败: {}", message)
                }
            }
            MirrorError::HtmlParse { details } => {
                write!(f, "HTML解析失败: {}", details)
            }
            MirrorError::FileOperation { path, operation, source } => {
                write!(f, "文件{}操作失败 [{}]: {}", operation, path, source)
            }
            MirrorError::TranslationApi { status_code, message, api_url } => {
                write!(f, "翻译API错误 [{}] {}: {}", status_code, api_url, message)
            }
            MirrorError::Render { url, details } => {
                write!(f, "页面渲染失败 [{}]: {}", url, details)
            }
            MirrorError::FilenameCollision { filename, existing, incoming } => {
                write!(
                    f,
                    "文件名冲突 [{}]: '{}' 与 '{}' 映射到同一文件",
                    filename, existing, incoming
                )
            }
            MirrorError::Configuration { field, reason } => {
                write!(f, "配置错误 [{}]: {}", field, reason)
            }
            MirrorError::InputValidation { input, reason } => {
                write!(f, "输入验证失败 [{}]: {}", input, reason)
            }
            MirrorError::Internal { source } => {
                write!(f, "内部处理错误: {}", source)
            }
        }
    }
}

impl std::error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MirrorError::Internal { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// 镜像翻译结果类型别名
pub type Result<T> = std::result::Result<T, MirrorError>;

/// 便捷的错误创建宏
#[macro_export]
macro_rules! mirror_error {
    (network, $msg:expr) => {
        $crate::error::MirrorError::Network {
            message: $msg.to_string(),
            status_code: None,
        }
    };
    (network, $msg:expr, $code:expr) => {
        $crate::error::MirrorError::Network {
            message: $msg.to_string(),
            status_code: Some($code),
        }
    };
    (html_parse, $details:expr) => {
        $crate::error::MirrorError::HtmlParse {
            details: $details.to_string(),
        }
    };
    (file_op, $path:expr, $op:expr, $source:expr) => {
        $crate::error::MirrorError::FileOperation {
            path: $path.to_string(),
            operation: $op.to_string(),
            source: $source.to_string(),
        }
    };
    (translation_api, $code:expr, $msg:expr, $url:expr) => {
        $crate::error::MirrorError::TranslationApi {
            status_code: $code,
            message: $msg.to_string(),
            api_url: $url.to_string(),
        }
    };
    (render, $url:expr, $details:expr) => {
        $crate::error::MirrorError::Render {
            url: $url.to_string(),
            details: $details.to_string(),
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::MirrorError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
    (input_validation, $input:expr, $reason:expr) => {
        $crate::error::MirrorError::InputValidation {
            input: $input.to_string(),
            reason: $reason.to_string(),
        }
    };
}

/// 从anyhow::Error转换为MirrorError
impl From<AnyhowError> for MirrorError {
    fn from(error: AnyhowError) -> Self {
        MirrorError::Internal { source: error }
    }
}

/// 从reqwest::Error转换为MirrorError
impl From<reqwest::Error> for MirrorError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        MirrorError::Network {
            message: error.to_string(),
            status_code,
        }
    }
}
