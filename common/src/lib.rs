//! 数据库问答服务公共模块
//!
//! 提供各组件共享的基础设施：
//! - 统一错误类型
//! - 环境变量配置
//! - 数据模型与 API 响应包装
//! - 请求 ID 中间件

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
